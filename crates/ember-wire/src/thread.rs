//! Threads and stack frames of a suspended target.

use std::sync::Arc;

use crate::error::WireError;
use crate::types::WireLocation;
use crate::value::{ObjectReference, WireValue};

/// Opaque thread identifier minted by the target machine.
///
/// Stable for a thread's lifetime within one connection.
pub type ThreadId = i64;

// ── LocalVariable ────────────────────────────────────────────────────────────

/// A named local variable visible in a stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    /// Variable name.
    pub name: String,
    /// Declared type name.
    pub type_name: String,
}

// ── ThreadReference ──────────────────────────────────────────────────────────

/// A live handle to a thread in the target machine.
pub trait ThreadReference: Send + Sync {
    /// The target-minted identifier for this thread.
    fn unique_id(&self) -> ThreadId;

    /// Thread name.
    fn name(&self) -> String;

    /// Number of frames on the call stack. The thread must be suspended.
    fn frame_count(&self) -> Result<usize, WireError>;

    /// The frame at `index` (0 = innermost). The thread must be suspended.
    fn frame(&self, index: usize) -> Result<Arc<dyn StackFrame>, WireError>;
}

// ── StackFrame ───────────────────────────────────────────────────────────────

/// One frame of a suspended thread's call stack.
///
/// Frame handles are invalidated as soon as the thread resumes.
pub trait StackFrame: Send + Sync {
    /// Code position of this frame.
    ///
    /// Fails once the frame handle is stale (the thread has resumed).
    fn location(&self) -> Result<WireLocation, WireError>;

    /// Locals visible at the current position, in slot order.
    ///
    /// Returns [`WireError::AbsentInformation`] when the enclosing method was
    /// compiled without variable tables.
    fn visible_variables(&self) -> Result<Vec<LocalVariable>, WireError>;

    /// Read a visible variable.
    fn get_value(&self, variable: &LocalVariable) -> Result<WireValue, WireError>;

    /// Write a visible variable.
    fn set_value(&self, variable: &LocalVariable, value: WireValue) -> Result<(), WireError>;

    /// The `this` object, or `None` in a static frame.
    fn this_object(&self) -> Option<Arc<dyn ObjectReference>>;

    /// Values of the method's arguments.
    fn argument_values(&self) -> Result<Vec<WireValue>, WireError>;
}
