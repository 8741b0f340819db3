//! Debug protocol - request/response/event types for the debug core.
//!
//! All types are serde-serializable so the enclosing server can put them on
//! its wire without re-modeling them. Object and thread identifiers are the
//! target-minted ids from `ember-wire`; they are only meaningful within the
//! session that produced them.

use std::path::PathBuf;

use ember_wire::{ObjectId, ThreadId};
use serde::{Deserialize, Serialize};

// ── Breakpoint ───────────────────────────────────────────────────────────────

/// A user breakpoint: an absolute source file and a 1-based line.
///
/// Value equality (and ordering, for stable listings) covers both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Source file path.
    pub file: PathBuf,
    /// Line number (1-based).
    pub line: u32,
}

impl Breakpoint {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

// ── Source position ──────────────────────────────────────────────────────────

/// A resolved position in a project source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: PathBuf,
    /// Line number (1-based).
    pub line: u32,
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

// ── Debug location ───────────────────────────────────────────────────────────

/// A client-addressable place from which a value can be read (or written).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DebugLocation {
    /// An object previously returned to the client.
    Reference { object_id: ObjectId },
    /// A named field of a previously-returned object.
    Field { object_id: ObjectId, name: String },
    /// An element of a previously-returned array.
    Element { object_id: ObjectId, index: u32 },
    /// A local variable slot in a suspended thread's stack.
    Slot {
        thread_id: ThreadId,
        /// Frame index, 0 = innermost.
        frame: u32,
        /// Slot offset within the frame's visible variables.
        offset: u32,
    },
}

// ── Marshaled values ─────────────────────────────────────────────────────────

/// A rendered field of a class or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassField {
    /// Stable ordinal within the concatenated declaring-class chain.
    pub index: i32,
    pub name: String,
    pub type_name: String,
    /// Rendered value summary; `"???"` when the value could not be read.
    pub summary: String,
}

/// A target value marshaled for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DebugValue {
    Null,
    Primitive {
        summary: String,
        type_name: String,
    },
    String {
        summary: String,
        fields: Vec<ClassField>,
        type_name: String,
        object_id: ObjectId,
    },
    Array {
        length: u32,
        type_name: String,
        element_type_name: String,
        object_id: ObjectId,
    },
    Object {
        summary: String,
        fields: Vec<ClassField>,
        type_name: String,
        object_id: ObjectId,
    },
}

impl DebugValue {
    /// The identity-cache id behind this value, if it is object-backed.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            DebugValue::Null | DebugValue::Primitive { .. } => None,
            DebugValue::String { object_id, .. }
            | DebugValue::Array { object_id, .. }
            | DebugValue::Object { object_id, .. } => Some(*object_id),
        }
    }
}

// ── Stack frames ─────────────────────────────────────────────────────────────

/// A local variable rendered for a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackLocal {
    /// Slot offset within the frame.
    pub index: i32,
    pub name: String,
    pub summary: String,
    pub type_name: String,
}

/// One rendered stack frame.
///
/// Rendering is best-effort: a frame whose details cannot be read still
/// appears, with `"Class"`/`"Method"` placeholders, no locals, zero
/// arguments, and a `this_object_id` of `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrameInfo {
    /// Frame index, 0 = innermost.
    pub index: u32,
    pub locals: Vec<StackLocal>,
    pub num_args: u32,
    pub class_name: String,
    pub method_name: String,
    pub source: Option<SourcePosition>,
    /// Identity-cache id of the frame's `this`, or `-1` for static frames.
    pub this_object_id: ObjectId,
}

/// A rendered slice of a thread's call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktraceInfo {
    pub frames: Vec<StackFrameInfo>,
    pub thread_id: ThreadId,
    pub thread_name: String,
}

// ── Requests ─────────────────────────────────────────────────────────────────

/// Requests accepted by the debug controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DebugRequest {
    // ── Session lifecycle ───────────────────────────────────────────────────
    /// Launch a new target process and start a session.
    Start { command: String },
    /// Attach to a running target and start a session.
    Attach { host: String, port: u16 },
    /// End the current session.
    Stop,
    /// Is a session active?
    ActiveVm,

    // ── Breakpoint management ───────────────────────────────────────────────
    /// Register a breakpoint; becomes pending if the class is not loaded yet.
    SetBreakpoint { file: PathBuf, line: u32 },
    /// Remove a breakpoint from both the active and pending sets.
    ClearBreakpoint { file: PathBuf, line: u32 },
    /// Remove every breakpoint.
    ClearAllBreakpoints,
    /// List active and pending breakpoints.
    ListBreakpoints,

    // ── Execution control ───────────────────────────────────────────────────
    /// Resume the target.
    Run,
    /// Resume the target. The whole machine resumes, not just the thread.
    Continue { thread_id: ThreadId },
    /// Step over the current source line.
    Next { thread_id: ThreadId },
    /// Step into the next call.
    Step { thread_id: ThreadId },
    /// Run until the current frame returns.
    StepOut { thread_id: ThreadId },

    // ── Inspection ──────────────────────────────────────────────────────────
    /// Find a name in scope for the given thread.
    LocateName { thread_id: ThreadId, name: String },
    /// Read the value at a location.
    Value { location: DebugLocation },
    /// Render the value at a location as text, invoking the target's
    /// `toString` for plain objects.
    ToString {
        thread_id: ThreadId,
        location: DebugLocation,
    },
    /// Parse `text` and write it into a stack slot.
    SetValue {
        location: DebugLocation,
        text: String,
    },
    /// Render a slice of a thread's call stack. `count == -1` means "to the
    /// end".
    Backtrace {
        thread_id: ThreadId,
        start: u32,
        count: i32,
    },
}

// ── Responses ────────────────────────────────────────────────────────────────

/// Replies from the debug controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DebugResponse {
    /// The request was processed; it carries no payload.
    Ok,
    /// Boolean outcome; `success: false` is the generic failure marker for
    /// requests that need a live (and reachable) target.
    Ack { success: bool },
    /// The request failed outright (startup errors).
    Error { code: i32, message: String },
    /// Active and pending breakpoints, each sorted by (file, line).
    Breakpoints {
        active: Vec<Breakpoint>,
        pending: Vec<Breakpoint>,
    },
    /// Where a name was found, if anywhere.
    Location { location: Option<DebugLocation> },
    /// A marshaled value, or `None` when the location did not resolve.
    Value { value: Option<DebugValue> },
    /// A textual rendering, or `None` when it could not be produced.
    Text { text: Option<String> },
    /// A rendered backtrace.
    Backtrace { backtrace: BacktraceInfo },
}

impl DebugResponse {
    /// Convenience constructor for the boolean reply.
    pub fn ack(success: bool) -> Self {
        Self::Ack { success }
    }

    /// Convenience constructor for an error reply.
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

// ── Events ───────────────────────────────────────────────────────────────────

/// Asynchronous events emitted to the broadcaster supplied at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DebugEvent {
    /// The target machine has started.
    VmStart,
    /// The session ended; all object and thread ids are now invalid.
    Disconnect,
    /// A step completed.
    Step {
        thread_id: ThreadId,
        thread_name: String,
        file: PathBuf,
        line: u32,
    },
    /// A breakpoint was hit.
    Break {
        thread_id: ThreadId,
        thread_name: String,
        file: PathBuf,
        line: u32,
    },
    /// An exception was thrown; no catch position means it is uncaught.
    Exception {
        exception_id: ObjectId,
        thread_id: ThreadId,
        thread_name: String,
        file: Option<PathBuf>,
        line: Option<u32>,
    },
    /// A target thread started.
    ThreadStart { thread_id: ThreadId },
    /// A target thread died.
    ThreadDeath { thread_id: ThreadId },
    /// A chunk of the launched target's standard output or error.
    Output { text: String },
    /// A human-readable notice for the client's status area.
    Background { text: String },
}
