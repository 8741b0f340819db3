//! Target events and the blocking event queue.

use std::sync::Arc;

use crate::error::WireError;
use crate::thread::ThreadReference;
use crate::types::{ReferenceType, WireLocation};
use crate::value::ObjectReference;

// ── SuspendPolicy ────────────────────────────────────────────────────────────

/// What the target does to its threads when an event request fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendPolicy {
    /// Suspend every thread in the target.
    All,
    /// Suspend nothing.
    None,
}

// ── WireEvent ────────────────────────────────────────────────────────────────

/// An event delivered by the target machine.
#[derive(Clone)]
pub enum WireEvent {
    /// The target machine has started (launched targets begin suspended).
    VmStart,
    /// The target machine is terminating.
    VmDeath,
    /// The connection to the target machine is gone.
    VmDisconnect,
    /// A class was loaded and prepared.
    ClassPrepare { class: Arc<dyn ReferenceType> },
    /// An installed breakpoint was hit.
    Breakpoint {
        thread: Arc<dyn ThreadReference>,
        location: WireLocation,
    },
    /// A step request completed.
    Step {
        thread: Arc<dyn ThreadReference>,
        location: WireLocation,
    },
    /// An exception was thrown.
    Exception {
        thread: Arc<dyn ThreadReference>,
        exception: Arc<dyn ObjectReference>,
        /// Where the exception will be caught; `None` means uncaught.
        catch_location: Option<WireLocation>,
    },
    /// A thread started.
    ThreadStart { thread: Arc<dyn ThreadReference> },
    /// A thread died.
    ThreadDeath { thread: Arc<dyn ThreadReference> },
}

impl std::fmt::Debug for WireEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireEvent::VmStart => write!(f, "VmStart"),
            WireEvent::VmDeath => write!(f, "VmDeath"),
            WireEvent::VmDisconnect => write!(f, "VmDisconnect"),
            WireEvent::ClassPrepare { class } => write!(f, "ClassPrepare({})", class.name()),
            WireEvent::Breakpoint { location, .. } => write!(f, "Breakpoint({location})"),
            WireEvent::Step { location, .. } => write!(f, "Step({location})"),
            WireEvent::Exception { catch_location, .. } => {
                write!(f, "Exception(caught: {})", catch_location.is_some())
            }
            WireEvent::ThreadStart { thread } => write!(f, "ThreadStart({})", thread.unique_id()),
            WireEvent::ThreadDeath { thread } => write!(f, "ThreadDeath({})", thread.unique_id()),
        }
    }
}

// ── EventSet ─────────────────────────────────────────────────────────────────

/// A batch of events delivered together, sharing one suspend policy.
///
/// A set delivered with [`SuspendPolicy::All`] keeps the target suspended
/// until [`EventSet::resume`] is called (or the machine is resumed by other
/// means). Resuming a [`SuspendPolicy::None`] set is a no-op.
pub trait EventSet: Send {
    /// The events in this set.
    fn events(&self) -> Vec<WireEvent>;

    /// The suspend policy the set was delivered under.
    fn suspend_policy(&self) -> SuspendPolicy;

    /// Undo the suspension caused by this set's delivery.
    fn resume(&self) -> Result<(), WireError>;
}

// ── EventQueue ───────────────────────────────────────────────────────────────

/// The target machine's event queue.
pub trait EventQueue: Send + Sync {
    /// Block until the next event set arrives.
    ///
    /// Returns [`WireError::Disconnected`] once the connection is gone; the
    /// queue never yields events after that.
    fn remove(&self) -> Result<Box<dyn EventSet>, WireError>;
}
