//! Wire-level errors.

use thiserror::Error;

/// Errors surfaced by a debug-wire backend.
///
/// `Disconnected` is special: the debug core treats it as a session-ending
/// condition on every operation, not as a per-call failure.
#[derive(Debug, Error)]
pub enum WireError {
    /// The connection to the target machine is gone.
    #[error("target disconnected")]
    Disconnected,

    /// The target has no source/line information for the queried element.
    #[error("line information absent")]
    AbsentInformation,

    /// The thread handle is stale or the thread is not suspended.
    #[error("invalid thread state")]
    InvalidThread,

    /// The requested stack frame does not exist.
    #[error("invalid frame index {0}")]
    InvalidFrame(usize),

    /// The backend cannot perform the operation on this value or machine.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Launching or attaching to the target failed.
    #[error("failed to start target: {0}")]
    Launch(String),

    /// A method invocation inside the target failed.
    #[error("invocation failed: {0}")]
    Invocation(String),
}

impl WireError {
    /// Returns `true` if this error means the target connection is gone.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, WireError::Disconnected)
    }
}
