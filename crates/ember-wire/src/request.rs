//! Event requests: what the debugger asks the target to watch for.

use std::sync::Arc;

use crate::event::SuspendPolicy;
use crate::thread::ThreadReference;
use crate::types::WireLocation;

// ── Step granularity ─────────────────────────────────────────────────────────

/// How far a single step moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStride {
    /// Step to a different source line.
    Line,
    /// Step by the smallest possible amount (one code index).
    Min,
}

/// Call-depth behavior of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDepth {
    /// Descend into calls.
    Into,
    /// Skip over calls.
    Over,
    /// Run until the current frame returns.
    Out,
}

// ── EventRequest ─────────────────────────────────────────────────────────────

/// A registered event request in the target.
///
/// Requests start disabled; nothing fires until [`EventRequest::enable`].
pub trait EventRequest: Send + Sync {
    /// Start delivering events for this request.
    fn enable(&self);

    /// Stop delivering events; the request stays registered.
    fn disable(&self);

    /// Whether the request is currently enabled.
    fn is_enabled(&self) -> bool;

    /// The code position this request watches (breakpoint requests only).
    fn location(&self) -> Option<WireLocation>;

    /// Auto-expire the request after `count` deliveries.
    fn set_count_filter(&self, count: u32);
}

// ── EventRequestManager ──────────────────────────────────────────────────────

/// Factory and registry for event requests on one target machine.
pub trait EventRequestManager: Send + Sync {
    /// Create a breakpoint request at a concrete code location.
    fn create_breakpoint(
        &self,
        location: &WireLocation,
        policy: SuspendPolicy,
    ) -> Arc<dyn EventRequest>;

    /// Create a step request for one thread.
    fn create_step(
        &self,
        thread: &Arc<dyn ThreadReference>,
        stride: StepStride,
        depth: StepDepth,
        policy: SuspendPolicy,
    ) -> Arc<dyn EventRequest>;

    /// Create a class-prepare request.
    fn create_class_prepare(&self, policy: SuspendPolicy) -> Arc<dyn EventRequest>;

    /// Create a thread-start request.
    fn create_thread_start(&self, policy: SuspendPolicy) -> Arc<dyn EventRequest>;

    /// Create a thread-death request.
    fn create_thread_death(&self, policy: SuspendPolicy) -> Arc<dyn EventRequest>;

    /// Create an exception request filtered by caught/uncaught.
    fn create_exception(
        &self,
        caught: bool,
        uncaught: bool,
        policy: SuspendPolicy,
    ) -> Arc<dyn EventRequest>;

    /// All currently registered breakpoint requests.
    fn breakpoint_requests(&self) -> Vec<Arc<dyn EventRequest>>;

    /// Delete every step request. At most one step is ever outstanding, so
    /// this runs before each new step is created.
    fn delete_step_requests(&self);
}
