//! Ember Wire - typed debug-wire capability surface
//!
//! This crate defines the API the Ember debug core consumes to drive a target
//! virtual machine: connectors, machine handles, event queues, event requests,
//! reference types, threads, frames, and value mirrors. It carries no protocol
//! implementation of its own; a concrete backend (a JDWP client, or an
//! in-memory test double) supplies the trait implementations.
//!
//! Every handle is an `Arc<dyn Trait>` minted by the backend. Handles are only
//! meaningful within the machine that produced them and become dangling once
//! the connection is disposed.

/// Ember wire API version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod event;
pub mod machine;
pub mod request;
pub mod thread;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use error::WireError;
pub use event::{EventQueue, EventSet, SuspendPolicy, WireEvent};
pub use machine::{Connector, LaunchOptions, VirtualMachine};
pub use request::{EventRequest, EventRequestManager, StepDepth, StepStride};
pub use thread::{LocalVariable, StackFrame, ThreadId, ThreadReference};
pub use types::{Field, Method, ReferenceType, WireLocation};
pub use value::{ArrayReference, ObjectId, ObjectReference, StringReference, WireValue};
