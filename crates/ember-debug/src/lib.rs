//! Ember Debug - debug control core for the Ember server
//!
//! This library drives one target virtual machine at a time through the
//! `ember-wire` capability surface:
//! - Session lifecycle (launch/attach/stop) behind a single-consumer
//!   controller mailbox
//! - Breakpoint resolution with pending/active bookkeeping and late binding
//!   as classes load
//! - An event pump bridging the target's blocking event queue into
//!   controller messages
//! - Value marshaling and a session-scoped object identity cache
//!
//! The enclosing server constructs a [`DebugController`] with a
//! configuration snapshot, a wire connector, and an event sink, then talks
//! to it through the returned [`ControllerHandle`].

/// Ember debug core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod breakpoints;
pub mod config;
pub mod controller;
pub mod locations;
pub mod marshal;
pub mod objects;
pub mod protocol;
pub mod source_map;

// Session internals: the controller is the only consumer.
mod pump;
mod relay;
mod session;

// Re-export commonly used types
pub use breakpoints::BreakpointRegistry;
pub use config::DebugConfig;
pub use controller::{ControllerHandle, DebugController};
pub use locations::LocationResolver;
pub use objects::ObjectRegistry;
pub use protocol::{
    BacktraceInfo, Breakpoint, ClassField, DebugEvent, DebugLocation, DebugRequest,
    DebugResponse, DebugValue, SourcePosition, StackFrameInfo, StackLocal,
};
pub use source_map::SourceMap;
