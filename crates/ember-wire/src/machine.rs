//! Connectors and the virtual machine handle.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::WireError;
use crate::event::EventQueue;
use crate::request::EventRequestManager;
use crate::thread::ThreadReference;
use crate::types::ReferenceType;
use crate::value::WireValue;

// ── LaunchOptions ────────────────────────────────────────────────────────────

/// Options for launching a target process.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Main class and program arguments, as one command line.
    pub command: String,
    /// Runtime classpath entries, in order.
    pub classpath: Vec<PathBuf>,
    /// Additional VM arguments.
    pub vm_args: Vec<String>,
    /// Start the target suspended so requests can be installed before user
    /// code runs.
    pub suspend: bool,
}

// ── Connector ────────────────────────────────────────────────────────────────

/// Establishes connections to target machines.
pub trait Connector: Send + Sync {
    /// Launch a new target process under debug control.
    fn launch(&self, options: &LaunchOptions) -> Result<Arc<dyn VirtualMachine>, WireError>;

    /// Attach to an already-running target.
    fn attach(&self, host: &str, port: u16) -> Result<Arc<dyn VirtualMachine>, WireError>;
}

// ── VirtualMachine ───────────────────────────────────────────────────────────

/// A live connection to a target machine.
pub trait VirtualMachine: Send + Sync {
    /// Resume all suspended threads.
    fn resume(&self) -> Result<(), WireError>;

    /// Release the connection. For launched targets this terminates the
    /// process. Safe to call on an already-dead connection.
    fn dispose(&self);

    /// All currently loaded classes.
    fn all_classes(&self) -> Result<Vec<Arc<dyn ReferenceType>>, WireError>;

    /// All live threads.
    fn all_threads(&self) -> Result<Vec<Arc<dyn ThreadReference>>, WireError>;

    /// Whether the target accepts mutating operations (value writes, method
    /// invocation). Read-only targets (e.g. core dumps) return `false`.
    fn can_be_modified(&self) -> bool;

    /// Create a new string object in the target.
    fn mirror_string(&self, value: &str) -> Result<WireValue, WireError>;

    /// The machine's event queue.
    fn event_queue(&self) -> Arc<dyn EventQueue>;

    /// The machine's event request manager.
    fn request_manager(&self) -> Arc<dyn EventRequestManager>;

    /// Standard output of the launched target process.
    ///
    /// Yields the stream at most once, and only for launched targets;
    /// attached targets return `None`.
    fn take_stdout(&self) -> Option<Box<dyn Read + Send>>;

    /// Standard error of the launched target process. Same contract as
    /// [`VirtualMachine::take_stdout`].
    fn take_stderr(&self) -> Option<Box<dyn Read + Send>>;
}
