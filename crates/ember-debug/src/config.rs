//! Immutable configuration snapshot for the debug core.
//!
//! Loading and merging configuration belongs to the enclosing server; the
//! core receives a finished snapshot at construction and never watches for
//! changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration snapshot passed to the controller at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Runtime classpath entries, in order, for launched targets.
    pub classpath: Vec<PathBuf>,
    /// Extra VM arguments for launched targets.
    pub vm_args: Vec<String>,
    /// All project source files; feeds the source map.
    pub source_files: Vec<PathBuf>,
}

impl DebugConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }
}
