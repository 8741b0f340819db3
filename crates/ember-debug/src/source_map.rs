//! Source map - short source names to absolute project files.
//!
//! The target runtime reports compiled classes with unqualified source file
//! names ("Foo.scala"); the editor works with absolute project paths. The map
//! records every project file under its short name and resolves lookups with
//! a deterministic pick when several files share one name.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::DebugConfig;

/// The unqualified file name of a path, as reported by the target runtime.
///
/// Returns an empty string for pathological paths with no final component.
pub fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ── SourceMap ────────────────────────────────────────────────────────────────

/// Short source name → set of absolute project paths.
///
/// Built once from the configuration snapshot; read-only afterwards except
/// for explicit [`SourceMap::rebuild`] calls.
#[derive(Debug, Default)]
pub struct SourceMap {
    by_name: HashMap<String, BTreeSet<PathBuf>>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source map from a configuration snapshot.
    pub fn from_config(config: &DebugConfig) -> Self {
        let mut map = Self::new();
        map.rebuild(config);
        map
    }

    /// Drop all entries and re-index the snapshot's source files.
    pub fn rebuild(&mut self, config: &DebugConfig) {
        self.by_name.clear();
        for file in &config.source_files {
            let key = short_name(file);
            if key.is_empty() {
                continue;
            }
            self.by_name.entry(key).or_default().insert(file.clone());
        }
    }

    /// All project files sharing the given short name.
    pub fn lookup(&self, name: &str) -> Option<&BTreeSet<PathBuf>> {
        self.by_name.get(name)
    }

    /// Resolve a short name to a single project file.
    ///
    /// When several files share the name, the lexicographically smallest path
    /// wins and a warning is emitted; the ambiguity is not fatal.
    pub fn resolve(&self, name: &str) -> Option<&PathBuf> {
        let paths = self.by_name.get(name)?;
        if paths.len() > 1 {
            warn!(
                short_name = name,
                candidates = paths.len(),
                "ambiguous source name, using the first match"
            );
        }
        paths.iter().next()
    }

    /// Resolve a path-or-short-name to a project file, falling back to the
    /// input unchanged when no mapping exists.
    pub fn resolve_or_raw(&self, file: &Path) -> PathBuf {
        self.resolve(&short_name(file))
            .cloned()
            .unwrap_or_else(|| file.to_path_buf())
    }

    /// Number of distinct short names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
