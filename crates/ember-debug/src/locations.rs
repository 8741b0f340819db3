//! Location resolver - source lines to concrete code locations in loaded
//! classes.
//!
//! Classes register under the short source name they declare; several
//! classes in one file (nested classes among them) can register under
//! different keys. Resolution collects matching line-table entries across
//! class-level code and every method, deduplicating by the
//! `(source_path, source_name, line)` tuple.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use ember_wire::{ReferenceType, WireLocation};

use crate::source_map::short_name;

/// File key → classes loaded from that source file.
#[derive(Default)]
pub struct LocationResolver {
    classes: HashMap<String, Vec<Arc<dyn ReferenceType>>>,
}

impl LocationResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loaded class under its declared source name.
    ///
    /// Returns the file key the class registered under, or `None` when the
    /// class carries no source information.
    pub fn register(&mut self, class: Arc<dyn ReferenceType>) -> Option<String> {
        let key = class.source_name().ok()?;
        let entry = self.classes.entry(key.clone()).or_default();
        let name = class.name();
        if !entry.iter().any(|c| c.name() == name) {
            entry.push(class);
        }
        Some(key)
    }

    /// All concrete code locations for a source line, across every class
    /// registered under the file's short name.
    pub fn locations(&self, file: &Path, line: u32) -> Vec<WireLocation> {
        let key = short_name(file);
        let mut seen: HashSet<(Option<String>, Option<String>, Option<u32>)> = HashSet::new();
        let mut out = Vec::new();

        let Some(classes) = self.classes.get(&key) else {
            return out;
        };
        for class in classes {
            let mut candidates = class.line_locations().unwrap_or_default();
            for method in class.methods() {
                // Methods without line tables are skipped silently.
                if let Ok(mut locations) = method.line_locations() {
                    candidates.append(&mut locations);
                }
            }
            for location in candidates {
                if location.line != Some(line) {
                    continue;
                }
                if location.source_name.as_deref() != Some(key.as_str()) {
                    continue;
                }
                let dedup = (
                    location.source_path.clone(),
                    location.source_name.clone(),
                    location.line,
                );
                if seen.insert(dedup) {
                    out.push(location);
                }
            }
        }
        out
    }

    /// Number of distinct file keys with registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class has registered yet.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Drop every registration (session end).
    pub fn clear(&mut self) {
        self.classes.clear();
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("file_keys", &self.classes.len())
            .finish()
    }
}
