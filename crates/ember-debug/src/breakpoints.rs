//! Breakpoint registry - active and pending breakpoint bookkeeping.
//!
//! Active breakpoints are installed as wire requests in the live target;
//! pending breakpoints are recorded user intent waiting for their class to
//! load. The registry survives session restarts: on disconnect every active
//! breakpoint is demoted back to pending so a later session re-installs it.

use std::collections::{HashMap, HashSet};

use crate::protocol::Breakpoint;
use crate::source_map::short_name;

/// Active and pending breakpoints.
///
/// Invariant: a breakpoint is never simultaneously active and pending. The
/// pending side is indexed by short file name so class-load events can find
/// retry candidates without scanning.
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    active: HashSet<Breakpoint>,
    pending: HashMap<String, HashSet<Breakpoint>>,
}

impl BreakpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a breakpoint as installed in the live target.
    pub fn add_active(&mut self, bp: Breakpoint) {
        self.remove_pending(&bp);
        self.active.insert(bp);
    }

    /// Record a breakpoint as waiting for its class to load.
    pub fn add_pending(&mut self, bp: Breakpoint) {
        if self.active.contains(&bp) {
            return;
        }
        self.pending
            .entry(short_name(&bp.file))
            .or_default()
            .insert(bp);
    }

    /// Move a pending breakpoint to the active set.
    pub fn promote(&mut self, bp: &Breakpoint) {
        self.remove_pending(bp);
        self.active.insert(bp.clone());
    }

    /// Remove a breakpoint from both sets. Returns `true` if anything was
    /// removed.
    pub fn remove(&mut self, bp: &Breakpoint) -> bool {
        let was_active = self.active.remove(bp);
        let was_pending = self.remove_pending(bp);
        was_active || was_pending
    }

    /// Empty both sets.
    pub fn clear(&mut self) {
        self.active.clear();
        self.pending.clear();
    }

    /// Demote every active breakpoint to pending (session disconnect).
    pub fn demote_all(&mut self) {
        for bp in std::mem::take(&mut self.active) {
            self.pending
                .entry(short_name(&bp.file))
                .or_default()
                .insert(bp);
        }
    }

    /// Pending breakpoints recorded under the given short file name, sorted
    /// by (file, line) so retries are deterministic.
    pub fn pending_for(&self, key: &str) -> Vec<Breakpoint> {
        let mut bps: Vec<Breakpoint> = self
            .pending
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        bps.sort();
        bps
    }

    /// Returns `true` if the breakpoint is currently installed.
    pub fn is_active(&self, bp: &Breakpoint) -> bool {
        self.active.contains(bp)
    }

    /// All active breakpoints, sorted by (file, line).
    pub fn active(&self) -> Vec<Breakpoint> {
        let mut bps: Vec<Breakpoint> = self.active.iter().cloned().collect();
        bps.sort();
        bps
    }

    /// All pending breakpoints, sorted by (file, line).
    pub fn pending(&self) -> Vec<Breakpoint> {
        let mut bps: Vec<Breakpoint> = self.pending.values().flatten().cloned().collect();
        bps.sort();
        bps
    }

    /// Both sides of the registry, each sorted, for the client.
    pub fn list(&self) -> (Vec<Breakpoint>, Vec<Breakpoint>) {
        (self.active(), self.pending())
    }

    fn remove_pending(&mut self, bp: &Breakpoint) -> bool {
        let key = short_name(&bp.file);
        let Some(set) = self.pending.get_mut(&key) else {
            return false;
        };
        let removed = set.remove(bp);
        if set.is_empty() {
            self.pending.remove(&key);
        }
        removed
    }
}
