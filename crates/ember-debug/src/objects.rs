//! Object identity cache - target-minted ids to live value handles.
//!
//! Clients hold object ids, never handles. Every object-backed value the
//! marshaler returns is recorded here first, so a later request can
//! dereference the id. The cache lives and dies with its session; there is
//! no eviction.

use std::collections::HashMap;

use ember_wire::{ObjectId, WireValue};

/// Session-scoped arena of object-backed values, indexed by target id.
#[derive(Default)]
pub struct ObjectRegistry {
    handles: HashMap<ObjectId, WireValue>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an object-backed value under its target id. Idempotent; the
    /// first handle recorded for an id is kept. Non-object values pass
    /// through without being recorded.
    ///
    /// Returns the id for object-backed values.
    pub fn remember(&mut self, value: &WireValue) -> Option<ObjectId> {
        let id = value.as_object()?.unique_id();
        self.handles.entry(id).or_insert_with(|| value.clone());
        Some(id)
    }

    /// The recorded value for an id, if the session has seen it.
    pub fn lookup(&self, id: ObjectId) -> Option<WireValue> {
        self.handles.get(&id).cloned()
    }

    /// Drop every handle (session end).
    pub fn clear(&mut self) {
        self.handles.clear();
    }

    /// Number of remembered objects.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if nothing has been remembered.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("handles", &self.handles.len())
            .finish()
    }
}
