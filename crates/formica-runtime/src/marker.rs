//! Markers and the pending-change queue.
//!
//! Agents never touch the marker list directly. Requests to add or remove a
//! marker go into [`MarkerQueue`] and are applied in one batch by the flush
//! phase, after every perception query of the tick has finished.

use formica_core::types::{BoundingBox, EntityHandle, MarkerId, Position};
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// A decaying signal left on the field.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: MarkerId,
    position: Position,
    radius: u32,
    payload: i64,
    lifespan: u32,
}

impl Marker {
    pub fn new(id: MarkerId, spec: MarkerSpec, default_lifespan: u32) -> Self {
        Self {
            id,
            position: spec.position,
            radius: spec.radius,
            payload: spec.payload,
            lifespan: spec.lifespan.unwrap_or(default_lifespan),
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn handle(&self) -> EntityHandle {
        EntityHandle::Marker(self.id)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Opaque information left by the agent that placed the marker.
    pub fn payload(&self) -> i64 {
        self.payload
    }

    pub fn lifespan(&self) -> u32 {
        self.lifespan
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::around(self.position, f64::from(self.radius))
    }

    /// Age the marker by one tick. Returns true once it has expired.
    pub fn decay(&mut self) -> bool {
        self.lifespan = self.lifespan.saturating_sub(1);
        self.lifespan == 0
    }
}

/// A marker that has been requested but not yet placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSpec {
    pub position: Position,
    pub radius: u32,
    pub payload: i64,
    /// Overrides the configured lifespan when set.
    pub lifespan: Option<u32>,
}

impl MarkerSpec {
    pub fn new(position: Position, radius: u32, payload: i64) -> Self {
        Self {
            position,
            radius,
            payload,
            lifespan: None,
        }
    }

    pub fn with_lifespan(mut self, lifespan: u32) -> Self {
        self.lifespan = Some(lifespan);
        self
    }
}

#[derive(Debug, Default)]
struct Pending {
    inserts: Vec<MarkerSpec>,
    removals: BTreeSet<MarkerId>,
}

/// Changes drained by a flush.
#[derive(Debug, Default)]
pub struct MarkerChanges {
    pub inserts: Vec<MarkerSpec>,
    pub removals: BTreeSet<MarkerId>,
}

impl MarkerChanges {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.removals.is_empty()
    }
}

/// Insert and delete queues behind one mutex.
#[derive(Debug, Default)]
pub struct MarkerQueue {
    pending: Mutex<Pending>,
}

impl MarkerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_insert(&self, spec: MarkerSpec) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .inserts
            .push(spec);
    }

    pub fn queue_removal(&self, id: MarkerId) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .removals
            .insert(id);
    }

    /// Take everything queued so far, leaving both queues empty.
    pub fn drain(&self) -> MarkerChanges {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        MarkerChanges {
            inserts: std::mem::take(&mut pending.inserts),
            removals: std::mem::take(&mut pending.removals),
        }
    }

    pub fn pending_inserts(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).inserts.len()
    }

    pub fn pending_removals(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).removals.len()
    }
}
