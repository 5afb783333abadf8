//! Food sources.

use formica_core::types::{BoundingBox, EntityHandle, FoodId, Position};
use std::sync::atomic::{AtomicU32, Ordering};

/// A pile of food. The quantity is shared by every agent that loads from it
/// during a tick, so it is stored atomically.
#[derive(Debug)]
pub struct Food {
    id: FoodId,
    position: Position,
    bounds: BoundingBox,
    quantity: AtomicU32,
}

impl Food {
    pub fn new(id: FoodId, position: Position, extents: (f64, f64), quantity: u32) -> Self {
        Self {
            id,
            position,
            bounds: BoundingBox::centered(position, extents.0, extents.1),
            quantity: AtomicU32::new(quantity),
        }
    }

    pub fn id(&self) -> FoodId {
        self.id
    }

    pub fn handle(&self) -> EntityHandle {
        EntityHandle::Food(self.id)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn remaining(&self) -> u32 {
        self.quantity.load(Ordering::Acquire)
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining() == 0
    }

    /// Remove up to `requested` units. Returns how many were actually taken.
    pub fn take(&self, requested: u32) -> u32 {
        let mut taken = 0;
        // fetch_update only fails when the closure returns None, which it never does
        let _ = self
            .quantity
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                taken = requested.min(current);
                Some(current - taken)
            });
        taken
    }
}
