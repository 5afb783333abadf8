//! The colony's home base.

use formica_core::types::{BoundingBox, EntityHandle, Position};
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed drop-off point. Deliveries can arrive from several agents in the
/// same perception phase, so the running total is atomic.
#[derive(Debug)]
pub struct Home {
    position: Position,
    bounds: BoundingBox,
    delivered: AtomicU64,
}

impl Home {
    pub fn new(position: Position, extents: (f64, f64)) -> Self {
        Self {
            position,
            bounds: BoundingBox::centered(position, extents.0, extents.1),
            delivered: AtomicU64::new(0),
        }
    }

    pub fn handle(&self) -> EntityHandle {
        EntityHandle::Home
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn deliver(&self, amount: u32) {
        self.delivered.fetch_add(u64::from(amount), Ordering::AcqRel);
    }

    /// Total delivered so far. Never decreases.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }
}
