//! Spatial index over entity bounding boxes.
//!
//! An R-tree behind a read/write lock. Searches and scans share the read
//! lock; insert, delete and replace take the write lock, so a concurrent
//! search sees either the state before a mutation or the state after it.
//! `replace` does its delete and insert under one write guard.
//!
//! Visitors run while the read lock is held. They must not call back into
//! the index mutably or they will deadlock; collect handles and act after
//! the search returns.

use crate::types::{BoundingBox, EntityHandle, Position};
use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One indexed rectangle and the entity it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    pub bounds: BoundingBox,
    pub handle: EntityHandle,
}

impl IndexEntry {
    pub fn new(bounds: BoundingBox, handle: EntityHandle) -> Self {
        Self { bounds, handle }
    }
}

fn to_aabb(bounds: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bounds.min.x, bounds.min.y], [bounds.max.x, bounds.max.y])
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        to_aabb(&self.bounds)
    }
}

impl PointDistance for IndexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope().distance_2(point)
    }
}

/// Thread-safe R-tree keyed by bounding box.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RwLock<RTree<IndexEntry>>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a batch of entries in one pass.
    pub fn bulk_load(entries: Vec<IndexEntry>) -> Self {
        Self {
            tree: RwLock::new(RTree::bulk_load(entries)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RTree<IndexEntry>> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RTree<IndexEntry>> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, bounds: BoundingBox, handle: EntityHandle) {
        self.write().insert(IndexEntry::new(bounds, handle));
    }

    /// Remove the exact (box, handle) pair. Returns false if it was absent.
    pub fn delete(&self, bounds: BoundingBox, handle: EntityHandle) -> bool {
        self.write().remove(&IndexEntry::new(bounds, handle)).is_some()
    }

    /// Swap an entry's box under a single write lock.
    ///
    /// The new entry is inserted even if the old one was not found; the
    /// return value reports whether the old entry existed.
    pub fn replace(
        &self,
        old_bounds: BoundingBox,
        old_handle: EntityHandle,
        new_bounds: BoundingBox,
        new_handle: EntityHandle,
    ) -> bool {
        let mut tree = self.write();
        let existed = tree.remove(&IndexEntry::new(old_bounds, old_handle)).is_some();
        tree.insert(IndexEntry::new(new_bounds, new_handle));
        existed
    }

    /// Visit every entry whose box intersects `query`. Stops when the
    /// visitor returns false. Visit order is unspecified.
    pub fn search<F>(&self, query: BoundingBox, mut visitor: F)
    where
        F: FnMut(&IndexEntry) -> bool,
    {
        let tree = self.read();
        for entry in tree.locate_in_envelope_intersecting(&to_aabb(&query)) {
            if !visitor(entry) {
                break;
            }
        }
    }

    /// Visit every entry. Stops when the visitor returns false.
    pub fn scan<F>(&self, mut visitor: F)
    where
        F: FnMut(&IndexEntry) -> bool,
    {
        let tree = self.read();
        for entry in tree.iter() {
            if !visitor(entry) {
                break;
            }
        }
    }

    /// Collect the handles intersecting `query`.
    pub fn handles_in(&self, query: BoundingBox) -> Vec<EntityHandle> {
        let mut hits = Vec::new();
        self.search(query, |entry| {
            hits.push(entry.handle);
            true
        });
        hits
    }

    /// Closest entry to `point`, measured to the edge of each box.
    pub fn nearest(&self, point: Position) -> Option<IndexEntry> {
        self.read().nearest_neighbor(&[point.x, point.y]).copied()
    }

    /// Copy of every entry currently indexed.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.read().iter().copied().collect()
    }

    /// How many entries refer to `handle`.
    pub fn count_handle(&self, handle: EntityHandle) -> usize {
        self.read().iter().filter(|entry| entry.handle == handle).count()
    }

    pub fn len(&self) -> usize {
        self.read().size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.write() = RTree::new();
    }
}
