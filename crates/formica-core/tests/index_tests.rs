//! Integration tests for the spatial index.
//!
//! Covers insert/search/delete round trips and the atomicity of `replace`
//! under concurrent readers.

use formica_core::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn square(x: f64, y: f64, size: f64) -> BoundingBox {
    BoundingBox::new(Position::new(x, y), Position::new(x + size, y + size))
}

#[test]
fn inserted_handle_is_found_then_gone_after_delete() {
    let index = SpatialIndex::new();
    let handle = EntityHandle::Marker(MarkerId(7));
    let bounds = square(100.0, 100.0, 20.0);

    index.insert(bounds, handle);
    let overlapping = square(110.0, 110.0, 50.0);
    assert!(index.handles_in(overlapping).contains(&handle));

    assert!(index.delete(bounds, handle));
    assert!(!index.handles_in(overlapping).contains(&handle));
    assert_eq!(index.len(), 0);
}

#[test]
fn disjoint_query_misses() {
    let index = SpatialIndex::new();
    index.insert(square(0.0, 0.0, 10.0), EntityHandle::Home);
    assert!(index.handles_in(square(50.0, 50.0, 10.0)).is_empty());
}

#[test]
fn scan_visits_everything() {
    let index = SpatialIndex::new();
    for i in 0..25 {
        index.insert(square(i as f64 * 3.0, 0.0, 2.0), EntityHandle::Agent(AgentId(i)));
    }
    let mut seen = 0;
    index.scan(|_| {
        seen += 1;
        true
    });
    assert_eq!(seen, 25);
    assert_eq!(index.len(), 25);
}

#[test]
fn replace_is_atomic_for_concurrent_searches() {
    let index = Arc::new(SpatialIndex::new());
    let handle = EntityHandle::Agent(AgentId(1));
    let left = square(0.0, 0.0, 10.0);
    let right = square(100.0, 0.0, 10.0);
    index.insert(left, handle);

    let done = Arc::new(AtomicBool::new(false));
    let mover = {
        let index = Arc::clone(&index);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..2_000 {
                let (from, to) = if i % 2 == 0 { (left, right) } else { (right, left) };
                assert!(index.replace(from, handle, to, handle));
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    // A query covering both positions must always see exactly one copy.
    let both = BoundingBox::new(Position::new(-1.0, -1.0), Position::new(111.0, 11.0));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checks = 0u64;
                while !done.load(Ordering::SeqCst) || checks == 0 {
                    let hits = index.handles_in(both);
                    assert_eq!(hits, vec![handle], "saw {hits:?}");
                    checks += 1;
                }
                checks
            })
        })
        .collect();

    mover.join().unwrap();
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(index.count_handle(handle), 1);
}

#[test]
fn concurrent_inserts_are_all_kept() {
    let index = Arc::new(SpatialIndex::new());
    let workers: Vec<_> = (0..8u64)
        .map(|w| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for i in 0..100u64 {
                    let id = w * 100 + i;
                    index.insert(square(id as f64, 0.0, 1.0), EntityHandle::Agent(AgentId(id)));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(index.len(), 800);
}
