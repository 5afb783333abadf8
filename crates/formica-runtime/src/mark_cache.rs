//! Per-agent record of markers already sensed.
//!
//! An agent standing on a marker overlaps it for many ticks in a row. The
//! cache makes sure the brain hears about each marker once, not once per
//! tick. The cache only stores ids; the simulation purges entries when the
//! marker or the agent goes away.

use formica_core::types::{AgentId, MarkerId};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct MarkCache {
    seen: RwLock<HashMap<AgentId, HashSet<MarkerId>>>,
}

impl MarkCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<AgentId, HashSet<MarkerId>>> {
        self.seen.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<AgentId, HashSet<MarkerId>>> {
        self.seen.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_mark(&self, agent: AgentId, marker: MarkerId) -> bool {
        self.read().get(&agent).is_some_and(|set| set.contains(&marker))
    }

    /// Record that `agent` has sensed `marker`.
    ///
    /// Returns true if this is the first time, so a caller can test and
    /// record under one lock.
    pub fn add_mark(&self, agent: AgentId, marker: MarkerId) -> bool {
        self.write().entry(agent).or_default().insert(marker)
    }

    /// Forget `marker` for every agent.
    pub fn remove_mark(&self, marker: MarkerId) {
        let mut seen = self.write();
        seen.retain(|_, set| {
            set.remove(&marker);
            !set.is_empty()
        });
    }

    /// Forget several markers in one pass.
    pub fn remove_marks<'a, I>(&self, markers: I)
    where
        I: IntoIterator<Item = &'a MarkerId>,
    {
        let doomed: HashSet<MarkerId> = markers.into_iter().copied().collect();
        if doomed.is_empty() {
            return;
        }
        let mut seen = self.write();
        seen.retain(|_, set| {
            set.retain(|m| !doomed.contains(m));
            !set.is_empty()
        });
    }

    /// Drop everything `agent` has seen.
    pub fn remove_agent(&self, agent: AgentId) {
        self.write().remove(&agent);
    }

    /// Does any agent still remember `marker`?
    pub fn references(&self, marker: MarkerId) -> bool {
        self.read().values().any(|set| set.contains(&marker))
    }

    /// Number of markers `agent` remembers.
    pub fn marks_for(&self, agent: AgentId) -> usize {
        self.read().get(&agent).map_or(0, HashSet::len)
    }

    /// Number of agents with at least one remembered marker.
    pub fn agent_count(&self) -> usize {
        self.read().len()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn add_then_remove_mark() {
        let cache = MarkCache::new();
        let (a, m) = (AgentId(1), MarkerId(10));
        assert!(!cache.has_mark(a, m));
        assert!(cache.add_mark(a, m));
        assert!(cache.has_mark(a, m));
        assert!(!cache.add_mark(a, m));
        cache.remove_mark(m);
        assert!(!cache.has_mark(a, m));
        assert!(!cache.references(m));
        assert_eq!(cache.agent_count(), 0);
    }

    #[test]
    fn remove_agent_forgets_its_marks_only() {
        let cache = MarkCache::new();
        cache.add_mark(AgentId(1), MarkerId(1));
        cache.add_mark(AgentId(1), MarkerId(2));
        cache.add_mark(AgentId(2), MarkerId(1));
        cache.remove_agent(AgentId(1));
        assert!(!cache.has_mark(AgentId(1), MarkerId(1)));
        assert_eq!(cache.marks_for(AgentId(1)), 0);
        assert!(cache.has_mark(AgentId(2), MarkerId(1)));
    }

    #[test]
    fn remove_marks_in_batch() {
        let cache = MarkCache::new();
        for m in 0..5 {
            cache.add_mark(AgentId(0), MarkerId(m));
        }
        cache.remove_marks(&[MarkerId(0), MarkerId(3)]);
        assert_eq!(cache.marks_for(AgentId(0)), 3);
        assert!(!cache.references(MarkerId(3)));
    }

    #[test]
    fn first_sighting_reported_once_across_threads() {
        let cache = Arc::new(MarkCache::new());
        let firsts: usize = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.add_mark(AgentId(5), MarkerId(5)) as usize)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .sum();
        assert_eq!(firsts, 1);
    }
}
