//! Perception queries run for each agent during the perceive phase.
//!
//! Three queries per agent: sight (square hull of the sight circle), smell
//! (body box, markers only) and collision (body box, only while the agent
//! has a target). Hits are collected under the index read lock and the
//! brain callbacks run after the lock is released, so a brain can never
//! stall writers or deadlock on the index.

use crate::agent::{Agent, Target, TickContext};
use crate::brain::PeerView;
use crate::mark_cache::MarkCache;
use crate::marker::Marker;
use formica_core::index::SpatialIndex;
use formica_core::types::{AgentId, EntityHandle, MarkerId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Counts of what the brains were told during one perceive phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PerceptionTally {
    pub peers_seen: usize,
    pub foods_seen: usize,
    pub markers_sensed: usize,
    pub arrivals: usize,
    /// Food carried into the home base this phase.
    pub delivered: u64,
}

impl PerceptionTally {
    pub fn merge(self, other: Self) -> Self {
        Self {
            peers_seen: self.peers_seen + other.peers_seen,
            foods_seen: self.foods_seen + other.foods_seen,
            markers_sensed: self.markers_sensed + other.markers_sensed,
            arrivals: self.arrivals + other.arrivals,
            delivered: self.delivered + other.delivered,
        }
    }
}

/// Read-only world state shared by every perception task.
pub(crate) struct Perception<'a> {
    pub index: &'a SpatialIndex,
    pub peers: &'a HashMap<AgentId, PeerView>,
    pub markers: &'a BTreeMap<MarkerId, Marker>,
    pub cache: &'a MarkCache,
}

impl Perception<'_> {
    pub fn perceive(&self, agent: &mut Agent, ctx: &TickContext<'_>) -> PerceptionTally {
        let mut tally = PerceptionTally::default();
        // collision only applies to agents that were heading somewhere when
        // the phase began
        let had_target = agent.body.target.is_some();
        self.sight(agent, ctx, &mut tally);
        self.smell(agent, ctx, &mut tally);
        if had_target {
            self.collide(agent, ctx, &mut tally);
        }
        tally
    }

    fn sight(&self, agent: &mut Agent, ctx: &TickContext<'_>, tally: &mut PerceptionTally) {
        let me = agent.id();
        let kind = agent.brain_kind();
        let origin = agent.body.position();
        let radius = agent.body.attributes.sight_radius;

        for handle in self.index.handles_in(agent.body.sight_bounds()) {
            match handle {
                EntityHandle::Agent(id) if id != me => {
                    let Some(peer) = self.peers.get(&id) else { continue };
                    if peer.kind != kind {
                        continue;
                    }
                    tally.peers_seen += 1;
                    agent.with_brain(ctx, |brain, ant| brain.on_see_peer(ant, peer));
                }
                EntityHandle::Food(id) => {
                    let Some(food) = ctx.foods.get(&id) else { continue };
                    if food.remaining() == 0
                        || agent.body.target == Some(Target::Food(id))
                        || origin.distance_to(&food.position()) > radius
                    {
                        continue;
                    }
                    tally.foods_seen += 1;
                    agent.with_brain(ctx, |brain, ant| brain.on_see_food(ant, food));
                }
                _ => {}
            }
        }
    }

    fn smell(&self, agent: &mut Agent, ctx: &TickContext<'_>, tally: &mut PerceptionTally) {
        let me = agent.id();
        for handle in self.index.handles_in(agent.bounds()) {
            let EntityHandle::Marker(id) = handle else { continue };
            let Some(marker) = self.markers.get(&id) else { continue };
            if !self.cache.add_mark(me, id) {
                continue;
            }
            tally.markers_sensed += 1;
            agent.with_brain(ctx, |brain, ant| brain.on_see_marker(ant, marker));
        }
    }

    fn collide(&self, agent: &mut Agent, ctx: &TickContext<'_>, tally: &mut PerceptionTally) {
        let Some(target) = agent.body.target else { return };
        let wanted = target.handle();
        let mut reached = false;
        self.index.search(agent.bounds(), |entry| {
            reached = entry.handle == wanted;
            !reached
        });
        if !reached {
            return;
        }

        agent.body.arrive();
        tally.arrivals += 1;
        match target {
            Target::Home => {
                let delivered = agent.body.unload(ctx.home);
                tally.delivered += u64::from(delivered);
                tracing::trace!(agent = %agent.id(), delivered, "reached home");
            }
            Target::Food(id) => {
                if let Some(food) = ctx.foods.get(&id) {
                    tracing::trace!(agent = %agent.id(), food = %id, "reached food");
                    agent.with_brain(ctx, |brain, ant| brain.on_reached_food(ant, food));
                }
            }
        }
    }
}
