//! The tick scheduler.
//!
//! The simulation owns every entity list, the spatial index and the
//! marking cache. Each tick runs five phases in order, and each phase
//! finishes completely before the next one starts:
//!
//! 1. **Populate**: top up agents and food sources to their desired counts
//! 2. **Update**: advance every agent's motion state (in parallel) and
//!    re-index its box; note food sources that ran out
//! 3. **Perceive**: sight, smell and collision queries per agent, in
//!    parallel, dispatching brain callbacks
//! 4. **Decay**: age markers and queue the expired ones for removal
//! 5. **Flush**: apply queued marker inserts and removals, purge the
//!    marking cache, drop depleted food
//!
//! Markers and food are only structurally changed in phase 5, so queries
//! in phase 3 never race with list or index mutation for them.

use crate::agent::{Agent, AgentBody, FoodMap, Target, TickContext};
use crate::brain::{AgentInfo, BrainFactory, PeerView};
use crate::config::SimulationConfig;
use crate::food::Food;
use crate::home::Home;
use crate::mark_cache::MarkCache;
use crate::marker::{Marker, MarkerQueue, MarkerSpec};
use crate::perception::{Perception, PerceptionTally};
use crate::selection::RoleSelector;
use formica_core::index::SpatialIndex;
use formica_core::roles::{resolve_attributes, AttributeSet, RoleCounts};
use formica_core::types::{AgentId, Field, FoodId, IdSequence, MarkerId, Position, Tick};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Phases of a tick, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TickPhase {
    Populate,
    Update,
    Perceive,
    Decay,
    Flush,
}

impl TickPhase {
    pub const ALL: [TickPhase; 5] = [
        TickPhase::Populate,
        TickPhase::Update,
        TickPhase::Perceive,
        TickPhase::Decay,
        TickPhase::Flush,
    ];
}

impl std::fmt::Display for TickPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickPhase::Populate => write!(f, "Populate"),
            TickPhase::Update => write!(f, "Update"),
            TickPhase::Perceive => write!(f, "Perceive"),
            TickPhase::Decay => write!(f, "Decay"),
            TickPhase::Flush => write!(f, "Flush"),
        }
    }
}

/// Structural changes applied by a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushOutcome {
    pub markers_added: usize,
    pub markers_removed: usize,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: Tick,
    pub agents_spawned: usize,
    pub foods_spawned: usize,
    pub markers_expired: usize,
    pub foods_removed: usize,
    pub flush: FlushOutcome,
    pub perception: PerceptionTally,
    pub agents: usize,
    pub foods: usize,
    pub markers: usize,
    pub elapsed_micros: u64,
}

/// Point-in-time summary of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStats {
    pub tick: Tick,
    pub agents: usize,
    pub foods: usize,
    pub markers: usize,
    pub indexed: usize,
    pub delivered: u64,
    pub food_remaining: u64,
    pub total_agents_spawned: u64,
    pub total_foods_spawned: u64,
    pub total_markers_placed: u64,
    pub role_counts: RoleCounts,
}

/// The tick-driven colony simulation.
pub struct Simulation {
    config: SimulationConfig,
    field: Field,
    base_range: f64,
    index: SpatialIndex,
    agents: Vec<Agent>,
    foods: FoodMap,
    markers: BTreeMap<MarkerId, Marker>,
    home: Home,
    mark_cache: MarkCache,
    marker_queue: MarkerQueue,
    role_counts: RoleCounts,
    brains: Arc<dyn BrainFactory>,
    selector: Arc<dyn RoleSelector>,
    pool: Option<rayon::ThreadPool>,
    rng: ChaCha8Rng,
    agent_ids: IdSequence,
    food_ids: IdSequence,
    marker_ids: IdSequence,
    tick: Tick,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("agents", &self.agents.len())
            .field("foods", &self.foods.len())
            .field("markers", &self.markers.len())
            .field("indexed", &self.index.len())
            .finish()
    }
}

fn timed<R>(phase: TickPhase, tick: Tick, f: impl FnOnce() -> R) -> R {
    let started = Instant::now();
    let result = f();
    trace!(%phase, tick, elapsed_us = started.elapsed().as_micros() as u64, "phase complete");
    result
}

impl Simulation {
    /// Assemble a simulation from validated parts. Use
    /// [`SimulationBuilder`](crate::builder::SimulationBuilder).
    pub(crate) fn from_parts(
        config: SimulationConfig,
        brains: Arc<dyn BrainFactory>,
        selector: Arc<dyn RoleSelector>,
        pool: Option<rayon::ThreadPool>,
        mut rng: ChaCha8Rng,
    ) -> Self {
        let field = config.field();
        let home_position = config
            .home_position
            .unwrap_or_else(|| random_inside(&mut rng, field, config.spawn_border));
        let home = Home::new(home_position, config.home_extents);
        let index = SpatialIndex::new();
        index.insert(home.bounds(), home.handle());

        Self {
            base_range: field.base_range(),
            field,
            index,
            agents: Vec::with_capacity(config.desired_agents),
            foods: FoodMap::new(),
            markers: BTreeMap::new(),
            home,
            mark_cache: MarkCache::new(),
            marker_queue: MarkerQueue::new(),
            role_counts: RoleCounts::new(),
            brains,
            selector,
            pool,
            rng,
            agent_ids: IdSequence::new(),
            food_ids: IdSequence::new(),
            marker_ids: IdSequence::new(),
            tick: 0,
            config,
        }
    }

    /// Run one full tick and report what happened.
    pub fn tick(&mut self) -> TickReport {
        let pool = self.pool.take();
        let report = match &pool {
            Some(pool) => pool.install(|| self.run_phases()),
            None => self.run_phases(),
        };
        self.pool = pool;
        report
    }

    /// Run `ticks` ticks back to back.
    pub fn run(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    fn run_phases(&mut self) -> TickReport {
        let started = Instant::now();
        let tick = self.tick;

        let (agents_spawned, foods_spawned) = timed(TickPhase::Populate, tick, || self.populate());
        let depleted = timed(TickPhase::Update, tick, || self.update_entities());
        let perception = timed(TickPhase::Perceive, tick, || self.perceive());
        let markers_expired = timed(TickPhase::Decay, tick, || self.decay_markers());
        let (flush, foods_removed) = timed(TickPhase::Flush, tick, || {
            let flush = self.flush();
            (flush, self.remove_foods(&depleted))
        });

        self.tick += 1;
        let report = TickReport {
            tick,
            agents_spawned,
            foods_spawned,
            markers_expired,
            foods_removed,
            flush,
            perception,
            agents: self.agents.len(),
            foods: self.foods.len(),
            markers: self.markers.len(),
            elapsed_micros: started.elapsed().as_micros() as u64,
        };
        debug!(
            tick,
            agents = report.agents,
            foods = report.foods,
            markers = report.markers,
            delivered = self.home.delivered(),
            elapsed_us = report.elapsed_micros,
            "tick complete"
        );
        report
    }

    // --- Phase 1: populate ---

    fn populate(&mut self) -> (usize, usize) {
        let mut agents = 0;
        while self.agents.len() < self.config.desired_agents {
            self.spawn_agent();
            agents += 1;
        }
        let mut foods = 0;
        while self.foods.len() < self.config.effective_desired_foods() {
            self.spawn_food();
            foods += 1;
        }
        if agents > 0 || foods > 0 {
            debug!(tick = self.tick, agents, foods, "population topped up");
        }
        (agents, foods)
    }

    /// Create one agent at the home base with a role from the selector.
    pub fn spawn_agent(&mut self) -> AgentId {
        let role = self.selector.choose(&self.role_counts);
        let attributes = match self.config.roles.get(&role) {
            Some(adjustments) => {
                *self.role_counts.entry(role.clone()).or_default() += 1;
                resolve_attributes(adjustments, self.base_range)
            }
            None => AttributeSet::baseline(self.base_range),
        };

        let id = AgentId(self.agent_ids.next_raw());
        let role: Arc<str> = Arc::from(role);
        let brain = self.brains.create(&AgentInfo {
            id,
            role: Arc::clone(&role),
        });
        let body = AgentBody::new(
            id,
            role,
            self.home.position(),
            attributes,
            self.config.agent_extents,
            self.tick,
        );
        self.index.insert(body.bounds(), body.handle());
        trace!(agent = %id, role = body.role(), "spawned agent");
        self.agents.push(Agent::new(body, brain));
        id
    }

    fn spawn_food(&mut self) -> FoodId {
        let position = random_inside(&mut self.rng, self.field, self.config.spawn_border);
        self.add_food_at(position)
    }

    /// Place a food source with the configured starting quantity.
    pub fn add_food_at(&mut self, position: Position) -> FoodId {
        self.add_food_with(position, self.config.food_quantity)
    }

    /// Place a food source with an explicit quantity.
    pub fn add_food_with(&mut self, position: Position, quantity: u32) -> FoodId {
        let id = FoodId(self.food_ids.next_raw());
        let food = Food::new(id, position, self.config.food_extents, quantity);
        self.index.insert(food.bounds(), food.handle());
        self.foods.insert(id, food);
        trace!(food = %id, quantity, "placed food");
        id
    }

    /// Remove an agent and every trace of it. Must not be called mid-tick,
    /// which `&mut self` already guarantees.
    pub fn remove_agent(&mut self, id: AgentId) -> bool {
        let Some(slot) = self.agents.iter().position(|a| a.id() == id) else {
            return false;
        };
        let agent = self.agents.swap_remove(slot);
        self.index.delete(agent.bounds(), agent.body.handle());
        self.mark_cache.remove_agent(id);
        if let Some(count) = self.role_counts.get_mut(agent.body.role()) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.role_counts.remove(agent.body.role());
            }
        }
        debug!(agent = %id, "removed agent");
        true
    }

    // --- Phase 2: update ---

    fn update_entities(&mut self) -> Vec<FoodId> {
        let ctx = TickContext {
            tick: self.tick,
            field: self.field,
            home: &self.home,
            foods: &self.foods,
            markers: &self.marker_queue,
            mark_refresh: self.config.mark_refresh_ticks,
        };
        let index = &self.index;
        let agents = &mut self.agents;
        let foods = &self.foods;

        let ((), depleted) = rayon::join(
            || {
                agents.par_iter_mut().for_each(|agent| {
                    let before = agent.bounds();
                    agent.update(&ctx);
                    let handle = agent.body.handle();
                    index.replace(before, handle, agent.bounds(), handle);
                })
            },
            || {
                foods
                    .par_iter()
                    .filter(|(_, food)| food.is_depleted())
                    .map(|(id, _)| *id)
                    .collect::<Vec<_>>()
            },
        );
        depleted
    }

    // --- Phase 3: perceive ---

    fn perceive(&mut self) -> PerceptionTally {
        let peers: HashMap<AgentId, PeerView> = self
            .agents
            .iter()
            .map(|agent| (agent.id(), agent.body.peer_view(agent.brain_kind())))
            .collect();
        let ctx = TickContext {
            tick: self.tick,
            field: self.field,
            home: &self.home,
            foods: &self.foods,
            markers: &self.marker_queue,
            mark_refresh: self.config.mark_refresh_ticks,
        };
        let perception = Perception {
            index: &self.index,
            peers: &peers,
            markers: &self.markers,
            cache: &self.mark_cache,
        };

        self.agents
            .par_iter_mut()
            .map(|agent| perception.perceive(agent, &ctx))
            .reduce(PerceptionTally::default, PerceptionTally::merge)
    }

    // --- Phase 4: decay ---

    fn decay_markers(&mut self) -> usize {
        let queue = &self.marker_queue;
        self.markers
            .par_iter_mut()
            .map(|(id, marker)| {
                if marker.decay() {
                    queue.queue_removal(*id);
                    1usize
                } else {
                    0
                }
            })
            .sum()
    }

    // --- Phase 5: flush ---

    /// Apply every queued marker insert and removal.
    ///
    /// Runs automatically at the end of each tick; call it directly to make
    /// markers queued from outside a tick visible right away.
    pub fn flush(&mut self) -> FlushOutcome {
        let changes = self.marker_queue.drain();
        let mut outcome = FlushOutcome::default();

        for spec in changes.inserts {
            let id = MarkerId(self.marker_ids.next_raw());
            let marker = Marker::new(id, spec, self.config.marker_lifespan);
            self.index.insert(marker.bounds(), marker.handle());
            self.markers.insert(id, marker);
            outcome.markers_added += 1;
        }

        let mut removed = Vec::with_capacity(changes.removals.len());
        for id in changes.removals {
            if let Some(marker) = self.markers.remove(&id) {
                self.index.delete(marker.bounds(), marker.handle());
                removed.push(id);
            }
        }
        self.mark_cache.remove_marks(&removed);
        outcome.markers_removed = removed.len();

        if outcome != FlushOutcome::default() {
            trace!(
                added = outcome.markers_added,
                removed = outcome.markers_removed,
                "flushed markers"
            );
        }
        outcome
    }

    fn remove_foods(&mut self, ids: &[FoodId]) -> usize {
        let mut removed = 0;
        for id in ids {
            if let Some(food) = self.foods.remove(id) {
                self.index.delete(food.bounds(), food.handle());
                debug!(food = %id, "food source depleted");
                removed += 1;
            }
        }
        if removed > 0 {
            // agents walking to a vanished source go idle and get to choose again
            for agent in &mut self.agents {
                if let Some(Target::Food(id)) = agent.body.target {
                    if ids.contains(&id) {
                        agent.body.arrive();
                    }
                }
            }
        }
        removed
    }

    /// Queue a marker for the next flush.
    pub fn queue_marker(&self, spec: MarkerSpec) {
        self.marker_queue.queue_insert(spec);
    }

    /// Queue a marker removal for the next flush.
    pub fn queue_marker_removal(&self, id: MarkerId) {
        self.marker_queue.queue_removal(id);
    }

    // --- Accessors ---

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Base for the marking range attribute.
    pub fn base_range(&self) -> f64 {
        self.base_range
    }

    /// Number of ticks completed.
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn foods(&self) -> &FoodMap {
        &self.foods
    }

    pub fn food(&self, id: FoodId) -> Option<&Food> {
        self.foods.get(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn home(&self) -> &Home {
        &self.home
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn mark_cache(&self) -> &MarkCache {
        &self.mark_cache
    }

    pub fn role_counts(&self) -> &RoleCounts {
        &self.role_counts
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            tick: self.tick,
            agents: self.agents.len(),
            foods: self.foods.len(),
            markers: self.markers.len(),
            indexed: self.index.len(),
            delivered: self.home.delivered(),
            food_remaining: self.foods.values().map(|f| u64::from(f.remaining())).sum(),
            total_agents_spawned: self.agent_ids.issued(),
            total_foods_spawned: self.food_ids.issued(),
            total_markers_placed: self.marker_ids.issued(),
            role_counts: self.role_counts.clone(),
        }
    }
}

/// Uniform point inside the field, at least `border` away from each edge.
fn random_inside(rng: &mut ChaCha8Rng, field: Field, border: f64) -> Position {
    Position::new(
        rng.gen_range(border..=field.width - border),
        rng.gen_range(border..=field.height - border),
    )
}
