//! Agents and the handle their brains drive them through.

use crate::brain::{Brain, PeerView};
use crate::error::{DomainError, DomainResult};
use crate::food::Food;
use crate::home::Home;
use crate::marker::{MarkerQueue, MarkerSpec};
use crate::motion::{MotionLimits, MotionState, MotionStep, Pose};
use formica_core::roles::AttributeSet;
use formica_core::types::{AgentId, BoundingBox, EntityHandle, Field, FoodId, Position, Tick};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Food sources keyed by id.
pub type FoodMap = BTreeMap<FoodId, Food>;

/// Where an agent is currently headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Food(FoodId),
    Home,
}

impl Target {
    pub fn handle(self) -> EntityHandle {
        match self {
            Target::Food(id) => EntityHandle::Food(id),
            Target::Home => EntityHandle::Home,
        }
    }
}

/// Shared, read-mostly world state visible to agents during a phase.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub tick: Tick,
    pub field: Field,
    pub home: &'a Home,
    pub foods: &'a FoodMap,
    pub markers: &'a MarkerQueue,
    /// Ticks an agent waits between two markers.
    pub mark_refresh: u64,
}

/// Everything about an agent except its brain.
#[derive(Debug, Clone)]
pub struct AgentBody {
    pub(crate) id: AgentId,
    pub(crate) role: Arc<str>,
    pub(crate) pose: Pose,
    pub(crate) motion: MotionState,
    pub(crate) load: u32,
    pub(crate) attributes: AttributeSet,
    pub(crate) target: Option<Target>,
    pub(crate) extents: (f64, f64),
    /// Updates performed so far.
    pub(crate) ops: u64,
    pub(crate) next_mark_at: u64,
    pub(crate) born: Tick,
}

impl AgentBody {
    pub fn new(
        id: AgentId,
        role: Arc<str>,
        position: Position,
        attributes: AttributeSet,
        extents: (f64, f64),
        born: Tick,
    ) -> Self {
        Self {
            id,
            role,
            pose: Pose::new(position, 0.0),
            motion: MotionState::Idle,
            load: 0,
            attributes,
            target: None,
            extents,
            ops: 0,
            next_mark_at: 0,
            born,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn position(&self) -> Position {
        self.pose.position
    }

    pub fn heading(&self) -> f64 {
        self.pose.heading
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn load(&self) -> u32 {
        self.load
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn target(&self) -> Option<Target> {
        self.target
    }

    pub fn born(&self) -> Tick {
        self.born
    }

    pub fn handle(&self) -> EntityHandle {
        EntityHandle::Agent(self.id)
    }

    /// Body box used for the index, smell and collision queries.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::centered(self.pose.position, self.extents.0, self.extents.1)
    }

    /// Box around the sight circle.
    pub fn sight_bounds(&self) -> BoundingBox {
        BoundingBox::around(self.pose.position, self.attributes.sight_radius)
    }

    fn limits(&self) -> MotionLimits {
        MotionLimits {
            speed: self.attributes.speed,
            turn_rate: self.attributes.turn_rate,
            loaded: self.load > 0,
        }
    }

    /// Clear target and motion after arriving somewhere.
    pub(crate) fn arrive(&mut self) {
        self.target = None;
        self.motion.stop();
    }

    /// Empty the load into the home base.
    pub(crate) fn unload(&mut self, home: &Home) -> u32 {
        let delivered = std::mem::take(&mut self.load);
        home.deliver(delivered);
        delivered
    }

    pub(crate) fn peer_view(&self, kind: &'static str) -> PeerView {
        PeerView {
            id: self.id,
            role: Arc::clone(&self.role),
            position: self.pose.position,
            heading: self.pose.heading,
            load: self.load,
            kind,
        }
    }
}

/// An agent: its body plus the brain that steers it.
pub struct Agent {
    pub(crate) body: AgentBody,
    pub(crate) brain: Box<dyn Brain>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("body", &self.body)
            .field("brain", &self.brain.kind())
            .finish()
    }
}

impl Agent {
    pub fn new(body: AgentBody, brain: Box<dyn Brain>) -> Self {
        Self { body, brain }
    }

    pub fn id(&self) -> AgentId {
        self.body.id
    }

    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    pub fn brain_kind(&self) -> &'static str {
        self.brain.kind()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.body.bounds()
    }

    /// One tick of agent life: advance the motion state, or let the brain
    /// pick something to do if there is none, then the per-tick callback.
    pub fn update(&mut self, ctx: &TickContext<'_>) -> MotionStep {
        let body = &mut self.body;
        body.ops += 1;

        let was_idle = body.motion.is_idle();
        let limits = body.limits();
        let step = body.motion.advance(&mut body.pose, &limits, &ctx.field);

        let mut ant = AntHandle::new(body, ctx);
        if was_idle {
            self.brain.on_idle(&mut ant);
        }
        self.brain.on_tick(&mut ant);
        step
    }

    /// Run `f` with the brain and a handle onto this agent.
    pub fn with_brain<R>(
        &mut self,
        ctx: &TickContext<'_>,
        f: impl FnOnce(&mut dyn Brain, &mut AntHandle<'_>) -> R,
    ) -> R {
        let mut ant = AntHandle::new(&mut self.body, ctx);
        f(self.brain.as_mut(), &mut ant)
    }
}

/// View of one agent handed to brain callbacks.
pub struct AntHandle<'a> {
    body: &'a mut AgentBody,
    ctx: &'a TickContext<'a>,
}

impl<'a> AntHandle<'a> {
    pub fn new(body: &'a mut AgentBody, ctx: &'a TickContext<'a>) -> Self {
        Self { body, ctx }
    }

    pub fn id(&self) -> AgentId {
        self.body.id
    }

    pub fn role(&self) -> &str {
        &self.body.role
    }

    pub fn load(&self) -> u32 {
        self.body.load
    }

    pub fn capacity(&self) -> u32 {
        self.body.attributes.capacity
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.body.attributes
    }

    pub fn position(&self) -> Position {
        self.body.pose.position
    }

    pub fn heading(&self) -> f64 {
        self.body.pose.heading
    }

    pub fn target(&self) -> Option<Target> {
        self.body.target
    }

    pub fn is_idle(&self) -> bool {
        self.body.motion.is_idle()
    }

    pub fn tick(&self) -> Tick {
        self.ctx.tick
    }

    pub fn home_position(&self) -> Position {
        self.ctx.home.position()
    }

    /// Look up a food source the brain remembered by id.
    pub fn food(&self, id: FoodId) -> Option<&'a Food> {
        self.ctx.foods.get(&id)
    }

    /// Bearing to the food, in whole degrees.
    pub fn direction_to(&self, food: &Food) -> i32 {
        self.body.pose.position.direction_to(&food.position())
    }

    pub fn direction_to_point(&self, point: Position) -> i32 {
        self.body.pose.position.direction_to(&point)
    }

    /// Face `direction` (degrees). Normalized before use.
    pub fn turn(&mut self, direction: impl Into<f64>) {
        self.body.motion.turn(direction.into());
    }

    pub fn advance(&mut self, steps: u32) {
        self.body.motion.go_forward(steps);
    }

    pub fn advance_unbounded(&mut self) {
        self.body.motion.go_forwards();
    }

    pub fn stop(&mut self) {
        self.body.motion.stop();
    }

    /// Head for `food` until it is reached.
    pub fn go_to(&mut self, food: &Food) {
        self.body.target = Some(Target::Food(food.id()));
        let bearing = self.direction_to(food);
        self.turn(bearing);
        self.advance_unbounded();
    }

    /// Head back to the home base until it is reached.
    pub fn go_to_home(&mut self) {
        self.body.target = Some(Target::Home);
        let bearing = self.direction_to_point(self.ctx.home.position());
        self.turn(bearing);
        self.advance_unbounded();
    }

    /// Load as much of `food` as fits. Returns the amount loaded.
    ///
    /// Fails if the agent's body is not touching the food.
    pub fn take_food(&mut self, food: &Food) -> DomainResult<u32> {
        if !self.body.bounds().intersects(&food.bounds()) {
            return Err(DomainError::NotTouchingFood {
                agent: self.body.id,
                food: food.id(),
            });
        }
        let room = self.capacity().saturating_sub(self.body.load);
        let taken = food.take(room);
        self.body.load += taken;
        tracing::trace!(agent = %self.body.id, food = %food.id(), taken, "loaded food");
        Ok(taken)
    }

    /// Leave a marker at the agent's position.
    ///
    /// Rate limited per agent; returns false when the request was dropped.
    pub fn set_marker(&mut self, radius: u32, payload: i64) -> bool {
        if self.body.ops < self.body.next_mark_at {
            return false;
        }
        self.body.next_mark_at = self.body.ops + self.ctx.mark_refresh;
        self.ctx
            .markers
            .queue_insert(MarkerSpec::new(self.body.pose.position, radius, payload));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::NullBrain;
    use formica_core::roles::AttributeSet;

    struct World {
        home: Home,
        foods: FoodMap,
        markers: MarkerQueue,
    }

    impl World {
        fn new() -> Self {
            let mut foods = FoodMap::new();
            foods.insert(
                FoodId(0),
                Food::new(FoodId(0), Position::new(200.0, 200.0), (32.0, 24.0), 1000),
            );
            Self {
                home: Home::new(Position::new(50.0, 50.0), (32.0, 32.0)),
                foods,
                markers: MarkerQueue::new(),
            }
        }

        fn ctx(&self) -> TickContext<'_> {
            TickContext {
                tick: 0,
                field: Field::default(),
                home: &self.home,
                foods: &self.foods,
                markers: &self.markers,
                mark_refresh: 10,
            }
        }
    }

    fn body_at(position: Position) -> AgentBody {
        AgentBody::new(
            AgentId(1),
            Arc::from("worker"),
            position,
            AttributeSet::baseline(500.0),
            (8.0, 4.0),
            0,
        )
    }

    #[test]
    fn take_food_requires_contact() {
        let world = World::new();
        let ctx = world.ctx();
        let food = &world.foods[&FoodId(0)];

        let mut far = body_at(Position::new(100.0, 100.0));
        let err = AntHandle::new(&mut far, &ctx).take_food(food).unwrap_err();
        assert_eq!(
            err,
            DomainError::NotTouchingFood {
                agent: AgentId(1),
                food: FoodId(0)
            }
        );
        assert_eq!(food.remaining(), 1000);

        let mut near = body_at(Position::new(218.0, 200.0));
        let taken = AntHandle::new(&mut near, &ctx).take_food(food).unwrap();
        assert_eq!(taken, 5);
        assert_eq!(near.load(), 5);
        assert_eq!(food.remaining(), 995);

        // full agents load nothing more
        assert_eq!(AntHandle::new(&mut near, &ctx).take_food(food), Ok(0));
        assert_eq!(food.remaining(), 995);
    }

    #[test]
    fn go_to_home_sets_target_and_heading() {
        let world = World::new();
        let ctx = world.ctx();
        let mut body = body_at(Position::new(150.0, 50.0));
        AntHandle::new(&mut body, &ctx).go_to_home();
        assert_eq!(body.target(), Some(Target::Home));
        assert_eq!(body.motion().target_heading(), Some(180.0));
    }

    #[test]
    fn set_marker_is_rate_limited() {
        let world = World::new();
        let ctx = world.ctx();
        let mut agent = Agent::new(body_at(Position::new(300.0, 300.0)), Box::new(NullBrain));

        assert!(AntHandle::new(&mut agent.body, &ctx).set_marker(5, 1));
        assert!(!AntHandle::new(&mut agent.body, &ctx).set_marker(5, 1));
        for _ in 0..10 {
            agent.update(&ctx);
        }
        assert!(AntHandle::new(&mut agent.body, &ctx).set_marker(5, 2));
        assert_eq!(world.markers.pending_inserts(), 2);
    }

    #[test]
    fn update_consults_brain_only_when_idle() {
        use std::sync::atomic::{AtomicU32, Ordering};

        #[derive(Default)]
        struct Counts {
            idles: AtomicU32,
            ticks: AtomicU32,
        }
        struct Recorder(Arc<Counts>);
        impl Brain for Recorder {
            fn on_idle(&mut self, ant: &mut AntHandle<'_>) {
                self.0.idles.fetch_add(1, Ordering::Relaxed);
                ant.advance(8);
            }
            fn on_tick(&mut self, _ant: &mut AntHandle<'_>) {
                self.0.ticks.fetch_add(1, Ordering::Relaxed);
            }
        }

        let world = World::new();
        let ctx = world.ctx();
        let counts = Arc::new(Counts::default());
        let mut agent = Agent::new(
            body_at(Position::new(300.0, 300.0)),
            Box::new(Recorder(Arc::clone(&counts))),
        );
        // idle -> 8 steps scheduled -> two moves -> stop -> idle again
        for _ in 0..5 {
            agent.update(&ctx);
        }
        assert_eq!(agent.body().position().x, 308.0);
        assert_eq!(counts.idles.load(Ordering::Relaxed), 2);
        assert_eq!(counts.ticks.load(Ordering::Relaxed), 5);
    }
}
