//! Random-walk brain.

use crate::agent_rng;
use formica_runtime::agent::AntHandle;
use formica_runtime::brain::{AgentInfo, Brain, BrainFactory};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Picks a new heading and leg length whenever it comes to a stop.
pub struct Wanderer {
    rng: ChaCha8Rng,
    max_turn: f64,
    steps: (u32, u32),
}

impl Wanderer {
    pub fn new(rng: ChaCha8Rng, max_turn: f64, steps: (u32, u32)) -> Self {
        Self {
            rng,
            max_turn,
            steps,
        }
    }
}

impl Brain for Wanderer {
    fn on_idle(&mut self, ant: &mut AntHandle<'_>) {
        wander(&mut self.rng, ant, self.max_turn, self.steps);
    }
}

/// Turn by up to `max_turn` either way and walk a random leg.
///
/// Either bound order is accepted for `steps`, and a negative `max_turn`
/// counts as its magnitude. A non-finite `max_turn` means no turn.
pub(crate) fn wander(
    rng: &mut ChaCha8Rng,
    ant: &mut AntHandle<'_>,
    max_turn: f64,
    steps: (u32, u32),
) {
    let max_turn = if max_turn.is_finite() {
        max_turn.abs().min(180.0)
    } else {
        0.0
    };
    let swing = if max_turn > 0.0 {
        rng.gen_range(-max_turn..=max_turn)
    } else {
        0.0
    };
    let (shortest, longest) = (steps.0.min(steps.1), steps.0.max(steps.1));
    ant.turn(ant.heading() + swing);
    ant.advance(rng.gen_range(shortest..=longest).max(1));
}

/// Builds [`Wanderer`] brains.
#[derive(Debug, Clone, Copy)]
pub struct WandererFactory {
    pub seed: u64,
    pub max_turn: f64,
    pub steps: (u32, u32),
}

impl WandererFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_turn: 60.0,
            steps: (20, 80),
        }
    }
}

impl Default for WandererFactory {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BrainFactory for WandererFactory {
    fn create(&self, info: &AgentInfo) -> Box<dyn Brain> {
        Box::new(Wanderer::new(
            agent_rng(self.seed, info.id),
            self.max_turn,
            self.steps,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formica_runtime::builder::SimulationBuilder;

    #[test]
    fn wanderers_leave_home_and_stay_in_the_field() {
        let mut sim = SimulationBuilder::new()
            .desired_agents(12)
            .desired_foods(0)
            .seed(8)
            .brains(WandererFactory::new(8))
            .build()
            .unwrap();
        let home = sim.home().position();
        sim.run(60);

        let field = sim.field();
        let moved = sim
            .agents()
            .iter()
            .filter(|a| a.body().position() != home)
            .count();
        assert!(moved > 0);
        for agent in sim.agents() {
            let p = agent.body().position();
            assert!(p.x >= 0.0 && p.x <= field.width && p.y >= 0.0 && p.y <= field.height);
        }
    }

    #[test]
    fn same_seed_same_walk() {
        let run = |seed| {
            let mut sim = SimulationBuilder::new()
                .desired_agents(4)
                .desired_foods(0)
                .seed(1)
                .worker_threads(2)
                .brains(WandererFactory::new(seed))
                .build()
                .unwrap();
            sim.run(40);
            sim.agents()
                .iter()
                .map(|a| a.body().position())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(5), run(5));
    }
}
