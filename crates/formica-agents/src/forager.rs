//! Foraging brain.
//!
//! A forager walks at random until food comes into sight, heads for it,
//! loads what it can carry and returns home. While loaded it lays markers
//! whose payload is the bearing from the marker back to the food, so empty
//! foragers that smell the trail can turn onto it. After a delivery it
//! returns to the source it remembers until that source runs dry.

use crate::agent_rng;
use crate::wanderer::wander;
use formica_core::types::{FoodId, Position};
use formica_runtime::agent::AntHandle;
use formica_runtime::brain::{AgentInfo, Brain, BrainFactory};
use formica_runtime::food::Food;
use formica_runtime::marker::Marker;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Tunables shared by every forager a factory builds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForagerSettings {
    /// Radius of the markers laid while carrying food.
    pub marker_radius: u32,
    /// Steps walked along a trail bearing after smelling a marker.
    pub trail_steps: u32,
    /// Largest random turn while wandering, in degrees either way.
    pub max_turn: f64,
    /// Inclusive range of a random leg.
    pub wander_steps: (u32, u32),
}

impl Default for ForagerSettings {
    fn default() -> Self {
        Self {
            marker_radius: 12,
            trail_steps: 40,
            max_turn: 45.0,
            wander_steps: (20, 60),
        }
    }
}

/// Remembered food source.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Source {
    id: FoodId,
    position: Position,
}

pub struct Forager {
    rng: ChaCha8Rng,
    settings: ForagerSettings,
    source: Option<Source>,
    loads_taken: u32,
}

impl Forager {
    pub fn new(rng: ChaCha8Rng, settings: ForagerSettings) -> Self {
        Self {
            rng,
            settings,
            source: None,
            loads_taken: 0,
        }
    }

    /// Food source this forager keeps returning to, if any.
    pub fn source(&self) -> Option<FoodId> {
        self.source.map(|s| s.id)
    }

    /// Number of loads picked up so far.
    pub fn loads_taken(&self) -> u32 {
        self.loads_taken
    }

    fn remember(&mut self, food: &Food) {
        self.source = Some(Source {
            id: food.id(),
            position: food.position(),
        });
    }
}

impl Brain for Forager {
    fn on_idle(&mut self, ant: &mut AntHandle<'_>) {
        if ant.load() > 0 {
            ant.go_to_home();
            return;
        }
        if let Some(source) = self.source {
            match ant.food(source.id) {
                Some(food) if !food.is_depleted() => {
                    ant.go_to(food);
                    return;
                }
                _ => {
                    trace!(agent = %ant.id(), food = %source.id, "source gone, wandering");
                    self.source = None;
                }
            }
        }
        let ForagerSettings {
            max_turn,
            wander_steps,
            ..
        } = self.settings;
        wander(&mut self.rng, ant, max_turn, wander_steps);
    }

    fn on_see_food(&mut self, ant: &mut AntHandle<'_>, food: &Food) {
        if ant.load() > 0 || ant.target().is_some() {
            return;
        }
        self.remember(food);
        ant.go_to(food);
    }

    fn on_reached_food(&mut self, ant: &mut AntHandle<'_>, food: &Food) {
        match ant.take_food(food) {
            Ok(taken) if taken > 0 => {
                self.remember(food);
                self.loads_taken += 1;
                ant.go_to_home();
            }
            Ok(_) if ant.load() > 0 => ant.go_to_home(),
            Ok(_) => self.source = None,
            Err(e) => debug!(error = %e, "could not load food"),
        }
    }

    fn on_see_marker(&mut self, ant: &mut AntHandle<'_>, marker: &Marker) {
        if ant.load() > 0 || ant.target().is_some() || self.source.is_some() {
            return;
        }
        ant.turn(marker.payload() as f64);
        ant.advance(self.settings.trail_steps);
    }

    fn on_tick(&mut self, ant: &mut AntHandle<'_>) {
        if ant.load() == 0 {
            return;
        }
        if let Some(source) = self.source {
            let bearing = ant.direction_to_point(source.position);
            ant.set_marker(self.settings.marker_radius, i64::from(bearing));
        }
    }
}

/// Builds [`Forager`] brains.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForagerFactory {
    pub seed: u64,
    pub settings: ForagerSettings,
}

impl ForagerFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            settings: ForagerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ForagerSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl BrainFactory for ForagerFactory {
    fn create(&self, info: &AgentInfo) -> Box<dyn Brain> {
        Box::new(Forager::new(agent_rng(self.seed, info.id), self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formica_runtime::builder::SimulationBuilder;

    #[test]
    fn loaded_foragers_lay_markers_pointing_at_the_food() {
        let mut sim = SimulationBuilder::new()
            .field(400.0, 300.0)
            .home_at(Position::new(100.0, 100.0))
            .desired_agents(1)
            .desired_foods(0)
            .mark_refresh_ticks(2)
            .seed(3)
            .brains(ForagerFactory::new(3))
            .build()
            .unwrap();
        sim.add_food_at(Position::new(150.0, 100.0));

        let mut placed = 0;
        for _ in 0..60 {
            sim.tick();
            placed = sim.stats().total_markers_placed;
            if placed > 0 {
                break;
            }
        }
        assert!(placed > 0);
        for marker in sim.markers() {
            // trail runs west of the food along y = 100
            assert!(marker.payload().abs() <= 5, "{marker:?}");
        }
    }

    #[test]
    fn reversed_wander_bounds_from_toml_still_walk() {
        let settings: ForagerSettings = toml::from_str(
            r#"
            wander_steps = [60, 20]
            max_turn = -30.0
            "#,
        )
        .unwrap();
        assert_eq!(settings.wander_steps, (60, 20));

        let mut sim = SimulationBuilder::new()
            .desired_agents(6)
            .desired_foods(0)
            .seed(4)
            .brains(ForagerFactory::new(4).with_settings(settings))
            .build()
            .unwrap();
        let home = sim.home().position();
        sim.run(30);

        assert_eq!(sim.current_tick(), 30);
        assert!(sim
            .agents()
            .iter()
            .any(|a| a.body().position() != home));
        for agent in sim.agents() {
            let budget = agent.body().motion().remaining_steps();
            assert!(budget.map_or(true, |steps| steps <= 60), "{budget:?}");
        }
    }

    #[test]
    fn settings_load_from_toml_with_defaults() {
        let factory: ForagerFactory = toml::from_str(
            r#"
            seed = 9
            [settings]
            marker_radius = 20
            "#,
        )
        .unwrap();
        assert_eq!(factory.seed, 9);
        assert_eq!(factory.settings.marker_radius, 20);
        assert_eq!(factory.settings.trail_steps, 40);
    }
}
