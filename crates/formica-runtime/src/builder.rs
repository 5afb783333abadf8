//! Simulation builder.
//!
//! Collects the configuration together with the collaborators that cannot
//! be expressed as data, validates everything, and produces a
//! [`Simulation`]. All configuration errors surface from [`build`]; a built
//! simulation never fails a tick.
//!
//! # Example
//!
//! ```rust
//! use formica_runtime::prelude::*;
//!
//! let mut sim = SimulationBuilder::new()
//!     .desired_agents(10)
//!     .seed(7)
//!     .role("scout", Adjustments {
//!         speed: Level::Boosted,
//!         capacity: Level::Decreased,
//!         attack: Level::Decreased,
//!         ..Adjustments::default()
//!     })
//!     .role_selector(BalancedRoles::even(["scout"]))
//!     .build()?;
//!
//! sim.tick();
//! assert_eq!(sim.agents().len(), 10);
//! assert_eq!(sim.role_counts()["scout"], 10);
//! # Ok::<(), ConfigError>(())
//! ```
//!
//! [`build`]: SimulationBuilder::build

use crate::brain::{BrainFactory, NullBrainFactory};
use crate::config::{SimulationConfig, MAX_FOODS};
use crate::error::{ConfigError, ConfigResult};
use crate::selection::{FixedRole, RoleSelector};
use crate::simulation::Simulation;
use formica_core::roles::{Adjustments, RoleTable};
use formica_core::types::Position;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{info, warn};

/// Builder for [`Simulation`].
pub struct SimulationBuilder {
    config: SimulationConfig,
    extra_roles: Vec<(String, Adjustments)>,
    brains: Arc<dyn BrainFactory>,
    selector: Arc<dyn RoleSelector>,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBuilder {
    /// Start from the default configuration, null brains and no roles.
    pub fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
            extra_roles: Vec::new(),
            brains: Arc::new(NullBrainFactory),
            selector: Arc::new(FixedRole::default()),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn field(mut self, width: f64, height: f64) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn desired_agents(mut self, count: usize) -> Self {
        self.config.desired_agents = count;
        self
    }

    pub fn desired_foods(mut self, count: usize) -> Self {
        self.config.desired_foods = count;
        self
    }

    pub fn food_quantity(mut self, quantity: u32) -> Self {
        self.config.food_quantity = quantity;
        self
    }

    pub fn marker_lifespan(mut self, ticks: u32) -> Self {
        self.config.marker_lifespan = ticks;
        self
    }

    pub fn mark_refresh_ticks(mut self, ticks: u64) -> Self {
        self.config.mark_refresh_ticks = ticks;
        self
    }

    pub fn home_at(mut self, position: Position) -> Self {
        self.config.home_position = Some(position);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Run phases on a dedicated pool of this many threads.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = Some(threads);
        self
    }

    pub fn tick_rate_hz(mut self, hz: f64) -> Self {
        self.config.tick_rate_hz = hz;
        self
    }

    /// Replace the role table.
    pub fn roles(mut self, roles: RoleTable) -> Self {
        self.config.roles = roles;
        self
    }

    /// Add one role. Checked for balance in [`build`](Self::build).
    pub fn role(mut self, name: impl Into<String>, adjustments: Adjustments) -> Self {
        self.extra_roles.push((name.into(), adjustments));
        self
    }

    pub fn role_selector(mut self, selector: impl RoleSelector + 'static) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    pub fn brains(mut self, factory: impl BrainFactory + 'static) -> Self {
        self.brains = Arc::new(factory);
        self
    }

    /// Validate and assemble the simulation.
    pub fn build(self) -> ConfigResult<Simulation> {
        let mut config = self.config;
        for (name, adjustments) in self.extra_roles {
            config.roles.define(name, adjustments)?;
        }
        config.validate()?;

        if config.desired_foods > MAX_FOODS {
            warn!(
                requested = config.desired_foods,
                max = MAX_FOODS,
                "desired food count clamped"
            );
        }

        let pool = match config.worker_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("formica-worker-{i}"))
                    .build()
                    .map_err(|e| ConfigError::WorkerPool(e.to_string()))?,
            ),
            None => None,
        };

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        info!(
            width = config.width,
            height = config.height,
            agents = config.desired_agents,
            foods = config.effective_desired_foods(),
            roles = config.roles.len(),
            threads = ?config.worker_threads,
            "simulation built"
        );

        Ok(Simulation::from_parts(
            config,
            self.brains,
            self.selector,
            pool,
            rng,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formica_core::error::CoreError;
    use formica_core::roles::Level;

    #[test]
    fn unbalanced_role_fails_build() {
        let err = SimulationBuilder::new()
            .role(
                "tank",
                Adjustments {
                    capacity: Level::Boosted,
                    ..Adjustments::default()
                },
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Role(CoreError::UnbalancedRole {
                role: "tank".into(),
                sum: 2
            })
        );
    }

    #[test]
    fn invalid_config_fails_build() {
        let err = SimulationBuilder::new().field(-5.0, 600.0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "width", .. }));
    }

    #[test]
    fn fixed_home_is_indexed() {
        let sim = SimulationBuilder::new()
            .home_at(Position::new(100.0, 100.0))
            .build()
            .unwrap();
        assert_eq!(sim.home().position(), Position::new(100.0, 100.0));
        assert_eq!(sim.index().len(), 1);
    }

    #[test]
    fn seeded_builds_place_home_identically() {
        let a = SimulationBuilder::new().seed(99).build().unwrap();
        let b = SimulationBuilder::new().seed(99).build().unwrap();
        assert_eq!(a.home().position(), b.home().position());
        let bounds = a.field();
        let home = a.home().position();
        assert!(home.x >= 30.0 && home.x <= bounds.width - 30.0);
        assert!(home.y >= 30.0 && home.y <= bounds.height - 30.0);
    }

    #[test]
    fn dedicated_pool_runs_ticks() {
        let mut sim = SimulationBuilder::new()
            .desired_agents(16)
            .worker_threads(2)
            .seed(1)
            .build()
            .unwrap();
        sim.run(3);
        assert_eq!(sim.current_tick(), 3);
        assert_eq!(sim.agents().len(), 16);
    }
}
