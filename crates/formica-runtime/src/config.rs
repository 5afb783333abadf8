//! Simulation configuration.
//!
//! Everything serializable lives in [`SimulationConfig`] and can be loaded
//! from TOML. Collaborators that are code rather than data (brain factory,
//! role selector) are passed to the builder instead.

use crate::error::{ConfigError, ConfigResult};
use formica_core::roles::RoleTable;
use formica_core::types::{Field, Position};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound on the standing number of food sources.
pub const MAX_FOODS: usize = 40;

/// Upper bound on the desired number of agents.
pub const MAX_AGENTS: usize = 100_000;

/// Shortest interval the fixed-rate driver will tick at.
pub const MIN_TICK_PERIOD: Duration = Duration::from_nanos(1);

/// Longest interval the fixed-rate driver will tick at.
pub const MAX_TICK_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Playing field width.
    pub width: f64,
    /// Playing field height.
    pub height: f64,
    /// Ticks per second for the fixed-rate driver.
    pub tick_rate_hz: f64,
    pub desired_agents: usize,
    /// Standing number of food sources. Clamped to [`MAX_FOODS`].
    pub desired_foods: usize,
    /// Quantity a new food source starts with.
    pub food_quantity: u32,
    /// Ticks a marker survives.
    pub marker_lifespan: u32,
    /// Ticks an agent waits between two markers.
    pub mark_refresh_ticks: u64,
    /// Keep spawned food this far from the edges.
    pub spawn_border: f64,
    /// Fixed home position. Random (inside the border) when absent.
    pub home_position: Option<Position>,
    pub agent_extents: (f64, f64),
    pub food_extents: (f64, f64),
    pub home_extents: (f64, f64),
    /// Seed for placement randomness. Drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Worker threads for the per-phase fan-out. Uses the global pool
    /// when absent.
    pub worker_threads: Option<usize>,
    pub roles: RoleTable,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            tick_rate_hz: 10.0,
            desired_agents: 100,
            desired_foods: 1,
            food_quantity: 1000,
            marker_lifespan: 200,
            mark_refresh_ticks: 10,
            spawn_border: 30.0,
            home_position: None,
            agent_extents: (8.0, 4.0),
            food_extents: (32.0, 24.0),
            home_extents: (32.0, 32.0),
            seed: None,
            worker_threads: None,
            roles: RoleTable::new(),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn field(&self) -> Field {
        Field::new(self.width, self.height)
    }

    /// Interval between ticks for the fixed-rate driver.
    ///
    /// Rates that [`validate`](Self::validate) rejects are clamped into
    /// `MIN_TICK_PERIOD..=MAX_TICK_PERIOD`.
    pub fn tick_period(&self) -> Duration {
        clamp_period(period_from_hz(self.tick_rate_hz))
    }

    /// Desired food count after clamping.
    pub fn effective_desired_foods(&self) -> usize {
        self.desired_foods.min(MAX_FOODS)
    }

    /// Check everything that would otherwise surface as odd behaviour
    /// mid-run.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(name, format!("must be positive, got {value}")));
            }
        }
        if !self.spawn_border.is_finite() || self.spawn_border < 0.0 {
            return Err(ConfigError::invalid("spawn_border", "must be zero or positive"));
        }
        if self.width <= 2.0 * self.spawn_border || self.height <= 2.0 * self.spawn_border {
            return Err(ConfigError::invalid(
                "spawn_border",
                format!(
                    "field {}x{} leaves no room inside a border of {}",
                    self.width, self.height, self.spawn_border
                ),
            ));
        }
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(ConfigError::invalid("tick_rate_hz", "must be positive"));
        }
        match period_from_hz(self.tick_rate_hz) {
            Some(period) if (MIN_TICK_PERIOD..=MAX_TICK_PERIOD).contains(&period) => {}
            _ => {
                return Err(ConfigError::invalid(
                    "tick_rate_hz",
                    format!(
                        "{} Hz gives a tick period outside {MIN_TICK_PERIOD:?}..={MAX_TICK_PERIOD:?}",
                        self.tick_rate_hz
                    ),
                ))
            }
        }
        if self.desired_agents > MAX_AGENTS {
            return Err(ConfigError::invalid(
                "desired_agents",
                format!("{} exceeds the limit of {MAX_AGENTS}", self.desired_agents),
            ));
        }
        if self.food_quantity == 0 {
            return Err(ConfigError::invalid("food_quantity", "must be at least 1"));
        }
        if self.mark_refresh_ticks == 0 {
            return Err(ConfigError::invalid("mark_refresh_ticks", "must be at least 1"));
        }
        for (name, (w, h)) in [
            ("agent_extents", self.agent_extents),
            ("food_extents", self.food_extents),
            ("home_extents", self.home_extents),
        ] {
            if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
                return Err(ConfigError::invalid(name, "extents must be positive"));
            }
        }
        if let Some(home) = self.home_position {
            if !self.field().bounds().contains(&home) {
                return Err(ConfigError::invalid("home_position", "must lie inside the field"));
            }
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::invalid("worker_threads", "must be at least 1"));
        }
        Ok(())
    }
}

/// Period for a rate in hertz, or `None` when it is not representable.
pub(crate) fn period_from_hz(hz: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(1.0 / hz).ok()
}

/// Force a period into the range the driver accepts.
pub(crate) fn clamp_period(period: Option<Duration>) -> Duration {
    period
        .unwrap_or(MAX_TICK_PERIOD)
        .clamp(MIN_TICK_PERIOD, MAX_TICK_PERIOD)
}
