//! Convenient re-exports for common usage.
//!
//! ```rust
//! use formica_runtime::prelude::*;
//! ```

pub use formica_core::prelude::*;

pub use crate::agent::{Agent, AgentBody, AntHandle, FoodMap, Target, TickContext};
pub use crate::brain::{AgentInfo, Brain, BrainFactory, NullBrain, NullBrainFactory, PeerView};
pub use crate::builder::SimulationBuilder;
pub use crate::config::{SimulationConfig, MAX_AGENTS, MAX_FOODS, MAX_TICK_PERIOD, MIN_TICK_PERIOD};
pub use crate::error::{ConfigError, ConfigResult, DomainError, DomainResult};
pub use crate::food::Food;
pub use crate::home::Home;
pub use crate::mark_cache::MarkCache;
pub use crate::marker::{Marker, MarkerSpec};
pub use crate::motion::{MotionState, MotionStep, Pose};
pub use crate::perception::PerceptionTally;
pub use crate::selection::{BalancedRoles, FixedRole, RoleSelector};
pub use crate::simulation::{FlushOutcome, Simulation, SimulationStats, TickPhase, TickReport};

#[cfg(feature = "async")]
pub use crate::clock::{DriverStats, SimulationDriver, TickTimer};
