//! # Formica
//!
//! Tick-driven spatial simulation engine for foraging ant colonies.
//!
//! Agents, food sources, the home base and scent markers live in a shared
//! R-tree. Each tick the engine tops up the population, moves every agent
//! through its motion state machine, runs sight, smell and collision
//! queries that call into per-agent brains, ages markers, and flushes the
//! marker changes queued during the tick.
//!
//! ## Quick Start
//!
//! ```rust
//! use formica::prelude::*;
//!
//! let mut sim = SimulationBuilder::new()
//!     .field(400.0, 300.0)
//!     .home_at(Position::new(100.0, 100.0))
//!     .desired_agents(5)
//!     .desired_foods(0)
//!     .seed(1)
//!     .brains(ForagerFactory::new(1))
//!     .build()?;
//!
//! sim.add_food_at(Position::new(140.0, 100.0));
//! sim.run(200);
//! println!("delivered {}", sim.stats().delivered);
//! # Ok::<(), ConfigError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`formica_core`]: geometry, entity ids, the spatial index and roles
//! - [`formica_runtime`]: entities, brains, the tick scheduler and the
//!   fixed-rate driver
//! - [`formica_agents`]: reference brains (`Forager`, `Wanderer`)
//!
//! ## Tick Phases
//!
//! | Phase | What It Does |
//! |-------|--------------|
//! | Populate | Spawn agents and food up to the configured counts |
//! | Update | Advance motion, fire idle and tick callbacks |
//! | Perceive | Sight, smell and collision queries per agent |
//! | Decay | Age markers, queue expired ones for removal |
//! | Flush | Apply queued marker inserts and removals |

pub use formica_agents;
pub use formica_core;
pub use formica_runtime;

pub mod prelude {
    //! Everything needed to build and run a colony.

    pub use formica_agents::prelude::*;
    pub use formica_runtime::prelude::*;
}
