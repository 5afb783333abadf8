//! # Formica Runtime
//!
//! The tick-driven engine of the Formica colony simulation.
//!
//! A [`Simulation`](simulation::Simulation) owns agents, food sources,
//! markers, the home base, a spatial index and a marking cache. Every tick
//! it tops up the population, moves agents in parallel, runs sight, smell
//! and collision queries that call into each agent's [`Brain`](brain::Brain),
//! ages markers, and finally flushes queued marker changes.
//!
//! ## Quick Start
//!
//! ```rust
//! use formica_runtime::prelude::*;
//!
//! struct Homebody;
//!
//! impl Brain for Homebody {
//!     fn on_see_food(&mut self, ant: &mut AntHandle<'_>, food: &Food) {
//!         if ant.load() == 0 && ant.target().is_none() {
//!             ant.go_to(food);
//!         }
//!     }
//! }
//!
//! let mut sim = SimulationBuilder::new()
//!     .desired_agents(20)
//!     .seed(42)
//!     .brains(|_: &AgentInfo| -> Box<dyn Brain> { Box::new(Homebody) })
//!     .build()
//!     .unwrap();
//!
//! let report = sim.tick();
//! assert_eq!(report.agents_spawned, 20);
//! assert_eq!(sim.stats().agents, 20);
//! ```

pub mod agent;
pub mod brain;
pub mod builder;
#[cfg(feature = "async")]
pub mod clock;
pub mod config;
pub mod error;
pub mod food;
pub mod home;
pub mod mark_cache;
pub mod marker;
pub mod motion;
pub mod perception;
pub mod prelude;
pub mod selection;
pub mod simulation;
