//! # Formica Agents
//!
//! Reference brains for the Formica colony simulation.
//!
//! - **Forager**: wanders until it sees food, carries loads home and lays a
//!   trail of markers pointing back at the source
//! - **Wanderer**: random walk, useful as background traffic
//!
//! Both are deterministic for a given seed: each brain draws from its own
//! generator seeded from the factory seed and the agent id.

pub mod forager;
pub mod prelude;
pub mod wanderer;

use formica_core::types::AgentId;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Per-agent generator. Distinct agents get unrelated streams.
pub(crate) fn agent_rng(seed: u64, id: AgentId) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(id.0);
    rng
}
