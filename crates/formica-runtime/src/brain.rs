//! The brain capability interface.
//!
//! A brain is the decision logic behind one agent. The engine calls into it
//! on perception events and once per tick; every callback has a no-op
//! default, so a brain only implements the events it cares about.
//!
//! Callbacks receive an [`AntHandle`] for reading the agent's state and
//! issuing commands. Commands take effect on the agent's own state
//! immediately; markers are queued and appear after the tick's flush.

use crate::agent::AntHandle;
use crate::food::Food;
use crate::marker::Marker;
use formica_core::types::{AgentId, Position};
use std::sync::Arc;

/// What an agent can learn about another agent it sees.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerView {
    pub id: AgentId,
    pub role: Arc<str>,
    pub position: Position,
    pub heading: f64,
    pub load: u32,
    /// Brain kind of the peer. Only peers of the same kind are reported.
    pub kind: &'static str,
}

/// Decision logic for one agent.
///
/// Brains run on worker threads, one agent at a time, so they need `Send`
/// but not `Sync`.
pub trait Brain: Send {
    /// Identifies the brain implementation. Agents only see peers whose
    /// brains report the same kind.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The agent has nothing left to do.
    fn on_idle(&mut self, _ant: &mut AntHandle<'_>) {}

    /// Food with something left on it came within sight.
    fn on_see_food(&mut self, _ant: &mut AntHandle<'_>, _food: &Food) {}

    /// The agent reached the food it was heading for.
    fn on_reached_food(&mut self, _ant: &mut AntHandle<'_>, _food: &Food) {}

    /// Another agent with the same kind of brain is within sight.
    fn on_see_peer(&mut self, _ant: &mut AntHandle<'_>, _peer: &PeerView) {}

    /// The agent walked onto a marker it had not sensed before.
    fn on_see_marker(&mut self, _ant: &mut AntHandle<'_>, _marker: &Marker) {}

    /// Called once per tick after the motion step.
    fn on_tick(&mut self, _ant: &mut AntHandle<'_>) {}
}

/// A brain that never reacts to anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBrain;

impl Brain for NullBrain {}

/// Identity handed to a [`BrainFactory`] when an agent is created.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentInfo {
    pub id: AgentId,
    pub role: Arc<str>,
}

/// Creates one brain per spawned agent.
pub trait BrainFactory: Send + Sync {
    fn create(&self, info: &AgentInfo) -> Box<dyn Brain>;
}

impl<F> BrainFactory for F
where
    F: Fn(&AgentInfo) -> Box<dyn Brain> + Send + Sync,
{
    fn create(&self, info: &AgentInfo) -> Box<dyn Brain> {
        self(info)
    }
}

/// Factory producing [`NullBrain`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBrainFactory;

impl BrainFactory for NullBrainFactory {
    fn create(&self, _info: &AgentInfo) -> Box<dyn Brain> {
        Box::new(NullBrain)
    }
}
