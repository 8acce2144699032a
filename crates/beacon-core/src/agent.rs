//! Agent — one independently scheduled unit of behavior.
//!
//! The host calls [`Agent::take_turn`] exactly once per round. All work
//! happens inside that call; nothing suspends across turns except the
//! state the agent keeps in its own context.

use crate::host::Host;
use crate::types::*;

/// A controller driving one unit in the simulation.
pub trait Agent {
    /// The host-assigned id of the unit this controller drives.
    fn id(&self) -> AgentId;

    fn unit_type(&self) -> UnitType;

    /// Run one turn.
    ///
    /// Each turn the agent:
    /// 1. Reads its own and its neighbors' broadcast slots
    /// 2. Updates local beliefs
    /// 3. Decides on movement, builds and bids
    /// 4. Returns the actions for the host to apply, in order
    fn take_turn(&mut self, host: &dyn Host) -> Vec<AgentAction>;

    /// How many turns this controller has taken.
    fn age(&self) -> Round;
}

/// What a factory needs to know to start a controller for a new unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub id: AgentId,
    pub team: Team,
    pub unit_type: UnitType,
    pub location: Location,
    /// Round the unit was created in.
    pub round: Round,
    /// Per-agent seed for any randomized behavior.
    pub seed: u64,
}

/// Creates controllers for units as the host creates them.
pub trait AgentFactory {
    /// `None` leaves the unit uncontrolled (it never acts).
    fn create(&mut self, spawn: &Spawn) -> Option<Box<dyn Agent>>;
}
