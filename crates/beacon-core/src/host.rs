//! Host — the simulation engine as seen by one agent during one turn.
//!
//! Agents never touch each other or the map directly. Each turn the host
//! hands an agent a read-only view; the agent answers with a list of
//! [`AgentAction`](crate::types::AgentAction)s that the host validates and
//! applies.

use crate::comms::{self, Message};
use crate::types::*;

/// Read-only, per-turn view of the world for a single agent.
///
/// Every query is local: terrain and agents beyond the sensor radius are
/// reported as unknown, the same as off-map cells.
pub trait Host {
    // --- Self ---

    fn id(&self) -> AgentId;

    fn team(&self) -> Team;

    fn unit_type(&self) -> UnitType;

    fn location(&self) -> Location;

    fn round(&self) -> Round;

    /// Influence currently held by this agent.
    fn influence(&self) -> i32;

    /// Whether the action cooldown allows a move or build this turn.
    fn is_ready(&self) -> bool;

    fn sensor_radius_squared(&self) -> i32;

    /// Computation units left for this turn. Queries past zero return
    /// nothing and void the turn's actions.
    fn budget_remaining(&self) -> u32;

    /// True once a query this turn was refused for lack of budget. After
    /// that, empty answers say nothing about the world and must not be
    /// remembered.
    fn exhausted(&self) -> bool;

    // --- Terrain ---

    /// True only for sensed cells that lie on the map.
    fn on_map(&self, location: Location) -> bool;

    /// Terrain passability in `(0, 1]`, or `None` if not sensed.
    fn passability(&self, location: Location) -> Option<f64>;

    // --- Agents ---

    fn agent_at(&self, location: Location) -> Option<SensedAgent>;

    /// Look up an agent by id if it is within sensing range.
    fn sense_agent(&self, id: AgentId) -> Option<SensedAgent>;

    /// Every agent within sensing range, excluding this one.
    fn nearby_agents(&self) -> Vec<SensedAgent>;

    fn is_occupied(&self, location: Location) -> bool {
        self.agent_at(location).is_some()
    }

    // --- Action pre-checks ---

    fn can_move(&self, direction: Direction) -> bool;

    fn can_build(&self, unit_type: UnitType, direction: Direction, influence: i32) -> bool;

    // --- Broadcast ---

    /// Raw slot value of any live agent, by id. `None` when the id is
    /// gone or the slot is empty. Range does not matter; knowing the id does.
    fn read_slot(&self, id: AgentId) -> Option<u32>;

    /// Whether `id` still names a live agent whose slot could be read.
    fn can_read_slot(&self, id: AgentId) -> bool;

    // --- Auction ---

    /// Votes this agent's team has won so far.
    fn team_votes(&self) -> u32;
}

/// Read and decode another agent's slot.
///
/// Absent, empty, stale and foreign values all come back as `None`.
pub fn read_message(host: &dyn Host, id: AgentId) -> Option<Message> {
    host.read_slot(id).and_then(comms::try_decode)
}
