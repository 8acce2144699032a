//! Per-agent, per-turn view of the world.
//!
//! A [`UnitView`] is the [`Host`] an agent sees during its turn. It limits
//! sensing to the unit's radius and charges every query against a
//! computation budget; once the budget runs out all queries come back
//! empty and the arena throws the turn's actions away.

use std::cell::Cell;

use beacon_core::host::Host;
use beacon_core::types::*;
use serde::{Deserialize, Serialize};

use crate::board::BroadcastBoard;
use crate::world::{GridWorld, Unit};

/// Computation units charged per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Units available to each agent per turn (default: 15000).
    pub per_turn: u32,
    /// Terrain and single-cell queries (default: 2).
    pub cell_query: u32,
    /// Looking an agent up by id, or reading its slot (default: 5).
    pub agent_query: u32,
    /// Scanning every agent in range (default: 50).
    pub scan: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            per_turn: 15_000,
            cell_query: 2,
            agent_query: 5,
            scan: 50,
        }
    }
}

pub struct UnitView<'a> {
    world: &'a GridWorld,
    board: &'a BroadcastBoard,
    unit: &'a Unit,
    costs: &'a BudgetConfig,
    remaining: Cell<u32>,
    exhausted: Cell<bool>,
}

impl<'a> UnitView<'a> {
    pub fn new(world: &'a GridWorld, board: &'a BroadcastBoard, unit: &'a Unit, costs: &'a BudgetConfig) -> Self {
        Self {
            world,
            board,
            unit,
            costs,
            remaining: Cell::new(costs.per_turn),
            exhausted: Cell::new(false),
        }
    }

    pub fn spent(&self) -> u32 {
        self.costs.per_turn - self.remaining.get()
    }

    fn charge(&self, cost: u32) -> bool {
        if self.exhausted.get() {
            return false;
        }
        match self.remaining.get().checked_sub(cost) {
            Some(left) => {
                self.remaining.set(left);
                true
            }
            None => {
                self.remaining.set(0);
                self.exhausted.set(true);
                false
            }
        }
    }

    fn in_range(&self, location: Location) -> bool {
        self.unit.location.distance_squared_to(location) <= self.unit.unit_type.sensor_radius_squared()
    }
}

impl Host for UnitView<'_> {
    fn id(&self) -> AgentId {
        self.unit.id
    }

    fn team(&self) -> Team {
        self.unit.team
    }

    fn unit_type(&self) -> UnitType {
        self.unit.unit_type
    }

    fn location(&self) -> Location {
        self.unit.location
    }

    fn round(&self) -> Round {
        self.world.round()
    }

    fn influence(&self) -> i32 {
        self.unit.influence
    }

    fn is_ready(&self) -> bool {
        self.unit.is_ready()
    }

    fn sensor_radius_squared(&self) -> i32 {
        self.unit.unit_type.sensor_radius_squared()
    }

    fn budget_remaining(&self) -> u32 {
        self.remaining.get()
    }

    fn exhausted(&self) -> bool {
        self.exhausted.get()
    }

    fn on_map(&self, location: Location) -> bool {
        self.charge(self.costs.cell_query) && self.in_range(location) && self.world.on_map(location)
    }

    fn passability(&self, location: Location) -> Option<f64> {
        if !self.charge(self.costs.cell_query) || !self.in_range(location) {
            return None;
        }
        self.world.passability(location)
    }

    fn agent_at(&self, location: Location) -> Option<SensedAgent> {
        if !self.charge(self.costs.cell_query) || !self.in_range(location) {
            return None;
        }
        self.world.unit_at(location).map(Unit::sensed)
    }

    fn sense_agent(&self, id: AgentId) -> Option<SensedAgent> {
        if !self.charge(self.costs.agent_query) {
            return None;
        }
        self.world
            .unit(id)
            .filter(|u| self.in_range(u.location))
            .map(Unit::sensed)
    }

    fn nearby_agents(&self) -> Vec<SensedAgent> {
        if !self.charge(self.costs.scan) {
            return Vec::new();
        }
        self.world
            .units()
            .filter(|u| u.id != self.unit.id && self.in_range(u.location))
            .map(Unit::sensed)
            .collect()
    }

    fn can_move(&self, direction: Direction) -> bool {
        self.charge(self.costs.cell_query) && self.world.can_move(self.unit.id, direction)
    }

    fn can_build(&self, unit_type: UnitType, direction: Direction, influence: i32) -> bool {
        self.charge(self.costs.cell_query) && self.world.can_build(self.unit.id, unit_type, direction, influence)
    }

    fn read_slot(&self, id: AgentId) -> Option<u32> {
        if !self.charge(self.costs.agent_query) {
            return None;
        }
        self.world.unit(id)?;
        self.board.read(id)
    }

    fn can_read_slot(&self, id: AgentId) -> bool {
        self.charge(self.costs.agent_query) && self.world.unit(id).is_some()
    }

    fn team_votes(&self) -> u32 {
        self.world.votes(self.unit.team)
    }
}
