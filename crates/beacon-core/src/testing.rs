//! A scriptable in-memory host for unit tests.

use crate::host::Host;
use crate::types::*;
use std::collections::HashMap;

pub struct FakeHost {
    pub id: AgentId,
    pub team: Team,
    pub unit_type: UnitType,
    pub location: Location,
    pub round: Round,
    pub influence: i32,
    pub ready: bool,
    pub votes: u32,
    /// Map spans `0..w` by `0..h`; `None` means no edges at all.
    pub bounds: Option<(i32, i32)>,
    pub passability: HashMap<Location, f64>,
    pub agents: Vec<SensedAgent>,
    pub slots: HashMap<AgentId, u32>,
    /// Out of budget: every query comes back empty.
    pub starved: bool,
}

impl FakeHost {
    pub fn unbounded() -> Self {
        Self {
            id: AgentId(1),
            team: Team::A,
            unit_type: UnitType::Politician,
            location: Location::new(0, 0),
            round: 1,
            influence: 0,
            ready: true,
            votes: 0,
            bounds: None,
            passability: HashMap::new(),
            agents: Vec::new(),
            slots: HashMap::new(),
            starved: false,
        }
    }

    pub fn open(width: i32, height: i32) -> Self {
        Self {
            bounds: Some((width, height)),
            location: Location::new(width / 2, height / 2),
            ..Self::unbounded()
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn as_unit(mut self, unit_type: UnitType) -> Self {
        self.unit_type = unit_type;
        self
    }

    pub fn with_influence(mut self, influence: i32) -> Self {
        self.influence = influence;
        self
    }

    pub fn with_round(mut self, round: Round) -> Self {
        self.round = round;
        self
    }

    pub fn with_passability(mut self, location: Location, passability: f64) -> Self {
        self.passability.insert(location, passability);
        self
    }

    pub fn with_agent(mut self, id: u32, team: Team, unit_type: UnitType, location: Location) -> Self {
        self.agents.push(SensedAgent {
            id: AgentId(id),
            team,
            unit_type,
            location,
            influence: 1,
        });
        self
    }

    pub fn with_slot(mut self, id: u32, flag: u32) -> Self {
        self.slots.insert(AgentId(id), flag);
        self
    }

    pub fn starved(mut self) -> Self {
        self.starved = true;
        self
    }

    fn in_bounds(&self, location: Location) -> bool {
        match self.bounds {
            Some((w, h)) => location.x >= 0 && location.y >= 0 && location.x < w && location.y < h,
            None => true,
        }
    }

    fn sensed(&self, location: Location) -> bool {
        !self.starved && self.location.distance_squared_to(location) <= self.sensor_radius_squared()
    }
}

impl Host for FakeHost {
    fn id(&self) -> AgentId {
        self.id
    }

    fn team(&self) -> Team {
        self.team
    }

    fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    fn location(&self) -> Location {
        self.location
    }

    fn round(&self) -> Round {
        self.round
    }

    fn influence(&self) -> i32 {
        self.influence
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn sensor_radius_squared(&self) -> i32 {
        self.unit_type.sensor_radius_squared()
    }

    fn budget_remaining(&self) -> u32 {
        if self.starved {
            0
        } else {
            u32::MAX
        }
    }

    fn exhausted(&self) -> bool {
        self.starved
    }

    fn on_map(&self, location: Location) -> bool {
        self.sensed(location) && self.in_bounds(location)
    }

    fn passability(&self, location: Location) -> Option<f64> {
        if !self.on_map(location) {
            return None;
        }
        Some(self.passability.get(&location).copied().unwrap_or(1.0))
    }

    fn agent_at(&self, location: Location) -> Option<SensedAgent> {
        if !self.sensed(location) {
            return None;
        }
        self.agents.iter().find(|a| a.location == location).copied()
    }

    fn sense_agent(&self, id: AgentId) -> Option<SensedAgent> {
        self.agents
            .iter()
            .find(|a| a.id == id && self.sensed(a.location))
            .copied()
    }

    fn nearby_agents(&self) -> Vec<SensedAgent> {
        self.agents
            .iter()
            .filter(|a| self.sensed(a.location))
            .copied()
            .collect()
    }

    fn can_move(&self, direction: Direction) -> bool {
        let to = self.location.add(direction);
        self.ready
            && self.unit_type.can_move()
            && direction != Direction::Center
            && self.on_map(to)
            && !self.is_occupied(to)
    }

    fn can_build(&self, unit_type: UnitType, direction: Direction, influence: i32) -> bool {
        let to = self.location.add(direction);
        self.ready
            && self.unit_type == UnitType::EnlightenmentCenter
            && unit_type != UnitType::EnlightenmentCenter
            && influence > 0
            && influence <= self.influence
            && direction != Direction::Center
            && self.on_map(to)
            && !self.is_occupied(to)
    }

    fn read_slot(&self, id: AgentId) -> Option<u32> {
        if self.starved {
            return None;
        }
        self.agents.iter().find(|a| a.id == id || id == self.id)?;
        self.slots.get(&id).copied().filter(|flag| *flag != 0)
    }

    fn can_read_slot(&self, id: AgentId) -> bool {
        !self.starved && (id == self.id || self.agents.iter().any(|a| a.id == id))
    }

    fn team_votes(&self) -> u32 {
        self.votes
    }
}
