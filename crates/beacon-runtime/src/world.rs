//! Grid world — terrain, units, influence and the vote auction.
//!
//! The world is the ground truth every [`UnitView`](crate::view::UnitView)
//! reads from. It validates and applies actions but never decides anything
//! on an agent's behalf.
//!
//! Each round:
//! 1. Cooldowns tick down and income is paid
//! 2. Agents act through their views
//! 3. The auction resolves and awards at most one vote

use std::collections::{BTreeMap, HashMap};

use beacon_core::error::{self, BeaconError, HostError};
use beacon_core::types::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest map side that still round-trips through 7-bit wrapped coordinates.
pub const MAX_SIDE: i32 = 64;

/// Map and economy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Map width in cells (default: 40).
    pub width: i32,
    /// Map height in cells (default: 40).
    pub height: i32,
    /// World x of the west column (default: 10000).
    pub origin_x: i32,
    /// World y of the south row (default: 10000).
    pub origin_y: i32,
    /// Lowest terrain passability (default: 0.1).
    pub min_passability: f64,
    /// Box-blur passes over the random terrain (default: 2).
    pub smoothing: usize,
    /// Rounds a slanderer pays income to its builder (default: 50).
    pub slanderer_income_rounds: Round,
    /// Influence of each team's first center (default: 150).
    pub starting_influence: i32,
    /// Neutral centers placed on the map, at most 4 (default: 2).
    pub neutral_centers: usize,
    /// Influence held by each neutral center (default: 200).
    pub neutral_influence: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            origin_x: 10_000,
            origin_y: 10_000,
            min_passability: 0.1,
            smoothing: 2,
            slanderer_income_rounds: 50,
            starting_influence: 150,
            neutral_centers: 2,
            neutral_influence: 200,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> error::Result<()> {
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if !(4..=MAX_SIDE).contains(&value) {
                return Err(BeaconError::out_of_range(field, 4.0, MAX_SIDE as f64, value as f64));
            }
        }
        if !(self.min_passability > 0.0 && self.min_passability <= 1.0) {
            return Err(BeaconError::out_of_range(
                "min_passability",
                0.0,
                1.0,
                self.min_passability,
            ));
        }
        if self.starting_influence <= 0 {
            return Err(BeaconError::invalid_config(
                "starting_influence",
                self.starting_influence.to_string(),
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Cooldown added per action before dividing by passability.
pub fn base_cooldown(unit_type: UnitType) -> f64 {
    match unit_type {
        UnitType::EnlightenmentCenter => 2.0,
        UnitType::Politician => 1.0,
        UnitType::Slanderer => 2.0,
        UnitType::Muckraker => 1.5,
    }
}

/// Income every center receives at the start of a round.
pub fn passive_income(round: Round) -> i32 {
    (0.2 * (round as f64).sqrt()).ceil() as i32
}

/// Per-round income a slanderer built with `influence` pays its builder.
pub fn slanderer_income(influence: i32) -> i32 {
    let inf = influence as f64;
    ((1.0 / 50.0 + 0.03 * (-0.001 * inf).exp()) * inf).floor() as i32
}

#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub id: AgentId,
    pub team: Team,
    pub unit_type: UnitType,
    pub location: Location,
    pub influence: i32,
    pub cooldown: f64,
    pub born: Round,
    /// The center that built this unit.
    pub parent: Option<AgentId>,
}

impl Unit {
    pub fn is_ready(&self) -> bool {
        self.cooldown < 1.0
    }

    pub fn sensed(&self) -> SensedAgent {
        SensedAgent {
            id: self.id,
            team: self.team,
            unit_type: self.unit_type,
            location: self.location,
            influence: self.influence,
        }
    }
}

/// How a round's auction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuctionResult {
    NoBids,
    Won { id: AgentId, team: Team, amount: u32 },
    /// Two or more highest bids were equal; nobody gets the vote.
    Tied { amount: u32 },
}

pub struct GridWorld {
    config: WorldConfig,
    passability: Vec<f64>,
    units: BTreeMap<AgentId, Unit>,
    occupancy: HashMap<Location, AgentId>,
    bids: Vec<(AgentId, u32)>,
    votes: HashMap<Team, u32>,
    round: Round,
    next_id: u32,
}

impl GridWorld {
    /// Build a world with mirrored random terrain and no units.
    pub fn new(config: WorldConfig, seed: u64) -> error::Result<Self> {
        config.validate()?;
        let passability = generate_terrain(&config, seed);
        Ok(Self {
            config,
            passability,
            units: BTreeMap::new(),
            occupancy: HashMap::new(),
            bids: Vec::new(),
            votes: HashMap::new(),
            round: 0,
            next_id: 10_000,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn width(&self) -> i32 {
        self.config.width
    }

    pub fn height(&self) -> i32 {
        self.config.height
    }

    fn index(&self, location: Location) -> Option<usize> {
        let x = location.x - self.config.origin_x;
        let y = location.y - self.config.origin_y;
        if x < 0 || y < 0 || x >= self.config.width || y >= self.config.height {
            return None;
        }
        Some((y * self.config.width + x) as usize)
    }

    pub fn on_map(&self, location: Location) -> bool {
        self.index(location).is_some()
    }

    pub fn passability(&self, location: Location) -> Option<f64> {
        self.index(location).map(|i| self.passability[i])
    }

    // --- Units ---

    pub fn unit(&self, id: AgentId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit_at(&self, location: Location) -> Option<&Unit> {
        self.occupancy.get(&location).and_then(|id| self.units.get(id))
    }

    /// Put a unit on a free on-map cell.
    pub fn place(
        &mut self,
        team: Team,
        unit_type: UnitType,
        location: Location,
        influence: i32,
        parent: Option<AgentId>,
    ) -> Option<AgentId> {
        if !self.on_map(location) || self.occupancy.contains_key(&location) {
            return None;
        }
        let id = AgentId(self.next_id);
        self.next_id += 1;
        self.units.insert(
            id,
            Unit {
                id,
                team,
                unit_type,
                location,
                influence,
                cooldown: 0.0,
                born: self.round,
                parent,
            },
        );
        self.occupancy.insert(location, id);
        Some(id)
    }

    /// One center per team, mirrored, plus the configured neutral centers.
    pub fn place_starting_centers(&mut self) -> error::Result<Vec<AgentId>> {
        let (w, h) = (self.config.width, self.config.height);
        let (ox, oy) = (self.config.origin_x, self.config.origin_y);
        let influence = self.config.starting_influence;

        let mut placed = Vec::new();
        for (team, x) in [(Team::A, w / 4), (Team::B, w - 1 - w / 4)] {
            let id = self
                .place(team, UnitType::EnlightenmentCenter, Location::new(ox + x, oy + h / 2), influence, None)
                .ok_or_else(|| BeaconError::invalid_config("width", w.to_string(), "no room for centers"))?;
            placed.push(id);
        }

        let spots = [(w / 2, h / 4), (w / 2, h - 1 - h / 4), (w / 2, h / 2), (w / 2, 0)];
        for &(x, y) in spots.iter().take(self.config.neutral_centers) {
            let at = Location::new(ox + x, oy + y);
            if let Some(id) = self.place(Team::Neutral, UnitType::EnlightenmentCenter, at, self.config.neutral_influence, None) {
                placed.push(id);
            }
        }
        Ok(placed)
    }

    // --- Rounds ---

    /// Advance the round counter, cool units down and pay income.
    pub fn begin_round(&mut self) {
        self.round += 1;
        let round = self.round;
        let window = self.config.slanderer_income_rounds;

        let mut payouts: Vec<(AgentId, i32)> = Vec::new();
        for unit in self.units.values_mut() {
            unit.cooldown = (unit.cooldown - 1.0).max(0.0);
            if unit.unit_type == UnitType::EnlightenmentCenter && unit.team != Team::Neutral {
                unit.influence += passive_income(round);
            }
            if unit.unit_type == UnitType::Slanderer && round.saturating_sub(unit.born) <= window {
                if let Some(parent) = unit.parent {
                    payouts.push((parent, slanderer_income(unit.influence)));
                }
            }
        }
        for (parent, amount) in payouts {
            if let Some(center) = self.units.get_mut(&parent) {
                center.influence += amount;
            }
        }
    }

    // --- Actions ---

    pub fn can_move(&self, id: AgentId, direction: Direction) -> bool {
        let Some(unit) = self.units.get(&id) else {
            return false;
        };
        let to = unit.location.add(direction);
        unit.is_ready()
            && unit.unit_type.can_move()
            && direction != Direction::Center
            && self.on_map(to)
            && !self.occupancy.contains_key(&to)
    }

    pub fn can_build(&self, id: AgentId, unit_type: UnitType, direction: Direction, influence: i32) -> bool {
        let Some(unit) = self.units.get(&id) else {
            return false;
        };
        let to = unit.location.add(direction);
        unit.is_ready()
            && unit.unit_type == UnitType::EnlightenmentCenter
            && unit.team != Team::Neutral
            && unit_type != UnitType::EnlightenmentCenter
            && influence > 0
            && influence <= unit.influence
            && direction != Direction::Center
            && self.on_map(to)
            && !self.occupancy.contains_key(&to)
    }

    fn charge_cooldown(&mut self, id: AgentId) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let pass = self.passability(unit.location).unwrap_or(1.0);
        let added = base_cooldown(unit.unit_type) / pass;
        if let Some(unit) = self.units.get_mut(&id) {
            unit.cooldown += added;
        }
    }

    pub fn move_unit(&mut self, id: AgentId, direction: Direction) -> Result<Location, HostError> {
        let unit = self.units.get(&id).ok_or(HostError::UnknownAgent(id))?;
        if !unit.is_ready() {
            return Err(HostError::NotReady(id));
        }
        if !self.can_move(id, direction) {
            return Err(HostError::MoveBlocked(id, direction));
        }
        let from = unit.location;
        let to = from.add(direction);
        self.charge_cooldown(id);
        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.location = to;
        }
        Ok(to)
    }

    pub fn build(&mut self, id: AgentId, order: BuildOrder) -> Result<AgentId, HostError> {
        let unit = self.units.get(&id).ok_or(HostError::UnknownAgent(id))?;
        if !unit.is_ready() {
            return Err(HostError::NotReady(id));
        }
        if !self.can_build(id, order.unit_type, order.direction, order.influence) {
            return Err(HostError::BuildRejected {
                id,
                unit_type: order.unit_type,
                direction: order.direction,
            });
        }
        let team = unit.team;
        let at = unit.location.add(order.direction);
        self.charge_cooldown(id);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.influence -= order.influence;
        }
        let child = self
            .place(team, order.unit_type, at, order.influence, Some(id))
            .ok_or(HostError::BuildRejected {
                id,
                unit_type: order.unit_type,
                direction: order.direction,
            })?;
        debug!(builder = %id, child = %child, unit = %order.unit_type, influence = order.influence, "unit built");
        Ok(child)
    }

    /// Register a bid for this round. A zero bid is ignored.
    pub fn place_bid(&mut self, id: AgentId, amount: u32) -> Result<(), HostError> {
        let unit = self.units.get(&id).ok_or(HostError::UnknownAgent(id))?;
        if amount as i64 > unit.influence as i64 {
            return Err(HostError::BidTooLarge {
                id,
                amount,
                available: unit.influence,
            });
        }
        if amount > 0 {
            self.bids.retain(|(bidder, _)| *bidder != id);
            self.bids.push((id, amount));
        }
        Ok(())
    }

    /// Settle the round's bids. The single highest bid wins a vote and is
    /// paid in full; every other bid costs half, rounded up. On a tie for
    /// the top every bid costs half and no vote is awarded.
    pub fn resolve_auction(&mut self) -> AuctionResult {
        let bids = std::mem::take(&mut self.bids);
        let Some(top) = bids.iter().map(|(_, amount)| *amount).max() else {
            return AuctionResult::NoBids;
        };
        let leaders: Vec<AgentId> = bids
            .iter()
            .filter(|(_, amount)| *amount == top)
            .map(|(id, _)| *id)
            .collect();
        let winner = if leaders.len() == 1 { Some(leaders[0]) } else { None };

        for (id, amount) in &bids {
            let cost = if Some(*id) == winner {
                *amount
            } else {
                amount.div_ceil(2)
            };
            if let Some(unit) = self.units.get_mut(id) {
                unit.influence -= cost as i32;
            }
        }

        match winner.and_then(|id| self.units.get(&id).map(|u| (id, u.team))) {
            Some((id, team)) => {
                *self.votes.entry(team).or_insert(0) += 1;
                AuctionResult::Won { id, team, amount: top }
            }
            None => AuctionResult::Tied { amount: top },
        }
    }

    pub fn votes(&self, team: Team) -> u32 {
        self.votes.get(&team).copied().unwrap_or(0)
    }
}

fn generate_terrain(config: &WorldConfig, seed: u64) -> Vec<f64> {
    let (w, h) = (config.width as usize, config.height as usize);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut cells: Vec<f64> = (0..w * h)
        .map(|_| rng.gen_range(config.min_passability..=1.0))
        .collect();

    for _ in 0..config.smoothing {
        let mut next = cells.clone();
        for y in 0..h {
            for x in 0..w {
                let mut sum = 0.0;
                let mut n = 0.0;
                for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                        sum += cells[ny * w + nx];
                        n += 1.0;
                    }
                }
                next[y * w + x] = sum / n;
            }
        }
        cells = next;
    }

    // Mirror left to right so both teams start on equal terrain.
    for y in 0..h {
        for x in w / 2..w {
            cells[y * w + x] = cells[y * w + (w - 1 - x)];
        }
    }
    cells
}
