//! Unit controller — drives politicians, slanderers and muckrakers.
//!
//! A unit reads its assignment from its home's slot on the first turn and
//! turns it into a [`Role`]. Each turn it:
//! 1. Re-evaluates the role against what it senses
//! 2. Steers the navigator toward the role's goal
//! 3. Reports the most important thing it knows through its own slot
//!
//! Slanderers never step toward an enemy muckraker.

use std::collections::HashMap;

use beacon_core::agent::{Agent, Spawn};
use beacon_core::comms::{self, compress_influence, Label, Message};
use beacon_core::exploration::ExplorationMemory;
use beacon_core::host::{read_message, Host};
use beacon_core::nav::{AbandonReason, DangerMask, NavGoal, NavStep, Navigator};
use beacon_core::types::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ControllerConfig, UnitConfig};

/// Largest enemy count a danger report carries.
const MAX_DANGER_COUNT: usize = 31;

/// What a unit is currently trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Head one way until the edge, then explore.
    Scout(Direction),
    Explore,
    /// Head for safety; `Center` hovers near home.
    Hide { safe: Direction },
    /// Run from sensed enemy muckrakers.
    Flee,
    Attack(Location),
    Defend(Direction),
    /// Loiter near home.
    Hover,
}

impl Role {
    /// Status message broadcast when there is nothing to report.
    pub fn status(self, here: Location) -> Message {
        match self {
            Role::Scout(d) => Message::with_direction(Label::Scout, d),
            Role::Explore => Message::bare(Label::Explore),
            Role::Hide { .. } | Role::Hover => Message::bare(Label::Hide),
            Role::Flee => Message::bare(Label::Flee),
            Role::Attack(target) if target == here => Message::bare(Label::CurrentlyDefending),
            Role::Attack(target) => Message::with_location(Label::AttackLoc, target),
            Role::Defend(d) => Message::with_direction(Label::Defend, d),
        }
    }
}

fn default_role(unit_type: UnitType) -> Role {
    match unit_type {
        UnitType::Slanderer => Role::Hide { safe: Direction::Center },
        _ => Role::Explore,
    }
}

/// Role for a unit given the instruction it was built with.
pub fn role_for(unit_type: UnitType, assignment: Option<&Message>, here: Location) -> Role {
    let Some(message) = assignment else {
        return default_role(unit_type);
    };
    match message.label() {
        Label::Scout => message.direction().map_or(Role::Explore, Role::Scout),
        Label::Explore | Label::Unclog => Role::Explore,
        Label::AttackLoc | Label::CaptureNeutralEc => {
            message.location(here).map_or(Role::Explore, Role::Attack)
        }
        Label::EcUpdate | Label::Hide if unit_type == UnitType::Slanderer => Role::Hide {
            safe: message
                .field(2)
                .and_then(Direction::from_ordinal)
                .unwrap_or(Direction::Center),
        },
        Label::Flee => Role::Flee,
        Label::SafeDirEdge | Label::Defend => message.direction().map_or(Role::Explore, Role::Defend),
        Label::Buff | Label::CurrentlyDefending => Role::Hover,
        _ => default_role(unit_type),
    }
}

pub struct UnitController {
    id: AgentId,
    team: Team,
    unit_type: UnitType,
    spawned_at: Location,
    config: UnitConfig,

    home: Option<(AgentId, Location)>,
    assignment: Option<Message>,
    role: Role,
    hover: Option<Location>,
    navigator: Navigator,

    /// Centers already reported, with the team they had then.
    seen_centers: HashMap<Location, Team>,
    pending: Option<Message>,
    rng: SmallRng,
    age: Round,
    awake: bool,
}

impl UnitController {
    pub fn new(spawn: &Spawn, config: &ControllerConfig) -> Self {
        let memory = ExplorationMemory::new(spawn.location, &config.exploration, spawn.seed);
        Self {
            id: spawn.id,
            team: spawn.team,
            unit_type: spawn.unit_type,
            spawned_at: spawn.location,
            config: config.unit.clone(),
            home: None,
            assignment: None,
            role: default_role(spawn.unit_type),
            hover: None,
            navigator: Navigator::new(memory, config.nav.clone()),
            seen_centers: HashMap::new(),
            pending: None,
            rng: SmallRng::seed_from_u64(spawn.seed.rotate_left(17)),
            age: 0,
            awake: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn home(&self) -> Option<(AgentId, Location)> {
        self.home
    }

    pub fn assignment(&self) -> Option<Message> {
        self.assignment
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    fn set_role(&mut self, role: Role) {
        if role != self.role {
            debug!(id = %self.id, from = ?self.role, to = ?role, "role change");
            self.role = role;
        }
    }

    fn is_threat(&self, agent: &SensedAgent) -> bool {
        agent.team != self.team && agent.team != Team::Neutral && agent.unit_type == UnitType::Muckraker
    }

    // --- First turn ---

    fn awaken(&mut self, host: &dyn Host, nearby: &[SensedAgent]) {
        self.home = nearby
            .iter()
            .filter(|a| a.team == self.team && a.unit_type == UnitType::EnlightenmentCenter)
            .filter(|a| a.location.is_adjacent_to(self.spawned_at))
            .min_by_key(|a| a.location.distance_squared_to(self.spawned_at))
            .map(|a| (a.id, a.location));
        self.assignment = self.home.and_then(|(id, _)| read_message(host, id));
        if host.exhausted() {
            return;
        }
        self.awake = true;
        self.role = role_for(self.unit_type, self.assignment.as_ref(), host.location());
        debug!(id = %self.id, role = ?self.role, assignment = ?self.assignment, "assigned");
    }

    // --- Role upkeep ---

    fn update_role(&mut self, host: &dyn Host, threats: &[Location]) {
        if self.unit_type != UnitType::Slanderer {
            return;
        }
        if !threats.is_empty() {
            self.set_role(Role::Flee);
            return;
        }
        let update = self
            .home
            .and_then(|(id, _)| read_message(host, id))
            .filter(|m| m.label() == Label::EcUpdate);
        let heard = update
            .and_then(|m| m.field(2))
            .map(|f| Direction::from_ordinal(f).unwrap_or(Direction::Center));
        match (self.role, heard) {
            (Role::Flee, safe) => self.set_role(Role::Hide { safe: safe.unwrap_or(Direction::Center) }),
            (Role::Hide { .. } | Role::Hover, Some(safe)) => self.set_role(Role::Hide { safe }),
            _ => {}
        }
    }

    fn hover_point(&mut self, here: Location) -> Location {
        if let Some(point) = self.hover {
            return point;
        }
        let r = self.config.hover_radius;
        let center = self.home.map_or(here, |(_, location)| location);
        let point = center.translate(self.rng.gen_range(-r..=r), self.rng.gen_range(-r..=r));
        self.hover = Some(point);
        point
    }

    fn steer(&mut self, here: Location, threats: &[Location]) {
        let role = self.role;
        let goal = match role {
            Role::Scout(d) | Role::Defend(d) | Role::Hide { safe: d } if d != Direction::Center => {
                NavGoal::GoInDirection(d)
            }
            Role::Explore => NavGoal::Explore,
            Role::Attack(target) => NavGoal::GoTo(target),
            Role::Flee => {
                let closest = threats.iter().min_by_key(|t| here.distance_squared_to(**t));
                match closest {
                    Some(threat) => NavGoal::GoInDirection(here.direction_to(*threat).opposite()),
                    None => NavGoal::GoTo(self.hover_point(here)),
                }
            }
            _ => NavGoal::GoTo(self.hover_point(here)),
        };
        self.navigator.set_goal(goal, here);
    }

    fn on_abandon(&mut self, host: &dyn Host, reason: AbandonReason) {
        match self.role {
            Role::Scout(heading) => {
                self.pending = self.edge_report(host, heading);
                self.set_role(Role::Explore);
            }
            Role::Explore if reason == AbandonReason::Exhausted => self.set_role(Role::Hover),
            Role::Attack(target) if reason == AbandonReason::AdjacentBlocked => {
                debug!(id = %self.id, %target, "target surrounded");
                self.set_role(Role::Explore);
            }
            Role::Attack(_) | Role::Defend(_) => self.set_role(Role::Explore),
            Role::Hover | Role::Hide { safe: Direction::Center } => self.hover = None,
            _ => {}
        }
    }

    /// Which map edge a scout stopped at, and how far it is from home.
    fn edge_report(&self, host: &dyn Host, heading: Direction) -> Option<Message> {
        let here = host.location();
        let home = self.home.map_or(self.spawned_at, |(_, location)| location);
        let edge = [Direction::North, Direction::East, Direction::South, Direction::West]
            .into_iter()
            .find(|d| !host.on_map(here.add(*d)))?;
        let offset = match edge {
            Direction::North | Direction::South => (here.y - home.y).abs(),
            _ => (here.x - home.x).abs(),
        };
        let offset = offset.min(self.config.max_edge_report) as u32;
        Some(Message::new(
            Label::SafeDirEdge,
            &[heading.ordinal() as u32, edge.ordinal() as u32, offset],
        ))
    }

    // --- Reporting ---

    fn sight_centers(&mut self, nearby: &[SensedAgent]) {
        for center in nearby.iter().filter(|a| a.unit_type == UnitType::EnlightenmentCenter) {
            if self.seen_centers.get(&center.location) == Some(&center.team) {
                continue;
            }
            self.seen_centers.insert(center.location, center.team);
            let code = compress_influence(center.influence);
            let message = if center.team == Team::Neutral {
                Message::located(Label::NeutralEc, center.location, code)
            } else if center.team == self.team {
                Message::with_location(Label::OurEc, center.location)
            } else {
                if self.unit_type == UnitType::Muckraker && matches!(self.role, Role::Explore | Role::Hover) {
                    self.set_role(Role::Attack(center.location));
                }
                Message::located(Label::EnemyEc, center.location, code)
            };
            if self.pending.is_none() {
                self.pending = Some(message);
            }
        }
    }

    fn report(&mut self, here: Location, nearby: &[SensedAgent], threats: &[Location]) -> Message {
        if let Some(message) = self.pending.take() {
            return message;
        }
        let home = self.home.map_or(here, |(_, location)| location);
        if let Some(closest) = threats.iter().min_by_key(|t| home.distance_squared_to(**t)) {
            let count = threats.len().min(MAX_DANGER_COUNT) as u32;
            return Message::located(Label::DangerInfo, *closest, count);
        }
        let slanderer = nearby
            .iter()
            .find(|a| a.team != self.team && a.team != Team::Neutral && a.unit_type == UnitType::Slanderer);
        if let Some(enemy) = slanderer {
            return Message::with_location(Label::SlanderersSeen, enemy.location);
        }
        self.role.status(here)
    }
}

impl Agent for UnitController {
    fn id(&self) -> AgentId {
        self.id
    }

    fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    fn take_turn(&mut self, host: &dyn Host) -> Vec<AgentAction> {
        self.age += 1;
        let here = host.location();
        let nearby = host.nearby_agents();
        if !self.awake {
            self.awaken(host, &nearby);
        }

        let threats: Vec<Location> = nearby
            .iter()
            .filter(|a| self.is_threat(a))
            .map(|a| a.location)
            .collect();
        self.sight_centers(&nearby);
        self.update_role(host, &threats);
        self.steer(here, &threats);

        let mask = match self.unit_type {
            UnitType::Slanderer => DangerMask::toward_threats(here, threats.iter().copied()),
            _ => DangerMask::EMPTY,
        };
        let step = self.navigator.tick(host, mask);
        if let NavStep::Abandoned(reason) = step {
            self.on_abandon(host, reason);
        }

        let report = self.report(here, &nearby, &threats);
        let mut actions = vec![AgentAction::Broadcast(comms::encode_or(&report, Label::Explore))];
        if let NavStep::Move(direction) = step {
            actions.push(AgentAction::Move(direction));
        }
        actions
    }

    fn age(&self) -> Round {
        self.age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERE: Location = Location::new(20, 20);

    #[test]
    fn scouts_take_their_heading() {
        let message = Message::with_direction(Label::Scout, Direction::West);
        assert_eq!(
            role_for(UnitType::Muckraker, Some(&message), HERE),
            Role::Scout(Direction::West)
        );
    }

    #[test]
    fn slanderers_hide_where_home_says() {
        let message = Message::located(Label::EcUpdate, HERE, Direction::South.ordinal() as u32);
        assert_eq!(
            role_for(UnitType::Slanderer, Some(&message), HERE),
            Role::Hide { safe: Direction::South }
        );
        let hover = Message::located(Label::EcUpdate, HERE, Direction::Center.ordinal() as u32);
        assert_eq!(
            role_for(UnitType::Slanderer, Some(&hover), HERE),
            Role::Hide { safe: Direction::Center }
        );
        assert_eq!(role_for(UnitType::Politician, Some(&message), HERE), Role::Explore);
    }

    #[test]
    fn located_orders_resolve_near_the_unit() {
        let target = Location::new(150, 140);
        let message = Message::with_location(Label::CaptureNeutralEc, target);
        assert_eq!(
            role_for(UnitType::Politician, Some(&message), Location::new(140, 140)),
            Role::Attack(target)
        );
    }

    #[test]
    fn missing_assignment_uses_defaults() {
        assert_eq!(role_for(UnitType::Muckraker, None, HERE), Role::Explore);
        assert_eq!(
            role_for(UnitType::Slanderer, None, HERE),
            Role::Hide { safe: Direction::Center }
        );
    }

    #[test]
    fn status_names_the_role() {
        assert_eq!(Role::Hover.status(HERE).label(), Label::Hide);
        assert_eq!(Role::Attack(HERE).status(HERE).label(), Label::CurrentlyDefending);
        assert_eq!(
            Role::Attack(Location::new(3, 3)).status(HERE).label(),
            Label::AttackLoc
        );
    }
}
