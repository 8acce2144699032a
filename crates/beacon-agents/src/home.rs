//! Home controller — drives an enlightenment center.
//!
//! Each turn:
//! 1. Identifies last turn's build and starts tracking it
//! 2. Reads a rotating batch of tracked units' slots
//! 3. Folds reports into the center registry and danger picture
//! 4. Advances the production phase and refills the queue
//! 5. Builds, bids, and broadcasts a status update when not building

use beacon_core::agent::{Agent, Spawn};
use beacon_core::bidding::{BidController, BidObservation};
use beacon_core::comms::{self, expand_influence, Label, Message};
use beacon_core::danger::DangerTracker;
use beacon_core::host::{read_message, Host};
use beacon_core::id_set::IdSet;
use beacon_core::production::{BuildCost, BuildOutcome, Priority, ProductionScheduler, UnitBuild};
use beacon_core::registry::{Allegiance, EcRegistry};
use beacon_core::types::*;
use tracing::{debug, info};

use crate::config::{ControllerConfig, HomeConfig};
use crate::phase::{next_phase, refill, Phase, RefillContext};

fn type_index(unit_type: UnitType) -> usize {
    match unit_type {
        UnitType::EnlightenmentCenter => 0,
        UnitType::Politician => 1,
        UnitType::Slanderer => 2,
        UnitType::Muckraker => 3,
    }
}

pub struct HomeController {
    id: AgentId,
    team: Team,
    spawned: Round,
    config: HomeConfig,

    scheduler: ProductionScheduler,
    bidder: BidController,
    registry: EcRegistry,
    danger: DangerTracker,
    tracked: IdSet,

    /// Distance from home to the map edge, per compass heading.
    edges: [Option<i32>; 8],
    phase: Phase,
    /// Units queued so far, by type.
    queued: [usize; 4],
    acquired: bool,

    unclog: Option<AgentId>,
    unclog_queued: bool,
    /// Set when the safest heading changed and hiders must hear about it.
    new_safe_dir: bool,
    enemy_slanderers: Option<Location>,
    age: Round,
    awake: bool,
}

impl HomeController {
    pub fn new(spawn: &Spawn, config: &ControllerConfig) -> Self {
        Self {
            id: spawn.id,
            team: spawn.team,
            spawned: spawn.round,
            config: config.home.clone(),
            scheduler: ProductionScheduler::new(config.production.clone()),
            bidder: BidController::new(config.bidding.clone(), spawn.seed),
            registry: EcRegistry::new(),
            danger: DangerTracker::new(),
            tracked: IdSet::new(),
            edges: [None; 8],
            phase: Phase::Opening,
            queued: [0; 4],
            acquired: false,
            unclog: None,
            unclog_queued: false,
            new_safe_dir: false,
            enemy_slanderers: None,
            age: 0,
            awake: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &EcRegistry {
        &self.registry
    }

    pub fn danger(&self) -> &DangerTracker {
        &self.danger
    }

    pub fn tracked(&self) -> &IdSet {
        &self.tracked
    }

    pub fn scheduler(&self) -> &ProductionScheduler {
        &self.scheduler
    }

    pub fn bidder(&self) -> &BidController {
        &self.bidder
    }

    pub fn queued(&self, unit_type: UnitType) -> usize {
        self.queued[type_index(unit_type)]
    }

    /// Known edge distance in `direction`, from scout reports.
    pub fn edge(&self, direction: Direction) -> Option<i32> {
        match direction {
            Direction::Center => None,
            d => self.edges[d.ordinal() as usize],
        }
    }

    fn queue(&mut self, item: UnitBuild, level: Priority) {
        self.queued[type_index(item.unit_type)] += 1;
        self.scheduler.push(item, level);
    }

    // --- First turn ---

    fn awaken(&mut self, host: &dyn Host) {
        let here = host.location();
        for agent in host.nearby_agents() {
            if agent.unit_type == UnitType::EnlightenmentCenter {
                let allegiance = Allegiance::of(agent.team, self.team);
                self.registry.upsert(agent.location, allegiance, Some(agent.influence));
            }
        }
        if host.exhausted() {
            return;
        }
        self.awake = true;
        self.acquired = self.spawned > self.config.starting_rounds;
        if self.acquired {
            info!(id = %self.id, %here, "center acquired mid-match");
            return;
        }

        let hide = Message::located(Label::EcUpdate, here, Direction::Center.ordinal() as u32);
        let cost = BuildCost::Ladder { significance: 0.9, floor: 130 };
        self.queue(UnitBuild::new(UnitType::Slanderer, cost, hide), Priority::High);
        for direction in Direction::COMPASS {
            let scout = Message::with_direction(Label::Scout, direction);
            self.queue(UnitBuild::new(UnitType::Muckraker, BuildCost::Fixed(1), scout), Priority::Medium);
        }
    }

    // --- Listening ---

    fn identify_last_build(&mut self, host: &dyn Host) {
        let Some((id, message)) = self.scheduler.take_last_built(host) else {
            return;
        };
        if message.label() == Label::Unclog {
            self.unclog = Some(id);
            self.unclog_queued = false;
        }
        self.tracked.insert(id);
    }

    fn listen(&mut self, host: &dyn Host, nearby: &[SensedAgent]) {
        for agent in nearby {
            if agent.team == self.team && agent.unit_type != UnitType::EnlightenmentCenter {
                self.tracked.insert(agent.id);
            }
        }

        for id in self.tracked.next_batch(self.config.slots_per_turn) {
            if !host.can_read_slot(id) {
                if host.exhausted() {
                    break;
                }
                self.tracked.remove(id);
                continue;
            }
            if let Some(message) = read_message(host, id) {
                self.handle(host, message);
            }
        }
    }

    fn handle(&mut self, host: &dyn Host, message: Message) {
        let here = host.location();
        match message.label() {
            Label::EnemyEc | Label::NeutralEc | Label::OurEc => {
                let Some(location) = message.location(here) else {
                    return;
                };
                let allegiance = match message.label() {
                    Label::EnemyEc => Allegiance::Enemy,
                    Label::NeutralEc => Allegiance::Neutral,
                    _ => Allegiance::Ours,
                };
                let influence = message.field(2).map(expand_influence);
                if self.registry.upsert(location, allegiance, influence) {
                    debug!(%location, ?allegiance, "center reported");
                }
            }
            Label::DangerInfo => {
                let (Some(location), Some(count)) = (message.location(here), message.field(2)) else {
                    return;
                };
                if here.distance_squared_to(location) <= self.config.danger_ignore_radius_squared {
                    return;
                }
                if self.danger.report_at(here, location, count, host.round()) {
                    self.new_safe_dir = true;
                }
            }
            Label::SlanderersSeen => {
                self.enemy_slanderers = message.location(here);
            }
            Label::SafeDirEdge => {
                let edge = message.field(1).and_then(Direction::from_ordinal);
                let (Some(edge), Some(offset)) = (edge, message.field(2)) else {
                    return;
                };
                let slot = &mut self.edges[edge.ordinal() as usize];
                let offset = offset as i32;
                if slot.map_or(true, |known| offset < known) {
                    *slot = Some(offset);
                }
            }
            _ => {}
        }
    }

    // --- Production ---

    fn queue_unclog(&mut self, host: &dyn Host) {
        let alive = self.unclog.is_some_and(|id| host.can_read_slot(id));
        if alive || self.unclog_queued || host.exhausted() {
            return;
        }
        let cost = BuildCost::Share { significance: 0.15, floor: 20 };
        self.queue(
            UnitBuild::new(UnitType::Politician, cost, Message::bare(Label::Unclog)),
            Priority::High,
        );
        self.unclog_queued = true;
    }

    fn refill(&mut self, host: &dyn Host) {
        let here = host.location();
        let influence = host.influence();
        let reserve = self.scheduler.reserve_floor(host.round());
        let margin = self.config.capture_margin;
        let capture = self
            .registry
            .best_neutral(here, influence, reserve)
            .filter(|entry| entry.influence.unwrap_or(0) + margin < influence)
            .copied();
        let enemy = self
            .registry
            .closest(here, Allegiance::Enemy)
            .map(|entry| entry.location);
        let ctx = RefillContext {
            influence,
            capture,
            enemy,
            update: self.update_message(here),
        };
        for (item, level) in refill(self.phase, &ctx, &self.config) {
            self.queue(item, level);
        }
        debug!(phase = self.phase.name(), queued = self.scheduler.queue().len(), "queue refilled");
    }

    /// Slanderers built next to an enemy muckraker die on arrival.
    fn drop_exposed_slanderers(&mut self, nearby: &[SensedAgent]) {
        let threatened = nearby
            .iter()
            .any(|a| a.team != self.team && a.team != Team::Neutral && a.unit_type == UnitType::Muckraker);
        if !threatened {
            return;
        }
        while self
            .scheduler
            .queue()
            .peek()
            .is_some_and(|item| item.unit_type == UnitType::Slanderer)
        {
            self.scheduler.discard_front();
            debug!("dropped slanderer build, muckraker nearby");
        }
    }

    // --- Broadcasting ---

    /// Heading hiders should take, falling back to the nearest known edge.
    fn safe_direction(&self) -> Direction {
        let away = self.danger.safest_direction();
        if away != Direction::Center {
            return away;
        }
        Direction::COMPASS
            .iter()
            .filter_map(|d| self.edges[d.ordinal() as usize].map(|offset| (offset, *d)))
            .min_by_key(|(offset, _)| *offset)
            .map_or(Direction::Center, |(_, d)| d)
    }

    fn update_message(&mut self, here: Location) -> Message {
        let location = self.registry.next_broadcast(here);
        Message::located(Label::EcUpdate, location, self.safe_direction().ordinal() as u32)
    }

    fn status_flag(&mut self, here: Location) -> u32 {
        let message = match self.enemy_slanderers.take() {
            Some(location) => Message::with_location(Label::SlanderersSeen, location),
            None => {
                self.new_safe_dir = false;
                self.update_message(here)
            }
        };
        comms::encode_or(&message, Label::Explore)
    }
}

impl Agent for HomeController {
    fn id(&self) -> AgentId {
        self.id
    }

    fn unit_type(&self) -> UnitType {
        UnitType::EnlightenmentCenter
    }

    fn take_turn(&mut self, host: &dyn Host) -> Vec<AgentAction> {
        self.age += 1;
        if !self.awake {
            self.awaken(host);
        }
        let here = host.location();
        let nearby = host.nearby_agents();

        self.identify_last_build(host);
        self.listen(host, &nearby);

        let phase = next_phase(self.queued(UnitType::Slanderer), self.acquired, &self.config);
        if phase != self.phase {
            info!(id = %self.id, from = self.phase.name(), to = phase.name(), "phase change");
            self.phase = phase;
        }
        if self.phase != Phase::Opening {
            self.queue_unclog(host);
        }
        if self.scheduler.queue().is_empty() {
            self.refill(host);
        }
        self.drop_exposed_slanderers(&nearby);

        let mut actions = Vec::new();
        let mut spent = 0;
        if !self.new_safe_dir {
            let outcome = self.scheduler.try_build(host);
            match &outcome {
                BuildOutcome::Built { order, .. } => spent = order.influence,
                BuildOutcome::Infeasible(reason) => debug!(?reason, "front build deferred"),
                BuildOutcome::Idle => {}
            }
            actions.extend(outcome.actions());
        }
        if actions.is_empty() {
            actions.push(AgentAction::Broadcast(self.status_flag(here)));
        }

        let observation = BidObservation {
            round: host.round(),
            influence: host.influence() - spent,
            team_votes: host.team_votes(),
            reserve: self.scheduler.reserve_floor(host.round()),
        };
        let bid = self.bidder.bid(&observation);
        if bid > 0 {
            actions.push(AgentAction::Bid(bid));
        }
        actions
    }

    fn age(&self) -> Round {
        self.age
    }
}
