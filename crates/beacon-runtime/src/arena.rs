//! Arena — match lifecycle and the round loop.
//!
//! The arena owns the world, the broadcast board and one controller per
//! unit. Controllers for units built during a round are created through
//! the [`AgentFactory`] and act from the next round on.
//!
//! Each round:
//! 1. The world advances (cooldowns, income)
//! 2. Every controller takes its turn against its own [`UnitView`]
//! 3. Actions are applied in the order the controller returned them
//! 4. The auction resolves and the board commits this round's writes
//! 5. Controllers for newborn units are created

use beacon_core::agent::{Agent, AgentFactory, Spawn};
use beacon_core::comms;
use beacon_core::error::{self, BeaconError};
use beacon_core::host::Host;
use beacon_core::types::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::BroadcastBoard;
use crate::view::{BudgetConfig, UnitView};
use crate::world::{AuctionResult, GridWorld, WorldConfig};

/// Event emitted by the arena during a match.
#[derive(Debug, Clone, Serialize)]
pub enum ArenaEvent {
    /// A unit entered the world.
    Spawned { id: AgentId, team: Team, unit_type: UnitType, location: Location },
    Moved { id: AgentId, to: Location },
    Built { builder: AgentId, id: AgentId, unit_type: UnitType, influence: i32 },
    Broadcast { id: AgentId, flag: u32 },
    Bid { id: AgentId, amount: u32 },
    /// The world refused an action.
    Rejected { id: AgentId, reason: String },
    /// A controller ran out of computation; its actions were dropped.
    BudgetExceeded { id: AgentId, dropped: usize },
    Auction(AuctionResult),
    RoundComplete { round: Round, units: usize, votes_a: u32, votes_b: u32 },
}

/// Running totals for a match.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArenaStats {
    pub round: Round,
    pub units_alive: usize,
    pub total_spawned: usize,
    pub moves: usize,
    pub builds: usize,
    pub broadcasts: usize,
    pub bids: usize,
    pub rejected: usize,
    pub budget_overruns: usize,
    pub votes_a: u32,
    pub votes_b: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitSnapshot {
    pub id: AgentId,
    pub team: Team,
    pub unit_type: UnitType,
    pub location: Location,
    pub influence: i32,
    pub controlled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotSnapshot {
    pub id: AgentId,
    pub flag: u32,
    /// Decoded label name, if the flag is a valid message.
    pub label: Option<String>,
}

/// A complete serializable snapshot of the arena at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ArenaSnapshot {
    pub round: Round,
    pub width: i32,
    pub height: i32,
    pub units: Vec<UnitSnapshot>,
    pub slots: Vec<SlotSnapshot>,
    pub stats: ArenaStats,
}

/// Configuration for a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Rounds in a match (default: 1500).
    pub rounds: Round,
    /// Seed for terrain and per-agent randomness (default: 42).
    pub seed: u64,
    /// Keep every event for later inspection (default: false).
    pub keep_history: bool,
    pub world: WorldConfig,
    pub budget: BudgetConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            rounds: 1500,
            seed: 42,
            keep_history: false,
            world: WorldConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

struct Controlled {
    id: AgentId,
    agent: Box<dyn Agent>,
}

pub struct Arena {
    config: ArenaConfig,
    world: GridWorld,
    board: BroadcastBoard,
    controllers: Vec<Controlled>,
    factory: Box<dyn AgentFactory>,
    stats: ArenaStats,
    event_history: Vec<(Round, ArenaEvent)>,
}

impl Arena {
    /// Create the world, place the starting centers and start their controllers.
    pub fn new(config: ArenaConfig, factory: Box<dyn AgentFactory>) -> error::Result<Self> {
        if config.rounds == 0 {
            return Err(BeaconError::invalid_config("rounds", "0", "a match needs at least one round"));
        }
        let mut world = GridWorld::new(config.world.clone(), config.seed)?;
        let placed = world.place_starting_centers()?;

        let mut arena = Self {
            config,
            world,
            board: BroadcastBoard::new(),
            controllers: Vec::new(),
            factory,
            stats: ArenaStats::default(),
            event_history: Vec::new(),
        };
        let mut events = Vec::new();
        for id in placed {
            arena.adopt(id, &mut events);
        }
        arena.record(events);
        arena.refresh_stats();
        Ok(arena)
    }

    fn agent_seed(&self, id: AgentId) -> u64 {
        self.config.seed ^ (id.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Start a controller for a unit that just entered the world.
    fn adopt(&mut self, id: AgentId, events: &mut Vec<ArenaEvent>) {
        let Some(unit) = self.world.unit(id) else {
            return;
        };
        let spawn = Spawn {
            id,
            team: unit.team,
            unit_type: unit.unit_type,
            location: unit.location,
            round: self.world.round(),
            seed: self.agent_seed(id),
        };
        self.stats.total_spawned += 1;
        events.push(ArenaEvent::Spawned {
            id,
            team: spawn.team,
            unit_type: spawn.unit_type,
            location: spawn.location,
        });
        if let Some(agent) = self.factory.create(&spawn) {
            self.controllers.push(Controlled { id, agent });
        }
    }

    fn record(&mut self, events: Vec<ArenaEvent>) {
        if self.config.keep_history {
            let round = self.world.round();
            self.event_history.extend(events.into_iter().map(|e| (round, e)));
        }
    }

    fn refresh_stats(&mut self) {
        self.stats.round = self.world.round();
        self.stats.units_alive = self.world.unit_count();
        self.stats.votes_a = self.world.votes(Team::A);
        self.stats.votes_b = self.world.votes(Team::B);
    }

    /// Run a single round.
    pub fn tick(&mut self) -> Vec<ArenaEvent> {
        let mut events = Vec::new();
        let mut births = Vec::new();
        self.world.begin_round();

        for i in 0..self.controllers.len() {
            let id = self.controllers[i].id;
            let Some(unit) = self.world.unit(id) else {
                continue;
            };
            let view = UnitView::new(&self.world, &self.board, unit, &self.config.budget);
            let actions = self.controllers[i].agent.take_turn(&view);
            if view.exhausted() {
                warn!(agent = %id, spent = view.spent(), dropped = actions.len(), "turn over budget, actions dropped");
                self.stats.budget_overruns += 1;
                events.push(ArenaEvent::BudgetExceeded {
                    id,
                    dropped: actions.len(),
                });
                continue;
            }
            for action in actions {
                self.apply(id, action, &mut events, &mut births);
            }
        }

        let auction = self.world.resolve_auction();
        if let AuctionResult::Won { team, amount, .. } = auction {
            debug!(round = self.world.round(), ?team, amount, "vote awarded");
        }
        events.push(ArenaEvent::Auction(auction));
        self.board.commit();

        for id in births {
            self.adopt(id, &mut events);
        }

        self.refresh_stats();
        events.push(ArenaEvent::RoundComplete {
            round: self.stats.round,
            units: self.stats.units_alive,
            votes_a: self.stats.votes_a,
            votes_b: self.stats.votes_b,
        });
        self.record(events.clone());
        events
    }

    fn apply(&mut self, id: AgentId, action: AgentAction, events: &mut Vec<ArenaEvent>, births: &mut Vec<AgentId>) {
        let result = match action {
            AgentAction::Move(direction) => self.world.move_unit(id, direction).map(|to| {
                self.stats.moves += 1;
                events.push(ArenaEvent::Moved { id, to });
            }),
            AgentAction::Build(order) => self.world.build(id, order).map(|child| {
                self.stats.builds += 1;
                births.push(child);
                events.push(ArenaEvent::Built {
                    builder: id,
                    id: child,
                    unit_type: order.unit_type,
                    influence: order.influence,
                });
            }),
            AgentAction::Broadcast(flag) => self.board.write(id, flag).map(|()| {
                self.stats.broadcasts += 1;
                events.push(ArenaEvent::Broadcast { id, flag });
            }),
            AgentAction::Bid(amount) => self.world.place_bid(id, amount).map(|()| {
                self.stats.bids += 1;
                events.push(ArenaEvent::Bid { id, amount });
            }),
        };
        if let Err(err) = result {
            debug!(agent = %id, error = %err, "action rejected");
            self.stats.rejected += 1;
            events.push(ArenaEvent::Rejected {
                id,
                reason: err.to_string(),
            });
        }
    }

    /// Run the simulation for N rounds.
    pub fn run(&mut self, rounds: Round) -> Vec<Vec<ArenaEvent>> {
        let mut all_events = Vec::new();
        for _ in 0..rounds {
            all_events.push(self.tick());
        }
        all_events
    }

    /// Play out the remaining rounds of the match and report the winner.
    pub fn run_to_end(&mut self) -> Option<Team> {
        while self.world.round() < self.config.rounds {
            self.tick();
        }
        let winner = self.winner();
        info!(
            rounds = self.world.round(),
            votes_a = self.stats.votes_a,
            votes_b = self.stats.votes_b,
            ?winner,
            "match finished"
        );
        winner
    }

    /// Team with more votes, if any.
    pub fn winner(&self) -> Option<Team> {
        let (a, b) = (self.world.votes(Team::A), self.world.votes(Team::B));
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Some(Team::A),
            std::cmp::Ordering::Less => Some(Team::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.world.round() >= self.config.rounds
    }

    pub fn stats(&self) -> ArenaStats {
        self.stats.clone()
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn board(&self) -> &BroadcastBoard {
        &self.board
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Number of units with a controller.
    pub fn controlled_count(&self) -> usize {
        self.controllers.len()
    }

    pub fn event_history(&self) -> &[(Round, ArenaEvent)] {
        &self.event_history
    }

    /// Take a serializable snapshot of the arena's current state.
    pub fn snapshot(&self) -> ArenaSnapshot {
        let units = self
            .world
            .units()
            .map(|u| UnitSnapshot {
                id: u.id,
                team: u.team,
                unit_type: u.unit_type,
                location: u.location,
                influence: u.influence,
                controlled: self.controllers.iter().any(|c| c.id == u.id),
            })
            .collect();

        let slots = self
            .board
            .slots()
            .into_iter()
            .map(|(id, flag)| SlotSnapshot {
                id,
                flag,
                label: comms::try_decode(flag).map(|m| m.label().name().to_string()),
            })
            .collect();

        ArenaSnapshot {
            round: self.world.round(),
            width: self.world.width(),
            height: self.world.height(),
            units,
            slots,
            stats: self.stats(),
        }
    }

    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::host::Host;

    /// Centers build one muckraker, then everyone walks north and bids 1.
    struct Walker {
        id: AgentId,
        unit_type: UnitType,
        age: Round,
    }

    impl Agent for Walker {
        fn id(&self) -> AgentId {
            self.id
        }

        fn unit_type(&self) -> UnitType {
            self.unit_type
        }

        fn take_turn(&mut self, host: &dyn Host) -> Vec<AgentAction> {
            self.age += 1;
            if self.unit_type == UnitType::EnlightenmentCenter {
                let mut actions = vec![AgentAction::Bid(1)];
                if self.age == 1 {
                    let flag = comms::encode(&comms::Message::bare(comms::Label::Explore)).unwrap();
                    actions.push(AgentAction::Broadcast(flag));
                    actions.push(AgentAction::Build(BuildOrder {
                        unit_type: UnitType::Muckraker,
                        direction: Direction::North,
                        influence: 1,
                    }));
                }
                return actions;
            }
            if host.can_move(Direction::North) {
                vec![AgentAction::Move(Direction::North)]
            } else {
                Vec::new()
            }
        }

        fn age(&self) -> Round {
            self.age
        }
    }

    struct WalkerFactory;

    impl AgentFactory for WalkerFactory {
        fn create(&mut self, spawn: &Spawn) -> Option<Box<dyn Agent>> {
            if spawn.team == Team::Neutral {
                return None;
            }
            Some(Box::new(Walker {
                id: spawn.id,
                unit_type: spawn.unit_type,
                age: 0,
            }))
        }
    }

    fn config() -> ArenaConfig {
        ArenaConfig {
            rounds: 20,
            keep_history: true,
            ..ArenaConfig::default()
        }
    }

    #[test]
    fn starting_centers_get_controllers() {
        let arena = Arena::new(config(), Box::new(WalkerFactory)).unwrap();
        assert_eq!(arena.world().unit_count(), 4);
        assert_eq!(arena.controlled_count(), 2);
        assert_eq!(arena.stats().total_spawned, 4);
    }

    #[test]
    fn built_units_act_from_the_next_round() {
        let mut arena = Arena::new(config(), Box::new(WalkerFactory)).unwrap();
        let first = arena.tick();
        assert_eq!(
            first.iter().filter(|e| matches!(e, ArenaEvent::Built { .. })).count(),
            2
        );
        assert!(!first.iter().any(|e| matches!(e, ArenaEvent::Moved { .. })));
        assert_eq!(arena.controlled_count(), 4);

        let second = arena.tick();
        assert!(second.iter().any(|e| matches!(e, ArenaEvent::Moved { .. })));
    }

    #[test]
    fn equal_bids_tie_every_round() {
        let mut arena = Arena::new(config(), Box::new(WalkerFactory)).unwrap();
        assert_eq!(arena.run_to_end(), None);
        assert!(arena.is_finished());
        assert_eq!(arena.stats().votes_a + arena.stats().votes_b, 0);
    }

    #[test]
    fn broadcasts_show_up_in_the_snapshot() {
        let mut arena = Arena::new(config(), Box::new(WalkerFactory)).unwrap();
        arena.tick();
        let snapshot = arena.snapshot();
        assert_eq!(snapshot.slots.len(), 2);
        assert!(snapshot.slots.iter().all(|s| s.label.as_deref() == Some("EXPLORE")));
        let json = arena.snapshot_json().unwrap();
        assert!(json.contains("\"round\": 1"));
    }

    #[test]
    fn history_is_kept_when_asked() {
        let mut arena = Arena::new(config(), Box::new(WalkerFactory)).unwrap();
        arena.run(3);
        assert!(arena
            .event_history()
            .iter()
            .any(|(round, e)| *round == 3 && matches!(e, ArenaEvent::RoundComplete { .. })));
    }
}
