//! Production scheduling for home units.
//!
//! Build requests wait in strictly ordered priority levels, FIFO within a
//! level. Each turn the scheduler looks at the single front request and
//! either commits it or leaves the queue exactly as it was. A request is
//! only dropped by a successful build or an explicit `discard_front`.

use crate::comms::{self, Label, Message};
use crate::host::Host;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Number of priority levels.
pub const LEVELS: usize = 4;

/// Default economy cost ladder. Each rung is a build size that pays back
/// noticeably better than the one below it.
pub const DEFAULT_LADDER: [i32; 18] = [
    85, 107, 130, 154, 178, 203, 229, 255, 282, 339, 399, 431, 498, 569, 605, 683, 724, 949,
];

/// Urgency of a build request. Lower is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    UltraHigh = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; LEVELS] = [
        Priority::UltraHigh,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// How much influence a request spends, decided when it reaches the front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BuildCost {
    Fixed(i32),
    /// A fraction of the influence above the reserve, at least `floor`.
    Share { significance: f64, floor: i32 },
    /// The best ladder rung that fits in the share described above.
    Ladder { significance: f64, floor: i32 },
}

/// One queued build request.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitBuild {
    pub unit_type: UnitType,
    pub cost: BuildCost,
    /// Instruction handed to the new unit through our broadcast slot.
    pub message: Message,
    /// Set by [`BuildQueue::push`].
    pub priority: Priority,
    /// May dip into the reserve floor.
    pub spend_now: bool,
}

impl UnitBuild {
    pub fn new(unit_type: UnitType, cost: BuildCost, message: Message) -> Self {
        Self {
            unit_type,
            cost,
            message,
            priority: Priority::Low,
            spend_now: false,
        }
    }

    pub fn spend_now(mut self) -> Self {
        self.spend_now = true;
        self
    }
}

/// Multi-level FIFO of build requests.
#[derive(Debug, Clone)]
pub struct BuildQueue {
    levels: [VecDeque<UnitBuild>; LEVELS],
    /// Lowest level that may be non-empty; `LEVELS` when all are empty.
    front: usize,
}

impl Default for BuildQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildQueue {
    pub fn new() -> Self {
        Self {
            levels: Default::default(),
            front: LEVELS,
        }
    }

    /// Append to `level`. The two most urgent levels may spend the reserve.
    pub fn push(&mut self, mut item: UnitBuild, level: Priority) {
        item.priority = level;
        if level <= Priority::High {
            item.spend_now = true;
        }
        self.levels[level.index()].push_back(item);
        self.front = self.front.min(level.index());
    }

    /// Put `item` back at the head of its own level.
    pub fn push_front(&mut self, item: UnitBuild) {
        let level = item.priority.index();
        self.levels[level].push_front(item);
        self.front = self.front.min(level);
    }

    pub fn push_many(&mut self, item: UnitBuild, level: Priority, count: usize) {
        for _ in 0..count {
            self.push(item.clone(), level);
        }
    }

    pub fn peek(&self) -> Option<&UnitBuild> {
        self.levels.get(self.front)?.front()
    }

    pub fn pop(&mut self) -> Option<UnitBuild> {
        let item = self.levels.get_mut(self.front)?.pop_front();
        while self.front < LEVELS && self.levels[self.front].is_empty() {
            self.front += 1;
        }
        item
    }

    pub fn is_empty(&self) -> bool {
        self.front == LEVELS
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(VecDeque::len).sum()
    }

    pub fn len_at(&self, level: Priority) -> usize {
        self.levels[level.index()].len()
    }

    /// Pending requests for one unit type across all levels.
    pub fn count(&self, unit_type: UnitType) -> usize {
        self.levels
            .iter()
            .flatten()
            .filter(|item| item.unit_type == unit_type)
            .count()
    }

    pub fn clear(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        self.front = LEVELS;
    }
}

/// Sorted build sizes for dynamically priced requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLadder {
    rungs: Vec<i32>,
}

impl Default for CostLadder {
    fn default() -> Self {
        Self::new(DEFAULT_LADDER.to_vec())
    }
}

impl CostLadder {
    pub fn new(mut rungs: Vec<i32>) -> Self {
        rungs.sort_unstable();
        rungs.dedup();
        Self { rungs }
    }

    pub fn minimum(&self) -> Option<i32> {
        self.rungs.first().copied()
    }

    /// Largest rung within `budget`, or `None` below the first rung.
    pub fn best_affordable(&self, budget: i32) -> Option<i32> {
        self.rungs.iter().rev().find(|&&rung| rung <= budget).copied()
    }
}

/// Tuning for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Reserve at round 0 (default: 5).
    pub reserve_base: i32,
    /// Reserve growth per round (default: 0.1).
    pub reserve_growth: f64,
    pub ladder: Vec<i32>,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            reserve_base: 5,
            reserve_growth: 0.1,
            ladder: DEFAULT_LADDER.to_vec(),
        }
    }
}

impl ProductionConfig {
    /// Operating capital that ordinary builds must leave untouched.
    pub fn reserve_floor(&self, round: Round) -> i32 {
        self.reserve_base + (round as f64 * self.reserve_growth) as i32
    }
}

/// Why the front request was not built this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildInfeasible {
    /// Dynamic cost resolved to nothing usable.
    NotViable,
    InsufficientResources { cost: i32, reserve: i32, available: i32 },
    NoFreeDirection,
}

/// Result of one [`ProductionScheduler::try_build`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Not ready, or nothing queued.
    Idle,
    Infeasible(BuildInfeasible),
    /// Committed. `flag` must be broadcast before the build is applied.
    Built { order: BuildOrder, flag: u32 },
}

impl BuildOutcome {
    /// Host actions for this outcome, broadcast first.
    pub fn actions(&self) -> Vec<AgentAction> {
        match self {
            BuildOutcome::Built { order, flag } => {
                vec![AgentAction::Broadcast(*flag), AgentAction::Build(*order)]
            }
            _ => Vec::new(),
        }
    }
}

/// The build committed on the previous turn, waiting to be identified.
#[derive(Debug, Clone, PartialEq)]
struct PendingBuild {
    direction: Direction,
    item: UnitBuild,
}

/// Adjacent headings sorted by descending passability; off-map counts as 0.
pub fn spawn_order(host: &dyn Host) -> Vec<Direction> {
    let here = host.location();
    let mut order = Direction::COMPASS.to_vec();
    order.sort_by(|a, b| {
        let pa = host.passability(here.add(*a)).unwrap_or(0.0);
        let pb = host.passability(here.add(*b)).unwrap_or(0.0);
        pb.total_cmp(&pa)
    });
    order
}

/// Priority queue plus the rules for turning its front into a build.
#[derive(Debug, Clone)]
pub struct ProductionScheduler {
    queue: BuildQueue,
    ladder: CostLadder,
    config: ProductionConfig,
    spawn_order: Option<Vec<Direction>>,
    pending: Option<PendingBuild>,
}

impl ProductionScheduler {
    pub fn new(config: ProductionConfig) -> Self {
        Self {
            queue: BuildQueue::new(),
            ladder: CostLadder::new(config.ladder.clone()),
            config,
            spawn_order: None,
            pending: None,
        }
    }

    pub fn queue(&self) -> &BuildQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut BuildQueue {
        &mut self.queue
    }

    pub fn ladder(&self) -> &CostLadder {
        &self.ladder
    }

    pub fn push(&mut self, item: UnitBuild, level: Priority) {
        self.queue.push(item, level);
    }

    /// Drop the front request without building it.
    pub fn discard_front(&mut self) -> Option<UnitBuild> {
        self.queue.pop()
    }

    pub fn reserve_floor(&self, round: Round) -> i32 {
        self.config.reserve_floor(round)
    }

    /// Price `item` against the current balance.
    pub fn resolve_cost(&self, item: &UnitBuild, influence: i32, reserve: i32) -> Option<i32> {
        let usable = (influence - reserve).max(0) as f64;
        let cost = match item.cost {
            BuildCost::Fixed(cost) => Some(cost),
            BuildCost::Share { significance, floor } => {
                Some(((usable * significance) as i32).max(floor))
            }
            BuildCost::Ladder { significance, floor } => {
                let budget = ((usable * significance) as i32).max(floor);
                self.ladder.best_affordable(budget)
            }
        };
        cost.filter(|c| *c > 0)
    }

    /// Try to commit the front request.
    pub fn try_build(&mut self, host: &dyn Host) -> BuildOutcome {
        if !host.is_ready() {
            return BuildOutcome::Idle;
        }
        if self.spawn_order.is_none() {
            let order = spawn_order(host);
            if host.exhausted() {
                return BuildOutcome::Idle;
            }
            self.spawn_order = Some(order);
        }
        let Some(item) = self.queue.peek() else {
            return BuildOutcome::Idle;
        };

        let available = host.influence();
        let reserve = self.reserve_floor(host.round());
        let Some(cost) = self.resolve_cost(item, available, reserve) else {
            return BuildOutcome::Infeasible(BuildInfeasible::NotViable);
        };
        let affordable = if item.spend_now {
            cost <= available
        } else {
            cost + reserve <= available
        };
        if !affordable {
            return BuildOutcome::Infeasible(BuildInfeasible::InsufficientResources {
                cost,
                reserve,
                available,
            });
        }

        let unit_type = item.unit_type;
        let direction = self
            .spawn_order
            .iter()
            .flatten()
            .copied()
            .find(|direction| host.can_build(unit_type, *direction, cost));
        let Some(direction) = direction else {
            debug!(%unit_type, cost, "no free build direction");
            return BuildOutcome::Infeasible(BuildInfeasible::NoFreeDirection);
        };

        if host.exhausted() {
            return BuildOutcome::Idle;
        }
        let flag = comms::encode_or(&item.message, Label::Explore);
        let Some(item) = self.queue.pop() else {
            return BuildOutcome::Idle;
        };
        info!(%unit_type, cost, ?direction, message = %item.message, "building");
        self.pending = Some(PendingBuild { direction, item });

        BuildOutcome::Built {
            order: BuildOrder {
                unit_type,
                direction,
                influence: cost,
            },
            flag,
        }
    }

    /// Identify the unit built on the previous turn: its id and the
    /// instruction it was given. Call once, on the turn after a build.
    ///
    /// A build the host never carried out goes back to the head of its
    /// level. On a turn without budget the check waits for the next call.
    pub fn take_last_built(&mut self, host: &dyn Host) -> Option<(AgentId, Message)> {
        let pending = self.pending.take()?;
        let built = host
            .agent_at(host.location().add(pending.direction))
            .filter(|agent| agent.team == host.team() && agent.unit_type == pending.item.unit_type);
        match built {
            Some(agent) => Some((agent.id, pending.item.message)),
            None if host.exhausted() => {
                self.pending = Some(pending);
                None
            }
            None => {
                debug!(unit_type = %pending.item.unit_type, "last build never appeared, requeued");
                self.queue.push_front(pending.item);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comms::decode;
    use crate::testing::FakeHost;

    fn build(unit_type: UnitType, cost: i32) -> UnitBuild {
        UnitBuild::new(unit_type, BuildCost::Fixed(cost), Message::bare(Label::Explore))
    }

    fn center(influence: i32, round: Round) -> FakeHost {
        FakeHost::open(40, 40)
            .as_unit(UnitType::EnlightenmentCenter)
            .with_influence(influence)
            .with_round(round)
    }

    #[test]
    fn higher_level_pops_first() {
        let mut queue = BuildQueue::new();
        queue.push(build(UnitType::Muckraker, 5), Priority::Low);
        queue.push(build(UnitType::Politician, 50), Priority::High);
        assert_eq!(queue.pop().unwrap().unit_type, UnitType::Politician);
        assert_eq!(queue.pop().unwrap().unit_type, UnitType::Muckraker);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn fifo_within_a_level_and_emptiness() {
        let mut queue = BuildQueue::new();
        assert!(queue.is_empty());
        for cost in [1, 2, 3] {
            queue.push(build(UnitType::Muckraker, cost), Priority::Medium);
        }
        queue.push(build(UnitType::Slanderer, 9), Priority::UltraHigh);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.count(UnitType::Muckraker), 3);

        let costs: Vec<BuildCost> = std::iter::from_fn(|| queue.pop()).map(|b| b.cost).collect();
        assert_eq!(
            costs,
            vec![
                BuildCost::Fixed(9),
                BuildCost::Fixed(1),
                BuildCost::Fixed(2),
                BuildCost::Fixed(3)
            ]
        );
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn pushing_below_front_moves_front_back_up() {
        let mut queue = BuildQueue::new();
        queue.push(build(UnitType::Muckraker, 1), Priority::Low);
        queue.push(build(UnitType::Politician, 2), Priority::Medium);
        assert_eq!(queue.peek().unwrap().priority, Priority::Medium);
        queue.pop();
        queue.push(build(UnitType::Politician, 3), Priority::High);
        assert_eq!(queue.peek().unwrap().priority, Priority::High);
        assert!(queue.peek().unwrap().spend_now);
    }

    #[test]
    fn ladder_picks_best_affordable_rung() {
        let ladder = CostLadder::default();
        assert_eq!(ladder.best_affordable(84), None);
        assert_eq!(ladder.best_affordable(85), Some(85));
        assert_eq!(ladder.best_affordable(150), Some(130));
        assert_eq!(ladder.best_affordable(10_000), Some(949));
    }

    #[test]
    fn reserve_floor_grows_with_time() {
        let config = ProductionConfig::default();
        assert_eq!(config.reserve_floor(0), 5);
        assert_eq!(config.reserve_floor(100), 15);
        assert_eq!(config.reserve_floor(1000), 105);
    }

    #[test]
    fn ordinary_builds_leave_the_reserve() {
        // Round 100: reserve is 15.
        let host = center(100, 100);
        let mut scheduler = ProductionScheduler::new(ProductionConfig::default());
        scheduler.push(build(UnitType::Politician, 90), Priority::Medium);
        assert_eq!(
            scheduler.try_build(&host),
            BuildOutcome::Infeasible(BuildInfeasible::InsufficientResources {
                cost: 90,
                reserve: 15,
                available: 100
            })
        );
        assert_eq!(scheduler.queue().len(), 1);

        let mut urgent = ProductionScheduler::new(ProductionConfig::default());
        urgent.push(build(UnitType::Politician, 90), Priority::High);
        assert!(matches!(urgent.try_build(&host), BuildOutcome::Built { .. }));
        assert!(urgent.queue().is_empty());
    }

    #[test]
    fn ladder_cost_resolves_at_dequeue_time() {
        let mut scheduler = ProductionScheduler::new(ProductionConfig::default());
        let eco = UnitBuild::new(
            UnitType::Slanderer,
            BuildCost::Ladder {
                significance: 1.0,
                floor: 0,
            },
            Message::bare(Label::Hide),
        );
        scheduler.push(eco, Priority::Medium);

        assert_eq!(
            scheduler.try_build(&center(50, 0)),
            BuildOutcome::Infeasible(BuildInfeasible::NotViable)
        );
        assert_eq!(scheduler.queue().len(), 1);

        match scheduler.try_build(&center(150, 0)) {
            BuildOutcome::Built { order, flag } => {
                assert_eq!(order.influence, 130);
                assert_eq!(order.unit_type, UnitType::Slanderer);
                assert_eq!(decode(flag).unwrap(), Message::bare(Label::Hide));
            }
            other => panic!("expected a build, got {:?}", other),
        }
    }

    #[test]
    fn builds_toward_the_smoothest_free_tile() {
        // West edge of the map: the three western tiles are off-map.
        let here = Location::new(0, 20);
        let host = center(500, 1)
            .at(here)
            .with_passability(here.add(Direction::North), 0.5);
        let order = spawn_order(&host);
        assert_eq!(order[0], Direction::NorthEast);
        assert_eq!(order[4], Direction::North);
        assert_eq!(&order[5..], &[Direction::SouthWest, Direction::West, Direction::NorthWest]);

        let mut scheduler = ProductionScheduler::new(ProductionConfig::default());
        scheduler.push(build(UnitType::Muckraker, 1), Priority::Low);
        let outcome = scheduler.try_build(&host);
        let actions = outcome.actions();
        assert!(matches!(actions[0], AgentAction::Broadcast(_)));
        assert_eq!(
            actions[1],
            AgentAction::Build(BuildOrder {
                unit_type: UnitType::Muckraker,
                direction: Direction::NorthEast,
                influence: 1
            })
        );
    }

    #[test]
    fn crowded_center_keeps_the_request() {
        let here = Location::new(20, 20);
        let mut host = center(500, 1).at(here);
        for (i, dir) in Direction::COMPASS.iter().enumerate() {
            host = host.with_agent(100 + i as u32, Team::A, UnitType::Politician, here.add(*dir));
        }
        let mut scheduler = ProductionScheduler::new(ProductionConfig::default());
        scheduler.push(build(UnitType::Muckraker, 1), Priority::Low);
        assert_eq!(
            scheduler.try_build(&host),
            BuildOutcome::Infeasible(BuildInfeasible::NoFreeDirection)
        );
        assert_eq!(scheduler.queue().len(), 1);
    }

    #[test]
    fn last_built_unit_is_identified_next_turn() {
        let here = Location::new(20, 20);
        let host = center(500, 1).at(here);
        let mut scheduler = ProductionScheduler::new(ProductionConfig::default());
        let scout = UnitBuild::new(
            UnitType::Muckraker,
            BuildCost::Fixed(1),
            Message::with_direction(Label::Scout, Direction::West),
        );
        scheduler.push(scout, Priority::Low);
        let BuildOutcome::Built { order, .. } = scheduler.try_build(&host) else {
            panic!("expected a build");
        };

        let next_turn = center(499, 2)
            .at(here)
            .with_agent(77, Team::A, UnitType::Muckraker, here.add(order.direction));
        let (id, message) = scheduler.take_last_built(&next_turn).unwrap();
        assert_eq!(id, AgentId(77));
        assert_eq!(message.direction(), Some(Direction::West));
        assert!(scheduler.take_last_built(&next_turn).is_none());
        assert!(scheduler.queue().is_empty());
    }

    #[test]
    fn dropped_build_returns_to_the_head_of_its_level() {
        let here = Location::new(20, 20);
        let mut scheduler = ProductionScheduler::new(ProductionConfig::default());
        scheduler.push(build(UnitType::Slanderer, 85), Priority::Medium);
        scheduler.push(build(UnitType::Muckraker, 1), Priority::Medium);
        assert!(matches!(
            scheduler.try_build(&center(500, 1).at(here)),
            BuildOutcome::Built { .. }
        ));
        assert_eq!(scheduler.queue().len(), 1);

        // Out of budget: nothing can be concluded yet.
        assert!(scheduler.take_last_built(&center(500, 2).at(here).starved()).is_none());
        assert_eq!(scheduler.queue().len(), 1);

        // The host threw the build away, so nobody stands on the tile.
        assert!(scheduler.take_last_built(&center(500, 3).at(here)).is_none());
        assert_eq!(scheduler.queue().len(), 2);
        let front = scheduler.queue().peek().unwrap();
        assert_eq!(front.unit_type, UnitType::Slanderer);
        assert_eq!(front.priority, Priority::Medium);
    }

    #[test]
    fn starved_turn_builds_nothing() {
        let mut scheduler = ProductionScheduler::new(ProductionConfig::default());
        scheduler.push(build(UnitType::Muckraker, 1), Priority::High);
        let starved = center(500, 1).at(Location::new(20, 20)).starved();
        assert!(matches!(
            scheduler.try_build(&starved),
            BuildOutcome::Idle | BuildOutcome::Infeasible(_)
        ));
        assert_eq!(scheduler.queue().len(), 1);
        assert!(scheduler.take_last_built(&center(500, 2)).is_none());
    }
}
