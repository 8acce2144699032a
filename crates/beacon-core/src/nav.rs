//! Navigation — one movement decision per turn toward the current goal.
//!
//! Movement comes from a small cost window centered on the agent. Each
//! cell starts at its squared distance to the target; off-map and occupied
//! cells are infinite. A few in-place relaxation passes pull cheap paths
//! around obstacles and rough terrain, then the agent steps to the cheapest
//! allowed neighbor. Nothing outside the window is ever consulted.
//!
//! Goals are abandoned locally and silently: after too many turns without
//! getting closer, on arrival, or when the target is adjacent but blocked.

use crate::exploration::ExplorationMemory;
use crate::host::Host;
use crate::types::{AgentId, Direction, Location};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Order in which neighbors are compared. Ties keep the earliest.
const SCAN_ORDER: [Direction; 8] = [
    Direction::East,
    Direction::NorthEast,
    Direction::North,
    Direction::NorthWest,
    Direction::West,
    Direction::SouthWest,
    Direction::South,
    Direction::SouthEast,
];

/// Tuning for the navigation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Half-width of the cost window (default: 2, a 5x5 window).
    pub window_radius: i32,
    /// Relaxation sweeps per turn (default: 2).
    pub relaxation_passes: usize,
    /// Scale applied to squared distance (default: 1.0).
    pub distance_weight: f64,
    /// Non-improving turns before a GoTo goal is dropped (default: 10).
    pub failure_turns: u32,
    /// Non-improving turns before an explore target is written off (default: 5).
    pub explore_failure_turns: u32,
    /// How far ahead a heading goal aims (default: 100).
    pub heading_reach: i32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            window_radius: 2,
            relaxation_passes: 2,
            distance_weight: 1.0,
            failure_turns: 10,
            explore_failure_turns: 5,
            heading_reach: 100,
        }
    }
}

impl NavConfig {
    /// Window radius clipped so the whole window stays within sensing range.
    pub fn effective_radius(&self, sensor_radius_squared: i32) -> i32 {
        let mut radius = self.window_radius.max(1);
        while radius > 1 && 2 * radius * radius > sensor_radius_squared {
            radius -= 1;
        }
        radius
    }
}

/// Set of headings the agent must not step toward this turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DangerMask(u8);

impl DangerMask {
    pub const EMPTY: DangerMask = DangerMask(0);

    pub fn insert(&mut self, direction: Direction) {
        if direction != Direction::Center {
            self.0 |= 1 << direction.ordinal();
        }
    }

    pub fn contains(self, direction: Direction) -> bool {
        direction != Direction::Center && self.0 & (1 << direction.ordinal()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Every heading whose step would bring `from` closer to any threat.
    pub fn toward_threats(from: Location, threats: impl IntoIterator<Item = Location>) -> Self {
        let mut mask = DangerMask::EMPTY;
        for threat in threats {
            let now = from.distance_squared_to(threat);
            for direction in Direction::COMPASS {
                if from.add(direction).distance_squared_to(threat) < now {
                    mask.insert(direction);
                }
            }
        }
        mask
    }
}

impl FromIterator<Direction> for DangerMask {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut mask = DangerMask::EMPTY;
        for direction in iter {
            mask.insert(direction);
        }
        mask
    }
}

/// What the agent is currently trying to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavGoal {
    #[default]
    None,
    GoTo(Location),
    GoInDirection(Direction),
    Follow(AgentId),
    Explore,
}

/// Why a goal was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonReason {
    /// No closer to the target for too many turns.
    NoProgress,
    Reached,
    /// Target is right next to us and the direct step is blocked.
    AdjacentBlocked,
    /// A followed agent is no longer sensed.
    TargetLost,
    /// Nothing left to explore.
    Exhausted,
}

/// Result of one navigation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStep {
    Move(Direction),
    /// Staying put is cheapest, or the agent is on cooldown.
    Stay,
    /// Every neighboring cell is off-map or occupied.
    Blocked,
    /// No goal.
    Idle,
    /// The goal was dropped this turn; the navigator is now idle.
    Abandoned(AbandonReason),
}

/// Local cost window around the agent, indexed row-major from the
/// south-west corner.
#[derive(Debug, Clone)]
pub struct CostWindow {
    radius: i32,
    side: usize,
    cost: Vec<f64>,
    move_cost: Vec<f64>,
}

impl CostWindow {
    /// Sample terrain and occupancy around the host's location.
    pub fn build(host: &dyn Host, target: Location, radius: i32, distance_weight: f64) -> Self {
        let side = (2 * radius + 1) as usize;
        let here = host.location();
        let mut cost = vec![f64::INFINITY; side * side];
        let mut move_cost = vec![f64::INFINITY; side * side];

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let cell = here.translate(dx, dy);
                let passability = if dx == 0 && dy == 0 {
                    // Our own cell is always costed.
                    Some(host.passability(cell).unwrap_or(1.0))
                } else if host.is_occupied(cell) {
                    None
                } else {
                    host.passability(cell)
                };
                if let Some(p) = passability {
                    let i = Self::index_of(radius, side, dx, dy);
                    cost[i] = cell.distance_squared_to(target) as f64 * distance_weight;
                    move_cost[i] = 1.0 / p.max(1e-6);
                }
            }
        }

        Self {
            radius,
            side,
            cost,
            move_cost,
        }
    }

    fn index_of(radius: i32, side: usize, dx: i32, dy: i32) -> usize {
        (dy + radius) as usize * side + (dx + radius) as usize
    }

    pub fn cost_at(&self, dx: i32, dy: i32) -> f64 {
        if dx.abs() > self.radius || dy.abs() > self.radius {
            return f64::INFINITY;
        }
        self.cost[Self::index_of(self.radius, self.side, dx, dy)]
    }

    /// Bounded Bellman-Ford sweeps. Pass `p` updates the window shrunk by
    /// `p` cells on each side, in place.
    pub fn relax(&mut self, passes: usize) {
        let n = self.side;
        for pass in 0..passes {
            if 2 * pass >= n {
                break;
            }
            for y in pass..n - pass {
                for x in pass..n - pass {
                    let i = y * n + x;
                    if !self.move_cost[i].is_finite() {
                        continue;
                    }
                    let mut cheapest = f64::INFINITY;
                    for ny in y.saturating_sub(1)..=(y + 1).min(n - 1) {
                        for nx in x.saturating_sub(1)..=(x + 1).min(n - 1) {
                            if nx != x || ny != y {
                                cheapest = cheapest.min(self.cost[ny * n + nx]);
                            }
                        }
                    }
                    let relaxed = cheapest + self.move_cost[i];
                    if relaxed < self.cost[i] {
                        self.cost[i] = relaxed;
                    }
                }
            }
        }
    }

    /// Cheapest allowed step, `Center` when staying is cheapest, `None` when
    /// no neighbor is reachable at all.
    pub fn best_direction(&self, danger: DangerMask) -> Option<Direction> {
        let mut best = Direction::Center;
        let mut best_cost = self.cost_at(0, 0);
        let mut any_reachable = false;
        for direction in SCAN_ORDER {
            let cost = self.cost_at(direction.dx(), direction.dy());
            any_reachable |= cost.is_finite();
            if danger.contains(direction) {
                continue;
            }
            if cost < best_cost {
                best = direction;
                best_cost = cost;
            }
        }
        any_reachable.then_some(best)
    }
}

/// One step toward `target` from the host's location.
pub fn go_to(host: &dyn Host, target: Location, danger: DangerMask, config: &NavConfig) -> Option<Direction> {
    let radius = config.effective_radius(host.sensor_radius_squared());
    let mut window = CostWindow::build(host, target, radius, config.distance_weight);
    window.relax(config.relaxation_passes);
    window.best_direction(danger)
}

/// Goal-tracking navigator owned by one agent.
pub struct Navigator {
    config: NavConfig,
    goal: NavGoal,
    target: Option<Location>,
    best_distance: i32,
    turns_since_improvement: u32,
    memory: ExplorationMemory,
}

impl Navigator {
    pub fn new(memory: ExplorationMemory, config: NavConfig) -> Self {
        Self {
            config,
            goal: NavGoal::None,
            target: None,
            best_distance: i32::MAX,
            turns_since_improvement: 0,
            memory,
        }
    }

    pub fn goal(&self) -> NavGoal {
        self.goal
    }

    /// Location currently steered toward, if any.
    pub fn target(&self) -> Option<Location> {
        self.target
    }

    pub fn turns_since_improvement(&self) -> u32 {
        self.turns_since_improvement
    }

    pub fn memory(&self) -> &ExplorationMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ExplorationMemory {
        &mut self.memory
    }

    /// Switch goals. Re-setting the current goal keeps its progress.
    pub fn set_goal(&mut self, goal: NavGoal, from: Location) {
        if goal == self.goal {
            return;
        }
        self.goal = goal;
        self.target = match goal {
            NavGoal::GoTo(target) => Some(target),
            NavGoal::GoInDirection(heading) => Some(from.add_n(heading, self.config.heading_reach)),
            NavGoal::None | NavGoal::Follow(_) | NavGoal::Explore => None,
        };
        self.reset_progress();
    }

    pub fn clear(&mut self) {
        self.goal = NavGoal::None;
        self.target = None;
        self.reset_progress();
    }

    fn reset_progress(&mut self) {
        self.best_distance = i32::MAX;
        self.turns_since_improvement = 0;
    }

    fn record_progress(&mut self, distance: i32) {
        if distance < self.best_distance {
            self.best_distance = distance;
            self.turns_since_improvement = 0;
        } else {
            self.turns_since_improvement += 1;
        }
    }

    fn abandon(&mut self, reason: AbandonReason) -> NavStep {
        debug!(goal = ?self.goal, ?reason, "abandoning goal");
        self.clear();
        NavStep::Abandoned(reason)
    }

    /// Advance the current goal by one turn.
    pub fn tick(&mut self, host: &dyn Host, danger: DangerMask) -> NavStep {
        self.memory.update(host);
        if !host.is_ready() {
            return NavStep::Stay;
        }

        let here = host.location();
        let target = match self.goal {
            NavGoal::None => return NavStep::Idle,
            NavGoal::GoTo(_) | NavGoal::GoInDirection(_) => {
                let Some(target) = self.target else {
                    return self.abandon(AbandonReason::TargetLost);
                };
                if here == target {
                    return self.abandon(AbandonReason::Reached);
                }
                let distance = here.distance_squared_to(target);
                self.record_progress(distance);
                if self.turns_since_improvement >= self.config.failure_turns {
                    return self.abandon(AbandonReason::NoProgress);
                }
                if distance < 4 && !host.can_move(here.direction_to(target)) && !host.exhausted() {
                    return self.abandon(AbandonReason::AdjacentBlocked);
                }
                target
            }
            NavGoal::Follow(id) => match host.sense_agent(id) {
                Some(agent) => {
                    self.target = Some(agent.location);
                    agent.location
                }
                None if host.exhausted() => return NavStep::Stay,
                None => return self.abandon(AbandonReason::TargetLost),
            },
            NavGoal::Explore => {
                if let Some(current) = self.target {
                    self.record_progress(here.distance_squared_to(current));
                    if self.turns_since_improvement >= self.config.explore_failure_turns {
                        self.memory.mark_visited(current);
                    }
                }
                match self.target.filter(|t| !self.memory.is_visited(*t)) {
                    Some(current) => current,
                    None => match self.memory.nearest_unvisited(here) {
                        Some(next) => {
                            self.target = Some(next);
                            self.reset_progress();
                            next
                        }
                        None => return self.abandon(AbandonReason::Exhausted),
                    },
                }
            }
        };

        match go_to(host, target, danger, &self.config) {
            Some(Direction::Center) => NavStep::Stay,
            Some(direction) => NavStep::Move(direction),
            None => NavStep::Blocked,
        }
    }
}
