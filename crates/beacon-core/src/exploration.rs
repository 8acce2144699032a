//! Exploration memory — which coarse regions of the map an agent has seen.
//!
//! The map is divided into square cells anchored at the agent's spawn
//! origin. Visited cells go into a sparse set; map edges, once sensed, are
//! kept as four sentinel coordinates and every cell lying past them
//! counts as visited, so the spiral search never leaves the map.

use crate::host::Host;
use crate::types::{Direction, Location};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Largest per-axis cell offset the spiral search reaches.
pub const MAX_CELL_OFFSET: i32 = 16;

/// Tuning for exploration memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// World units per cell side (default: 4).
    pub cell_size: i32,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self { cell_size: 4 }
    }
}

/// Cell offsets sharing one squared distance from the center.
#[derive(Debug, Clone)]
pub struct Shell {
    pub radius_squared: i32,
    pub offsets: Vec<(i32, i32)>,
}

/// Concentric shells covering `|dx|, |dy| <= MAX_CELL_OFFSET`, nearest first.
pub fn shells() -> &'static [Shell] {
    static SHELLS: OnceLock<Vec<Shell>> = OnceLock::new();
    SHELLS.get_or_init(|| {
        let mut offsets: Vec<(i32, i32)> = (-MAX_CELL_OFFSET..=MAX_CELL_OFFSET)
            .flat_map(|dx| (-MAX_CELL_OFFSET..=MAX_CELL_OFFSET).map(move |dy| (dx, dy)))
            .collect();
        offsets.sort_by_key(|&(dx, dy)| (dx * dx + dy * dy, dx, dy));

        let mut shells: Vec<Shell> = Vec::new();
        for (dx, dy) in offsets {
            let r2 = dx * dx + dy * dy;
            match shells.last_mut() {
                Some(shell) if shell.radius_squared == r2 => shell.offsets.push((dx, dy)),
                _ => shells.push(Shell {
                    radius_squared: r2,
                    offsets: vec![(dx, dy)],
                }),
            }
        }
        shells
    })
}

/// First off-map row or column found in each direction, in world
/// coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edges {
    pub north: Option<i32>,
    pub east: Option<i32>,
    pub south: Option<i32>,
    pub west: Option<i32>,
}

/// Coarse visited-region set for one agent.
pub struct ExplorationMemory {
    origin: Location,
    cell_size: i32,
    visited: HashSet<(i32, i32)>,
    edges: Edges,
    rng: SmallRng,
}

impl ExplorationMemory {
    pub fn new(origin: Location, config: &ExplorationConfig, seed: u64) -> Self {
        Self {
            origin,
            cell_size: config.cell_size.max(1),
            visited: HashSet::new(),
            edges: Edges::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn origin(&self) -> Location {
        self.origin
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn edges(&self) -> Edges {
        self.edges
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn cell_of(&self, location: Location) -> (i32, i32) {
        (
            (location.x - self.origin.x).div_euclid(self.cell_size),
            (location.y - self.origin.y).div_euclid(self.cell_size),
        )
    }

    /// Mark the cell containing `location`. Also used to give up on a goal
    /// cell that turned out unreachable.
    pub fn mark_visited(&mut self, location: Location) {
        let cell = self.cell_of(location);
        self.visited.insert(cell);
    }

    pub fn is_visited(&self, location: Location) -> bool {
        self.is_cell_visited(self.cell_of(location))
    }

    fn is_cell_visited(&self, (cx, cy): (i32, i32)) -> bool {
        let c = self.cell_size;
        // Cells lying wholly past an edge.
        let past_high = |edge: i32, origin: i32| (edge - origin + c - 1).div_euclid(c);
        let past_low = |edge: i32, origin: i32| (edge - origin + 1).div_euclid(c) - 1;

        let Edges {
            north,
            east,
            south,
            west,
        } = self.edges;
        let (ox, oy) = (self.origin.x, self.origin.y);
        if north.is_some_and(|n| cy >= past_high(n, oy))
            || east.is_some_and(|e| cx >= past_high(e, ox))
            || south.is_some_and(|s| cy <= past_low(s, oy))
            || west.is_some_and(|w| cx <= past_low(w, ox))
        {
            return true;
        }
        self.visited.contains(&(cx, cy))
    }

    /// Record that `probe`, reached by heading in `direction`, is off the map.
    pub fn record_edge(&mut self, direction: Direction, probe: Location) {
        let edges = &mut self.edges;
        match direction {
            Direction::North => edges.north = Some(edges.north.map_or(probe.y, |n| n.min(probe.y))),
            Direction::East => edges.east = Some(edges.east.map_or(probe.x, |e| e.min(probe.x))),
            Direction::South => edges.south = Some(edges.south.map_or(probe.y, |s| s.max(probe.y))),
            Direction::West => edges.west = Some(edges.west.map_or(probe.x, |w| w.max(probe.x))),
            _ => {}
        }
    }

    /// Walk outward in each cardinal direction, up to the sensor radius,
    /// and record the first off-map cell found. Nothing is recorded once
    /// the host runs out of budget.
    pub fn observe_edges(&mut self, host: &dyn Host) {
        let here = host.location();
        let reach = (host.sensor_radius_squared().max(0) as f64).sqrt() as i32;
        for direction in [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ] {
            let known = match direction {
                Direction::North => self.edges.north,
                Direction::East => self.edges.east,
                Direction::South => self.edges.south,
                _ => self.edges.west,
            };
            if known.is_some() {
                continue;
            }
            let probe = (1..=reach)
                .map(|k| here.add_n(direction, k))
                .find(|probe| !host.on_map(*probe));
            if host.exhausted() {
                return;
            }
            if let Some(probe) = probe {
                self.record_edge(direction, probe);
            }
        }
    }

    /// Per-turn upkeep: sense edges and mark the current cell.
    pub fn update(&mut self, host: &dyn Host) {
        self.observe_edges(host);
        self.mark_visited(host.location());
    }

    /// Nearest unvisited cell to `from`, as a world location inside it.
    ///
    /// Shells are scanned nearest first. Each call starts every shell at
    /// the same random rotation so agents spawned together spread out.
    pub fn nearest_unvisited(&mut self, from: Location) -> Option<Location> {
        let (cx, cy) = self.cell_of(from);
        let spin: usize = self.rng.gen();
        for shell in shells() {
            let n = shell.offsets.len();
            for k in 0..n {
                let (dx, dy) = shell.offsets[(k + spin % n) % n];
                if !self.is_cell_visited((cx + dx, cy + dy)) {
                    return Some(from.translate(dx * self.cell_size, dy * self.cell_size));
                }
            }
        }
        None
    }

    /// Heading and distance to the closest confirmed off-map row or column.
    pub fn nearest_edge(&self, from: Location) -> Option<(Direction, i32)> {
        let Edges {
            north,
            east,
            south,
            west,
        } = self.edges;
        [
            north.map(|n| (Direction::North, n - from.y)),
            east.map(|e| (Direction::East, e - from.x)),
            south.map(|s| (Direction::South, from.y - s)),
            west.map(|w| (Direction::West, from.x - w)),
        ]
        .into_iter()
        .flatten()
        .min_by_key(|&(_, distance)| distance)
    }
}
