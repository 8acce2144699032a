//! Shared types used across all Beacon components and crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic round counter reported by the host.
pub type Round = u32;

/// Fixed-width identifier the host assigns to every agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side an agent or landmark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
    /// Unclaimed landmarks. Neutral units never act.
    Neutral,
}

impl Team {
    /// The other playing team. Neutral stays neutral.
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
            Team::Neutral => Team::Neutral,
        }
    }
}

/// The kinds of units the host can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Immobile economic hub. Builds every other unit and bids for votes.
    EnlightenmentCenter,
    Politician,
    /// Economy unit. Fragile, so it hides away from enemy muckrakers.
    Slanderer,
    /// Cheap scout that hunts slanderers.
    Muckraker,
}

impl UnitType {
    pub fn can_move(self) -> bool {
        !matches!(self, UnitType::EnlightenmentCenter)
    }

    /// Squared sensing radius for this unit type.
    pub fn sensor_radius_squared(self) -> i32 {
        match self {
            UnitType::EnlightenmentCenter => 40,
            UnitType::Politician => 25,
            UnitType::Slanderer => 20,
            UnitType::Muckraker => 30,
        }
    }

    /// Short name for display and logging.
    pub fn name(self) -> &'static str {
        match self {
            UnitType::EnlightenmentCenter => "center",
            UnitType::Politician => "politician",
            UnitType::Slanderer => "slanderer",
            UnitType::Muckraker => "muckraker",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the eight compass headings, or no movement.
///
/// Ordinals run clockwise from north and are the values carried on the
/// wire and in danger masks. North is `+y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Center,
}

impl Direction {
    /// The eight movement headings in ordinal order.
    pub const COMPASS: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::NorthEast => 1,
            Direction::East => 2,
            Direction::SouthEast => 3,
            Direction::South => 4,
            Direction::SouthWest => 5,
            Direction::West => 6,
            Direction::NorthWest => 7,
            Direction::Center => 8,
        }
    }

    /// Inverse of [`Direction::ordinal`] for the eight compass headings.
    pub fn from_ordinal(ordinal: u32) -> Option<Direction> {
        Direction::COMPASS.get(ordinal as usize).copied()
    }

    pub fn dx(self) -> i32 {
        match self {
            Direction::NorthEast | Direction::East | Direction::SouthEast => 1,
            Direction::SouthWest | Direction::West | Direction::NorthWest => -1,
            _ => 0,
        }
    }

    pub fn dy(self) -> i32 {
        match self {
            Direction::NorthWest | Direction::North | Direction::NorthEast => 1,
            Direction::SouthWest | Direction::South | Direction::SouthEast => -1,
            _ => 0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Center => Direction::Center,
            d => Direction::COMPASS[(d.ordinal() as usize + 4) % 8],
        }
    }

    /// Next heading clockwise.
    pub fn rotate_right(self) -> Direction {
        match self {
            Direction::Center => Direction::Center,
            d => Direction::COMPASS[(d.ordinal() as usize + 1) % 8],
        }
    }

    /// Next heading counter-clockwise.
    pub fn rotate_left(self) -> Direction {
        match self {
            Direction::Center => Direction::Center,
            d => Direction::COMPASS[(d.ordinal() as usize + 7) % 8],
        }
    }
}

/// An integer map coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

/// Coordinates travel on the wire modulo this value.
pub const WRAP: i32 = 128;

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn translate(self, dx: i32, dy: i32) -> Location {
        Location::new(self.x + dx, self.y + dy)
    }

    pub fn add(self, dir: Direction) -> Location {
        self.translate(dir.dx(), dir.dy())
    }

    /// Step `n` times in `dir`.
    pub fn add_n(self, dir: Direction, n: i32) -> Location {
        self.translate(dir.dx() * n, dir.dy() * n)
    }

    pub fn distance_squared_to(self, other: Location) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn is_adjacent_to(self, other: Location) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    /// Closest of the eight headings (or `Center`) pointing at `other`.
    ///
    /// A heading is cardinal when one axis dominates the other by at least
    /// a factor of 2.414 (tan 67.5°), diagonal otherwise.
    pub fn direction_to(self, other: Location) -> Direction {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let (ax, ay) = (dx.abs() as f64, dy.abs() as f64);
        if ax >= 2.414 * ay {
            match dx.signum() {
                1 => Direction::East,
                -1 => Direction::West,
                _ => Direction::Center,
            }
        } else if ay >= 2.414 * ax {
            if dy > 0 {
                Direction::North
            } else {
                Direction::South
            }
        } else if dy > 0 {
            if dx > 0 {
                Direction::NorthEast
            } else {
                Direction::NorthWest
            }
        } else if dx > 0 {
            Direction::SouthEast
        } else {
            Direction::SouthWest
        }
    }

    /// Coordinates reduced modulo [`WRAP`] for transmission.
    pub fn wrapped(self) -> (u32, u32) {
        (self.x.rem_euclid(WRAP) as u32, self.y.rem_euclid(WRAP) as u32)
    }

    /// Rebuild a location from wrapped coordinates, choosing the candidate
    /// nearest to `near`. Exact whenever the two are less than `WRAP / 2`
    /// apart on each axis.
    pub fn from_wrapped(x: u32, y: u32, near: Location) -> Location {
        fn unwrap_axis(value: u32, near: i32) -> i32 {
            let mut offset = value as i32 - near.rem_euclid(WRAP);
            if offset >= WRAP / 2 {
                offset -= WRAP;
            } else if offset < -WRAP / 2 {
                offset += WRAP;
            }
            near + offset
        }
        Location::new(unwrap_axis(x, near.x), unwrap_axis(y, near.y))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Another agent as reported by the host's sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensedAgent {
    pub id: AgentId,
    pub team: Team,
    pub unit_type: UnitType,
    pub location: Location,
    pub influence: i32,
}

/// A build command produced by a home unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOrder {
    pub unit_type: UnitType,
    pub direction: Direction,
    pub influence: i32,
}

/// An action an agent hands back to the host at the end of its turn.
///
/// The host applies a turn's actions in order, so a `Broadcast` listed
/// before a `Build` is visible to the newly built unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentAction {
    /// Step one cell. `Center` is never emitted; staying is no action.
    Move(Direction),
    Build(BuildOrder),
    /// Overwrite this agent's broadcast slot. `0` clears it.
    Broadcast(u32),
    /// Submit an auction bid for this round's vote.
    Bid(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_to_prefers_diagonal_between_thresholds() {
        let origin = Location::new(0, 0);
        assert_eq!(origin.direction_to(Location::new(5, 5)), Direction::NorthEast);
        assert_eq!(origin.direction_to(Location::new(5, 1)), Direction::East);
        assert_eq!(origin.direction_to(Location::new(-1, -6)), Direction::South);
        assert_eq!(origin.direction_to(Location::new(-3, 2)), Direction::NorthWest);
        assert_eq!(origin.direction_to(origin), Direction::Center);
    }

    #[test]
    fn opposite_and_rotation_are_consistent() {
        for dir in Direction::COMPASS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.rotate_left().rotate_right(), dir);
            assert_eq!(dir.dx(), -dir.opposite().dx());
            assert_eq!(dir.dy(), -dir.opposite().dy());
        }
    }

    #[test]
    fn wrapped_location_round_trips_near_receiver() {
        let sender = Location::new(10_030, 19_990);
        let receiver = Location::new(10_001, 20_040);
        let (x, y) = sender.wrapped();
        assert_eq!(Location::from_wrapped(x, y, receiver), sender);
    }

    #[test]
    fn ordinal_round_trip() {
        for dir in Direction::COMPASS {
            assert_eq!(Direction::from_ordinal(dir.ordinal() as u32), Some(dir));
        }
        assert_eq!(Direction::from_ordinal(8), None);
    }
}
