//! Per-direction enemy counts reported to a home unit.

use serde::{Deserialize, Serialize};

use crate::types::{Direction, Location, Round};

/// Reports older than this many rounds are overwritten by any new report.
pub const STALE_AFTER: Round = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DangerTracker {
    counts: [u32; 8],
    last_update: [Round; 8],
}

impl DangerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` enemies in `direction`. A report replaces the stored
    /// count when it is larger or when the stored one has gone stale.
    /// Returns true when the stored count changed.
    pub fn report(&mut self, direction: Direction, count: u32, round: Round) -> bool {
        if direction == Direction::Center {
            return false;
        }
        let i = direction.ordinal() as usize;
        if count > self.counts[i] || round.saturating_sub(self.last_update[i]) > STALE_AFTER {
            let changed = self.counts[i] != count;
            self.counts[i] = count;
            self.last_update[i] = round;
            return changed;
        }
        false
    }

    /// Convenience for a report carrying the enemy's location.
    pub fn report_at(&mut self, home: Location, seen: Location, count: u32, round: Round) -> bool {
        self.report(home.direction_to(seen), count, round)
    }

    pub fn count(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Center => 0,
            d => self.counts[d.ordinal() as usize],
        }
    }

    pub fn any(&self) -> bool {
        self.counts.iter().any(|&c| c > 0)
    }

    /// Direction pointing away from the weighted sum of threats.
    ///
    /// When threats cancel out, the first direction with no reported
    /// enemies is used. `Center` means nothing is known.
    pub fn safest_direction(&self) -> Direction {
        let (dx, dy) = Direction::COMPASS
            .iter()
            .fold((0, 0), |(dx, dy), &d| {
                let n = self.count(d) as i32;
                (dx + d.dx() * n, dy + d.dy() * n)
            });
        let origin = Location::new(0, 0);
        let away = origin.direction_to(Location::new(dx, dy)).opposite();
        if away != Direction::Center {
            return away;
        }
        if !self.any() {
            return Direction::Center;
        }
        Direction::COMPASS
            .iter()
            .copied()
            .find(|&d| self.count(d) == 0)
            .unwrap_or(Direction::Center)
    }
}
