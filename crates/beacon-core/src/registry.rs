//! Registry of enlightenment centers a home unit has heard about.
//!
//! Entries are keyed by location, updated in place and never deleted: a
//! captured center simply changes allegiance.

use serde::{Deserialize, Serialize};

use crate::types::{Location, Team};

/// Whose side a center is on, relative to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    Ours,
    Enemy,
    Neutral,
}

impl Allegiance {
    pub fn of(team: Team, ours: Team) -> Self {
        if team == Team::Neutral {
            Allegiance::Neutral
        } else if team == ours {
            Allegiance::Ours
        } else {
            Allegiance::Enemy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcEntry {
    pub location: Location,
    pub allegiance: Allegiance,
    /// Last reported influence, if anyone reported one.
    pub influence: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcRegistry {
    entries: Vec<EcEntry>,
    broadcast_cursor: usize,
}

impl EcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry at `location`. Returns true when new.
    pub fn upsert(&mut self, location: Location, allegiance: Allegiance, influence: Option<i32>) -> bool {
        let entry = EcEntry {
            location,
            allegiance,
            influence,
        };
        match self.entries.iter_mut().find(|e| e.location == location) {
            Some(existing) => {
                *existing = entry;
                false
            }
            None => {
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn get(&self, location: Location) -> Option<&EcEntry> {
        self.entries.iter().find(|e| e.location == location)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EcEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, allegiance: Allegiance) -> usize {
        self.entries.iter().filter(|e| e.allegiance == allegiance).count()
    }

    /// Closest center of the given allegiance.
    pub fn closest(&self, from: Location, allegiance: Allegiance) -> Option<&EcEntry> {
        self.entries
            .iter()
            .filter(|e| e.allegiance == allegiance)
            .min_by_key(|e| e.location.distance_squared_to(from))
    }

    /// The neutral center cheapest to take, scoring distance² plus influence.
    ///
    /// Centers whose influence would leave less than `reserve` out of
    /// `1.7 * influence` are skipped. Unknown influence counts as zero.
    pub fn best_neutral(&self, from: Location, influence: i32, reserve: i32) -> Option<&EcEntry> {
        let acting = (1.7 * influence as f64) as i32;
        self.entries
            .iter()
            .filter(|e| e.allegiance == Allegiance::Neutral)
            .filter(|e| acting - e.influence.unwrap_or(0) > reserve)
            .min_by_key(|e| e.location.distance_squared_to(from) + e.influence.unwrap_or(0))
    }

    /// Rotate through centers that are not ours; `home` when there are none.
    pub fn next_broadcast(&mut self, home: Location) -> Location {
        let n = self.entries.len();
        for _ in 0..n {
            self.broadcast_cursor = (self.broadcast_cursor + 1) % n;
            let entry = &self.entries[self.broadcast_cursor];
            if entry.allegiance != Allegiance::Ours {
                return entry.location;
            }
        }
        home
    }
}
