//! Ordered set of agent ids with constant-time add, remove and lookup.
//!
//! Iteration order is insertion order until a removal, which moves the
//! last id into the freed slot. A rotating cursor hands out bounded
//! batches so a large set is visited fairly across turns.

use std::collections::HashMap;

use crate::types::AgentId;

#[derive(Debug, Clone, Default)]
pub struct IdSet {
    ids: Vec<AgentId>,
    index: HashMap<AgentId, usize>,
    cursor: usize,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: AgentId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.ids.len());
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: AgentId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };
        self.ids.swap_remove(slot);
        if let Some(moved) = self.ids.get(slot) {
            self.index.insert(*moved, slot);
        }
        true
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.ids.iter().copied()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.index.clear();
        self.cursor = 0;
    }

    /// Up to `budget` ids starting at the cursor, wrapping around once.
    /// The cursor advances past the returned ids.
    pub fn next_batch(&mut self, budget: usize) -> Vec<AgentId> {
        let n = self.ids.len();
        if n == 0 {
            self.cursor = 0;
            return Vec::new();
        }
        let take = budget.min(n);
        let start = self.cursor % n;
        let batch = (0..take).map(|j| self.ids[(start + j) % n]).collect();
        self.cursor = (start + take) % n;
        batch
    }
}

impl FromIterator<AgentId> for IdSet {
    fn from_iter<I: IntoIterator<Item = AgentId>>(iter: I) -> Self {
        let mut set = IdSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}
