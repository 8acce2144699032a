//! Broadcast board — every agent's public slot.
//!
//! Writes made during a round land in a pending buffer and become visible
//! when the round is committed, so all agents in a round read the same
//! values regardless of turn order. A slot keeps its value until its
//! owner overwrites it.

use std::collections::HashMap;

use beacon_core::error::HostError;
use beacon_core::types::AgentId;

#[derive(Debug, Clone, Default)]
pub struct BroadcastBoard {
    committed: HashMap<AgentId, u32>,
    pending: HashMap<AgentId, u32>,
}

impl BroadcastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed slot value. Empty slots read as `None`.
    pub fn read(&self, id: AgentId) -> Option<u32> {
        self.committed.get(&id).copied().filter(|flag| *flag != 0)
    }

    /// Stage a write for this round. One write per agent per round.
    pub fn write(&mut self, id: AgentId, flag: u32) -> Result<(), HostError> {
        if self.pending.contains_key(&id) {
            return Err(HostError::DuplicateBroadcast(id));
        }
        self.pending.insert(id, flag);
        Ok(())
    }

    /// Publish this round's writes.
    pub fn commit(&mut self) -> usize {
        let written = self.pending.len();
        for (id, flag) in self.pending.drain() {
            if flag == 0 {
                self.committed.remove(&id);
            } else {
                self.committed.insert(id, flag);
            }
        }
        written
    }

    /// Forget a slot entirely, for units that left the world.
    pub fn remove(&mut self, id: AgentId) {
        self.committed.remove(&id);
        self.pending.remove(&id);
    }

    /// Committed non-empty slots, sorted by id.
    pub fn slots(&self) -> Vec<(AgentId, u32)> {
        let mut slots: Vec<_> = self.committed.iter().map(|(id, flag)| (*id, *flag)).collect();
        slots.sort();
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_visible_after_commit() {
        let mut board = BroadcastBoard::new();
        board.write(AgentId(1), 42).unwrap();
        assert_eq!(board.read(AgentId(1)), None);
        assert_eq!(board.commit(), 1);
        assert_eq!(board.read(AgentId(1)), Some(42));
    }

    #[test]
    fn slot_persists_until_overwritten() {
        let mut board = BroadcastBoard::new();
        board.write(AgentId(1), 42).unwrap();
        board.commit();
        board.commit();
        assert_eq!(board.read(AgentId(1)), Some(42));
        board.write(AgentId(1), 0).unwrap();
        board.commit();
        assert_eq!(board.read(AgentId(1)), None);
    }

    #[test]
    fn second_write_in_a_round_is_rejected() {
        let mut board = BroadcastBoard::new();
        board.write(AgentId(7), 1).unwrap();
        assert_eq!(board.write(AgentId(7), 2), Err(HostError::DuplicateBroadcast(AgentId(7))));
        board.commit();
        assert_eq!(board.read(AgentId(7)), Some(1));
        assert!(board.write(AgentId(7), 2).is_ok());
    }
}
