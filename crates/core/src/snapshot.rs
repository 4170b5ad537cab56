//! Generation history for stepping a grid backwards.
//!
//! A [`Snapshot`] holds the rows plus the CTRL/CONFIG registers, so a rewind
//! also restores the boundary mode and the enable bit that produced the
//! history. The pending pulse is never captured.
//!
//! [`RewindBuffer`] keeps the most recent snapshots keyed by generation. A
//! capture is stored only once the generation has moved `interval` past the
//! newest entry; a generation counter that goes backwards (reset, state load)
//! starts a new history.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Logical rows, column c in bit c
    pub rows: Vec<u64>,
    pub generation: u64,
    pub cycle: u64,
    /// CTRL with the pulse bit masked off
    pub ctrl: u32,
    pub config: u32,
}

pub struct RewindBuffer {
    history: VecDeque<Snapshot>,
    capacity: usize,
    /// Minimum generation distance between stored snapshots
    pub interval: u64,
}

impl RewindBuffer {
    pub fn new(capacity: usize, interval: u64) -> Self {
        let capacity = capacity.max(1);
        RewindBuffer { history: VecDeque::with_capacity(capacity), capacity, interval: interval.max(1) }
    }

    /// Offer a snapshot. Returns true if it was stored.
    pub fn capture(&mut self, snap: Snapshot) -> bool {
        if let Some(newest) = self.history.back() {
            if snap.generation < newest.generation {
                self.history.clear();
            } else if snap.generation < newest.generation + self.interval {
                return false;
            }
        }
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(snap);
        true
    }

    /// Take the newest snapshot.
    pub fn rewind(&mut self) -> Option<Snapshot> {
        self.history.pop_back()
    }

    /// Generation of the newest snapshot.
    pub fn newest_generation(&self) -> Option<u64> {
        self.history.back().map(|s| s.generation)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
