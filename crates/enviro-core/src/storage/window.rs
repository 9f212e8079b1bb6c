//! Sliding window of recent readings.

use std::collections::VecDeque;

use super::{Aggregate, Reading};

/// Sliding buffer of the most recent readings.
///
/// Holds at most `capacity` readings; pushing into a full window drops the
/// oldest one first.
#[derive(Debug, Clone)]
pub struct Window {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl Window {
    /// Create an empty window. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest entries until there is room.
    pub fn push(&mut self, reading: Reading) {
        while self.readings.len() > self.capacity - 1 {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the window holds at least half its capacity.
    ///
    /// For odd capacities this rounds up: a window of 5 needs 3 readings.
    pub fn is_half_full(&self) -> bool {
        self.readings.len() * 2 >= self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Mean over everything currently in the window.
    pub fn aggregate(&self) -> Option<Aggregate> {
        Aggregate::from_readings(&self.readings)
    }
}
