//! Eviction Queue Module
//!
//! Tracks insertion order of in-memory entries for oldest-first eviction.

use std::collections::VecDeque;

// == Eviction Queue ==
/// Insertion-order tracker paired with each entry's estimated size.
///
/// - Front = most recently written
/// - Back = oldest, evicted first
///
/// Reads do not reorder; only writes move a key to the front.
#[derive(Debug, Default)]
pub struct EvictionQueue {
    order: VecDeque<(String, usize)>,
}

impl EvictionQueue {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Records a write of `key` with the given size.
    ///
    /// Returns the previously tracked size for the key, if any, so the
    /// caller can keep its byte total accurate on overwrite.
    pub fn push(&mut self, key: &str, size: usize) -> Option<usize> {
        let previous = self.remove(key);
        self.order.push_front((key.to_string(), size));
        previous
    }

    // == Remove ==
    /// Stops tracking a key, returning its size.
    pub fn remove(&mut self, key: &str) -> Option<usize> {
        let index = self.order.iter().position(|(k, _)| k == key)?;
        self.order.remove(index).map(|(_, size)| size)
    }

    // == Pop Oldest ==
    /// Removes and returns the oldest key with its size.
    pub fn pop_oldest(&mut self) -> Option<(String, usize)> {
        self.order.pop_back()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
