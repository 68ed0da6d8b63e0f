//! Dispatch queue: the hand-off FIFO toward the device
//!
//! Requests selected by a dispatch round are placed in ascending-sector
//! position so each burst reaches the device in elevator order. `Front`
//! and `Back` inserts bypass the sorting and hit the head or tail
//! directly.

use std::collections::VecDeque;

use crate::request::{RequestId, RequestPool};

/// FIFO of requests no longer owned by any issuer queue
#[derive(Debug, Default)]
pub struct DispatchQueue {
    fifo: VecDeque<RequestId>,
}

impl DispatchQueue {
    /// Create an empty dispatch queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push at the head, ahead of everything already queued
    pub fn push_front(&mut self, id: RequestId) {
        self.fifo.push_front(id);
    }

    /// Append at the tail
    pub fn push_back(&mut self, id: RequestId) {
        self.fifo.push_back(id);
    }

    /// Insert in ascending start-sector position
    ///
    /// Scans from the tail; dispatch rounds produce mostly-ascending
    /// sectors so the common case is a plain append.
    pub fn push_sorted(&mut self, pool: &RequestPool, id: RequestId) {
        let start = pool.get(id).range.start;
        let mut at = self.fifo.len();
        while at > 0 && pool.get(self.fifo[at - 1]).range.start > start {
            at -= 1;
        }
        self.fifo.insert(at, id);
    }

    /// Pop the head of the FIFO
    pub fn pop_front(&mut self) -> Option<RequestId> {
        self.fifo.pop_front()
    }

    /// Unlink a request wherever it sits; true if it was present
    pub fn remove(&mut self, id: RequestId) -> bool {
        match self.fifo.iter().position(|&candidate| candidate == id) {
            Some(position) => {
                self.fifo.remove(position);
                true
            }
            None => false,
        }
    }

    /// Number of queued requests
    #[must_use]
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    /// True when nothing is waiting for the device
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    /// Iterate the queue in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.fifo.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairq_common::{Direction, IssuerId, SectorRange};

    fn pool_with(starts: &[u64]) -> (RequestPool, Vec<RequestId>) {
        let mut pool = RequestPool::new(16);
        let ids = starts
            .iter()
            .map(|&start| {
                pool.alloc(SectorRange::new(start, 8), Direction::Write, IssuerId::new(1), 0)
                    .unwrap()
            })
            .collect();
        (pool, ids)
    }

    #[test]
    fn test_sorted_placement() {
        let (pool, ids) = pool_with(&[200, 100, 300, 150]);
        let mut queue = DispatchQueue::new();
        for &id in &ids {
            queue.push_sorted(&pool, id);
        }

        let order: Vec<u64> = queue.iter().map(|id| pool.get(id).range.start).collect();
        assert_eq!(order, vec![100, 150, 200, 300]);
    }

    #[test]
    fn test_front_and_back_bypass_sorting() {
        let (pool, ids) = pool_with(&[200, 100, 300]);
        let mut queue = DispatchQueue::new();
        queue.push_sorted(&pool, ids[0]);
        queue.push_front(ids[1]);
        queue.push_back(ids[2]);

        assert_eq!(queue.pop_front(), Some(ids[1]));
        assert_eq!(queue.pop_front(), Some(ids[0]));
        assert_eq!(queue.pop_front(), Some(ids[2]));
        assert_eq!(queue.pop_front(), None);
    }

    #[test]
    fn test_remove() {
        let (pool, ids) = pool_with(&[100, 200]);
        let mut queue = DispatchQueue::new();
        queue.push_sorted(&pool, ids[0]);
        queue.push_sorted(&pool, ids[1]);

        assert!(queue.remove(ids[0]));
        assert!(!queue.remove(ids[0]));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_front(), Some(ids[1]));
    }
}
