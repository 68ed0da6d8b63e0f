//! Per-issuer sorted queueing
//!
//! One [`IssuerQueue`] holds a single issuer's pending requests keyed by
//! starting sector, so dispatch always serves that issuer's lowest-sector
//! work first (elevator ordering inside a fair-queuing frame).

use fairq_common::{Direction, IssuerId};
use std::collections::BTreeMap;

use crate::request::{RequestId, RequestPool};

/// One issuer's pending requests, sorted by starting sector
#[derive(Debug)]
pub struct IssuerQueue {
    issuer: IssuerId,
    sorted: BTreeMap<u64, RequestId>,
    /// Pending counts, indexed by `Direction::index`
    queued: [usize; 2],
    /// True while this queue is linked into the rotation list
    pub(crate) on_rotation: bool,
}

impl IssuerQueue {
    /// Create an empty queue for `issuer`
    #[must_use]
    pub fn new(issuer: IssuerId) -> Self {
        Self {
            issuer,
            sorted: BTreeMap::new(),
            queued: [0, 0],
            on_rotation: false,
        }
    }

    /// The issuer this queue belongs to
    #[must_use]
    pub const fn issuer(&self) -> IssuerId {
        self.issuer
    }

    /// Keyed insert by starting sector
    ///
    /// Two requests cannot share a sort key. If one already sits at this
    /// start sector it is displaced and returned; the caller relocates it
    /// into the dispatch queue (collision eviction, not an error path).
    pub fn insert(&mut self, pool: &RequestPool, id: RequestId) -> Option<RequestId> {
        let request = pool.get(id);
        self.queued[request.direction.index()] += 1;

        let evicted = self.sorted.insert(request.range.start, id);
        if let Some(evicted) = evicted {
            let displaced = pool.get(evicted);
            self.queued[displaced.direction.index()] -= 1;
        }
        evicted
    }

    /// Remove a request from the sorted set
    pub fn remove(&mut self, pool: &RequestPool, id: RequestId) {
        let request = pool.get(id);
        let removed = self.sorted.remove(&request.range.start);
        assert_eq!(
            removed,
            Some(id),
            "request {id} not present in issuer queue {}",
            self.issuer
        );
        self.queued[request.direction.index()] -= 1;
    }

    /// Pop the request with the smallest starting sector
    pub fn take_lowest(&mut self, pool: &RequestPool) -> Option<RequestId> {
        let (_, id) = self.sorted.pop_first()?;
        self.queued[pool.get(id).direction.index()] -= 1;
        Some(id)
    }

    /// Ordered predecessor of a queued request, if any
    #[must_use]
    pub fn former(&self, pool: &RequestPool, id: RequestId) -> Option<RequestId> {
        let start = pool.get(id).range.start;
        self.sorted.range(..start).next_back().map(|(_, &id)| id)
    }

    /// Ordered successor of a queued request, if any
    #[must_use]
    pub fn latter(&self, pool: &RequestPool, id: RequestId) -> Option<RequestId> {
        let start = pool.get(id).range.start;
        self.sorted
            .range(start + 1..)
            .next()
            .map(|(_, &id)| id)
    }

    /// Front-merge target: a queued request starting exactly at the new
    /// I/O's end sector, in the same direction
    #[must_use]
    pub fn front_merge_candidate(
        &self,
        pool: &RequestPool,
        end: u64,
        direction: Direction,
    ) -> Option<RequestId> {
        let &id = self.sorted.get(&end)?;
        (pool.get(id).direction == direction).then_some(id)
    }

    /// Pending count for one direction
    #[must_use]
    pub const fn queued(&self, direction: Direction) -> usize {
        self.queued[direction.index()]
    }

    /// Total pending requests
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// True when the sorted set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairq_common::SectorRange;

    fn pool_with(starts: &[u64]) -> (RequestPool, Vec<RequestId>) {
        let mut pool = RequestPool::new(16);
        let ids = starts
            .iter()
            .map(|&start| {
                pool.alloc(SectorRange::new(start, 8), Direction::Read, IssuerId::new(7), 0)
                    .unwrap()
            })
            .collect();
        (pool, ids)
    }

    #[test]
    fn test_take_lowest_is_sorted() {
        let (pool, ids) = pool_with(&[300, 100, 200]);
        let mut queue = IssuerQueue::new(IssuerId::new(7));
        for &id in &ids {
            assert!(queue.insert(&pool, id).is_none());
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.queued(Direction::Read), 3);

        let mut last = 0;
        while let Some(id) = queue.take_lowest(&pool) {
            let start = pool.get(id).range.start;
            assert!(start >= last);
            last = start;
        }
        assert!(queue.is_empty());
        assert_eq!(queue.queued(Direction::Read), 0);
    }

    #[test]
    fn test_collision_evicts_existing() {
        let (pool, ids) = pool_with(&[100, 100]);
        let mut queue = IssuerQueue::new(IssuerId::new(7));

        assert!(queue.insert(&pool, ids[0]).is_none());
        // Same sort key: the earlier request is displaced
        assert_eq!(queue.insert(&pool, ids[1]), Some(ids[0]));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.queued(Direction::Read), 1);
        assert_eq!(queue.take_lowest(&pool), Some(ids[1]));
    }

    #[test]
    fn test_neighbor_lookups() {
        let (pool, ids) = pool_with(&[100, 200, 300]);
        let mut queue = IssuerQueue::new(IssuerId::new(7));
        for &id in &ids {
            queue.insert(&pool, id);
        }

        assert_eq!(queue.former(&pool, ids[1]), Some(ids[0]));
        assert_eq!(queue.latter(&pool, ids[1]), Some(ids[2]));
        assert_eq!(queue.former(&pool, ids[0]), None);
        assert_eq!(queue.latter(&pool, ids[2]), None);
    }

    #[test]
    fn test_front_merge_candidate() {
        let (pool, ids) = pool_with(&[200]);
        let mut queue = IssuerQueue::new(IssuerId::new(7));
        queue.insert(&pool, ids[0]);

        // New I/O [192, 200) ends where the queued request begins
        assert_eq!(
            queue.front_merge_candidate(&pool, 200, Direction::Read),
            Some(ids[0])
        );
        assert_eq!(
            queue.front_merge_candidate(&pool, 200, Direction::Write),
            None
        );
        assert_eq!(queue.front_merge_candidate(&pool, 199, Direction::Read), None);
    }

    #[test]
    #[should_panic(expected = "not present in issuer queue")]
    fn test_remove_unknown_panics() {
        let (pool, ids) = pool_with(&[100]);
        let mut queue = IssuerQueue::new(IssuerId::new(7));
        queue.remove(&pool, ids[0]);
    }
}
