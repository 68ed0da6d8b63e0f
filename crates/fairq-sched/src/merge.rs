//! Adjacency-merge detection
//!
//! Every queued request is indexed under its end sector, so an incoming
//! I/O beginning at that sector is one hash lookup away from its
//! back-merge target. Front merges stay within the issuer's own sorted
//! queue and are probed there instead (see [`crate::issuer`]).

use fairq_common::Direction;
use std::collections::HashMap;

use crate::request::{RequestId, RequestPool, RequestState};

/// Hash index of queued requests keyed by their end sector
#[derive(Debug, Default)]
pub struct MergeIndex {
    by_end: HashMap<u64, Vec<RequestId>>,
}

impl MergeIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a queued request under its current end sector
    pub fn index(&mut self, pool: &RequestPool, id: RequestId) {
        let end = pool.get(id).range.end();
        self.by_end.entry(end).or_default().push(id);
    }

    /// Remove a request previously indexed under `end`
    ///
    /// Callers pass the end sector the request was indexed with, which may
    /// differ from its current range mid-merge.
    pub fn deindex(&mut self, end: u64, id: RequestId) {
        if let Some(candidates) = self.by_end.get_mut(&end) {
            candidates.retain(|&candidate| candidate != id);
            if candidates.is_empty() {
                self.by_end.remove(&end);
            }
        }
    }

    /// Find a back-merge target: a queued request whose range ends exactly
    /// at `start` and moves data in the same direction
    ///
    /// Candidates that are no longer queued (or whose range moved since
    /// indexing) are skipped, never trusted. Merging is best-effort; a miss
    /// here just means plain insertion.
    #[must_use]
    pub fn find_back_merge(
        &self,
        pool: &RequestPool,
        start: u64,
        direction: Direction,
    ) -> Option<RequestId> {
        self.by_end.get(&start)?.iter().copied().find(|&id| {
            let request = pool.get(id);
            request.state() == RequestState::Queued
                && request.direction == direction
                && request.range.end() == start
        })
    }

    /// Number of indexed requests
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_end.values().map(Vec::len).sum()
    }

    /// True if nothing is indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_end.is_empty()
    }
}
