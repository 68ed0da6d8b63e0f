//! Thread-safe scheduler handle
//!
//! The engine itself is single-threaded and relies on external
//! serialization. [`SharedScheduler`] supplies that discipline for
//! embedders with multiple submitters: one coarse lock around every
//! operation, the same model the original ran under.

use fairq_common::{Direction, IssuerId, Result, SchedConfig, SectorRange};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::request::{Request, RequestId};
use crate::scheduler::{InsertPosition, MergeOutcome, Scheduler};
use crate::stats::SchedStats;

/// Cloneable, lock-wrapped [`Scheduler`]
#[derive(Clone)]
pub struct SharedScheduler {
    inner: Arc<Mutex<Scheduler>>,
}

impl SharedScheduler {
    /// Create a shared scheduler from a configuration
    pub fn new(config: SchedConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(Scheduler::new(config)?)),
        })
    }

    /// Allocate a request from the pool
    pub fn alloc_request(
        &self,
        range: SectorRange,
        direction: Direction,
        issuer: IssuerId,
        payload: u64,
    ) -> Result<RequestId> {
        self.inner
            .lock()
            .alloc_request(range, direction, issuer, payload)
    }

    /// Probe for a merge target
    #[must_use]
    pub fn merge_attempt(
        &self,
        range: SectorRange,
        direction: Direction,
        issuer: IssuerId,
    ) -> MergeOutcome {
        self.inner.lock().merge_attempt(range, direction, issuer)
    }

    /// Commit a previously-detected merge
    pub fn commit_merge(&self, survivor: RequestId, absorbed: RequestId) {
        self.inner.lock().commit_merge(survivor, absorbed);
    }

    /// Queue a request for scheduling
    pub fn insert(&self, id: RequestId, position: InsertPosition) -> Result<()> {
        self.inner.lock().insert(id, position)
    }

    /// Remove a request the scheduler still owns
    pub fn remove(&self, id: RequestId) -> Request {
        self.inner.lock().remove(id)
    }

    /// Hand the next request to the device
    pub fn dispatch_next(&self) -> Option<Request> {
        self.inner.lock().dispatch_next()
    }

    /// Backpressure probe for one issuer and direction
    #[must_use]
    pub fn admission_check(&self, issuer: IssuerId, direction: Direction) -> bool {
        self.inner.lock().admission_check(issuer, direction)
    }

    /// True iff nothing is queued or dispatched
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.inner.lock().is_idle()
    }

    /// Drain everything still pending
    pub fn shutdown(&self) -> Vec<Request> {
        self.inner.lock().shutdown()
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> SchedStats {
        self.inner.lock().stats()
    }

    /// Run a compound operation under one lock acquisition
    ///
    /// Useful when a probe and its commit must be atomic with respect to
    /// other submitters (e.g. `merge_attempt` followed by `commit_merge`).
    pub fn with<R>(&self, f: impl FnOnce(&mut Scheduler) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
