//! The fair-queuing scheduler
//!
//! Coordinates the request pool, merge index, per-issuer sorted queues,
//! rotation list and dispatch queue behind the host-facing call surface.
//! Every operation here assumes external serialization (see
//! [`crate::shared::SharedScheduler`] for the lock-wrapped form) and none
//! of them block.
//!
//! Request lifecycle: `Unqueued -> Queued -> Dispatched -> returned to
//! host`. A request removed while queued goes straight back to the host
//! without passing through the dispatch queue. Any other transition is a
//! caller contract violation and panics.

use fairq_common::{Direction, Error, IssuerId, Result, SchedConfig, SectorRange};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info, trace};

use crate::dispatch::DispatchQueue;
use crate::issuer::IssuerQueue;
use crate::merge::MergeIndex;
use crate::request::{Request, RequestId, RequestPool, RequestState};
use crate::rotation::RotationList;
use crate::stats::SchedStats;

/// Where an insert places a request relative to the dispatch stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertPosition {
    /// Common path: sort into the issuer's queue and rotate fairly
    Sorted,
    /// Head of the dispatch queue, bypassing fairness (retry path)
    Front,
    /// Barrier: flush every busy queue, then append at the dispatch tail
    Back,
}

/// Outcome of a merge probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No adjacent queued request was found
    NoMerge,
    /// The new I/O extends this queued request at its end
    BackMerge(RequestId),
    /// The new I/O extends this queued request at its front
    FrontMerge(RequestId),
}

/// Fair-queuing block I/O scheduler
///
/// One instance per device queue; owns every table it arbitrates over.
pub struct Scheduler {
    config: SchedConfig,
    pool: RequestPool,
    issuers: HashMap<IssuerId, IssuerQueue>,
    rotation: RotationList,
    dispatch: DispatchQueue,
    merge: MergeIndex,
    stats: SchedStats,
}

impl Scheduler {
    /// Create a scheduler from a validated configuration
    pub fn new(config: SchedConfig) -> Result<Self> {
        config.validate()?;
        info!(
            quantum = config.quantum,
            capacity = config.capacity,
            max_issuers = config.max_issuers,
            "fair-queuing scheduler initialized"
        );
        Ok(Self {
            pool: RequestPool::new(config.capacity),
            issuers: HashMap::new(),
            rotation: RotationList::new(),
            dispatch: DispatchQueue::new(),
            merge: MergeIndex::new(),
            stats: SchedStats::default(),
            config,
        })
    }

    /// Allocate a request from the pool
    ///
    /// The handle stays `Unqueued` until [`Scheduler::insert`] accepts it.
    pub fn alloc_request(
        &mut self,
        range: SectorRange,
        direction: Direction,
        issuer: IssuerId,
        payload: u64,
    ) -> Result<RequestId> {
        let id = self.pool.alloc(range, direction, issuer, payload)?;
        self.stats.allocated += 1;
        Ok(id)
    }

    /// Probe for a merge target for an incoming I/O
    ///
    /// Pure query: nothing changes until the caller commits with
    /// [`Scheduler::commit_merge`]. Back merges are found index-wide; a
    /// front merge is only looked for in the issuer's own sorted queue.
    #[must_use]
    pub fn merge_attempt(
        &self,
        range: SectorRange,
        direction: Direction,
        issuer: IssuerId,
    ) -> MergeOutcome {
        if let Some(target) = self.merge.find_back_merge(&self.pool, range.start, direction) {
            return MergeOutcome::BackMerge(target);
        }
        if let Some(queue) = self.issuers.get(&issuer)
            && let Some(target) = queue.front_merge_candidate(&self.pool, range.end(), direction)
        {
            return MergeOutcome::FrontMerge(target);
        }
        MergeOutcome::NoMerge
    }

    /// Commit a previously-detected merge
    ///
    /// Extends `survivor` over `absorbed`'s adjacent range and releases
    /// `absorbed` back to the pool. The survivor must be queued; the
    /// absorbed request may be queued or still unqueued (merge detected
    /// before insertion). Non-adjacent or direction-mismatched pairs are
    /// contract violations.
    pub fn commit_merge(&mut self, survivor: RequestId, absorbed: RequestId) {
        assert_ne!(survivor, absorbed, "cannot merge a request with itself");
        let (survivor_range, survivor_direction, survivor_state) = {
            let request = self.pool.get(survivor);
            (request.range, request.direction, request.state())
        };
        let (absorbed_range, absorbed_direction, absorbed_state) = {
            let request = self.pool.get(absorbed);
            (request.range, request.direction, request.state())
        };

        assert_eq!(
            survivor_state,
            RequestState::Queued,
            "merge survivor must be queued"
        );
        assert_eq!(
            survivor_direction, absorbed_direction,
            "merge requires matching directions"
        );
        let back = survivor_range.precedes(&absorbed_range);
        assert!(
            back || survivor_range.follows(&absorbed_range),
            "merge requires sector-adjacent requests: {survivor_range:?} / {absorbed_range:?}"
        );

        match absorbed_state {
            RequestState::Queued => self.detach_queued(absorbed),
            RequestState::Unqueued => {}
            RequestState::Dispatched => panic!("cannot merge a dispatched request"),
        }
        let absorbed_request = self.pool.free(absorbed);

        if back {
            // End sector moves, so the merge-index key changes
            self.merge.deindex(survivor_range.end(), survivor);
            self.pool.get_mut(survivor).range.length += absorbed_request.range.length;
            self.merge.index(&self.pool, survivor);
            self.stats.back_merges += 1;
        } else {
            // Start sector moves: the sort key changes, re-sort within the
            // issuer queue (collision eviction applies on re-insertion)
            let issuer = self.pool.get(survivor).issuer;
            {
                let queue = self
                    .issuers
                    .get_mut(&issuer)
                    .expect("queued request without issuer queue");
                queue.remove(&self.pool, survivor);
            }
            {
                let request = self.pool.get_mut(survivor);
                request.range.start = absorbed_request.range.start;
                request.range.length += absorbed_request.range.length;
            }
            let evicted = {
                let queue = self
                    .issuers
                    .get_mut(&issuer)
                    .expect("queued request without issuer queue");
                queue.insert(&self.pool, survivor)
            };
            if let Some(evicted) = evicted {
                self.evict_to_dispatch(evicted);
            }
            self.stats.front_merges += 1;
        }

        debug!(
            survivor = %survivor,
            range = %self.pool.get(survivor).range,
            back_merge = back,
            "merge committed"
        );
    }

    /// Queue a request for scheduling
    ///
    /// Fails only when a new issuer queue would exceed the issuer budget;
    /// the request then stays `Unqueued` and owned by the caller.
    pub fn insert(&mut self, id: RequestId, position: InsertPosition) -> Result<()> {
        assert_eq!(
            self.pool.get(id).state(),
            RequestState::Unqueued,
            "insert requires an unqueued request"
        );

        match position {
            InsertPosition::Front => {
                self.pool.get_mut(id).state = RequestState::Dispatched;
                self.dispatch.push_front(id);
                self.stats.inserted_front += 1;
            }
            InsertPosition::Back => {
                let flushed = self.flush_all();
                self.stats.barrier_flushed += flushed as u64;
                self.pool.get_mut(id).state = RequestState::Dispatched;
                self.dispatch.push_back(id);
                self.stats.inserted_back += 1;
                debug!(request = %id, flushed, "barrier insert");
            }
            InsertPosition::Sorted => {
                let issuer = self.pool.get(id).issuer;
                let busy = self.issuers.len();
                let (was_empty, evicted) = {
                    let queue = match self.issuers.entry(issuer) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => {
                            if busy >= self.config.max_issuers {
                                return Err(Error::OutOfIssuerQueues {
                                    capacity: self.config.max_issuers,
                                });
                            }
                            trace!(%issuer, "issuer queue created");
                            entry.insert(IssuerQueue::new(issuer))
                        }
                    };
                    let was_empty = queue.is_empty();
                    self.pool.get_mut(id).state = RequestState::Queued;
                    let evicted = queue.insert(&self.pool, id);
                    if was_empty {
                        queue.on_rotation = true;
                    }
                    (was_empty, evicted)
                };
                if was_empty {
                    self.rotation.push(issuer);
                }
                self.merge.index(&self.pool, id);
                if let Some(evicted) = evicted {
                    self.evict_to_dispatch(evicted);
                }
                self.stats.inserted_sorted += 1;
            }
        }
        Ok(())
    }

    /// Remove a request the scheduler still owns and return it to the host
    ///
    /// Legal on queued requests and on dispatched requests still waiting
    /// in the dispatch queue. Anything else is a contract violation.
    pub fn remove(&mut self, id: RequestId) -> Request {
        match self.pool.get(id).state() {
            RequestState::Queued => self.detach_queued(id),
            RequestState::Dispatched => {
                let present = self.dispatch.remove(id);
                assert!(present, "dispatched request {id} not in dispatch queue");
            }
            RequestState::Unqueued => {
                panic!("remove of a request the scheduler does not own: {id}")
            }
        }
        self.stats.removed += 1;
        self.pool.free(id)
    }

    /// Hand the next request to the device
    ///
    /// Pops the dispatch queue head; when it is empty, runs one dispatch
    /// round over the rotation first. Returns `None` only when nothing is
    /// pending anywhere. Ownership of the returned request transfers to
    /// the host; its pool slot is released.
    pub fn dispatch_next(&mut self) -> Option<Request> {
        if self.dispatch.is_empty() {
            if self.rotation.is_empty() {
                return None;
            }
            self.run_dispatch_round();
        }
        let id = self.dispatch.pop_front()?;
        self.stats.dispatched += 1;
        Some(self.pool.free(id))
    }

    /// Backpressure probe for one issuer and direction
    ///
    /// The per-issuer limit is the issuer's fair share of the pool minus
    /// reserve headroom, clamped into `[3, max_queued]`. Always true on a
    /// cold start or for an issuer with no queue yet.
    #[must_use]
    pub fn admission_check(&self, issuer: IssuerId, direction: Direction) -> bool {
        let busy = self.issuers.len();
        if busy == 0 {
            return true;
        }
        let Some(queue) = self.issuers.get(&issuer) else {
            return true;
        };
        let share = self
            .config
            .capacity
            .saturating_sub(self.config.queued_reserve)
            / busy;
        let limit = share.min(self.config.max_queued).max(3);
        queue.queued(direction) < limit
    }

    /// Ordered predecessor of a queued request within its issuer's queue
    #[must_use]
    pub fn former_request(&self, id: RequestId) -> Option<RequestId> {
        let request = self.pool.get(id);
        if request.state() != RequestState::Queued {
            return None;
        }
        self.issuers.get(&request.issuer)?.former(&self.pool, id)
    }

    /// Ordered successor of a queued request within its issuer's queue
    #[must_use]
    pub fn latter_request(&self, id: RequestId) -> Option<RequestId> {
        let request = self.pool.get(id);
        if request.state() != RequestState::Queued {
            return None;
        }
        self.issuers.get(&request.issuer)?.latter(&self.pool, id)
    }

    /// True iff both the dispatch queue and the rotation are empty
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.dispatch.is_empty() && self.rotation.is_empty()
    }

    /// Drain everything still queued or dispatched and return it
    pub fn shutdown(&mut self) -> Vec<Request> {
        self.flush_all();
        let mut drained = Vec::with_capacity(self.dispatch.len());
        while let Some(id) = self.dispatch.pop_front() {
            drained.push(self.pool.free(id));
        }
        info!(drained = drained.len(), "scheduler shut down");
        drained
    }

    /// Borrow a request the scheduler still owns
    #[must_use]
    pub fn request(&self, id: RequestId) -> &Request {
        self.pool.get(id)
    }

    /// Number of busy issuer queues
    #[must_use]
    pub fn busy_issuers(&self) -> usize {
        self.issuers.len()
    }

    /// Pending requests for one issuer (0 if it has no queue)
    #[must_use]
    pub fn pending(&self, issuer: IssuerId) -> usize {
        self.issuers.get(&issuer).map_or(0, IssuerQueue::len)
    }

    /// Requests waiting in the dispatch queue
    #[must_use]
    pub fn dispatch_len(&self) -> usize {
        self.dispatch.len()
    }

    /// Live requests across all states
    #[must_use]
    pub fn live_requests(&self) -> usize {
        self.pool.live()
    }

    /// Snapshot of the counters
    #[must_use]
    pub const fn stats(&self) -> SchedStats {
        self.stats
    }

    /// The configuration this scheduler runs with
    #[must_use]
    pub const fn config(&self) -> &SchedConfig {
        &self.config
    }

    /// Unlink a queued request from the merge index and its issuer queue,
    /// destroying the queue if it drained
    fn detach_queued(&mut self, id: RequestId) {
        let (issuer, end) = {
            let request = self.pool.get(id);
            (request.issuer, request.range.end())
        };
        self.merge.deindex(end, id);
        let empty = {
            let queue = self
                .issuers
                .get_mut(&issuer)
                .expect("queued request without issuer queue");
            queue.remove(&self.pool, id);
            queue.is_empty()
        };
        self.pool.get_mut(id).state = RequestState::Unqueued;
        if empty {
            self.release_issuer(issuer);
        }
    }

    /// Relocate a collision-displaced request into the dispatch queue
    fn evict_to_dispatch(&mut self, id: RequestId) {
        let end = self.pool.get(id).range.end();
        self.merge.deindex(end, id);
        self.pool.get_mut(id).state = RequestState::Dispatched;
        self.dispatch.push_sorted(&self.pool, id);
        self.stats.collision_evictions += 1;
        debug!(request = %id, "sort-key collision, evicted to dispatch queue");
    }

    /// Move the lowest-sector request of `issuer`'s queue into the
    /// dispatch queue; true while the queue has more pending work
    fn dispatch_one(&mut self, issuer: IssuerId) -> bool {
        let (id, still_busy) = {
            let queue = self
                .issuers
                .get_mut(&issuer)
                .expect("rotation references unknown issuer");
            let id = queue
                .take_lowest(&self.pool)
                .expect("busy issuer queue with no requests");
            let still_busy = !queue.is_empty();
            queue.on_rotation = still_busy;
            (id, still_busy)
        };
        let end = self.pool.get(id).range.end();
        self.merge.deindex(end, id);
        self.pool.get_mut(id).state = RequestState::Dispatched;
        self.dispatch.push_sorted(&self.pool, id);
        still_busy
    }

    /// One dispatch round: whole round-robin passes, at most one request
    /// per busy queue per pass, stopping between passes once `quantum`
    /// requests moved or the rotation drained
    fn run_dispatch_round(&mut self) {
        let quantum = self.config.quantum;
        let mut appended = 0usize;
        while appended < quantum && !self.rotation.is_empty() {
            let pass = self.rotation.len();
            for _ in 0..pass {
                let Some(issuer) = self.rotation.take_current() else {
                    break;
                };
                if self.dispatch_one(issuer) {
                    self.rotation.requeue(issuer);
                } else {
                    self.release_issuer(issuer);
                }
                appended += 1;
            }
        }
        self.stats.dispatch_rounds += 1;
        trace!(appended, remaining = self.rotation.len(), "dispatch round");
    }

    /// Barrier flush: drain every busy issuer queue into the dispatch
    /// queue, in sector order per queue
    fn flush_all(&mut self) -> usize {
        let mut flushed = 0usize;
        while let Some(issuer) = self.rotation.take_current() {
            loop {
                let more = self.dispatch_one(issuer);
                flushed += 1;
                if !more {
                    break;
                }
            }
            self.release_issuer(issuer);
        }
        flushed
    }

    /// Destroy a drained issuer queue and drop it from the rotation
    fn release_issuer(&mut self, issuer: IssuerId) {
        let queue = self
            .issuers
            .remove(&issuer)
            .expect("releasing unknown issuer queue");
        assert!(queue.is_empty(), "releasing a non-empty issuer queue");
        if queue.on_rotation {
            self.rotation.remove(issuer);
        }
        trace!(%issuer, "issuer queue drained");
    }
}
