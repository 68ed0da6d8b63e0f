//! Request descriptors and the bounded pool that backs them
//!
//! All request storage lives in a slab-style arena. The rest of the
//! scheduler refers to requests through stable [`RequestId`] handles, so
//! the ordered and hashed containers never hold pointers into each other.

use fairq_common::{Direction, Error, IssuerId, Result, SectorRange};
use std::fmt;

/// Stable handle to a request slot in the pool
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u32);

impl RequestId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rq#{}", self.0)
    }
}

/// Which container currently owns a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
    /// Allocated but not yet handed to the scheduler
    Unqueued,
    /// Sorted into an issuer queue and visible to the merge index
    Queued,
    /// Moved to the dispatch queue; no longer merge-eligible
    Dispatched,
}

/// A single block I/O operation descriptor
#[derive(Clone, Debug)]
pub struct Request {
    /// Sector range covered by the operation
    pub range: SectorRange,
    /// Transfer direction
    pub direction: Direction,
    /// Scheduling unit this request belongs to
    pub issuer: IssuerId,
    /// Opaque handle the host uses to find its own I/O context
    pub payload: u64,
    pub(crate) state: RequestState,
}

impl Request {
    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> RequestState {
        self.state
    }
}

/// Bounded arena backing all request storage
///
/// Freed slots are recycled through a free list. Exhaustion surfaces as
/// [`Error::OutOfRequests`]; using a handle after its slot was freed is a
/// caller contract violation and panics.
#[derive(Debug)]
pub struct RequestPool {
    slots: Vec<Option<Request>>,
    free: Vec<u32>,
    live: usize,
    capacity: usize,
}

impl RequestPool {
    /// Create a pool with room for `capacity` concurrent requests
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity,
        }
    }

    /// Allocate a request slot
    pub fn alloc(
        &mut self,
        range: SectorRange,
        direction: Direction,
        issuer: IssuerId,
        payload: u64,
    ) -> Result<RequestId> {
        if self.live == self.capacity {
            return Err(Error::OutOfRequests {
                capacity: self.capacity,
            });
        }

        let request = Request {
            range,
            direction,
            issuer,
            payload,
            state: RequestState::Unqueued,
        };

        let id = if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(request);
            RequestId(index)
        } else {
            self.slots.push(Some(request));
            RequestId::from_index(self.slots.len() - 1)
        };

        self.live += 1;
        Ok(id)
    }

    /// Release a slot and return its descriptor to the caller
    pub fn free(&mut self, id: RequestId) -> Request {
        let request = self.slots[id.index()]
            .take()
            .expect("free of a stale request handle");
        self.live -= 1;
        self.free.push(id.index() as u32);
        request
    }

    /// Borrow a live request
    #[must_use]
    pub fn get(&self, id: RequestId) -> &Request {
        self.slots[id.index()]
            .as_ref()
            .expect("stale request handle")
    }

    /// Mutably borrow a live request
    pub fn get_mut(&mut self, id: RequestId) -> &mut Request {
        self.slots[id.index()]
            .as_mut()
            .expect("stale request handle")
    }

    /// Number of live requests
    #[must_use]
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Total pool capacity
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
