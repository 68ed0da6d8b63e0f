//! Scheduler statistics
//!
//! Monotonic counters maintained by the [`crate::Scheduler`] as it works.
//! The engine is single-threaded by contract, so these are plain fields;
//! snapshots are cheap copies.

use std::fmt;

/// Counters for one scheduler instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedStats {
    /// Requests allocated from the pool
    pub allocated: u64,
    /// Requests inserted on the common sorted path
    pub inserted_sorted: u64,
    /// Requests pushed to the dispatch head (retry path)
    pub inserted_front: u64,
    /// Barrier inserts appended at the dispatch tail
    pub inserted_back: u64,
    /// Requests flushed out of issuer queues by barrier inserts
    pub barrier_flushed: u64,
    /// Committed back merges
    pub back_merges: u64,
    /// Committed front merges
    pub front_merges: u64,
    /// Requests displaced to the dispatch queue by a sort-key collision
    pub collision_evictions: u64,
    /// Dispatch rounds run
    pub dispatch_rounds: u64,
    /// Requests handed to the host via `dispatch_next`
    pub dispatched: u64,
    /// Requests removed before dispatch completion
    pub removed: u64,
}

impl fmt::Display for SchedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocated={} sorted={} front={} back={} merges={}/{} evictions={} \
             rounds={} dispatched={} removed={}",
            self.allocated,
            self.inserted_sorted,
            self.inserted_front,
            self.inserted_back,
            self.back_merges,
            self.front_merges,
            self.collision_evictions,
            self.dispatch_rounds,
            self.dispatched,
            self.removed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_compact() {
        let stats = SchedStats {
            allocated: 3,
            dispatched: 2,
            ..SchedStats::default()
        };
        let line = stats.to_string();
        assert!(line.contains("allocated=3"));
        assert!(line.contains("dispatched=2"));
    }
}
