//! Configuration types for fairq
//!
//! Tunables for the scheduler: dispatch burst size, pool bounds and the
//! admission-control knobs.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedConfig {
    /// Maximum requests moved into the dispatch stream per dispatch round
    /// before yielding back to the caller
    pub quantum: usize,
    /// Pool headroom subtracted from `capacity` when computing the
    /// per-issuer admission limit
    pub queued_reserve: usize,
    /// Upper bound on a single issuer's per-direction pending count
    pub max_queued: usize,
    /// Total request pool capacity
    pub capacity: usize,
    /// Maximum number of concurrently busy issuer queues
    pub max_issuers: usize,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            quantum: 4,
            queued_reserve: 8,
            max_queued: 8,
            capacity: 128,
            max_issuers: 64,
        }
    }
}

impl SchedConfig {
    /// Validate the configuration
    ///
    /// Rejects values the dispatch and admission arithmetic cannot work
    /// with; defaults always validate.
    pub fn validate(&self) -> Result<()> {
        if self.quantum == 0 {
            return Err(Error::configuration("quantum must be at least 1"));
        }
        if self.capacity == 0 {
            return Err(Error::configuration("capacity must be at least 1"));
        }
        if self.max_issuers == 0 {
            return Err(Error::configuration("max_issuers must be at least 1"));
        }
        if self.max_queued == 0 {
            return Err(Error::configuration("max_queued must be at least 1"));
        }
        if self.queued_reserve >= self.capacity {
            return Err(Error::configuration(format!(
                "queued_reserve ({}) must be below capacity ({})",
                self.queued_reserve, self.capacity
            )));
        }
        Ok(())
    }
}
