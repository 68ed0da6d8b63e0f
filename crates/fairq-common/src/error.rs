//! Error types for fairq
//!
//! Pool exhaustion is the only failure that crosses the scheduler API as a
//! value. Caller contract violations (stale handles, double removes) are
//! fatal assertions inside the engine, not variants here.

use thiserror::Error;

/// Common result type for fairq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for fairq
#[derive(Debug, Error)]
pub enum Error {
    // Pool exhaustion
    #[error("request pool exhausted: capacity {capacity}")]
    OutOfRequests { capacity: usize },

    #[error("issuer queue budget exhausted: capacity {capacity}")]
    OutOfIssuerQueues { capacity: usize },

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this is a pool-exhaustion error
    ///
    /// These are the backpressure signals a host stack retries after
    /// draining some of its outstanding I/O.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            Self::OutOfRequests { .. } | Self::OutOfIssuerQueues { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exhausted() {
        assert!(Error::OutOfRequests { capacity: 128 }.is_exhausted());
        assert!(Error::OutOfIssuerQueues { capacity: 64 }.is_exhausted());
        assert!(!Error::configuration("bad quantum").is_exhausted());
    }

    #[test]
    fn test_error_display() {
        let err = Error::OutOfRequests { capacity: 8 };
        assert_eq!(err.to_string(), "request pool exhausted: capacity 8");
    }
}
