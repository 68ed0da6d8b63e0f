//! Core type definitions for fairq
//!
//! This module defines the fundamental types shared by the scheduler
//! components: transfer direction, issuer identity, and sector ranges.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transfer direction of a block I/O request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Data moves from the device to the host
    Read,
    /// Data moves from the host to the device
    Write,
}

impl Direction {
    /// Index for per-direction bookkeeping arrays
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Read => 0,
            Self::Write => 1,
        }
    }

    /// Short lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of a scheduling unit (e.g. one per originating process)
///
/// The scheduler only compares and hashes issuer ids; the host stack
/// decides what they mean.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, From, Into)]
pub struct IssuerId(u64);

impl IssuerId {
    /// Create an issuer id from a host-supplied value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuerId({})", self.0)
    }
}

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contiguous run of sectors on a block device
///
/// Sectors are plain unsigned 64-bit logical block addresses; no
/// wraparound handling is performed.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRange {
    /// First sector of the range
    pub start: u64,
    /// Number of sectors covered
    pub length: u32,
}

impl SectorRange {
    /// Create a new sector range
    #[must_use]
    pub const fn new(start: u64, length: u32) -> Self {
        Self { start, length }
    }

    /// One past the last sector of the range
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.start + self.length as u64
    }

    /// True if `other` begins exactly where this range ends
    #[must_use]
    pub const fn precedes(&self, other: &Self) -> bool {
        self.end() == other.start
    }

    /// True if `other` ends exactly where this range begins
    #[must_use]
    pub const fn follows(&self, other: &Self) -> bool {
        other.end() == self.start
    }
}

impl fmt::Debug for SectorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectorRange({}..{})", self.start, self.end())
    }
}

impl fmt::Display for SectorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_index() {
        assert_eq!(Direction::Read.index(), 0);
        assert_eq!(Direction::Write.index(), 1);
        assert_eq!(Direction::Read.to_string(), "read");
    }

    #[test]
    fn test_issuer_id_roundtrip() {
        let id = IssuerId::new(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(IssuerId::from(42u64), id);
        assert_eq!(format!("{id:?}"), "IssuerId(42)");
    }

    #[test]
    fn test_sector_range_adjacency() {
        let a = SectorRange::new(0, 8);
        let b = SectorRange::new(8, 8);
        let c = SectorRange::new(17, 8);

        assert_eq!(a.end(), 8);
        assert!(a.precedes(&b));
        assert!(b.follows(&a));
        assert!(!a.precedes(&c));
        assert!(!c.follows(&b));
    }

    #[test]
    fn test_sector_range_display() {
        let r = SectorRange::new(100, 16);
        assert_eq!(r.to_string(), "[100, 116)");
        assert_eq!(format!("{r:?}"), "SectorRange(100..116)");
    }
}
