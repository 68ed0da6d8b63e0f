//! fairq Scheduler - fair-queuing block I/O request scheduling
//!
//! This crate implements a completely-fair-queuing request scheduler for a
//! single dispatch stream: per-issuer sorted queues, adjacency-based
//! request merging through a hashed index, round-robin arbitration, and
//! pool-based admission control.
//!
//! # Features
//!
//! - **Fair rotation**: one request per busy issuer per pass, with a
//!   persistent rotation position across dispatch calls
//! - **Adjacency merging**: back merges found index-wide in O(1), front
//!   merges within the issuer's own sorted queue
//! - **Bounded pools**: request and issuer-queue budgets surface
//!   exhaustion as errors, never as blocking
//! - **Barrier inserts**: a `Back` insert flushes all queued work ahead
//!   of itself
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │    Host stack    │  (alloc / insert / remove / dispatch_next)
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │    Scheduler     │
//! │  - MergeIndex    │  end-sector hash -> merge candidates
//! │  - IssuerQueues  │  per-issuer sorted sets
//! │  - RotationList  │  round-robin over busy issuers
//! │  - DispatchQueue │  sector-ordered hand-off FIFO
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  Device driver   │  (hardware submission, completion)
//! └──────────────────┘
//! ```

pub mod dispatch;
pub mod issuer;
pub mod merge;
pub mod request;
pub mod rotation;
pub mod scheduler;
pub mod shared;
pub mod stats;

pub use dispatch::DispatchQueue;
pub use issuer::IssuerQueue;
pub use merge::MergeIndex;
pub use request::{Request, RequestId, RequestPool, RequestState};
pub use rotation::RotationList;
pub use scheduler::{InsertPosition, MergeOutcome, Scheduler};
pub use shared::SharedScheduler;
pub use stats::SchedStats;

pub use fairq_common::{Direction, Error, IssuerId, Result, SchedConfig, SectorRange};
