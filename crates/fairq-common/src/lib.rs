//! fairq Common - Shared types and utilities
//!
//! This crate provides the leaf types, error definitions, and configuration
//! structures used across the fairq scheduler components.

pub mod config;
pub mod error;
pub mod types;

pub use config::SchedConfig;
pub use error::{Error, Result};
pub use types::*;
