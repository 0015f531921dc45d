//! Core domain + pipeline for the Discord channel mirror.
//!
//! This crate is platform-agnostic: Discord REST and RocksDB live behind
//! ports (traits) implemented in adapter crates. The pipeline here owns the
//! two invariants that matter: the global sort-key order and the
//! one-durable-batch-per-page write discipline.

pub mod attachments;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod pager;
pub mod pipeline;
pub mod ports;

pub use errors::{Error, Result};
