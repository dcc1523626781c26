//! Shared fan-out worker domain primitives.
//!
//! This crate owns the deterministic parts of the worker: the work packet
//! contract, the splitting policy, template rendering, and the naming and
//! encoding of result records. It intentionally excludes AWS SDK, HTTP client
//! and Lambda runtime concerns.

pub mod contract;
pub mod outcome;
pub mod splitting;
pub mod storage_keys;
pub mod template;
