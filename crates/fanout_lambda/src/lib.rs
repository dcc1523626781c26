//! AWS-oriented adapters and handlers for the recursive fan-out worker.
//!
//! This crate owns runtime integration details (the Lambda handler, HTTP
//! execution, self-invocation and object storage adapters) on top of the
//! deterministic primitives in `fanout_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
