//! scriptgrade-engine: sheet-level evaluation orchestration.
//!
//! Builds on `scriptgrade-core`: evaluation sessions with a monotonic
//! lifecycle, human score overrides, sheet aggregation, and a concurrent
//! scoring engine.

pub mod aggregate;
pub mod engine;
pub mod session;
