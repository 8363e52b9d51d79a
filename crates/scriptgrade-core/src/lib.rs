//! scriptgrade-core: deterministic scoring of free-text exam answers.
//!
//! This crate defines the data model, keyword matching, confidence
//! estimation, score computation, and review triage that the rest of the
//! scriptgrade system builds on.

pub mod error;
pub mod evaluate;
pub mod feedback;
pub mod matcher;
pub mod model;
pub mod parser;
pub mod scoring;
pub mod traits;
pub mod triage;
