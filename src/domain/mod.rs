//! Core domain types and logic.

pub mod snapshot;
pub mod history;
pub mod correlation;
pub mod graph;
pub mod pipeline;
pub mod config_validation;
pub mod error;
