//! sectioner: partition remote code repositories into bounded sections
//! for downstream summarization (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod cache;
pub mod config;
pub mod constants;
pub mod env;
pub mod graph;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod partition;
pub mod remote;
pub mod traversal;
