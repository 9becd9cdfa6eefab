//! prscribe: LLM-written pull request summaries for CI (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod config;
pub mod constants;
pub mod context;
pub mod diff;
pub mod env;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod providers;
pub mod publish;
