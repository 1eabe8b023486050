//! Schema module - Configuration types for swarm optimization runs.

mod config;
mod problem;

pub use config::*;
pub use problem::*;
