//! Persistence - Checkpoint files and per-iteration history export.

mod checkpoint;
mod history;

pub use checkpoint::*;
pub use history::*;

use std::io;

/// Errors raised while reading or writing run artifacts.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Incompatible snapshot: {0}")]
    Incompatible(String),
}
