//! Engine error types

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn engine: {0}")]
    Spawn(String),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Engine process exited")]
    Crashed,

    #[error("Engine session closed")]
    Closed,
}
