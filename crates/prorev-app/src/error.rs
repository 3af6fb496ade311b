//! Application-level errors.

use prorev_core::{ServiceError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Could not start the task runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("Service misconfigured: {0}")]
    Service(#[from] ServiceError),

    #[error("Renderer error: {0}")]
    Renderer(String),
}
