//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from configuration loading, repositories, and background
//! tasks so callers can bubble them up with consistent context.

use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] tier_content::ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("engine lock was poisoned")]
    LockPoisoned,

    #[error("background reload failed to join")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
