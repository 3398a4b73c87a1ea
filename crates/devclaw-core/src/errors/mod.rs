//! Error types for every devclaw subsystem.
//!
//! Each layer defines its own `thiserror` enum; `DevclawError` aggregates
//! them so callers can hold one error type across subsystem boundaries.
//! Policy violations and preflight findings are *not* errors — the sandbox
//! reports them inside `ExecResult` so callers always see stderr.

mod embedding_error;
mod skill_error;
mod ssrf_error;
mod storage_error;

pub use embedding_error::EmbeddingError;
pub use skill_error::SkillError;
pub use ssrf_error::SsrfError;
pub use storage_error::StorageError;

/// Aggregate error for the whole workspace.
#[derive(Debug, thiserror::Error)]
pub enum DevclawError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Ssrf(#[from] SsrfError),

    #[error(transparent)]
    Skill(#[from] SkillError),

    #[error("sandbox error: {0}")]
    Sandbox(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline elapsed")]
    TimeoutElapsed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the workspace.
pub type DevclawResult<T> = Result<T, DevclawError>;
