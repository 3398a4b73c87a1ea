//! # devclaw-core
//!
//! Foundation crate for the devclaw copilot core.
//! Defines shared types, traits, errors, config, and the cancellation
//! context. Every other crate in the workspace depends on this.

pub mod config;
pub mod context;
pub mod errors;
pub mod hash;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::DevclawConfig;
pub use context::Ctx;
pub use errors::{DevclawError, DevclawResult};
pub use models::SearchResult;
pub use traits::EmbeddingProvider;
