//! Workspace configuration.
//!
//! Every subsystem gets its own config struct, all TOML-deserialisable with
//! per-field defaults so a partial config file is always valid.

mod defaults;
mod embedding_config;
mod memory_config;
mod sandbox_config;

pub use embedding_config::EmbeddingConfig;
pub use memory_config::MemoryConfig;
pub use sandbox_config::{IsolationLevel, SandboxConfig, SsrfConfig};

use serde::{Deserialize, Serialize};

/// Top-level configuration for the devclaw core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevclawConfig {
    pub memory: MemoryConfig,
    pub embedding: EmbeddingConfig,
    pub sandbox: SandboxConfig,
}

impl DevclawConfig {
    /// Parse a TOML document into a config, filling defaults for anything
    /// the document leaves out.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
