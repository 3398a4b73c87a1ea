use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding provider configuration.
///
/// `provider` may be left empty: the factory then autodetects from the
/// base URL (when an explicit key is set) or from well-known environment
/// variables, and falls back to the null provider when nothing matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Explicit provider name ("openai", "gemini", "voyage", "mistral", "null").
    pub provider: Option<String>,
    /// Explicit API key. When unset, well-known env vars are probed.
    pub api_key: Option<String>,
    /// Endpoint base URL override.
    pub base_url: Option<String>,
    /// Model identifier sent on the wire and used in cache keys.
    pub model: String,
    /// Requested output dimensionality, when the provider supports it.
    pub dimensions: Option<usize>,
    /// Per-call HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// Optional failover provider, tried when the primary errors.
    pub fallback: Option<Box<EmbeddingConfig>>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: None,
            base_url: None,
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            http_timeout_secs: defaults::DEFAULT_EMBED_HTTP_TIMEOUT_SECS,
            fallback: None,
        }
    }
}
