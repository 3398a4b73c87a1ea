//! Provider construction and autodetection.
//!
//! Priority: explicit config > base-URL substring match > env var probe
//! (OPENAI_API_KEY, GOOGLE_API_KEY, VOYAGE_API_KEY, MISTRAL_API_KEY).
//! Nothing matching yields the null provider and vector search degrades
//! to keyword-only.

mod fallback;
mod gemini;
mod null;
mod openai;

pub use fallback::FallbackProvider;
pub use gemini::GeminiProvider;
pub use null::NullProvider;
pub use openai::OpenAiCompatibleProvider;

use std::sync::Arc;

use tracing::{debug, info};

use devclaw_core::config::EmbeddingConfig;
use devclaw_core::errors::DevclawResult;
use devclaw_core::traits::EmbeddingProvider;

/// Env vars probed, in priority order, when no explicit key is configured.
const ENV_PROBE: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "openai"),
    ("GOOGLE_API_KEY", "gemini"),
    ("VOYAGE_API_KEY", "voyage"),
    ("MISTRAL_API_KEY", "mistral"),
];

/// Map a base URL to a provider name. Unknown endpoints are assumed
/// OpenAI-compatible.
pub(crate) fn detect_from_base_url(base_url: &str) -> &'static str {
    let url = base_url.to_ascii_lowercase();
    if url.contains("googleapis") || url.contains("gemini") {
        "gemini"
    } else if url.contains("voyageai") {
        "voyage"
    } else if url.contains("mistral") {
        "mistral"
    } else {
        "openai"
    }
}

/// Build the configured provider, composing a fallback when one is set.
pub fn create_provider(config: &EmbeddingConfig) -> DevclawResult<Arc<dyn EmbeddingProvider>> {
    let primary = create_single(config)?;
    let provider: Arc<dyn EmbeddingProvider> = match &config.fallback {
        Some(fallback_config) => {
            let fallback = create_single(fallback_config)?;
            Arc::new(FallbackProvider::new(primary, fallback))
        }
        None => primary,
    };
    info!(provider = provider.name(), model = provider.model(), "embedding provider ready");
    Ok(provider)
}

fn create_single(config: &EmbeddingConfig) -> DevclawResult<Arc<dyn EmbeddingProvider>> {
    let (name, api_key) = match resolve_identity(config) {
        Some(pair) => pair,
        None => {
            debug!("no embedding provider configured, using null");
            return Ok(Arc::new(NullProvider));
        }
    };

    match name.as_str() {
        "null" | "none" | "disabled" => Ok(Arc::new(NullProvider)),
        "gemini" | "google" => Ok(Arc::new(GeminiProvider::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            config.dimensions,
            config.http_timeout_secs,
        )?)),
        "voyage" => Ok(Arc::new(OpenAiCompatibleProvider::new(
            "voyage",
            api_key,
            config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.voyageai.com/v1".to_string()),
            config.model.clone(),
            config.dimensions,
            config.http_timeout_secs,
        )?)),
        "mistral" => Ok(Arc::new(OpenAiCompatibleProvider::new(
            "mistral",
            api_key,
            config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.mistral.ai/v1".to_string()),
            config.model.clone(),
            config.dimensions,
            config.http_timeout_secs,
        )?)),
        // "openai" and anything unknown with a compatible endpoint.
        other => Ok(Arc::new(OpenAiCompatibleProvider::new(
            if other == "openai" { "openai" } else { "custom" },
            api_key,
            config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            config.model.clone(),
            config.dimensions,
            config.http_timeout_secs,
        )?)),
    }
}

/// Resolve `(provider_name, api_key)` from config or environment.
fn resolve_identity(config: &EmbeddingConfig) -> Option<(String, String)> {
    if let Some(name) = &config.provider {
        if name == "null" || name == "none" || name == "disabled" {
            return Some((name.clone(), String::new()));
        }
        let key = config.api_key.clone().or_else(|| explicit_env_key(name))?;
        return Some((name.clone(), key));
    }

    if let Some(key) = &config.api_key {
        let name = config
            .base_url
            .as_deref()
            .map(detect_from_base_url)
            .unwrap_or("openai");
        return Some((name.to_string(), key.clone()));
    }

    for (var, name) in ENV_PROBE {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                return Some((name.to_string(), key));
            }
        }
    }
    None
}

fn explicit_env_key(provider: &str) -> Option<String> {
    let var = match provider {
        "openai" => "OPENAI_API_KEY",
        "gemini" | "google" => "GOOGLE_API_KEY",
        "voyage" => "VOYAGE_API_KEY",
        "mistral" => "MISTRAL_API_KEY",
        _ => return None,
    };
    std::env::var(var).ok().filter(|k| !k.is_empty())
}
