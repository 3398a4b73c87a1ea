//! Primary/failover provider composition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use devclaw_core::errors::{DevclawResult, EmbeddingError};
use devclaw_core::traits::EmbeddingProvider;

/// Calls the primary; on any error, warns and calls the fallback. Both
/// failing surfaces an error naming the two providers.
///
/// The composition's cache identity is `fallback:{primary}` — embeddings
/// from different models are never interchangeable, so a query answered by
/// the fallback must not be cached under the primary's key.
pub struct FallbackProvider {
    primary: Arc<dyn EmbeddingProvider>,
    fallback: Arc<dyn EmbeddingProvider>,
    name: String,
}

impl FallbackProvider {
    pub fn new(primary: Arc<dyn EmbeddingProvider>, fallback: Arc<dyn EmbeddingProvider>) -> Self {
        let name = format!("fallback:{}", primary.name());
        Self {
            primary,
            fallback,
            name,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackProvider {
    async fn embed(&self, texts: &[String]) -> DevclawResult<Vec<Vec<f32>>> {
        let primary_err = match self.primary.embed(texts).await {
            Ok(vectors) => return Ok(vectors),
            Err(e) => e,
        };
        warn!(
            primary = self.primary.name(),
            error = %primary_err,
            "primary embedding provider failed, trying fallback"
        );

        match self.fallback.embed(texts).await {
            Ok(vectors) => Ok(vectors),
            Err(fallback_err) => {
                warn!(
                    fallback = self.fallback.name(),
                    error = %fallback_err,
                    "fallback embedding provider also failed"
                );
                Err(EmbeddingError::Fallback {
                    primary: self.primary.name().to_string(),
                    fallback: self.fallback.name().to_string(),
                }
                .into())
            }
        }
    }

    fn dimensions(&self) -> Option<usize> {
        self.primary.dimensions()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        self.primary.model()
    }

    fn is_enabled(&self) -> bool {
        self.primary.is_enabled() || self.fallback.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        name: &'static str,
        result: Option<Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed(&self, texts: &[String]) -> DevclawResult<Vec<Vec<f32>>> {
            match &self.result {
                Some(v) => Ok(texts.iter().map(|_| v.clone()).collect()),
                None => Err(EmbeddingError::provider(self.name, "down").into()),
            }
        }

        fn dimensions(&self) -> Option<usize> {
            None
        }

        fn name(&self) -> &str {
            self.name
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let provider = FallbackProvider::new(
            Arc::new(FixedProvider {
                name: "a",
                result: Some(vec![1.0]),
            }),
            Arc::new(FixedProvider {
                name: "b",
                result: Some(vec![2.0]),
            }),
        );
        let out = provider.embed(&["x".to_string()]).await.unwrap();
        assert_eq!(out, vec![vec![1.0]]);
    }

    #[tokio::test]
    async fn primary_failure_uses_fallback() {
        let provider = FallbackProvider::new(
            Arc::new(FixedProvider {
                name: "a",
                result: None,
            }),
            Arc::new(FixedProvider {
                name: "b",
                result: Some(vec![2.0]),
            }),
        );
        let out = provider.embed(&["x".to_string()]).await.unwrap();
        assert_eq!(out, vec![vec![2.0]]);
    }

    #[tokio::test]
    async fn both_failing_names_both_providers() {
        let provider = FallbackProvider::new(
            Arc::new(FixedProvider {
                name: "a",
                result: None,
            }),
            Arc::new(FixedProvider {
                name: "b",
                result: None,
            }),
        );
        let err = provider.embed(&["x".to_string()]).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("primary a") && message.contains("fallback b"));
    }

    #[test]
    fn cache_identity_is_fallback_primary() {
        let provider = FallbackProvider::new(
            Arc::new(FixedProvider {
                name: "openai",
                result: None,
            }),
            Arc::new(FixedProvider {
                name: "gemini",
                result: None,
            }),
        );
        assert_eq!(provider.name(), "fallback:openai");
    }
}
