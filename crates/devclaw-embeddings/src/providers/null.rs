//! Null provider: embeddings disabled.

use async_trait::async_trait;

use devclaw_core::errors::DevclawResult;
use devclaw_core::traits::EmbeddingProvider;

/// Disabled embedding path. Returns an empty sequence so vector search
/// short-circuits and hybrid queries run keyword-only.
pub struct NullProvider;

#[async_trait]
impl EmbeddingProvider for NullProvider {
    async fn embed(&self, _texts: &[String]) -> DevclawResult<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str {
        "null"
    }

    fn model(&self) -> &str {
        "null"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
