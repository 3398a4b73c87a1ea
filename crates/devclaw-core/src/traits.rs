//! Cross-crate capability traits.

use async_trait::async_trait;

use crate::errors::DevclawResult;

/// Text → vector provider.
///
/// Implementations are HTTP clients (OpenAI-compatible, Gemini), the null
/// provider, or compositions (primary + failover). All are shareable across
/// threads; batch calls preserve input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> DevclawResult<Vec<Vec<f32>>>;

    /// Requested output dimensionality, when the provider pins one.
    fn dimensions(&self) -> Option<usize>;

    /// Provider name as used in embedding-cache keys.
    fn name(&self) -> &str;

    /// Model identifier as used in embedding-cache keys.
    fn model(&self) -> &str;

    /// False for the null provider; vector search short-circuits on it.
    fn is_enabled(&self) -> bool {
        true
    }
}
