//! # devclaw-embeddings
//!
//! Text → vector providers behind the `EmbeddingProvider` trait:
//! OpenAI-compatible (OpenAI, Voyage, Mistral, custom endpoints), Gemini,
//! the null provider, and a primary/failover composition. Provider
//! selection autodetects from explicit config, the endpoint base URL, or
//! well-known environment variables.

pub mod providers;

pub use providers::{
    create_provider, FallbackProvider, GeminiProvider, NullProvider, OpenAiCompatibleProvider,
};
