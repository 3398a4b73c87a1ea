/// Embedding-layer errors: provider calls, wire parsing, composition.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider {provider} failed: {cause}")]
    Provider { provider: String, cause: String },

    #[error("both embedding providers failed (primary {primary}, fallback {fallback})")]
    Fallback { primary: String, fallback: String },

    #[error("embedding endpoint returned HTTP {code}: {body}")]
    HttpStatus { code: u16, body: String },

    #[error("malformed embedding response: {message}")]
    JsonMalformed { message: String },

    #[error("provider {provider} returned no embeddings for non-empty input")]
    EmptyResponse { provider: String },
}

impl EmbeddingError {
    pub fn provider(provider: impl Into<String>, cause: impl ToString) -> Self {
        Self::Provider {
            provider: provider.into(),
            cause: cause.to_string(),
        }
    }
}
