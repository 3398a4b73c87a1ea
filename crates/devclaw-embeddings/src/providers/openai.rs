//! OpenAI-compatible embeddings endpoint.
//!
//! Used for OpenAI, Voyage, Mistral, and any unknown provider exposing the
//! same shape. The response's `data[].index` field is authoritative for
//! ordering; outputs are re-sorted to match input order.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use devclaw_core::errors::{DevclawResult, EmbeddingError};
use devclaw_core::traits::EmbeddingProvider;

pub struct OpenAiCompatibleProvider {
    name: &'static str,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: Option<usize>,
    /// Provider-specific extra body fields, merged last into each request.
    extra: serde_json::Map<String, serde_json::Value>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: &'static str,
        api_key: String,
        base_url: String,
        model: String,
        dimensions: Option<usize>,
        http_timeout_secs: u64,
    ) -> DevclawResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http_timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::provider(name, e))?;
        Ok(Self {
            name,
            api_key,
            base_url,
            model,
            dimensions,
            extra: serde_json::Map::new(),
            client,
        })
    }

    /// Add a provider-specific request field (e.g. Voyage's `input_type`).
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    fn request_body(&self, texts: &[String]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        if let Some(dims) = self.dimensions {
            body["dimensions"] = dims.into();
        }
        for (key, value) in &self.extra {
            body[key.as_str()] = value.clone();
        }
        body
    }
}

/// Re-sort response data by `index` and validate the count.
fn vectors_in_input_order(
    provider: &str,
    mut response: EmbeddingsResponse,
    expected: usize,
) -> DevclawResult<Vec<Vec<f32>>> {
    if response.data.is_empty() && expected > 0 {
        return Err(EmbeddingError::EmptyResponse {
            provider: provider.to_string(),
        }
        .into());
    }
    if response.data.len() != expected {
        return Err(EmbeddingError::JsonMalformed {
            message: format!(
                "expected {expected} embeddings, got {}",
                response.data.len()
            ),
        }
        .into());
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleProvider {
    async fn embed(&self, texts: &[String]) -> DevclawResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(texts))
            .send()
            .await
            .map_err(|e| EmbeddingError::provider(self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::HttpStatus {
                code: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: EmbeddingsResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::JsonMalformed {
                    message: e.to_string(),
                })?;

        vectors_in_input_order(self.name, parsed, texts.len())
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}
