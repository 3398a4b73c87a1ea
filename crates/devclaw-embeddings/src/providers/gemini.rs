//! Gemini (Google AI) embeddings.
//!
//! Single texts go through `embedContent`, batches through
//! `batchEmbedContents`. The API key travels as a URL query parameter.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use devclaw_core::errors::{DevclawResult, EmbeddingError};
use devclaw_core::traits::EmbeddingProvider;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    dimensions: Option<usize>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SingleResponse {
    embedding: Values,
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Deserialize)]
struct Values {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        dimensions: Option<usize>,
        http_timeout_secs: u64,
    ) -> DevclawResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http_timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::provider("gemini", e))?;
        Ok(Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            dimensions,
            client,
        })
    }

    /// Model name for URLs, without any `models/` prefix.
    fn api_model(&self) -> &str {
        self.model.strip_prefix("models/").unwrap_or(&self.model)
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{method}?key={}",
            self.base_url.trim_end_matches('/'),
            self.api_model(),
            self.api_key
        )
    }

    fn single_request(&self, text: &str) -> serde_json::Value {
        let mut request = serde_json::json!({
            "model": format!("models/{}", self.api_model()),
            "content": { "parts": [ { "text": text } ] },
            "taskType": TASK_TYPE,
        });
        if let Some(dims) = self.dimensions {
            request["outputDimensionality"] = dims.into();
        }
        request
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> DevclawResult<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| EmbeddingError::provider("gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::HttpStatus {
                code: status.as_u16(),
                body,
            }
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::JsonMalformed {
                message: e.to_string(),
            }
            .into())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed(&self, texts: &[String]) -> DevclawResult<Vec<Vec<f32>>> {
        match texts {
            [] => Ok(Vec::new()),
            [text] => {
                let raw = self
                    .post(&self.endpoint("embedContent"), &self.single_request(text))
                    .await?;
                let parsed: SingleResponse =
                    serde_json::from_value(raw).map_err(|e| EmbeddingError::JsonMalformed {
                        message: e.to_string(),
                    })?;
                if parsed.embedding.values.is_empty() {
                    return Err(EmbeddingError::EmptyResponse {
                        provider: "gemini".to_string(),
                    }
                    .into());
                }
                Ok(vec![parsed.embedding.values])
            }
            _ => {
                let body = serde_json::json!({
                    "requests": texts
                        .iter()
                        .map(|t| self.single_request(t))
                        .collect::<Vec<_>>(),
                });
                let raw = self
                    .post(&self.endpoint("batchEmbedContents"), &body)
                    .await?;
                let parsed: BatchResponse =
                    serde_json::from_value(raw).map_err(|e| EmbeddingError::JsonMalformed {
                        message: e.to_string(),
                    })?;
                if parsed.embeddings.is_empty() {
                    return Err(EmbeddingError::EmptyResponse {
                        provider: "gemini".to_string(),
                    }
                    .into());
                }
                if parsed.embeddings.len() != texts.len() {
                    return Err(EmbeddingError::JsonMalformed {
                        message: format!(
                            "expected {} embeddings, got {}",
                            texts.len(),
                            parsed.embeddings.len()
                        ),
                    }
                    .into());
                }
                Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
            }
        }
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
