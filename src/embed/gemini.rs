use crate::embed::{Embedder, Embedding};
use crate::error::{ChapterizeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Gemini batch embedding endpoint.
const BATCH_EMBED_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:batchEmbedContents";

/// Model name carried inside each batched request entry.
const MODEL_NAME: &str = "models/text-embedding-004";

/// Output dimension of text-embedding-004.
const DIMENSION: usize = 768;

/// The batch API caps requests at 100 entries.
const MAX_BATCH_SIZE: usize = 100;

/// Maximum retries for API calls.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 1000;

/// Google Gemini embeddings API client.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiEmbedder {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BATCH_EMBED_URL.to_string(),
        }
    }

    /// Override the API endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Make the API request once.
    async fn call_api(&self, texts: &[String]) -> Result<BatchEmbedResponse> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: MODEL_NAME,
                    content: Content {
                        parts: vec![Part { text: text.clone() }],
                    },
                })
                .collect(),
        };

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        debug!("Gemini embeddings API response status: {}", status);

        if status.is_success() {
            let parsed: BatchEmbedResponse = response.json().await?;
            return Ok(parsed);
        }

        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<GeminiErrorResponse>(&error_body) {
            return Err(ChapterizeError::Api(format!(
                "Gemini API error ({}): {} ({})",
                status, api_error.error.message, api_error.error.status
            )));
        }

        Err(ChapterizeError::Api(format!(
            "Gemini API error ({}): {}",
            status, error_body
        )))
    }

    /// Call with retry; client errors (4xx) are not retried.
    async fn call_with_retry(&self, texts: &[String]) -> Result<BatchEmbedResponse> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.call_api(texts).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let error_str = e.to_string();
                    if error_str.contains("API error (4") {
                        return Err(e);
                    }
                    warn!("Attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChapterizeError::Api("Unknown error".to_string())))
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.len() > self.max_batch_size() {
            return Err(ChapterizeError::Embedding(format!(
                "Batch of {} texts exceeds the {} input limit",
                texts.len(),
                self.max_batch_size()
            )));
        }

        debug!("Embedding {} texts with {}", texts.len(), self.name());

        let response = self.call_with_retry(texts).await?;

        if response.embeddings.len() != texts.len() {
            return Err(ChapterizeError::Embedding(format!(
                "Gemini returned {} vectors for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }

        for entry in &response.embeddings {
            if entry.values.len() != DIMENSION {
                return Err(ChapterizeError::Embedding(format!(
                    "Expected {}-dimension vectors, got {}",
                    DIMENSION,
                    entry.values.len()
                )));
            }
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn name(&self) -> &'static str {
        "Gemini Embeddings"
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    model: &'static str,
    content: Content,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}
