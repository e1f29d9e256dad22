use crate::embed::{Embedder, Embedding};
use crate::error::{ChapterizeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// OpenAI embeddings API endpoint.
const EMBEDDINGS_API_URL: &str = "https://api.openai.com/v1/embeddings";

/// Inputs per request; the API allows more, but large payloads time out.
const MAX_BATCH_SIZE: usize = 128;

/// Maximum retries for API calls.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 1000;

/// OpenAI embedding model variants.
#[derive(Debug, Clone, Copy, Default)]
pub enum OpenAiModel {
    #[default]
    TextEmbedding3Small,
    TextEmbedding3Large,
}

impl OpenAiModel {
    fn as_str(&self) -> &'static str {
        match self {
            OpenAiModel::TextEmbedding3Small => "text-embedding-3-small",
            OpenAiModel::TextEmbedding3Large => "text-embedding-3-large",
        }
    }

    fn dimension(&self) -> usize {
        match self {
            OpenAiModel::TextEmbedding3Small => 1536,
            OpenAiModel::TextEmbedding3Large => 3072,
        }
    }
}

/// OpenAI embeddings API client.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: OpenAiModel,
    base_url: String,
}

impl OpenAiEmbedder {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: OpenAiModel::default(),
            base_url: EMBEDDINGS_API_URL.to_string(),
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: OpenAiModel) -> Self {
        self.model = model;
        self
    }

    /// Override the API endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Make the API request once.
    async fn call_api(&self, texts: &[String]) -> Result<EmbeddingsResponse> {
        let request = EmbeddingsRequest {
            model: self.model.as_str(),
            input: texts,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!("OpenAI embeddings API response status: {}", status);

        if status.is_success() {
            let parsed: EmbeddingsResponse = response.json().await?;
            return Ok(parsed);
        }

        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(ChapterizeError::Api(format!(
                "OpenAI API error ({}): {} ({})",
                status, api_error.error.message, api_error.error.r#type
            )));
        }

        Err(ChapterizeError::Api(format!(
            "OpenAI API error ({}): {}",
            status, error_body
        )))
    }

    /// Call with retry; client errors (4xx) are not retried.
    async fn call_with_retry(&self, texts: &[String]) -> Result<EmbeddingsResponse> {
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
impl Embedder for OpenAiEmbedder {
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

        if response.data.len() != texts.len() {
            return Err(ChapterizeError::Embedding(format!(
                "OpenAI returned {} vectors for {} inputs",
                response.data.len(),
                texts.len()
            )));
        }

        // The API may return entries out of order; index is authoritative
        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        let expected = self.dimension();
        for entry in &data {
            if entry.embedding.len() != expected {
                return Err(ChapterizeError::Embedding(format!(
                    "Expected {}-dimension vectors, got {}",
                    expected,
                    entry.embedding.len()
                )));
            }
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &'static str {
        "OpenAI Embeddings"
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    fn dimension(&self) -> usize {
        self.model.dimension()
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'static str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    r#type: String,
    #[allow(dead_code)]
    code: Option<String>,
}
