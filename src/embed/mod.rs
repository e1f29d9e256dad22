pub mod batcher;
pub mod gemini;
pub mod openai;

pub use batcher::{EmbeddingBatcher, EmbeddingStats};
pub use gemini::GeminiEmbedder;
pub use openai::OpenAiEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// A fixed-dimension vector representation of one text block, associated
/// with a time window by position.
pub type Embedding = Vec<f32>;

/// An opaque text-to-vector capability. Deterministic for identical input;
/// failure propagates as a hard error since segmentation is impossible
/// without vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input, in order.
    /// Callers must keep batches within `max_batch_size`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    fn name(&self) -> &'static str;

    /// Largest number of inputs one request may carry.
    fn max_batch_size(&self) -> usize;

    /// Dimension of the vectors this provider emits.
    fn dimension(&self) -> usize;
}
