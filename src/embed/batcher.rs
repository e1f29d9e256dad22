use crate::embed::{Embedder, Embedding};
use crate::error::{ChapterizeError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Statistics from the embedding stage.
#[derive(Debug, Clone)]
pub struct EmbeddingStats {
    pub total_texts: usize,
    pub batches: usize,
    pub dimension: usize,
    pub total_time: Duration,
}

/// Runs provider-sized embedding batches concurrently and reassembles the
/// vectors in input order.
///
/// There is no partial-success mode: a single failed batch fails the whole
/// call, because segmentation cannot proceed with missing vectors.
pub struct EmbeddingBatcher {
    embedder: Arc<dyn Embedder>,
    concurrency: usize,
    show_progress: bool,
}

impl EmbeddingBatcher {
    /// Create a new batcher around the given provider.
    pub fn new(embedder: Box<dyn Embedder>, concurrency: usize) -> Self {
        Self {
            embedder: Arc::from(embedder),
            concurrency: concurrency.max(1),
            show_progress: true,
        }
    }

    /// Enable or disable progress bar display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Embed every text, preserving input order.
    pub async fn embed_all(&self, texts: &[String]) -> Result<(Vec<Embedding>, EmbeddingStats)> {
        if texts.is_empty() {
            return Ok((
                Vec::new(),
                EmbeddingStats {
                    total_texts: 0,
                    batches: 0,
                    dimension: self.embedder.dimension(),
                    total_time: Duration::ZERO,
                },
            ));
        }

        let start_time = Instant::now();
        let batch_size = self.embedder.max_batch_size().max(1);

        let batches: Vec<(usize, Vec<String>)> = texts
            .chunks(batch_size)
            .map(|chunk| chunk.to_vec())
            .enumerate()
            .collect();
        let total_batches = batches.len();

        info!(
            "Embedding {} texts in {} batches with {} ({} concurrent requests)",
            texts.len(),
            total_batches,
            self.embedder.name(),
            self.concurrency
        );

        let progress_bar = if self.show_progress {
            let pb = ProgressBar::new(total_batches as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut futures = FuturesUnordered::new();

        for (index, batch) in batches {
            let sem = semaphore.clone();
            let embedder = self.embedder.clone();
            let pb = progress_bar.clone();

            futures.push(async move {
                let _permit = sem.acquire().await.expect("Semaphore closed");

                debug!("Embedding batch {} ({} texts)", index, batch.len());
                let result = embedder.embed_batch(&batch).await;

                if let Some(ref pb) = pb {
                    pb.inc(1);
                }

                (index, result)
            });
        }

        let mut results: Vec<(usize, Vec<Embedding>)> = Vec::with_capacity(total_batches);
        while let Some((index, result)) = futures.next().await {
            match result {
                Ok(vectors) => results.push((index, vectors)),
                Err(e) => {
                    if let Some(ref pb) = progress_bar {
                        pb.abandon_with_message("Embedding failed");
                    }
                    return Err(e);
                }
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Embedding complete");
        }

        // Reassemble in input order
        results.sort_by_key(|(index, _)| *index);
        let embeddings: Vec<Embedding> = results
            .into_iter()
            .flat_map(|(_, vectors)| vectors)
            .collect();

        if embeddings.len() != texts.len() {
            return Err(ChapterizeError::Embedding(format!(
                "Provider returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        let stats = EmbeddingStats {
            total_texts: texts.len(),
            batches: total_batches,
            dimension,
            total_time: start_time.elapsed(),
        };

        info!(
            "Embedded {} texts in {:.2}s",
            texts.len(),
            stats.total_time.as_secs_f64()
        );

        Ok((embeddings, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock embedder that encodes each text's parsed value into a vector.
    struct MockEmbedder {
        call_count: AtomicUsize,
        batch_size: usize,
        fail_on_batch: Option<usize>,
    }

    impl MockEmbedder {
        fn new(batch_size: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                batch_size,
                fail_on_batch: None,
            }
        }

        fn failing_on(batch_size: usize, batch: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                batch_size,
                fail_on_batch: Some(batch),
            }
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            let call = self.call_count.fetch_add(1, Ordering::SeqCst);

            // Simulate some network latency
            tokio::time::sleep(Duration::from_millis(5)).await;

            if self.fail_on_batch == Some(call) {
                return Err(ChapterizeError::Api("Mock error".to_string()));
            }

            Ok(texts
                .iter()
                .map(|t| {
                    let value: f32 = t.parse().unwrap_or(-1.0);
                    vec![value, 1.0]
                })
                .collect())
        }

        fn name(&self) -> &'static str {
            "Mock"
        }

        fn max_batch_size(&self) -> usize {
            self.batch_size
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn numbered_texts(count: usize) -> Vec<String> {
        (0..count).map(|i| i.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_input() {
        let batcher =
            EmbeddingBatcher::new(Box::new(MockEmbedder::new(10)), 4).with_progress(false);

        let (embeddings, stats) = batcher.embed_all(&[]).await.unwrap();

        assert!(embeddings.is_empty());
        assert_eq!(stats.batches, 0);
    }

    #[tokio::test]
    async fn test_single_batch() {
        let batcher =
            EmbeddingBatcher::new(Box::new(MockEmbedder::new(10)), 4).with_progress(false);

        let (embeddings, stats) = batcher.embed_all(&numbered_texts(7)).await.unwrap();

        assert_eq!(embeddings.len(), 7);
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.dimension, 2);
    }

    #[tokio::test]
    async fn test_order_preserved_across_batches() {
        // 25 texts in batches of 4, run 3 at a time: completion order is
        // nondeterministic, output order must not be.
        let batcher =
            EmbeddingBatcher::new(Box::new(MockEmbedder::new(4)), 3).with_progress(false);

        let (embeddings, stats) = batcher.embed_all(&numbered_texts(25)).await.unwrap();

        assert_eq!(stats.batches, 7);
        for (i, embedding) in embeddings.iter().enumerate() {
            assert_eq!(embedding[0], i as f32);
        }
    }

    #[tokio::test]
    async fn test_any_batch_failure_fails_the_run() {
        let batcher = EmbeddingBatcher::new(Box::new(MockEmbedder::failing_on(4, 2)), 2)
            .with_progress(false);

        let result = batcher.embed_all(&numbered_texts(20)).await;

        assert!(result.is_err());
    }
}
