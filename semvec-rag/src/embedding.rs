//! Embedding provider trait and chunk aggregation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunking::Chunk;
use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a remote embedding model behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// Results are never cached: embedding the same text twice makes two calls.
///
/// # Example
///
/// ```rust,ignore
/// use semvec_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short provider name used in logs and errors.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// How the vectors of a multi-chunk document collapse into one stored vector.
///
/// A store must only ever hold vectors produced with one strategy, otherwise
/// similarity scores across documents are not comparable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Element-wise mean of all chunk vectors (the chunk centroid).
    #[default]
    Mean,
    /// The vector of the first chunk only.
    First,
}

impl std::str::FromStr for Aggregation {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "first" => Ok(Self::First),
            other => Err(RagError::ConfigError(format!("unknown aggregation '{other}'"))),
        }
    }
}

/// Collapse chunk vectors into a single vector of the same dimensionality.
///
/// # Errors
///
/// Returns [`RagError::EmbeddingError`] if `vectors` is empty and
/// [`RagError::DimensionMismatch`] if the vectors differ in length.
pub fn aggregate(vectors: &[Vec<f32>], aggregation: Aggregation) -> Result<Vec<f32>> {
    let first = vectors
        .first()
        .ok_or_else(|| RagError::embedding("aggregate", "no vectors to aggregate"))?;
    let dimensions = first.len();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(RagError::DimensionMismatch { expected: dimensions, actual: bad.len() });
    }

    match aggregation {
        Aggregation::First => Ok(first.clone()),
        Aggregation::Mean => {
            let mut mean = vec![0.0f32; dimensions];
            for vector in vectors {
                for (acc, value) in mean.iter_mut().zip(vector) {
                    *acc += value;
                }
            }
            let count = vectors.len() as f32;
            mean.iter_mut().for_each(|v| *v /= count);
            Ok(mean)
        }
    }
}

/// Check that a provider returned one well-formed vector per input.
pub(crate) fn validate_embeddings(
    provider: &dyn EmbeddingProvider,
    expected_count: usize,
    vectors: &[Vec<f32>],
) -> Result<()> {
    if vectors.len() != expected_count {
        return Err(RagError::embedding(
            provider.name(),
            format!("malformed response: expected {expected_count} vectors, got {}", vectors.len()),
        ));
    }
    let dimensions = provider.dimensions();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(RagError::embedding(
            provider.name(),
            format!("malformed response: expected {dimensions} dimensions, got {}", bad.len()),
        ));
    }
    Ok(())
}

/// Embed the chunks of one document in a single batch and aggregate them.
///
/// Chunks of different documents must not be passed together: the grouping
/// is what aggregation relies on.
///
/// # Errors
///
/// Returns [`RagError::EmbeddingError`] if the provider fails or returns a
/// response with the wrong number or size of vectors.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    chunks: &[Chunk],
    aggregation: Aggregation,
) -> Result<Vec<f32>> {
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    debug!(provider = provider.name(), chunk_count = texts.len(), ?aggregation, "embedding chunks");

    let vectors = provider.embed_batch(&texts).await?;
    validate_embeddings(provider, texts.len(), &vectors)?;
    aggregate(&vectors, aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        vectors: Vec<Vec<f32>>,
        dimensions: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            unreachable!("batch is overridden")
        }

        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(self.vectors.clone())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk { index: i, text: format!("chunk {i}"), start: i, end: i + 1 })
            .collect()
    }

    #[test]
    fn mean_is_elementwise() {
        let vectors = vec![vec![1.0, 0.0, 2.0], vec![3.0, 2.0, 0.0]];
        assert_eq!(aggregate(&vectors, Aggregation::Mean).unwrap(), vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn first_keeps_first_vector() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(aggregate(&vectors, Aggregation::First).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn aggregation_parses_from_flag_values() {
        assert_eq!("MEAN".parse::<Aggregation>().unwrap(), Aggregation::Mean);
        assert_eq!("first".parse::<Aggregation>().unwrap(), Aggregation::First);
        assert!("max".parse::<Aggregation>().is_err());
    }

    #[test]
    fn single_vector_is_unchanged() {
        let vectors = vec![vec![0.25, -0.5]];
        assert_eq!(aggregate(&vectors, Aggregation::Mean).unwrap(), vec![0.25, -0.5]);
    }

    #[test]
    fn aggregate_rejects_empty_and_ragged_input() {
        assert!(matches!(
            aggregate(&[], Aggregation::Mean),
            Err(RagError::EmbeddingError { .. })
        ));
        assert!(matches!(
            aggregate(&[vec![1.0, 2.0], vec![1.0]], Aggregation::Mean),
            Err(RagError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn embed_chunks_rejects_wrong_vector_count() {
        let provider = Fixed { vectors: vec![vec![1.0, 0.0]], dimensions: 2 };
        let err = embed_chunks(&provider, &chunks(2), Aggregation::Mean).await.unwrap_err();
        assert!(err.to_string().contains("expected 2 vectors"));
    }

    #[tokio::test]
    async fn embed_chunks_rejects_wrong_dimensions() {
        let provider = Fixed { vectors: vec![vec![1.0, 0.0, 0.0]], dimensions: 2 };
        let err = embed_chunks(&provider, &chunks(1), Aggregation::Mean).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
    }

    #[tokio::test]
    async fn embed_chunks_aggregates_batch() {
        let provider = Fixed { vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]], dimensions: 2 };
        let vector = embed_chunks(&provider, &chunks(2), Aggregation::Mean).await.unwrap();
        assert_eq!(vector, vec![0.5, 0.5]);
    }
}
