//! Retrieval pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the ingest and query workflows by composing
//! an [`EmbeddingProvider`], a [`VectorStore`] and a [`Chunker`]. All three
//! are injected once at construction and shared by every request; the
//! pipeline itself holds no mutable state.
//!
//! # Example
//!
//! ```rust,ignore
//! use semvec_rag::{InMemoryVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! let document = pipeline.ingest("The quick brown fox").await?;
//! let results = pipeline.query("a fast animal").await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Document, NewDocument, QueryResult};
use crate::embedding::{EmbeddingProvider, embed_chunks, validate_embeddings};
use crate::error::{RagError, Result};
use crate::similarity::MatchParams;
use crate::vectorstore::VectorStore;

/// Text together with its (aggregated) embedding, not yet stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedText {
    /// The original text.
    pub text: String,
    /// The embedding representing the whole text.
    pub embedding: Vec<f32>,
    /// Number of chunks the text was split into before aggregation.
    pub chunk_count: usize,
}

/// The retrieval pipeline orchestrator.
///
/// Coordinates ingestion (validate → chunk → embed → aggregate → store) and
/// query execution (validate → embed → match). Construct one via
/// [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

fn require_text(text: &str, field: &'static str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RagError::EmptyInput { field });
    }
    Ok(())
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Run a remote call under the configured request timeout.
    async fn timed<T>(
        &self,
        call: impl Future<Output = Result<T>>,
        on_timeout: impl FnOnce() -> RagError,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout()),
        }
    }

    /// Chunk, embed and aggregate `text` without storing it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] for blank text and
    /// [`RagError::EmbeddingError`] if the embedding call fails or times out.
    pub async fn embed_text(&self, text: &str) -> Result<EmbeddedText> {
        require_text(text, "text")?;

        let chunks = self.chunker.chunk(text);
        let chunk_count = chunks.len();
        let provider = self.embedding_provider.as_ref();
        let embedding = self
            .timed(embed_chunks(provider, &chunks, self.config.aggregation), || {
                RagError::embedding(provider.name(), "request timed out")
            })
            .await
            .inspect_err(|e| error!(error = %e, chunk_count, "embedding failed"))?;

        debug!(chunk_count, dimensions = embedding.len(), "embedded text");
        Ok(EmbeddedText { text: text.to_string(), embedding, chunk_count })
    }

    /// Ingest `text`: chunk → embed → aggregate → store.
    ///
    /// Returns the stored [`Document`] with its store-assigned id. Nothing is
    /// stored when validation or embedding fails.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] for blank text, and the embedding or
    /// store error otherwise.
    pub async fn ingest(&self, text: &str) -> Result<Document> {
        let embedded = self.embed_text(text).await?;
        let chunk_count = embedded.chunk_count;
        let document = self.store(NewDocument::new(embedded.text, embedded.embedding)).await?;
        info!(document.id = %document.id, chunk_count, "ingested document");
        Ok(document)
    }

    /// Store `text` with an embedding computed earlier, e.g. by
    /// [`embed_text`](Self::embed_text).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] for blank text,
    /// [`RagError::DimensionMismatch`] if the embedding length differs from the
    /// provider's dimensionality, and the store error otherwise.
    pub async fn ingest_embedded(&self, text: &str, embedding: Vec<f32>) -> Result<Document> {
        require_text(text, "text")?;
        let expected = self.embedding_provider.dimensions();
        if embedding.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
        }

        let document = self.store(NewDocument::new(text, embedding)).await?;
        info!(document.id = %document.id, "ingested pre-embedded document");
        Ok(document)
    }

    async fn store(&self, document: NewDocument) -> Result<Document> {
        let store = self.vector_store.as_ref();
        self.timed(store.insert(document), || {
            RagError::store_transient(store.name(), "insert timed out")
        })
        .await
        .inspect_err(|e| error!(backend = store.name(), error = %e, "insert failed"))
    }

    /// Answer a query with the configured threshold and result count.
    ///
    /// An empty result is a success.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] for a blank query, and the embedding,
    /// dimension or store error otherwise.
    pub async fn query(&self, query: &str) -> Result<Vec<QueryResult>> {
        self.query_with(query, self.config.match_params()).await
    }

    /// Answer a query with explicit match parameters.
    pub async fn query_with(&self, query: &str, params: MatchParams) -> Result<Vec<QueryResult>> {
        require_text(query, "query")?;

        let provider = self.embedding_provider.as_ref();
        let query_embedding = self
            .timed(provider.embed(query), || {
                RagError::embedding(provider.name(), "request timed out")
            })
            .await
            .inspect_err(|e| error!(error = %e, "embedding failed during query"))?;
        validate_embeddings(provider, 1, std::slice::from_ref(&query_embedding))?;

        self.query_embedding(&query_embedding, params).await
    }

    /// Match a precomputed query vector against the store.
    pub async fn query_embedding(
        &self,
        query_embedding: &[f32],
        params: MatchParams,
    ) -> Result<Vec<QueryResult>> {
        if query_embedding.is_empty() {
            return Err(RagError::EmptyInput { field: "query" });
        }
        if params.limit == 0 {
            return Err(RagError::ConfigError("match count must be greater than zero".to_string()));
        }
        if !(-1.0..=1.0).contains(&params.threshold) {
            return Err(RagError::ConfigError(format!(
                "match threshold ({}) must be in [-1, 1]",
                params.threshold
            )));
        }
        let expected = self.embedding_provider.dimensions();
        if query_embedding.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: query_embedding.len() });
        }

        let store = self.vector_store.as_ref();
        let results = self
            .timed(store.match_documents(query_embedding, params), || {
                RagError::store_transient(store.name(), "match timed out")
            })
            .await
            .inspect_err(|e| error!(backend = store.name(), error = %e, "match failed"))?;

        info!(
            result_count = results.len(),
            threshold = params.threshold,
            limit = params.limit,
            "query completed"
        );
        Ok(results)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider and vector store are required. The configuration
/// defaults to [`RagConfig::default()`] and the chunker to the one selected
/// by the configuration's [`ChunkingStrategy`](crate::ChunkingStrategy).
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .chunker(Arc::new(BoundaryChunker::new(1000, 0.2)))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the chunker derived from the configuration.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating the configuration and that all
    /// required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| config.chunking.build(config.chunk_size, config.overlap_fraction));

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker })
    }
}
