//! # semvec-rag
//!
//! Semantic retrieval over stored text: split text into overlapping chunks,
//! embed the chunks with a hosted model, collapse them into one vector per
//! document, persist it, and answer natural-language queries by cosine
//! similarity.
//!
//! ## Overview
//!
//! - [`Chunker`]: splits text into bounded, overlapping [`Chunk`]s
//! - [`EmbeddingProvider`]: maps text to fixed-length vectors; [`Aggregation`]
//!   decides how chunk vectors become one document vector
//! - [`VectorStore`]: persists [`Document`]s and matches query vectors under
//!   the contract implemented by [`similarity::rank`]
//! - [`RagPipeline`]: the orchestrator composing all of the above
//! - [`ApiResponse`]: the `{success, data | error}` shape used at the API boundary
//!
//! ## Features
//!
//! - `openai` (default): [`openai::OpenAIEmbeddingProvider`]
//! - `supabase` (default): [`supabase::SupabaseVectorStore`]
//! - `pgvector`: `pgvector::PgVectorStore` over sqlx
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use semvec_rag::{InMemoryVectorStore, RagConfig, RagPipeline};
//! use semvec_rag::openai::OpenAIEmbeddingProvider;
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! pipeline.ingest("Artificial intelligence is the study of intelligent agents").await?;
//! let results = pipeline.query("machine learning").await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod pipeline;
pub mod response;
pub mod similarity;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;
#[cfg(feature = "supabase")]
pub mod supabase;

pub use chunking::{BoundaryChunker, Chunk, Chunker, ChunkingStrategy, WindowChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Document, DocumentId, NewDocument, QueryResult};
pub use embedding::{Aggregation, EmbeddingProvider, aggregate, embed_chunks};
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{EmbeddedText, RagPipeline, RagPipelineBuilder};
pub use response::ApiResponse;
pub use similarity::{MatchParams, cosine_similarity};
pub use vectorstore::VectorStore;
