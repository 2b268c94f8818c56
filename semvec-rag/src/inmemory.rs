//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `Vec` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small-scale use cases, and serves as the
//! reference implementation of the match contract.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Document, DocumentId, NewDocument, QueryResult};
use crate::error::{RagError, Result};
use crate::similarity::{MatchParams, cosine_similarity, rank};
use crate::vectorstore::VectorStore;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    dimensions: Option<usize>,
    documents: Vec<Document>,
}

/// An in-memory vector store using brute-force cosine similarity.
///
/// Ids start at 1 and increase with each insert. The dimensionality is fixed
/// by [`with_dimensions`](InMemoryVectorStore::with_dimensions) or, failing
/// that, by the first inserted document.
///
/// # Example
///
/// ```rust,ignore
/// use semvec_rag::{InMemoryVectorStore, NewDocument, VectorStore};
///
/// let store = InMemoryVectorStore::with_dimensions(1536);
/// let doc = store.insert(NewDocument::new("hello", embedding)).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    state: RwLock<State>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that only accepts vectors of `dimensions` length.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { state: RwLock::new(State { dimensions: Some(dimensions), ..State::default() }) }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, document: NewDocument) -> Result<Document> {
        let mut state = self.state.write().await;
        let actual = document.embedding.len();
        match state.dimensions {
            Some(expected) if expected != actual => {
                return Err(RagError::DimensionMismatch { expected, actual });
            }
            Some(_) => {}
            None => state.dimensions = Some(actual),
        }

        state.next_id += 1;
        let stored = Document {
            id: DocumentId(state.next_id),
            content: document.content,
            embedding: document.embedding,
        };
        state.documents.push(stored.clone());
        debug!(id = %stored.id, dimensions = actual, "inserted document in memory");
        Ok(stored)
    }

    async fn match_documents(
        &self,
        query_embedding: &[f32],
        params: MatchParams,
    ) -> Result<Vec<QueryResult>> {
        let state = self.state.read().await;
        let Some(expected) = state.dimensions else {
            return Ok(Vec::new());
        };
        if query_embedding.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: query_embedding.len() });
        }

        let mut scored = Vec::new();
        for document in &state.documents {
            let similarity = cosine_similarity(&document.embedding, query_embedding)?;
            if similarity >= params.threshold {
                scored.push(QueryResult { document: document.clone(), similarity });
            }
        }

        Ok(rank(scored, &params))
    }

    fn name(&self) -> &str {
        "InMemory"
    }
}
