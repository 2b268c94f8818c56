//! Data types for stored documents and query results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned document identifier.
///
/// Identifiers grow with insertion order, which is what ties between equal
/// similarity scores are broken by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored text with its embedding.
///
/// Documents are immutable once created. Every document in one store has an
/// embedding of the same length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier assigned by the store on insert.
    pub id: DocumentId,
    /// The original, unchunked text.
    pub content: String,
    /// The (aggregated) embedding of `content`.
    pub embedding: Vec<f32>,
}

/// A document that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDocument {
    /// The original, unchunked text.
    pub content: String,
    /// The (aggregated) embedding of `content`.
    pub embedding: Vec<f32>,
}

impl NewDocument {
    /// Create a new unsaved document.
    pub fn new(content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self { content: content.into(), embedding }
    }
}

/// A stored [`Document`] matched by a query, with its cosine similarity.
///
/// Serialises flat, as `{id, content, embedding, similarity}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// The matched document.
    #[serde(flatten)]
    pub document: Document,
    /// Cosine similarity to the query vector, in `[-1, 1]`.
    pub similarity: f32,
}
