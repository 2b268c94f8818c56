//! Vector store trait for persisting documents and matching query vectors.

use async_trait::async_trait;

use crate::document::{Document, NewDocument, QueryResult};
use crate::error::Result;
use crate::similarity::MatchParams;

/// A storage backend for embedded documents with similarity search.
///
/// The store owns identifier assignment, indexing and its own concurrency
/// control. [`match_documents`](VectorStore::match_documents) must honour the
/// contract described in [`similarity`](crate::similarity): inclusive
/// threshold, descending similarity, lower id first on ties, at most
/// `params.limit` results.
///
/// # Example
///
/// ```rust,ignore
/// use semvec_rag::{InMemoryVectorStore, MatchParams, NewDocument, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// let doc = store.insert(NewDocument::new("hello", embedding)).await?;
/// let results = store.match_documents(&query_embedding, MatchParams::default()).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist a document and return it with its store-assigned id.
    async fn insert(&self, document: NewDocument) -> Result<Document>;

    /// Return the stored documents most similar to `query_embedding`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// if the query vector's length differs from the stored vectors.
    async fn match_documents(
        &self,
        query_embedding: &[f32],
        params: MatchParams,
    ) -> Result<Vec<QueryResult>>;

    /// A short backend name used in logs and errors.
    fn name(&self) -> &str;
}

/// Format a vector as a pgvector literal, e.g. `[0.1,0.2,0.3]`.
#[cfg(feature = "pgvector")]
pub(crate) fn vector_literal(embedding: &[f32]) -> String {
    format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
}

/// Parse a pgvector literal such as `[0.1,0.2,0.3]`.
#[cfg(any(feature = "supabase", feature = "pgvector"))]
pub(crate) fn parse_vector_literal(literal: &str) -> std::result::Result<Vec<f32>, String> {
    let inner = literal
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("not a vector literal: {literal}"))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|v| {
            v.trim().parse::<f32>().map_err(|e| format!("invalid vector component '{v}': {e}"))
        })
        .collect()
}

/// Map pgvector's dimension errors to a [`RagError::DimensionMismatch`].
///
/// Recognises `different vector dimensions 1536 and 512` (distance operators)
/// and `expected 1536 dimensions, not 512` (column inserts).
#[cfg(any(feature = "supabase", feature = "pgvector"))]
pub(crate) fn dimension_mismatch_from_message(message: &str) -> Option<crate::RagError> {
    let numbers = |s: &str| -> Vec<usize> {
        s.split(|c: char| !c.is_ascii_digit()).filter_map(|n| n.parse().ok()).collect()
    };
    let tail = if let Some(pos) = message.find("different vector dimensions") {
        &message[pos..]
    } else if let Some(pos) = message.find("expected ") {
        let tail = &message[pos..];
        if !tail.contains("dimensions, not") {
            return None;
        }
        tail
    } else {
        return None;
    };
    match numbers(tail).as_slice() {
        [expected, actual, ..] => {
            Some(crate::RagError::DimensionMismatch { expected: *expected, actual: *actual })
        }
        _ => None,
    }
}

#[cfg(all(test, any(feature = "supabase", feature = "pgvector")))]
mod tests {
    use super::*;
    use crate::RagError;

    #[test]
    #[cfg(feature = "pgvector")]
    fn vectors_format_as_pgvector_literals() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.0]), "[0.5,-1,2]");
        assert_eq!(parse_vector_literal(&vector_literal(&[0.25, 3.0])).unwrap(), vec![0.25, 3.0]);
    }

    #[test]
    fn vector_literals_parse_from_text() {
        assert_eq!(parse_vector_literal("[0.5, -1,2]").unwrap(), vec![0.5, -1.0, 2.0]);
        assert_eq!(parse_vector_literal("[]").unwrap(), Vec::<f32>::new());
        assert!(parse_vector_literal("0.5,1").is_err());
    }

    #[test]
    fn pgvector_dimension_errors_are_recognised() {
        assert!(matches!(
            dimension_mismatch_from_message("different vector dimensions 1536 and 512"),
            Some(RagError::DimensionMismatch { expected: 1536, actual: 512 })
        ));
        assert!(matches!(
            dimension_mismatch_from_message("expected 1536 dimensions, not 3"),
            Some(RagError::DimensionMismatch { expected: 1536, actual: 3 })
        ));
        assert!(dimension_mismatch_from_message("permission denied for table documents").is_none());
    }
}
