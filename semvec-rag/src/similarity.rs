//! Cosine similarity and the ranking contract every vector store honours.
//!
//! A match keeps the documents whose similarity to the query is at least the
//! threshold, orders them by descending similarity (lower id first on ties),
//! and returns at most `limit` of them. An empty result is not an error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MATCH_COUNT, DEFAULT_MATCH_THRESHOLD};
use crate::document::QueryResult;
use crate::error::{RagError, Result};

/// Threshold and result cap for a similarity match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatchParams {
    /// Minimum cosine similarity (inclusive).
    pub threshold: f32,
    /// Maximum number of results.
    pub limit: usize,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self { threshold: DEFAULT_MATCH_THRESHOLD, limit: DEFAULT_MATCH_COUNT }
    }
}

impl MatchParams {
    /// Create match parameters.
    pub fn new(threshold: f32, limit: usize) -> Self {
        Self { threshold, limit }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
///
/// # Errors
///
/// Returns [`RagError::DimensionMismatch`] if the vectors differ in length;
/// `a` is taken as the reference dimensionality.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch { expected: a.len(), actual: b.len() });
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Apply the match contract to a set of scored documents.
///
/// Drops results below `params.threshold` (and NaN scores), sorts by
/// descending similarity with ascending id as the tie-break, keeps only the
/// best entry per document id, and truncates to `params.limit`.
pub fn rank(mut results: Vec<QueryResult>, params: &MatchParams) -> Vec<QueryResult> {
    results.retain(|r| r.similarity >= params.threshold);
    results.sort_by(|a, b| {
        b.similarity.total_cmp(&a.similarity).then_with(|| a.document.id.cmp(&b.document.id))
    });

    let mut seen = HashSet::new();
    results.retain(|r| seen.insert(r.document.id));
    results.truncate(params.limit);
    results
}
