//! Configuration for the retrieval pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunking::ChunkingStrategy;
use crate::embedding::Aggregation;
use crate::error::{RagError, Result};
use crate::similarity::MatchParams;

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default fraction of a chunk shared with its successor.
pub const DEFAULT_OVERLAP_FRACTION: f32 = 0.2;

/// Default minimum cosine similarity for a match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.80;

/// Default maximum number of matches returned by a query.
pub const DEFAULT_MATCH_COUNT: usize = 5;

/// Default timeout applied to every embedding and store call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Fraction of `chunk_size` shared by consecutive chunks, in `[0, 1)`.
    pub overlap_fraction: f32,
    /// How text is split into chunks.
    pub chunking: ChunkingStrategy,
    /// How per-chunk vectors collapse into one document vector.
    pub aggregation: Aggregation,
    /// Minimum similarity for a stored document to match a query.
    pub match_threshold: f32,
    /// Maximum number of matches returned by a query.
    pub match_count: usize,
    /// Timeout for each remote embedding or store call.
    pub request_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap_fraction: DEFAULT_OVERLAP_FRACTION,
            chunking: ChunkingStrategy::default(),
            aggregation: Aggregation::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            match_count: DEFAULT_MATCH_COUNT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        (self.chunk_size as f32 * self.overlap_fraction).round() as usize
    }

    /// The default match parameters used by [`RagPipeline::query`](crate::RagPipeline::query).
    pub fn match_params(&self) -> MatchParams {
        MatchParams { threshold: self.match_threshold, limit: self.match_count }
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `overlap_fraction` is outside `[0, 1)`
    /// - the overlap rounds up to the whole chunk, leaving no forward progress
    /// - `match_count == 0`
    /// - `match_threshold` is outside `[-1, 1]`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(RagError::ConfigError(format!(
                "overlap_fraction ({}) must be in [0, 1)",
                self.overlap_fraction
            )));
        }
        if self.chunk_overlap() >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap(),
                self.chunk_size
            )));
        }
        if self.match_count == 0 {
            return Err(RagError::ConfigError("match_count must be greater than zero".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.match_threshold) {
            return Err(RagError::ConfigError(format!(
                "match_threshold ({}) must be in [-1, 1]",
                self.match_threshold
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the fraction of each chunk that overlaps its successor.
    pub fn overlap_fraction(mut self, fraction: f32) -> Self {
        self.config.overlap_fraction = fraction;
        self
    }

    /// Set the chunking strategy.
    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Set the chunk aggregation strategy.
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.config.aggregation = aggregation;
        self
    }

    /// Set the minimum similarity threshold for matches.
    pub fn match_threshold(mut self, threshold: f32) -> Self {
        self.config.match_threshold = threshold;
        self
    }

    /// Set the maximum number of matches returned by a query.
    pub fn match_count(mut self, count: usize) -> Self {
        self.config.match_count = count;
        self
    }

    /// Set the timeout applied to each remote call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
