//! Embeddings from the OpenAI `/embeddings` endpoint (feature `openai`).
//!
//! Any service speaking the same protocol works too; point
//! [`OpenAIEmbeddingProvider::with_base_url`] at it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Production endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used unless [`OpenAIEmbeddingProvider::with_model`] says otherwise.
pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";

/// Output length of [`DEFAULT_MODEL`].
pub const DEFAULT_DIMENSIONS: usize = 1536;

const PROVIDER: &str = "OpenAI";

/// Calls `POST {base_url}/embeddings` with every chunk of a document in one
/// request.
///
/// ```rust,ignore
/// use semvec_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::from_env()?.with_model("text-embedding-3-small");
/// let vector = provider.embed("machine learning").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
    /// Sent as `dimensions` so v3 models shorten their output.
    truncate_to: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Provider for [`DEFAULT_MODEL`] authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::embedding(PROVIDER, "API key must not be empty"));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            truncate_to: None,
        })
    }

    /// Reads `OPENAI_API_KEY`, and `OPENAI_EMBEDDING_MODEL` if present.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::embedding(PROVIDER, "OPENAI_API_KEY environment variable not set")
        })?;
        let provider = Self::new(api_key)?;
        Ok(match std::env::var("OPENAI_EMBEDDING_MODEL") {
            Ok(model) if !model.is_empty() => provider.with_model(model),
            _ => provider,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask the API for vectors of length `dimensions`.
    ///
    /// [`EmbeddingProvider::dimensions`] reports the new length afterwards,
    /// so stores created from it match.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self.truncate_to = Some(dimensions);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Give up on a request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            RagError::embedding(PROVIDER, format!("failed to build HTTP client: {e}"))
        })?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, payload: &EmbeddingsRequest<'_>) -> Result<EmbeddingsPage> {
        let response = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embeddings request failed");
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    format!("request failed: {e}")
                };
                RagError::embedding(PROVIDER, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ApiErrorBody>(&raw) {
                Ok(body) => body.error.message,
                Err(_) => raw,
            };
            error!(provider = PROVIDER, %status, reason = %reason, "embeddings API error");
            return Err(RagError::embedding(PROVIDER, format!("API returned {status}: {reason}")));
        }

        response.json::<EmbeddingsPage>().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "unreadable embeddings response");
            RagError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })
    }
}

// wire format

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    encoding_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsPage {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        match vectors.pop() {
            Some(vector) if vectors.is_empty() => Ok(vector),
            _ => Err(RagError::embedding(PROVIDER, "expected exactly one embedding")),
        }
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            provider = PROVIDER,
            model = %self.model,
            inputs = texts.len(),
            "requesting embeddings"
        );

        let page = self
            .post(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
                encoding_format: "float",
                dimensions: self.truncate_to,
            })
            .await?;

        // Rows may arrive in any order; `index` refers to the input position.
        let mut rows = page.data;
        rows.sort_by_key(|row| row.index);
        Ok(rows.into_iter().map(|row| row.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
