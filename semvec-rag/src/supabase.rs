//! Supabase (PostgREST + pgvector) vector store backend.
//!
//! Provides [`SupabaseVectorStore`] which implements [`VectorStore`] over the
//! Supabase REST API:
//!
//! - inserts go to `POST /rest/v1/{table}` with `Prefer: return=representation`
//! - matches call the `match_documents` SQL function through
//!   `POST /rest/v1/rpc/{function}` with
//!   `{query_embedding, match_threshold, match_count}`
//!
//! The SQL side (table and function) is the one created by
//! `PgVectorStore::ensure_schema` (feature `pgvector`), or by the equivalent
//! Supabase migration.
//!
//! This module is only available when the `supabase` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use semvec_rag::supabase::SupabaseVectorStore;
//!
//! let store = SupabaseVectorStore::from_env()?;
//! let doc = store.insert(NewDocument::new("hello", embedding)).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{Document, DocumentId, NewDocument, QueryResult};
use crate::error::{RagError, Result};
use crate::similarity::{MatchParams, rank};
use crate::vectorstore::{VectorStore, dimension_mismatch_from_message, parse_vector_literal};

const BACKEND: &str = "supabase";

/// Default table holding `{id, content, embedding}` rows.
pub const DEFAULT_TABLE: &str = "documents";

/// Default SQL function implementing the match contract.
pub const DEFAULT_MATCH_FUNCTION: &str = "match_documents";

/// A [`VectorStore`] backed by a Supabase project.
pub struct SupabaseVectorStore {
    client: reqwest::Client,
    url: String,
    api_key: String,
    table: String,
    match_function: String,
    dimensions: Option<usize>,
}

impl SupabaseVectorStore {
    /// Create a store for the project at `url` using `api_key`.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let url = url.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();
        if url.is_empty() || api_key.is_empty() {
            return Err(RagError::ConfigError(
                "Supabase URL and API key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_key,
            table: DEFAULT_TABLE.to_string(),
            match_function: DEFAULT_MATCH_FUNCTION.to_string(),
            dimensions: None,
        })
    }

    /// Create a store from `SUPABASE_URL` and `SUPABASE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| {
                RagError::ConfigError(format!("{name} environment variable not set"))
            })
        };
        Self::new(var("SUPABASE_URL")?, var("SUPABASE_API_KEY")?)
    }

    /// Use a different table for inserts.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Use a different SQL function for matches.
    pub fn with_match_function(mut self, function: impl Into<String>) -> Self {
        self.match_function = function.into();
        self
    }

    /// Reject vectors of any other length before they reach the server.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Set a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::store(BACKEND, format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        match self.dimensions {
            Some(expected) if expected != embedding.len() => {
                Err(RagError::DimensionMismatch { expected, actual: embedding.len() })
            }
            _ => Ok(()),
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/rest/v1/{path}", self.url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            error!(backend = BACKEND, error = %e, "request failed");
            if e.is_timeout() {
                RagError::store_transient(BACKEND, "request timed out")
            } else {
                RagError::store_transient(BACKEND, format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<PostgrestError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            error!(backend = BACKEND, %status, detail = %detail, "API error");
            if let Some(mismatch) = dimension_mismatch_from_message(&detail) {
                return Err(mismatch);
            }
            let message = format!("API returned {status}: {detail}");
            return Err(if is_transient(status) {
                RagError::store_transient(BACKEND, message)
            } else {
                RagError::store(BACKEND, message)
            });
        }

        response.json().await.map_err(|e| {
            error!(backend = BACKEND, error = %e, "failed to parse response");
            RagError::store(BACKEND, format!("failed to parse response: {e}"))
        })
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

// ── PostgREST request/response types ───────────────────────────────

#[derive(Serialize)]
struct InsertRow<'a> {
    content: &'a str,
    embedding: &'a [f32],
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_threshold: f32,
    match_count: usize,
}

/// pgvector columns come back either as JSON arrays or as text literals.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireVector {
    Array(Vec<f32>),
    Text(String),
}

impl WireVector {
    fn into_vec(self) -> Result<Vec<f32>> {
        match self {
            Self::Array(values) => Ok(values),
            Self::Text(literal) => {
                parse_vector_literal(&literal).map_err(|e| RagError::store(BACKEND, e))
            }
        }
    }
}

#[derive(Deserialize)]
struct Row {
    id: i64,
    content: String,
    #[serde(default)]
    embedding: Option<WireVector>,
    #[serde(default)]
    similarity: Option<f32>,
}

impl Row {
    fn into_document(self) -> Result<(Document, Option<f32>)> {
        let embedding = match self.embedding {
            Some(vector) => vector.into_vec()?,
            None => Vec::new(),
        };
        let document = Document { id: DocumentId(self.id), content: self.content, embedding };
        Ok((document, self.similarity))
    }
}

#[derive(Deserialize)]
struct PostgrestError {
    message: String,
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    async fn insert(&self, document: NewDocument) -> Result<Document> {
        self.check_dimensions(&document.embedding)?;

        let body = [InsertRow { content: &document.content, embedding: &document.embedding }];
        let request = self
            .request(&self.table)
            .header("Prefer", "return=representation")
            .json(&body);
        let rows: Vec<Row> = self.send(request).await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| RagError::store(BACKEND, "insert returned no rows"))?;
        let (mut stored, _) = row.into_document()?;
        if stored.embedding.is_empty() {
            stored.embedding = document.embedding;
        }
        debug!(backend = BACKEND, id = %stored.id, "inserted document");
        Ok(stored)
    }

    async fn match_documents(
        &self,
        query_embedding: &[f32],
        params: MatchParams,
    ) -> Result<Vec<QueryResult>> {
        self.check_dimensions(query_embedding)?;

        let body = MatchRequest {
            query_embedding,
            match_threshold: params.threshold,
            match_count: params.limit,
        };
        let request = self.request(&format!("rpc/{}", self.match_function)).json(&body);
        let rows: Vec<Row> = self.send(request).await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let (document, similarity) = row.into_document()?;
            let similarity = match similarity {
                Some(similarity) => similarity,
                None => return Err(RagError::store(BACKEND, "match row without similarity")),
            };
            results.push(QueryResult { document, similarity });
        }
        debug!(backend = BACKEND, result_count = results.len(), "matched documents");

        // Enforce the contract on whatever the SQL function returned.
        Ok(rank(results, &params))
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
