//! Request handlers and the mapping from pipeline errors to HTTP responses.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use semvec_rag::{ApiResponse, Document, EmbeddedText, MatchParams, QueryResult, RagError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::server::AppState;

/// Body of `POST /api/embed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedRequest {
    #[serde(default)]
    pub text: String,
}

/// Body of `POST /api/push-to-vector-database`.
///
/// Without `embeddingVector` the text is chunked and embedded first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_vector: Option<Vec<f32>>,
}

/// Body of `POST /api/query-vector-embeddings`.
///
/// `queryEmbedding` takes precedence over `query`. Missing match parameters
/// fall back to the pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
}

/// HTTP status for a pipeline error.
pub fn status_for(error: &RagError) -> StatusCode {
    match error {
        RagError::EmptyInput { .. } | RagError::ConfigError(_) => StatusCode::BAD_REQUEST,
        RagError::DimensionMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RagError::EmbeddingError { .. } => StatusCode::BAD_GATEWAY,
        RagError::VectorStoreError { transient: true, .. } => StatusCode::SERVICE_UNAVAILABLE,
        RagError::VectorStoreError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: semvec_rag::Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => {
            let status = status_for(&e);
            warn!(%status, error = %e, "request failed");
            (status, Json(ApiResponse::<T>::from(Err(e)))).into_response()
        }
    }
}

fn bad_body(rejection: JsonRejection) -> Response {
    let detail = rejection.body_text();
    warn!(error = %detail, "rejected request body");
    let body = ApiResponse::<()>::failure(format!("Invalid request body: {detail}"));
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub(crate) async fn embed(
    State(state): State<AppState>,
    body: Result<Json<EmbedRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let result: semvec_rag::Result<EmbeddedText> = state.pipeline.embed_text(&request.text).await;
    respond(result)
}

pub(crate) async fn push_to_vector_database(
    State(state): State<AppState>,
    body: Result<Json<PushRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let result: semvec_rag::Result<Document> = match request.embedding_vector {
        Some(embedding) => state.pipeline.ingest_embedded(&request.text, embedding).await,
        None => state.pipeline.ingest(&request.text).await,
    };
    respond(result)
}

pub(crate) async fn query_vector_embeddings(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    let defaults = state.pipeline.config().match_params();
    let params = MatchParams::new(
        request.match_threshold.unwrap_or(defaults.threshold),
        request.match_count.unwrap_or(defaults.limit),
    );

    let result: semvec_rag::Result<Vec<QueryResult>> = match request.query_embedding {
        Some(embedding) => state.pipeline.query_embedding(&embedding, params).await,
        None => {
            let query = request.query.unwrap_or_default();
            state.pipeline.query_with(&query, params).await
        }
    };
    respond(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(status_for(&RagError::EmptyInput { field: "text" }), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&RagError::DimensionMismatch { expected: 3, actual: 2 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&RagError::embedding("OpenAI", "down")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&RagError::store_transient("supabase", "timed out")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&RagError::store("supabase", "constraint")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn query_request_reads_camel_case() {
        let request: QueryRequest = serde_json::from_str(
            r#"{"queryEmbedding": [0.1, 0.2], "matchThreshold": 0.5, "matchCount": 2}"#,
        )
        .unwrap();
        assert_eq!(request.query_embedding, Some(vec![0.1, 0.2]));
        assert_eq!(request.match_threshold, Some(0.5));
        assert_eq!(request.match_count, Some(2));
        assert!(request.query.is_none());
    }
}
