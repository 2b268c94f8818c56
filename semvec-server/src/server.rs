use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use semvec_rag::{ApiResponse, RagPipeline};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers::{embed, push_to_vector_database, query_vector_embeddings};

/// Slack added on top of the pipeline's two sequential remote calls.
const DEADLINE_MARGIN: Duration = Duration::from_secs(5);

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self { pipeline }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Minimum upper bound on a whole request. [`run_server`] raises it to
    /// [`request_deadline`] when the pipeline's own timeouts need longer.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Deadline for a whole request given the pipeline's per-call timeout.
///
/// An ingest or a text query makes one embedding call and one store call,
/// each bounded by `pipeline_timeout`, so the result always exceeds twice
/// that.
pub fn request_deadline(configured: Duration, pipeline_timeout: Duration) -> Duration {
    configured.max(pipeline_timeout.saturating_mul(2).saturating_add(DEADLINE_MARGIN))
}

/// Build the router. Requests running longer than `request_timeout` get a
/// `504` with an [`ApiResponse`] body.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/embed", post(embed))
        .route("/api/push-to-vector-database", post(push_to_vector_database))
        .route("/api/query-vector-embeddings", post(query_vector_embeddings))
        .with_state(state)
        .layer(middleware::from_fn_with_state(request_timeout, enforce_deadline))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn enforce_deadline(
    State(deadline): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(%path, deadline_ms = deadline.as_millis() as u64, "request timed out");
            (StatusCode::GATEWAY_TIMEOUT, Json(ApiResponse::<()>::failure("Request timed out")))
                .into_response()
        }
    }
}

pub async fn run_server(config: ServerConfig, pipeline: Arc<RagPipeline>) -> anyhow::Result<()> {
    let deadline = request_deadline(config.request_timeout, pipeline.config().request_timeout);
    let app = app_router(AppState::new(pipeline), deadline);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for semvec server")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(deadline_secs = deadline.as_secs(), "semvec listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "semvec"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_outlasts_both_pipeline_calls() {
        let pipeline_timeout = Duration::from_secs(30);
        let deadline = request_deadline(Duration::from_secs(60), pipeline_timeout);
        assert!(deadline > pipeline_timeout * 2);

        let deadline = request_deadline(Duration::from_secs(300), pipeline_timeout);
        assert_eq!(deadline, Duration::from_secs(300));

        let deadline = request_deadline(Duration::ZERO, Duration::MAX);
        assert_eq!(deadline, Duration::MAX);
    }
}
