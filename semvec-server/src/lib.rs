//! # semvec-server
//!
//! HTTP API over a [`RagPipeline`](semvec_rag::RagPipeline).
//!
//! | route | body | returns |
//! |---|---|---|
//! | `GET /health` | | `{status, service}` |
//! | `POST /api/embed` | `{text}` | [`EmbeddedText`](semvec_rag::EmbeddedText) |
//! | `POST /api/push-to-vector-database` | `{text, embeddingVector?}` | [`Document`](semvec_rag::Document) |
//! | `POST /api/query-vector-embeddings` | `{query?, queryEmbedding?, matchThreshold?, matchCount?}` | `[QueryResult]` |
//!
//! Every `/api` response is an [`ApiResponse`](semvec_rag::ApiResponse)
//! envelope; the status code follows the error kind.

pub mod handlers;
pub mod server;

pub use handlers::{EmbedRequest, PushRequest, QueryRequest, status_for};
pub use server::{AppState, ServerConfig, app_router, request_deadline, run_server};
