//! Supabase store tests against a local mock of the PostgREST endpoints.

#![cfg(feature = "supabase")]

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use semvec_rag::supabase::SupabaseVectorStore;
use semvec_rag::{MatchParams, NewDocument, RagError, VectorStore};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Mock {
    requests: Arc<Mutex<Vec<Recorded>>>,
    replies: Arc<Mutex<Vec<(StatusCode, Value)>>>,
}

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    apikey: Option<String>,
    prefer: Option<String>,
    body: Value,
}

impl Mock {
    fn reply(self, status: StatusCode, body: Value) -> Self {
        self.replies.lock().unwrap().push((status, body));
        self
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(mock): State<Mock>,
    Path(path): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    mock.requests.lock().unwrap().push(Recorded {
        path,
        apikey: header("apikey"),
        prefer: header("prefer"),
        body,
    });
    let (status, reply) = mock.replies.lock().unwrap().remove(0);
    (status, Json(reply))
}

async fn spawn(mock: Mock) -> SupabaseVectorStore {
    let app = Router::new().route("/rest/v1/{*path}", post(handle)).with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    SupabaseVectorStore::new(format!("http://{addr}"), "service-key").unwrap()
}

#[tokio::test]
async fn insert_posts_row_and_returns_assigned_id() {
    let mock = Mock::default().reply(
        StatusCode::CREATED,
        json!([{"id": 42, "content": "hello", "embedding": "[0.5,0.5]"}]),
    );
    let store = spawn(mock.clone()).await;

    let document = store.insert(NewDocument::new("hello", vec![0.5, 0.5])).await.unwrap();
    assert_eq!(document.id.0, 42);
    assert_eq!(document.content, "hello");
    assert_eq!(document.embedding, vec![0.5, 0.5]);

    let request = &mock.requests()[0];
    assert_eq!(request.path, "documents");
    assert_eq!(request.apikey.as_deref(), Some("service-key"));
    assert_eq!(request.prefer.as_deref(), Some("return=representation"));
    assert_eq!(request.body, json!([{"content": "hello", "embedding": [0.5, 0.5]}]));
}

#[tokio::test]
async fn match_calls_rpc_and_enforces_ordering() {
    let mock = Mock::default().reply(
        StatusCode::OK,
        json!([
            {"id": 3, "content": "c", "embedding": [0.0, 1.0], "similarity": 0.81},
            {"id": 1, "content": "a", "embedding": "[1,0]", "similarity": 0.95},
            {"id": 2, "content": "b", "similarity": 0.81},
            {"id": 4, "content": "d", "similarity": 0.2}
        ]),
    );
    let store = spawn(mock.clone()).await;

    let results = store.match_documents(&[1.0, 0.0], MatchParams::new(0.8, 5)).await.unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r.document.id.0).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(results[0].document.embedding, vec![1.0, 0.0]);

    let request = &mock.requests()[0];
    assert_eq!(request.path, "rpc/match_documents");
    assert_eq!(request.body["match_count"], 5);
    assert_eq!(request.body["query_embedding"], json!([1.0, 0.0]));
    assert!((request.body["match_threshold"].as_f64().unwrap() - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn no_match_is_an_empty_result() {
    let store = spawn(Mock::default().reply(StatusCode::OK, json!([]))).await;
    let results = store.match_documents(&[1.0], MatchParams::default()).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn dimension_errors_from_postgres_are_mapped() {
    let mock = Mock::default().reply(
        StatusCode::BAD_REQUEST,
        json!({"code": "22000", "message": "different vector dimensions 1536 and 512"}),
    );
    let store = spawn(mock).await;

    let err = store.match_documents(&[0.1; 512], MatchParams::default()).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 1536, actual: 512 }));
}

#[tokio::test]
async fn server_errors_are_transient_and_client_errors_are_not() {
    let mock = Mock::default()
        .reply(StatusCode::SERVICE_UNAVAILABLE, json!({"message": "upstream unavailable"}))
        .reply(StatusCode::FORBIDDEN, json!({"message": "permission denied for table documents"}));
    let store = spawn(mock).await;

    let err = store.insert(NewDocument::new("x", vec![1.0])).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStoreError { transient: true, .. }));
    assert!(err.is_retryable());
    assert_eq!(err.user_message(), "Error while querying vector database");

    let err = store.insert(NewDocument::new("x", vec![1.0])).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStoreError { transient: false, .. }));
    assert!(err.to_string().contains("permission denied"));
}

#[tokio::test]
async fn configured_dimensions_are_checked_locally() {
    let mock = Mock::default();
    let store = spawn(mock.clone()).await.with_dimensions(3);

    let err = store.insert(NewDocument::new("x", vec![1.0; 2])).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
    assert!(mock.requests().is_empty());
}

#[test]
fn blank_credentials_are_rejected() {
    assert!(SupabaseVectorStore::new("", "key").is_err());
    assert!(SupabaseVectorStore::new("https://project.supabase.co", "").is_err());
}
