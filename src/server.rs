use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::engine;
use crate::error::ScoringError;
use crate::models::RunRequest;
use crate::store::ScoringStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScoringStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ScoringStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /api/scores/run
///
/// An empty body scores every account.
pub async fn run_scores(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RunRequest::default()
    } else {
        match serde_json::from_slice::<RunRequest>(&body) {
            Ok(request) => request,
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
        }
    };

    match engine::run(state.store.as_ref(), &request, Utc::now()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err @ ScoringError::InvalidInput(_)) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(err) => {
            error!(error = %err, "scoring run failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scores/run", post(run_scores))
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    fn post_run(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/scores/run")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn extract_json(body: Body) -> Value {
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("should read body");
        serde_json::from_slice(&bytes).expect("should parse JSON")
    }

    fn app_with(store: MemoryStore) -> Router {
        build_router(AppState::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app_with(MemoryStore::new());
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["module"], "engagement-scoring");
    }

    #[tokio::test]
    async fn empty_body_scores_all_accounts() {
        let store = MemoryStore::new();
        let account_id = Uuid::new_v4();
        store.add_account(account_id, None);
        store.add_client(account_id, "active");
        store.add_client(account_id, "active");

        let response = app_with(store).oneshot(post_run("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["results"][0]["account_id"], account_id.to_string());
        assert_eq!(body["results"][0]["clients_processed"], 2);
        assert_eq!(body["results"][0]["errors"], json!([]));
    }

    #[tokio::test]
    async fn scoped_request_reports_client_errors() {
        let store = MemoryStore::new();
        let account_id = Uuid::new_v4();
        store.add_account(account_id, None);
        let client = store.add_client(account_id, "active");
        store.fail_reads_for(client.id);

        let payload = json!({ "account_id": account_id, "client_id": client.id }).to_string();
        let response = app_with(store).oneshot(post_run(&payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["results"][0]["clients_processed"], 0);
        let errors = body["results"][0]["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].as_str().unwrap().contains(&client.id.to_string()));
    }

    #[tokio::test]
    async fn client_without_account_is_bad_request() {
        let payload = json!({ "client_id": Uuid::new_v4() }).to_string();
        let response = app_with(MemoryStore::new())
            .oneshot(post_run(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = extract_json(response.into_body()).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn account_listing_failure_is_server_error() {
        let store = MemoryStore::new();
        store.fail_account_listing();

        let response = app_with(store).oneshot(post_run("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = extract_json(response.into_body()).await;
        assert!(body["error"].is_string());
    }
}
