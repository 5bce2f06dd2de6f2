//! HTTP request handlers

use super::types::{ErrorResponse, SessionResponse, SuccessResponse, TopicsResponse, UserAction};
use super::AppState;
use crate::catalog;
use crate::imaging::MAX_UPLOAD_BYTES;
use crate::view::TransitionError;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Action bodies carry images as base64, which grows them by a third.
/// Files somewhat over the upload cap must still reach validation.
const MAX_ACTION_BODY_BYTES: usize = 2 * MAX_UPLOAD_BYTES;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Topic catalog
        .route("/api/topics", get(list_topics))
        // Controller lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // User actions
        .route(
            "/api/sessions/:id/actions",
            post(post_action).layer(DefaultBodyLimit::max(MAX_ACTION_BODY_BYTES)),
        )
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn list_topics() -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: catalog::topics(),
    })
}

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let controller = state.create_controller().await;
    Json(SessionResponse {
        id: controller.id().to_string(),
        state: controller.snapshot(),
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let controller = state
        .controller(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;
    Ok(Json(SessionResponse {
        id,
        state: controller.snapshot(),
    }))
}

/// Apply a user action and answer once its provider work has settled
async fn post_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserAction>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(action) = body.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(e.body_text()),
        _ => AppError::BadRequest(e.body_text()),
    })?;
    let event = action
        .into_event()
        .map_err(|e| AppError::BadRequest(format!("Invalid image data: {e}")))?;

    let controller = state
        .controller(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;

    let mut updates = controller.subscribe();
    let dispatched = controller.dispatch(event).await?;

    // Back from another request also clears the pending flag
    let settled = updates
        .wait_for(|s| !s.is_busy() || s.epoch != dispatched.epoch)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .clone();

    Ok(Json(SessionResponse { id, state: settled }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let controller = state
        .remove_controller(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;
    controller.shutdown().await;
    tracing::info!(controller = %id, "Controller removed");
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_version() -> &'static str {
    concat!("green-land ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Busy | TransitionError::InvalidTransition(_) => {
                AppError::Conflict(err.to_string())
            }
            TransitionError::EmptyInput | TransitionError::UnknownTopic(_) => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockLlmService;
    use crate::llm::{LlmResponse, ModelRegistry};
    use crate::tools::ToolRegistry;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(mock: Arc<MockLlmService>) -> Router {
        let registry = Arc::new(ModelRegistry::with_service(mock));
        create_router(AppState::new(registry, Arc::new(ToolRegistry::builtin())))
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["screen"], "landing");
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_topics_listed() {
        let app = app(Arc::new(MockLlmService::new()));
        let (status, body) = call(&app, "GET", "/api/topics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topics"].as_array().unwrap().len(), 10);
        assert_eq!(body["topics"][1]["key"], "pest-id");
    }

    #[tokio::test]
    async fn test_search_round_trip() {
        let mock = Arc::new(MockLlmService::new());
        mock.queue_response(LlmResponse::from_text("Mix greens and browns."));
        let app = app(mock);
        let id = new_session(&app).await;
        let actions = format!("/api/sessions/{id}/actions");

        call(&app, "POST", &actions, Some(json!({"type": "get_started"}))).await;
        let (status, body) = call(
            &app,
            "POST",
            &actions,
            Some(json!({"type": "search", "query": "how to make compost"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["screen"], "chat");
        assert_eq!(body["state"]["pending"], Value::Null);
        assert_eq!(body["state"]["transcript"][1]["text"], "Mix greens and browns.");
        assert_eq!(body["state"]["transcript"][1]["sender"], "ai");

        let (status, body) = call(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["transcript"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_action_is_conflict() {
        let app = app(Arc::new(MockLlmService::new()));
        let id = new_session(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/sessions/{id}/actions"),
            Some(json!({"type": "send_message", "text": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("landing"));
    }

    #[tokio::test]
    async fn test_malformed_action_is_bad_request() {
        let app = app(Arc::new(MockLlmService::new()));
        let id = new_session(&app).await;
        let actions = format!("/api/sessions/{id}/actions");

        let (status, _) = call(&app, "POST", &actions, Some(json!({"type": "dance"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        call(&app, "POST", &actions, Some(json!({"type": "get_started"}))).await;
        let (status, _) = call(
            &app,
            "POST",
            &actions,
            Some(json!({"type": "search", "query": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_upload_limits_over_http() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let app = app(Arc::new(MockLlmService::new()));
        let id = new_session(&app).await;
        let actions = format!("/api/sessions/{id}/actions");
        call(&app, "POST", &actions, Some(json!({"type": "get_started"}))).await;
        call(&app, "POST", &actions, Some(json!({"type": "show_image_identifier"}))).await;

        let select = |len: usize| {
            json!({
                "type": "select_image",
                "image": {"data": BASE64.encode(vec![0u8; len]), "media_type": "image/png"}
            })
        };

        let (status, body) = call(&app, "POST", &actions, Some(select(MAX_UPLOAD_BYTES))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["screen"], "image_identify");
        assert!(body["state"]["selected"].is_object());
        assert_eq!(body["state"]["error"], Value::Null);

        let (status, body) = call(&app, "POST", &actions, Some(select(5 * 1024 * 1024))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["selected"], Value::Null);
        assert!(body["state"]["error"]
            .as_str()
            .unwrap()
            .contains("smaller than 4MB"));

        let (status, _) = call(&app, "POST", &actions, Some(select(3 * MAX_UPLOAD_BYTES))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_session_not_found() {
        let app = app(Arc::new(MockLlmService::new()));
        let (status, _) = call(&app, "GET", "/api/sessions/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(
            &app,
            "POST",
            "/api/sessions/missing/actions",
            Some(json!({"type": "back"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = app(Arc::new(MockLlmService::new()));
        let id = new_session(&app).await;
        let (status, body) = call(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = call(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
