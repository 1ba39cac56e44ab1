//! HTTP API module
//! 
//! This module contains the control channel, status endpoints and the
//! break surface.

pub mod break_page;
pub mod handlers;
pub mod messages;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

pub use messages::{Ack, ControlMessage, ControlReply};

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/message", post(message_handler))
        .route("/status", get(status_handler))
        .route("/break", get(break_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        clock::SystemClock,
        services::presenter::NullPresenter,
        state::Store,
    };

    fn router() -> (Router, Arc<AppState>) {
        let (state, _rx) = AppState::new(
            Arc::new(Store::in_memory()),
            Arc::new(SystemClock),
            Arc::new(NullPresenter),
            "127.0.0.1".to_string(),
            20554,
        );
        let state = Arc::new(state);
        (create_router(Arc::clone(&state)), state)
    }

    async fn send(router: &Router, body: Value) -> (StatusCode, Value) {
        let request = Request::post("/message")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn get_timer_state_is_null_before_any_session() {
        let (router, _) = router();
        let (status, body) = send(&router, json!({"action": "getTimerState"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn start_then_query() {
        let (router, state) = router();

        let (status, body) = send(&router, json!({"action": "startTimer", "minutes": 25})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (_, body) = send(&router, json!({"action": "getTimerState"})).await;
        assert_eq!(body["active"], true);
        assert_eq!(body["paused"], false);
        assert_eq!(body["totalDuration"], 1500);
        assert!(body["remainingTime"].as_u64().unwrap() >= 1499);

        state.stop_refresh_loop();
    }

    #[tokio::test]
    async fn pause_and_resume_round_trip() {
        let (router, state) = router();
        send(&router, json!({"action": "startTimer", "minutes": 5})).await;

        let (_, body) = send(&router, json!({"action": "pauseTimer", "timeLeft": 123})).await;
        assert_eq!(body, json!({"success": true}));
        let (_, body) = send(&router, json!({"action": "getTimerState"})).await;
        assert_eq!(body["paused"], true);
        assert_eq!(body["remainingTime"], 123);

        let (_, body) = send(&router, json!({"action": "resumeTimer"})).await;
        assert_eq!(body, json!({"success": true}));
        let (_, body) = send(&router, json!({"action": "getTimerState"})).await;
        assert_eq!(body["paused"], false);
        assert!(body["remainingTime"].as_u64().unwrap() >= 122);

        state.stop_refresh_loop();
    }

    #[tokio::test]
    async fn non_positive_minutes_are_rejected() {
        let (router, state) = router();
        let (status, body) = send(&router, json!({"action": "startTimer", "minutes": 0})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(state.get_timer_state().is_none());

        let (status, body) = send(&router, json!({"action": "startTimer", "minutes": 1e12})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(state.get_timer_state().is_none());
    }

    #[tokio::test]
    async fn oversized_pause_is_rejected_and_the_session_keeps_running() {
        let (router, state) = router();
        send(&router, json!({"action": "startTimer", "minutes": 5})).await;

        let (status, body) =
            send(&router, json!({"action": "pauseTimer", "timeLeft": 10_000_000_000_000u64})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (_, body) = send(&router, json!({"action": "resumeTimer"})).await;
        assert_eq!(body, json!({"success": true}));
        let (_, body) = send(&router, json!({"action": "getTimerState"})).await;
        assert_eq!(body["active"], true);
        assert_eq!(body["paused"], false);

        state.stop_refresh_loop();
    }

    #[tokio::test]
    async fn status_health_and_break_page() {
        let (router, _) = router();

        let response = router
            .clone()
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(status["sessionType"], "work");
        assert_eq!(status["timer"], Value::Null);

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/break").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Time for a Break!"));
    }
}
