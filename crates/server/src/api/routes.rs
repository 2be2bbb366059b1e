use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/schedule", get(handlers::get_schedule));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use topicwatch_core::{
        CheckScheduler, Config, SchedulerConfig, SqliteTopicStore, TopicStore, TopicType,
        TrackingTopic,
    };

    fn app() -> (Router, Arc<CheckScheduler>) {
        let store: Arc<dyn TopicStore> = Arc::new(SqliteTopicStore::in_memory().unwrap());
        let (scheduler, _due_rx) = CheckScheduler::new(SchedulerConfig::default(), store);
        let scheduler = Arc::new(scheduler);
        let state = Arc::new(AppState::new(Config::default(), Arc::clone(&scheduler)));
        (create_router(state), scheduler)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app();
        let (status, json) = get_json(router, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["scheduler_running"], false);
    }

    #[tokio::test]
    async fn test_schedule_lists_pending_topics() {
        let (router, scheduler) = app();
        scheduler
            .on_topic_changed(TrackingTopic::new(TopicType::Game, "Some Game", "g/1"))
            .await;

        let (status, json) = get_json(router, "/api/v1/schedule").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["entries"][0]["guid"], "g/1");
        assert_eq!(json["entries"][0]["query"], "Some Game");
    }

    #[tokio::test]
    async fn test_config_hides_nothing_by_default() {
        let (router, _) = app();
        let (status, json) = get_json(router, "/api/v1/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["server"]["port"], 8080);
        assert!(json.get("searcher").is_none());
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (router, _) = app();
        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("topicwatch_pending_topics"));
    }
}
