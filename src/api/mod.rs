pub mod statistics;

use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use statistics::{statistics_router, ApiState, StatisticsResponse, EXPORT_FILE_NAME};

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Full application router: health check plus the statistics API under `/api`.
pub fn app(state: Arc<ApiState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", statistics_router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::VariancePolicy;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> Arc<ApiState> {
        Arc::new(ApiState {
            policy: VariancePolicy::Clamp,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(state(), 1024)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_over_limit_rejected() {
        let body = format!("id,fecha,total\n{}", "1,2020-01-01,1\n".repeat(100));
        let response = app(state(), 64)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/statistics")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_nested_statistics_route() {
        let response = app(state(), 1024)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/statistics")
                    .body(Body::from("id,fecha,total\n1,2020-01-15,10\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
