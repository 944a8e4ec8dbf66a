//! Tests for the liveness endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use instagram_discord_notifier::web;
use tower::ServiceExt;

#[tokio::test]
async fn test_liveness_root_responds_running() {
    let app = web::router();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("running"));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = web::router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
