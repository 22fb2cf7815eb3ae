//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_health_check_returns_200() {
    let app = common::build_test_app();

    let (status, json) = common::get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["tracked_sessions"], 0);
}

#[tokio::test]
async fn test_health_check_counts_tracked_sessions() {
    let app = common::build_test_app();
    let (status, _) =
        common::post_json(app.clone(), "/api/v1/game/start", &serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = common::get_json(app, "/health").await;

    assert_eq!(json["tracked_sessions"], 1);
}
