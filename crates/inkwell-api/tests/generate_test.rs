//! Integration tests for the standalone generator routes.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use inkwell_test_support::{FailingArtGenerator, FailingImageGenerator, StaticVoiceGenerator};
use serde_json::json;
use uuid::Uuid;

use common::TestGenerators;

#[tokio::test]
async fn test_generate_art_returns_descriptor() {
    let app = common::build_test_app();

    let (status, json) = common::post_json(
        app,
        "/api/v1/generate/art",
        &json!({
            "session_id": Uuid::new_v4(),
            "scene_setting": "Throne room",
            "curr_narrative": "Cersei waits."
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["art_description"], "A painted view of Throne room.");
    assert!(json.get("style_notes").is_some());
}

#[tokio::test]
async fn test_generate_art_failure_returns_502() {
    let app = common::build_test_app_with(TestGenerators {
        art: Arc::new(FailingArtGenerator::default()),
        ..TestGenerators::default()
    });

    let (status, json) = common::post_json(
        app,
        "/api/v1/generate/art",
        &json!({
            "session_id": Uuid::new_v4(),
            "scene_setting": "Throne room",
            "curr_narrative": "Cersei waits."
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "art_generation_error");
}

#[tokio::test]
async fn test_generate_image_returns_url() {
    let app = common::build_test_app();

    let (status, json) = common::post_json(
        app,
        "/api/v1/generate/image",
        &json!({ "art_description": "A torchlit hall." }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["image_url"], "https://images.test/1.png");
    assert_eq!(json["cached"], false);
    assert!(json["error"].is_null());
}

#[tokio::test]
async fn test_generate_image_failure_is_reported_in_body() {
    let app = common::build_test_app_with(TestGenerators {
        image: Arc::new(FailingImageGenerator::default()),
        ..TestGenerators::default()
    });

    let (status, json) = common::post_json(
        app,
        "/api/v1/generate/image",
        &json!({ "art_description": "A torchlit hall.", "style_notes": "Dark" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["image_url"].is_null());
    assert!(json["error"].as_str().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn test_generate_voice_returns_audio() {
    let app = common::build_test_app();

    let (status, content_type, bytes) = common::post_for_bytes(
        app,
        "/api/v1/generate/voice",
        &json!({ "text": "Winter is coming.", "voice_id": "stark" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("audio/mpeg"));
    assert_eq!(bytes.len(), 4096);
}

#[tokio::test]
async fn test_generate_voice_rejects_degenerate_payload() {
    let app = common::build_test_app_with(TestGenerators {
        voice: Arc::new(StaticVoiceGenerator::with_len(16)),
        ..TestGenerators::default()
    });

    let (status, json) = common::post_json(
        app,
        "/api/v1/generate/voice",
        &json!({ "text": "Winter is coming." }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "voice_generation_error");
}

#[tokio::test]
async fn test_generate_voice_rejects_empty_text() {
    let app = common::build_test_app();

    let (status, json) =
        common::post_json(app, "/api/v1/generate/voice", &json!({ "text": " " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}
