//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use inkwell_core::clock::Clock;
use inkwell_core::generator::{
    ArtDescriptionGenerator, ImageGenerator, NarrativeGenerator, VoiceGenerator,
};
use inkwell_enrichment::pipeline::EnrichmentPipeline;
use inkwell_event_store::memory_event_repository::InMemoryEventRepository;
use inkwell_narrative::application::orchestrator::TurnOrchestrator;
use inkwell_test_support::{
    CountingImageGenerator, FixedClock, ScriptedNarrativeGenerator, StaticArtGenerator,
    StaticVoiceGenerator,
};
use tower::ServiceExt;

use inkwell_api::routes;
use inkwell_api::state::AppState;

/// Generators behind a test app.
pub struct TestGenerators {
    pub narrator: Arc<dyn NarrativeGenerator>,
    pub art: Arc<dyn ArtDescriptionGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub voice: Arc<dyn VoiceGenerator>,
}

impl Default for TestGenerators {
    fn default() -> Self {
        Self {
            narrator: Arc::new(ScriptedNarrativeGenerator::endless()),
            art: Arc::new(StaticArtGenerator::default()),
            image: Arc::new(CountingImageGenerator::default()),
            voice: Arc::new(StaticVoiceGenerator::with_len(4096)),
        }
    }
}

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::default())
}

/// Build the full app router over an in-memory store and the default test
/// generators. The router shares its state across clones.
pub fn build_test_app() -> Router {
    build_test_app_with(TestGenerators::default())
}

/// Build the full app router over an in-memory store and `generators`.
pub fn build_test_app_with(generators: TestGenerators) -> Router {
    let event_repository = Arc::new(InMemoryEventRepository::new());
    let pipeline = EnrichmentPipeline::new(
        generators.art,
        generators.image,
        generators.voice,
        "test-narrator",
    );
    let orchestrator = TurnOrchestrator::new(
        generators.narrator,
        pipeline,
        event_repository.clone(),
        fixed_clock(),
    );
    let app_state = AppState::new(event_repository, orchestrator);

    routes::build_router(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the raw response.
pub async fn post_for_bytes(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    into_parts(app.oneshot(request).await.unwrap()).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the raw response.
pub async fn get_bytes(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    into_parts(app.oneshot(request).await.unwrap()).await
}

async fn into_parts(response: axum::response::Response) -> (StatusCode, Option<String>, Vec<u8>) {
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_owned());
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, content_type, body_bytes.to_vec())
}
