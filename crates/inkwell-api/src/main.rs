//! Inkwell API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use inkwell_api::config::AppConfig;
use inkwell_api::error::AppError;
use inkwell_api::state::AppState;
use inkwell_api::{routes, telemetry};
use inkwell_core::clock::{Clock, SystemClock};
use inkwell_core::repository::EventRepository;
use inkwell_enrichment::cache::SemanticImageCache;
use inkwell_enrichment::pipeline::EnrichmentPipeline;
use inkwell_event_store::memory_event_repository::InMemoryEventRepository;
use inkwell_event_store::pg_event_repository::PgEventRepository;
use inkwell_narrative::application::orchestrator::TurnOrchestrator;
use inkwell_providers::art::OpenAiArtDescriber;
use inkwell_providers::elevenlabs::{DEFAULT_ELEVENLABS_BASE_URL, ElevenLabsVoiceGenerator};
use inkwell_providers::freepik::{DEFAULT_FREEPIK_BASE_URL, FreepikImageGenerator};
use inkwell_providers::narrative::OpenAiNarrativeGenerator;
use inkwell_providers::openai::OpenAiClient;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

async fn event_repository(config: &AppConfig) -> Result<Arc<dyn EventRepository>, AppError> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, sessions are kept in memory");
        return Ok(Arc::new(InMemoryEventRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("connected to PostgreSQL event store");

    Ok(Arc::new(PgEventRepository::new(pool)))
}

async fn orchestrator(
    config: &AppConfig,
    repo: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
) -> TurnOrchestrator {
    let openai = OpenAiClient::new(&config.openai_base_url, &config.openai_api_key)
        .with_model(&config.openai_model)
        .with_embedding_model(&config.openai_embedding_model);

    let freepik = Arc::new(FreepikImageGenerator::new(
        DEFAULT_FREEPIK_BASE_URL,
        config.freepik_api_key.clone(),
    ));
    let mut image_cache =
        SemanticImageCache::new(freepik, Arc::new(openai.clone()), Arc::clone(&clock))
            .with_threshold(config.image_cache_threshold);
    if let Some(path) = &config.image_cache_path {
        image_cache = image_cache.with_store(path.clone()).await;
    }

    let voice = ElevenLabsVoiceGenerator::new(
        DEFAULT_ELEVENLABS_BASE_URL,
        config.elevenlabs_api_key.clone(),
    );
    if config.freepik_api_key.is_none() {
        tracing::warn!("FREEPIK_API_KEY not set, images will be unavailable");
    }
    if config.elevenlabs_api_key.is_none() {
        tracing::warn!("ELEVENLABS_API_KEY not set, voice will be unavailable");
    }

    let mut pipeline = EnrichmentPipeline::new(
        Arc::new(OpenAiArtDescriber::new(openai.clone())),
        Arc::new(image_cache),
        Arc::new(voice),
        config.elevenlabs_voice_id.clone(),
    );
    if let Some(timeout) = config.enrichment_timeout {
        pipeline = pipeline.with_call_timeout(timeout);
    }

    TurnOrchestrator::new(
        Arc::new(OpenAiNarrativeGenerator::new(openai)),
        pipeline,
        repo,
        clock,
    )
}

fn cors_layer(config: &AppConfig) -> Result<CorsLayer, AppError> {
    let Some(origins) = &config.cors_allowed_origins else {
        return Ok(CorsLayer::permissive());
    };
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| AppError::Config(format!("invalid CORS origin {o:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Inkwell API server");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repo = event_repository(&config).await?;
    let orchestrator = orchestrator(&config, Arc::clone(&repo), clock).await;
    let app_state = AppState::new(repo, orchestrator);

    let app = routes::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}
