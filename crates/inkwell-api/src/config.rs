//! Server configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use inkwell_enrichment::cache::DEFAULT_SIMILARITY_THRESHOLD;
use inkwell_providers::elevenlabs::DEFAULT_VOICE_ID;
use inkwell_providers::openai::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL};

use crate::error::AppError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable, multi-line.
    Pretty,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// PostgreSQL URL; `None` keeps sessions in memory.
    pub database_url: Option<String>,
    /// OpenAI API key.
    pub openai_api_key: String,
    /// OpenAI base URL.
    pub openai_base_url: String,
    /// Chat model.
    pub openai_model: String,
    /// Embedding model.
    pub openai_embedding_model: String,
    /// Freepik API key; `None` degrades images.
    pub freepik_api_key: Option<String>,
    /// ElevenLabs API key; `None` degrades voice.
    pub elevenlabs_api_key: Option<String>,
    /// Voice used for turn enrichment.
    pub elevenlabs_voice_id: String,
    /// JSON file backing the image cache.
    pub image_cache_path: Option<PathBuf>,
    /// Similarity threshold of the image cache.
    pub image_cache_threshold: f32,
    /// Per-call enrichment timeout.
    pub enrichment_timeout: Option<Duration>,
    /// Allowed CORS origins; `None` allows any.
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Log output format.
    pub log_format: LogFormat,
    /// OTLP collector endpoint; `None` disables span export.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from the process environment, after loading
    /// a `.env` file if one exists.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        // A missing .env file is the normal case in production.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };
        let image_cache_threshold = match var("IMAGE_CACHE_THRESHOLD") {
            Some(raw) => parse_threshold(&raw)?,
            None => DEFAULT_SIMILARITY_THRESHOLD,
        };
        let enrichment_timeout = var("ENRICHMENT_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    AppError::Config(format!("ENRICHMENT_TIMEOUT_SECS must be whole seconds: {e}"))
                })
            })
            .transpose()?;
        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "LOG_FORMAT must be json or pretty, got {other:?}"
                )));
            }
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: var("DATABASE_URL"),
            openai_api_key: var("OPENAI_API_KEY").ok_or_else(|| {
                AppError::Config("OPENAI_API_KEY environment variable must be set".to_string())
            })?,
            openai_base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            openai_embedding_model: var("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            freepik_api_key: var("FREEPIK_API_KEY"),
            elevenlabs_api_key: var("ELEVENLABS_API_KEY"),
            elevenlabs_voice_id: var("ELEVENLABS_VOICE_ID")
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            image_cache_path: var("IMAGE_CACHE_PATH").map(PathBuf::from),
            image_cache_threshold,
            enrichment_timeout,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS").map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            log_format,
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The `HOST:PORT` bind address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_threshold(raw: &str) -> Result<f32, AppError> {
    let threshold: f32 = raw
        .parse()
        .map_err(|e| AppError::Config(format!("IMAGE_CACHE_THRESHOLD must be a number: {e}")))?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(AppError::Config(format!(
            "IMAGE_CACHE_THRESHOLD must be within 0..=1, got {threshold}"
        )));
    }
    Ok(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_openai_key_is_set() {
        // Act
        let config = config_from(&[("OPENAI_API_KEY", "sk-test")]).unwrap();

        // Assert
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert_eq!(config.openai_model, "gpt-5-nano");
        assert_eq!(config.openai_embedding_model, "text-embedding-3-small");
        assert!(config.freepik_api_key.is_none());
        assert!((config.image_cache_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.cors_allowed_origins.is_none());
    }

    #[test]
    fn test_missing_openai_key_is_a_config_error() {
        let result = config_from(&[("PORT", "8080"), ("OPENAI_API_KEY", "  ")]);

        assert!(matches!(result, Err(AppError::Config(m)) if m.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn test_overrides_are_parsed() {
        // Arrange
        let pairs = [
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "8080"),
            ("ENRICHMENT_TIMEOUT_SECS", "20"),
            ("IMAGE_CACHE_THRESHOLD", "0.9"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:5173, https://play.example"),
            ("LOG_FORMAT", "pretty"),
        ];

        // Act
        let config = config_from(&pairs).unwrap();

        // Assert
        assert_eq!(config.port, 8080);
        assert_eq!(config.enrichment_timeout, Some(Duration::from_secs(20)));
        assert!((config.image_cache_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(
            config.cors_allowed_origins.unwrap(),
            vec!["http://localhost:5173", "https://play.example"]
        );
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_port = config_from(&[("OPENAI_API_KEY", "k"), ("PORT", "http")]);
        let bad_threshold = config_from(&[("OPENAI_API_KEY", "k"), ("IMAGE_CACHE_THRESHOLD", "2")]);
        let bad_format = config_from(&[("OPENAI_API_KEY", "k"), ("LOG_FORMAT", "xml")]);

        assert!(matches!(bad_port, Err(AppError::Config(_))));
        assert!(matches!(bad_threshold, Err(AppError::Config(_))));
        assert!(matches!(bad_format, Err(AppError::Config(_))));
    }
}
