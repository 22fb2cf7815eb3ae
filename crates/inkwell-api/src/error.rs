//! Inkwell gateway — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inkwell_core::error::DomainError;
use inkwell_core::generator::GenerationError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// Tracing or span exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A fatal domain error from the critical path.
    Domain(DomainError),
    /// A standalone generator call failed.
    Generation {
        /// Machine-readable error code.
        code: &'static str,
        /// The generator failure.
        source: GenerationError,
    },
    /// A tracked resource does not exist (yet).
    NotFound {
        /// Machine-readable error code.
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl ApiError {
    /// A failed art description request.
    #[must_use]
    pub fn art_generation(source: GenerationError) -> Self {
        Self::Generation {
            code: "art_generation_error",
            source,
        }
    }

    /// A failed voice synthesis request.
    #[must_use]
    pub fn voice_generation(source: GenerationError) -> Self {
        Self::Generation {
            code: "voice_generation_error",
            source,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Domain(err) => match err {
                DomainError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
                DomainError::InvalidChoice { .. } => (StatusCode::BAD_REQUEST, "invalid_choice"),
                DomainError::SessionTerminated(_) => (StatusCode::CONFLICT, "session_terminated"),
                DomainError::UpstreamNarrative(_) => {
                    (StatusCode::BAD_GATEWAY, "upstream_narrative_error")
                }
                DomainError::ConcurrencyConflict { .. } => {
                    (StatusCode::CONFLICT, "concurrency_conflict")
                }
                DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                DomainError::Infrastructure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
                }
            },
            Self::Generation { code, .. } => (StatusCode::BAD_GATEWAY, *code),
            Self::NotFound { code, .. } => (StatusCode::NOT_FOUND, *code),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Domain(err) => err.to_string(),
            Self::Generation { source, .. } => source.to_string(),
            Self::NotFound { message, .. } => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = self.message();
        if status.is_server_error() && !matches!(self, Self::Generation { .. }) {
            error!(error = error_code, %message, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        let response = err.into().into_response();
        response.status()
    }

    #[test]
    fn test_session_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::SessionNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_choice_maps_to_400() {
        assert_eq!(
            status_of(DomainError::InvalidChoice {
                session_id: Uuid::new_v4(),
                choice_id: "fly".into(),
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_session_terminated_and_conflict_map_to_409() {
        assert_eq!(
            status_of(DomainError::SessionTerminated(Uuid::new_v4())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::ConcurrencyConflict {
                aggregate_id: Uuid::new_v4(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_upstream_narrative_maps_to_502() {
        assert_eq!(
            status_of(DomainError::UpstreamNarrative("timed out".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_generation_failures_map_to_502_with_their_code() {
        let art = ApiError::art_generation(GenerationError::TimedOut("chat".into()));
        let voice = ApiError::voice_generation(GenerationError::NotConfigured("no key".into()));

        assert_eq!(art.status_and_code(), (StatusCode::BAD_GATEWAY, "art_generation_error"));
        assert_eq!(
            voice.status_and_code(),
            (StatusCode::BAD_GATEWAY, "voice_generation_error")
        );
    }
}
