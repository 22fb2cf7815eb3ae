//! Mapping of HTTP failures onto `GenerationError`.

use inkwell_core::generator::GenerationError;
use reqwest::Response;

/// Classifies a transport error from `reqwest`.
pub(crate) fn transport_error(service: &str, err: &reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::TimedOut(format!("{service}: {err}"))
    } else if err.is_decode() {
        GenerationError::Malformed(format!("{service}: {err}"))
    } else {
        GenerationError::Unavailable(format!("{service}: {err}"))
    }
}

/// Extracts the most useful message from an upstream error body.
///
/// JSON bodies carrying a `message` or `error` field (string, or object with
/// its own `message`) yield that field; anything else is returned as is.
pub(crate) fn error_detail(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_owned();
    };
    let field = json.get("message").or_else(|| json.get("error"));
    match field {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(serde_json::Value::Object(inner)) => inner
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| body.trim().to_owned(), str::to_owned),
        _ => body.trim().to_owned(),
    }
}

/// Passes successful responses through and turns any other status into
/// `GenerationError::Rejected`.
pub(crate) async fn ensure_success(
    service: &str,
    response: Response,
) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("{service}: unreadable error body: {e}"));
    Err(GenerationError::Rejected {
        status: status.as_u16(),
        message: error_detail(&body),
    })
}
