//! Voice payload validation.

use inkwell_core::generator::{GenerationError, VoicePayload};

/// Smallest audio payload accepted as real speech. Anything shorter is an
/// empty or truncated response.
pub const MIN_VOICE_PAYLOAD_BYTES: usize = 1024;

/// Rejects degenerate voice payloads.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` when the payload is below
/// [`MIN_VOICE_PAYLOAD_BYTES`].
pub fn validate_voice_payload(payload: VoicePayload) -> Result<VoicePayload, GenerationError> {
    if payload.bytes.len() < MIN_VOICE_PAYLOAD_BYTES {
        return Err(GenerationError::Malformed(format!(
            "voice payload of {} bytes is below the {MIN_VOICE_PAYLOAD_BYTES} byte minimum",
            payload.bytes.len()
        )));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> VoicePayload {
        VoicePayload {
            bytes: vec![1; len],
            content_type: "audio/mpeg".into(),
        }
    }

    #[test]
    fn test_payload_at_minimum_is_accepted() {
        assert!(validate_voice_payload(payload(MIN_VOICE_PAYLOAD_BYTES)).is_ok());
    }

    #[test]
    fn test_short_payload_is_malformed() {
        let result = validate_voice_payload(payload(12));

        assert!(matches!(result, Err(GenerationError::Malformed(msg)) if msg.contains("12 bytes")));
    }
}
