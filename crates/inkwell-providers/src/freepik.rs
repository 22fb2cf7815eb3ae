//! Freepik text-to-image client.

use std::time::Duration;

use async_trait::async_trait;
use inkwell_core::generator::{ArtDescriptor, GeneratedImage, GenerationError, ImageGenerator};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::error::{ensure_success, transport_error};

/// Default Freepik API base URL.
pub const DEFAULT_FREEPIK_BASE_URL: &str = "https://api.freepik.com";

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const SERVICE: &str = "freepik";

const STYLE_SUFFIX: &str =
    "Game of Thrones style, medieval fantasy, cinematic, detailed, atmospheric";

const NEGATIVE_PROMPT: &str = "cartoon, anime, modern, colorful, bright, cheerful, b&w, \
     black and white, earth, ugly, low quality";

/// Client for Freepik's text-to-image endpoint.
///
/// Without an API key every call fails with `GenerationError::NotConfigured`,
/// so the service still runs with images degraded.
#[derive(Clone)]
pub struct FreepikImageGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for FreepikImageGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreepikImageGenerator")
            .field("base_url", &self.base_url)
            .field("configured", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl FreepikImageGenerator {
    /// Creates a client. A `None` key disables image generation.
    #[must_use]
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl ImageGenerator for FreepikImageGenerator {
    #[instrument(skip(self, art))]
    async fn generate_image(&self, art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::NotConfigured(
                "FREEPIK_API_KEY is not set".to_string(),
            ));
        };

        let response = self
            .client
            .post(format!("{}/v1/ai/text-to-image", self.base_url))
            .header("x-freepik-api-key", api_key)
            .json(&build_payload(art))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("{SERVICE}: {e}")))?;

        let image_url = extract_image_url(&body).ok_or_else(|| {
            GenerationError::Malformed("no image in text-to-image response".to_string())
        })?;
        info!("image generated");
        Ok(GeneratedImage {
            image_url,
            cached: false,
        })
    }
}

/// Builds the text-to-image request body for `art`.
fn build_payload(art: &ArtDescriptor) -> Value {
    let mut prompt = art.art_description.trim().to_string();
    if !art.style_notes.trim().is_empty() {
        prompt.push_str(", ");
        prompt.push_str(art.style_notes.trim());
    }
    prompt.push_str(", ");
    prompt.push_str(STYLE_SUFFIX);

    json!({
        "prompt": prompt,
        "negative_prompt": NEGATIVE_PROMPT,
        "guidance_scale": 2,
        "seed": 42,
        "num_images": 1,
        "image": { "size": "square_1_1" },
        "styling": {
            "style": "digital-art",
            "effects": {
                "color": "dramatic",
                "lightning": "cinematic",
                "framing": "cinematic"
            },
            "colors": [
                { "color": "#8B0000", "weight": 1 },
                { "color": "#C9A961", "weight": 1 }
            ]
        },
        "filter_nsfw": true
    })
}

fn url_field(value: &Value) -> Option<String> {
    value
        .get("url")
        .or_else(|| value.get("image_url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Finds the image in a text-to-image response. Inline base64 images become
/// `data:` URLs.
fn extract_image_url(body: &Value) -> Option<String> {
    if let Some(first) = body.get("data").and_then(Value::as_array).and_then(|d| d.first()) {
        if let Some(base64) = first.get("base64").and_then(Value::as_str) {
            return Some(format!("data:image/jpeg;base64,{base64}"));
        }
        return url_field(first);
    }
    url_field(body).or_else(|| {
        body.get("images")
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(url_field)
    })
}
