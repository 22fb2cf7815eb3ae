//! Player configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::PlayerError;

/// Gateway address used when `INKWELL_GATEWAY_URL` is unset.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";

/// Enrichment long-poll used when `INKWELL_ENRICHMENT_WAIT_MS` is unset.
pub const DEFAULT_ENRICHMENT_WAIT_MS: u64 = 20_000;

/// Everything the player needs to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Base URL of the gateway.
    pub gateway_url: String,
    /// Directory voice clips are written to; `None` skips saving.
    pub audio_dir: Option<PathBuf>,
    /// How long each enrichment poll may wait.
    pub enrichment_wait: Duration,
}

impl PlayerConfig {
    /// Reads the configuration from the process environment, after loading
    /// a `.env` file if one exists.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Config` when a value does not parse.
    pub fn from_env() -> Result<Self, PlayerError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Config` when a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlayerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let wait_ms = match var("INKWELL_ENRICHMENT_WAIT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                PlayerError::Config(format!("INKWELL_ENRICHMENT_WAIT_MS must be milliseconds: {e}"))
            })?,
            None => DEFAULT_ENRICHMENT_WAIT_MS,
        };

        Ok(Self {
            gateway_url: var("INKWELL_GATEWAY_URL")
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            audio_dir: var("INKWELL_AUDIO_DIR").map(PathBuf::from),
            enrichment_wait: Duration::from_millis(wait_ms),
        })
    }
}
