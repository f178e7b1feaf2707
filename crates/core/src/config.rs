use std::env;
use std::time::Duration;
use crate::error::{AppError, Result};
use dotenvy::dotenv;

/// Image-editing model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: String,
    pub model_name: String,
    pub ads: AdSettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| AppError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model_name = env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            gemini_api_key: api_key,
            model_name,
            ads: AdSettings::from_env()?,
        })
    }
}

/// Timings that drive the ad gateway.
///
/// The defaults are the production values; tests shrink or keep them and
/// drive a paused tokio clock instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdSettings {
    /// Delay between two probes for the ad capability.
    pub poll_interval: Duration,
    /// Deadline after which the gateway stops waiting for the capability.
    pub init_deadline: Duration,
    /// How long the placeholder runs before completing on its own.
    pub placeholder_duration: Duration,
    /// Safety-net delay after `break_done` before forcing resolution.
    pub grace_delay: Duration,
    /// Minimum interval between two real ad presentations.
    pub cooldown: Duration,
}

impl Default for AdSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            init_deadline: Duration::from_millis(5000),
            placeholder_duration: Duration::from_secs(15),
            grace_delay: Duration::from_millis(100),
            cooldown: Duration::from_secs(60 * 60),
        }
    }
}

impl AdSettings {
    /// Defaults overridden by `HAIRPIECE_AD_COOLDOWN_SECS` and
    /// `HAIRPIECE_PLACEHOLDER_SECS` when present.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        if let Some(secs) = secs_from_env("HAIRPIECE_AD_COOLDOWN_SECS")? {
            settings.cooldown = secs;
        }
        if let Some(secs) = secs_from_env("HAIRPIECE_PLACEHOLDER_SECS")? {
            settings.placeholder_duration = secs;
        }
        Ok(settings)
    }
}

fn secs_from_env(key: &str) -> Result<Option<Duration>> {
    match env::var(key) {
        Ok(raw) => parse_secs(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::config(format!(
            "{key} must be a positive number of seconds, got '{raw}'"
        ))),
    }
}
