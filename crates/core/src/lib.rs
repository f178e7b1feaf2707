//! Hairpiece Core Library
//!
//! This library provides the core functionality for Hairpiece, an AI
//! hairstyle preview tool: the user supplies a photo and a description of
//! the hairstyle they want, and gets back the same photo with only the
//! hair changed.
//!
//! # Overview
//!
//! - **Ad Gating**: Loading-time ad breaks with cooldown and placeholder
//!   fallback via the [`ads`] module
//! - **Image Processing**: Photo validation and data-URL handling via
//!   [`image_processing`]
//! - **AI Integration**: Gemini image editing via [`gemini`]
//! - **Orchestration**: The generate action that runs both together via
//!   [`studio`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`Hairpiece`] facade:
//!
//! ```ignore
//! use hairpiece_core::Hairpiece;
//!
//! // Initialize with environment configuration
//! let app = Hairpiece::new()?;
//!
//! let report = app.generate("me.jpg", "short platinum bob").await?;
//! report.image.save("me-bob.png")?;
//! ```
//!
//! # Module Structure
//!
//! - [`ads`]: Ad gateway, cooldown and placeholder
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`gemini`]: Gemini AI client for image edits
//! - [`image_processing`]: Photo and generated-image utilities
//! - [`studio`]: Orchestration of the generate action

pub mod ads;
pub mod config;
pub mod error;
pub mod gemini;
pub mod image_processing;
pub mod studio;

// Re-export primary types for convenience
pub use ads::{AdGateway, GateCallbacks, GateOutcome, skip_placeholder};
pub use config::{AdSettings, Config};
pub use error::{AppError, Result};
pub use gemini::GeminiClient;
pub use image_processing::{GeneratedImage, Photo};
pub use studio::{GenerationReport, ImageGenerator, LoadingState, Studio};

use ads::{AdEnvironment, NoAds};
use std::path::Path;
use tokio::sync::watch;

/// Main entry point for the Hairpiece application.
///
/// This struct provides a facade over the various subsystems, wiring the
/// configuration, the process-wide ad gateway and the Gemini client into
/// a [`Studio`].
///
/// All constructors must run inside a Tokio runtime, since the ad gateway
/// starts its handshake in the background.
pub struct Hairpiece {
    config: Config,
    studio: Studio<GeminiClient>,
}

impl Hairpiece {
    /// Creates a new instance with environment configuration and no ad
    /// network, so every loading break uses the placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete or the Gemini
    /// client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_ad_environment(config, NoAds)
    }

    /// Creates an instance whose gateway probes `environment` for an ad
    /// network.
    ///
    /// The gateway is installed as the process-wide instance; if one is
    /// already installed it is reused and `environment` is ignored.
    pub fn with_ad_environment<E>(config: Config, environment: E) -> Result<Self>
    where
        E: AdEnvironment + 'static,
    {
        let client = GeminiClient::new(&config)?;
        let gateway = AdGateway::new(environment, config.ads).install_global().clone();
        Ok(Self {
            studio: Studio::new(gateway, client),
            config,
        })
    }

    /// Loads the photo at `photo_path` and runs the generate action.
    ///
    /// # Errors
    ///
    /// Returns an error if the photo cannot be read or is not an accepted
    /// image, if the description is blank, or if generation fails.
    pub async fn generate(
        &self,
        photo_path: impl AsRef<Path>,
        description: &str,
    ) -> Result<GenerationReport> {
        let photo = Photo::from_path(photo_path)?;
        self.studio.generate(Some(&photo), description).await
    }

    /// Subscribes to loading-state changes of the generate action.
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.studio.subscribe()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.studio.loading_state()
    }

    pub fn gateway(&self) -> &AdGateway {
        self.studio.gateway()
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}
