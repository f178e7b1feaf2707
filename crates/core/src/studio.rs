//! The generate action: loading gate and image edit, run side by side.
//!
//! [`Studio::generate`] validates the input, then starts the ad gateway's
//! loading gate and the image-generation call together and waits for
//! both. A [`LoadingState`] is published on a watch channel so a front end
//! can show the loading overlay and the ad overlay independently.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::ads::{AdGateway, GateCallbacks, GateOutcome};
use crate::error::{AppError, Result};
use crate::image_processing::{GeneratedImage, Photo};

/// Message shown when the photo or the description is missing.
pub const MISSING_INPUT_MESSAGE: &str = "Please upload a photo and describe a hairstyle";

/// Produces an edited image from a photo and a hairstyle description.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, photo: &Photo, description: &str) -> Result<GeneratedImage>;
}

/// What the front end should currently display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadingState {
    /// A generation is in flight.
    pub loading: bool,
    /// The ad or placeholder overlay is up.
    pub showing_ad: bool,
}

/// Result of a successful generate action.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub image: GeneratedImage,
    pub gate: GateOutcome,
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    mime_type: &'a str,
    gate: GateOutcome,
    output: Option<&'a str>,
}

impl GenerationReport {
    /// One-line JSON summary, without the image payload.
    pub fn summary_json(&self, output: Option<&str>) -> Result<String> {
        Ok(serde_json::to_string(&ReportSummary {
            mime_type: &self.image.mime_type,
            gate: self.gate,
            output,
        })?)
    }
}

pub struct Studio<G> {
    gateway: AdGateway,
    generator: G,
    state: Arc<watch::Sender<LoadingState>>,
}

impl<G: ImageGenerator> Studio<G> {
    pub fn new(gateway: AdGateway, generator: G) -> Self {
        let (state, _) = watch::channel(LoadingState::default());
        Self {
            gateway,
            generator,
            state: Arc::new(state),
        }
    }

    pub fn gateway(&self) -> &AdGateway {
        &self.gateway
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Subscribes to loading-state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.state.subscribe()
    }

    pub fn loading_state(&self) -> LoadingState {
        *self.state.borrow()
    }

    /// Runs the loading gate and the edit concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MalformedInput`] without touching the gateway or
    /// the generator when the photo is missing or the description is
    /// blank. Generation failures are returned as-is; the gate itself
    /// never fails.
    pub async fn generate(
        &self,
        photo: Option<&Photo>,
        description: &str,
    ) -> Result<GenerationReport> {
        let photo = match photo {
            Some(photo) if !description.trim().is_empty() => photo,
            _ => return Err(AppError::malformed(MISSING_INPUT_MESSAGE)),
        };

        self.state.send_replace(LoadingState {
            loading: true,
            showing_ad: true,
        });

        let gate = self.gateway.run_loading_gate(self.overlay_callbacks());
        let edit = self.generator.generate(photo, description.trim());
        let (gate, edit) = tokio::join!(gate, edit);

        self.state.send_replace(LoadingState::default());

        match edit {
            Ok(image) => {
                info!(?gate, mime_type = %image.mime_type, "Hairstyle generated");
                Ok(GenerationReport { image, gate })
            }
            Err(e) => {
                warn!(?gate, error = %e, "Hairstyle generation failed");
                Err(e)
            }
        }
    }

    /// Callbacks that take the ad overlay down when the break ends.
    fn overlay_callbacks(&self) -> GateCallbacks {
        let hide = |state: Arc<watch::Sender<LoadingState>>| {
            move || {
                state.send_modify(|s| s.showing_ad = false);
            }
        };
        GateCallbacks::new()
            .on_complete(hide(Arc::clone(&self.state)))
            .on_dismissed(hide(Arc::clone(&self.state)))
    }
}
