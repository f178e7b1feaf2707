//! Loading-time ad gating.
//!
//! The [`AdGateway`] runs alongside a long operation and shows an ad break
//! (or a local placeholder) while the user waits. It is meant to live for
//! the whole process: the cooldown between real ads only makes sense if
//! one gateway sees every trigger. [`AdGateway::install_global`] registers
//! that instance, and [`skip_placeholder`] reaches it from anywhere, e.g.
//! a "Skip" control in the UI.
//!
//! ```ignore
//! let gateway = AdGateway::new(NoAds, AdSettings::default()).install_global();
//!
//! let outcome = gateway
//!     .run_loading_gate(GateCallbacks::new().on_complete(|| println!("done")))
//!     .await;
//! ```

mod callbacks;
mod capability;
mod gateway;
mod placeholder;
mod settle;

pub use callbacks::{Callback, GateCallbacks, RewardCallbacks};
pub use capability::{
    AdBreakRequest, AdCapability, AdConfigOptions, AdEnvironment, BreakHooks, BreakKind,
    BreakStatus, CapabilitySlot, Hook, NoAds, PlacementInfo, ShowAd, Toggle,
};
pub use gateway::AdGateway;

use serde::Serialize;
use std::sync::OnceLock;

/// How a gate invocation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// The ad or placeholder ran to the end.
    Completed,
    /// The user dismissed the ad or skipped the placeholder.
    Dismissed,
    /// The break finished without a completion hook; released by the
    /// safety net.
    Released,
    /// A real ad ran recently; nothing was shown.
    CooldownActive,
}

static GLOBAL: OnceLock<AdGateway> = OnceLock::new();

impl AdGateway {
    /// Registers this gateway as the process-wide instance.
    ///
    /// The first installed gateway stays for the rest of the process; if
    /// one is already installed, `self` is dropped and the existing one is
    /// returned.
    pub fn install_global(self) -> &'static AdGateway {
        GLOBAL.get_or_init(|| self)
    }

    /// The process-wide gateway, if one was installed.
    pub fn global() -> Option<&'static AdGateway> {
        GLOBAL.get()
    }
}

/// Skips the placeholder currently shown by the global gateway.
///
/// Safe to call at any time: without a global gateway, or once the
/// placeholder has finished, it does nothing and returns `false`.
pub fn skip_placeholder() -> bool {
    AdGateway::global().is_some_and(AdGateway::skip_placeholder)
}
