//! The external ad capability and the environment it is discovered in.
//!
//! The gateway never serves ads itself. It probes an [`AdEnvironment`] for
//! an [`AdCapability`], configures it once, and hands it [`AdBreakRequest`]s
//! whose hooks report back what happened. Hooks may be called from any
//! thread, in any number, or not at all; the gateway guards against all of
//! these.

use std::fmt;
use std::sync::{Arc, RwLock};

/// A hook the capability calls with no arguments.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Handed to `before_reward`; calling it starts the rewarded ad.
pub type ShowAd = Box<dyn FnOnce() + Send>;

/// On/off switch used by the configuration options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

/// Options passed to [`AdCapability::configure`].
pub struct AdConfigOptions {
    pub preload: Toggle,
    pub sound: Toggle,
    /// Called by the capability once it is able to present ads.
    pub on_ready: Hook,
}

impl fmt::Debug for AdConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdConfigOptions")
            .field("preload", &self.preload)
            .field("sound", &self.sound)
            .finish_non_exhaustive()
    }
}

/// Placement type of an ad break.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakKind {
    Start,
    Pause,
    Next,
    Browse,
    Reward,
}

/// Final status reported through `break_done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakStatus {
    NotReady,
    Timeout,
    Error,
    NoAdPreloaded,
    FrequencyCapped,
    Ignored,
    Other,
    Dismissed,
    Viewed,
}

/// Details the capability attaches to `break_done`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementInfo {
    pub kind: BreakKind,
    pub name: String,
    pub status: BreakStatus,
}

/// The set of hooks attached to one ad break.
///
/// Every field is optional; absent hooks are simply not called.
#[derive(Default)]
pub struct BreakHooks {
    pub before_ad: Option<Hook>,
    pub after_ad: Option<Hook>,
    pub ad_dismissed: Option<Hook>,
    /// Reward granted (rewarded breaks only).
    pub ad_viewed: Option<Hook>,
    pub break_done: Option<Arc<dyn Fn(PlacementInfo) + Send + Sync>>,
    pub before_reward: Option<Arc<dyn Fn(ShowAd) + Send + Sync>>,
}

/// A presentation request handed to [`AdCapability::present`].
pub struct AdBreakRequest {
    pub kind: BreakKind,
    pub name: String,
    pub hooks: BreakHooks,
}

impl AdBreakRequest {
    pub fn new(kind: BreakKind, name: impl Into<String>, hooks: BreakHooks) -> Self {
        Self {
            kind,
            name: name.into(),
            hooks,
        }
    }

    pub fn before_ad(&self) {
        fire(&self.hooks.before_ad);
    }

    pub fn after_ad(&self) {
        fire(&self.hooks.after_ad);
    }

    pub fn ad_dismissed(&self) {
        fire(&self.hooks.ad_dismissed);
    }

    pub fn ad_viewed(&self) {
        fire(&self.hooks.ad_viewed);
    }

    /// Reports the end of the break with the given status.
    pub fn break_done(&self, status: BreakStatus) {
        if let Some(hook) = &self.hooks.break_done {
            hook(PlacementInfo {
                kind: self.kind,
                name: self.name.clone(),
                status,
            });
        }
    }

    /// Offers the reward; `show` is run if the consumer accepts.
    pub fn before_reward(&self, show: ShowAd) {
        if let Some(hook) = &self.hooks.before_reward {
            hook(show);
        }
    }
}

impl fmt::Debug for AdBreakRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdBreakRequest")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn fire(hook: &Option<Hook>) {
    if let Some(hook) = hook {
        hook();
    }
}

/// An ad network integration.
pub trait AdCapability: Send + Sync {
    /// Configures the network; `options.on_ready` fires when ads can run.
    fn configure(&self, options: AdConfigOptions);

    /// Whether the presentation trigger is currently callable.
    fn can_present(&self) -> bool {
        true
    }

    /// Starts an ad break. Returns immediately; progress arrives via hooks.
    fn present(&self, request: AdBreakRequest);
}

/// Where the gateway looks for the ad capability.
///
/// The capability may not exist yet at startup, so the gateway polls
/// [`AdEnvironment::discover`] until it returns something or the
/// initialization deadline passes.
pub trait AdEnvironment: Send + Sync {
    fn discover(&self) -> Option<Arc<dyn AdCapability>>;
}

/// An environment with no ad network at all.
///
/// Every gate invocation falls back to the placeholder sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAds;

impl AdEnvironment for NoAds {
    fn discover(&self) -> Option<Arc<dyn AdCapability>> {
        None
    }
}

/// A slot that a capability can be installed into at any time.
///
/// Cloning shares the slot, so the loader that eventually provides the
/// capability and the gateway polling for it see the same value.
#[derive(Clone, Default)]
pub struct CapabilitySlot {
    inner: Arc<RwLock<Option<Arc<dyn AdCapability>>>>,
}

impl CapabilitySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `capability` visible to the next probe.
    pub fn install(&self, capability: Arc<dyn AdCapability>) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(capability);
    }

    pub fn is_installed(&self) -> bool {
        self.inner
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

impl AdEnvironment for CapabilitySlot {
    fn discover(&self) -> Option<Arc<dyn AdCapability>> {
        self.inner.read().ok().and_then(|slot| slot.clone())
    }
}
