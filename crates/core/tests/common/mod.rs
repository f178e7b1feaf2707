#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hairpiece_core::ads::{
    AdBreakRequest, AdCapability, AdConfigOptions, BreakKind, BreakStatus, GateCallbacks,
    RewardCallbacks, Toggle,
};
use hairpiece_core::{AppError, GeneratedImage, ImageGenerator, Photo, Result};

pub const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub fn photo() -> Photo {
    Photo::from_bytes(PNG_HEADER.to_vec()).unwrap()
}

/// Shared log of callback names, in firing order.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<&'static str>>>);

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: &'static str) {
        self.0.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    fn recorder(&self, event: &'static str) -> impl FnOnce() + Send + 'static {
        let events = self.clone();
        move || events.push(event)
    }

    pub fn gate_callbacks(&self) -> GateCallbacks {
        GateCallbacks::new()
            .on_start(self.recorder("start"))
            .on_complete(self.recorder("complete"))
            .on_dismissed(self.recorder("dismissed"))
    }

    pub fn reward_callbacks(&self) -> RewardCallbacks {
        RewardCallbacks::new()
            .on_reward(self.recorder("reward"))
            .on_dismissed(self.recorder("dismissed"))
    }
}

/// What the fake network does with a presentation request.
#[derive(Clone, Copy, Debug)]
pub enum Script {
    /// before_ad, after_ad, break_done.
    Complete,
    /// before_ad, ad_dismissed, break_done.
    Dismiss,
    /// Calls every completion hook, some twice.
    Chaotic,
    /// before_ad, then break_done only.
    DoneOnly,
    /// Keeps the request; the test drives it through `held()`.
    Hold,
    /// Drops the request without calling anything.
    Drop,
    /// Rewarded: before_reward, ad_viewed, break_done.
    RewardViewed,
    /// Rewarded: before_reward, ad_dismissed, break_done.
    RewardDismissed,
}

pub struct FakeNetwork {
    ready_after: Option<Duration>,
    presentable: bool,
    script: Script,
    configured: Mutex<Option<(Toggle, Toggle)>>,
    presented: Mutex<Vec<BreakKind>>,
    held: Mutex<Option<AdBreakRequest>>,
    shown: Arc<AtomicUsize>,
}

impl FakeNetwork {
    /// A network that reports ready as soon as it is configured.
    pub fn ready(script: Script) -> Arc<Self> {
        Self::build(Some(Duration::ZERO), true, script)
    }

    pub fn ready_after(delay: Duration, script: Script) -> Arc<Self> {
        Self::build(Some(delay), true, script)
    }

    /// A network that never calls `on_ready`.
    pub fn silent() -> Arc<Self> {
        Self::build(None, true, Script::Complete)
    }

    /// Ready, but its presentation trigger is not callable.
    pub fn without_trigger() -> Arc<Self> {
        Self::build(Some(Duration::ZERO), false, Script::Complete)
    }

    fn build(ready_after: Option<Duration>, presentable: bool, script: Script) -> Arc<Self> {
        Arc::new(Self {
            ready_after,
            presentable,
            script,
            configured: Mutex::new(None),
            presented: Mutex::new(Vec::new()),
            held: Mutex::new(None),
            shown: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn configured(&self) -> Option<(Toggle, Toggle)> {
        *self.configured.lock().unwrap()
    }

    pub fn presented(&self) -> Vec<BreakKind> {
        self.presented.lock().unwrap().clone()
    }

    /// Number of times a rewarded ad was actually started.
    pub fn rewarded_shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }

    /// Runs `f` against the held request.
    pub fn held<R>(&self, f: impl FnOnce(&AdBreakRequest) -> R) -> R {
        let held = self.held.lock().unwrap();
        f(held.as_ref().expect("no request held"))
    }

    pub fn release_held(&self) {
        self.held.lock().unwrap().take();
    }
}

impl AdCapability for FakeNetwork {
    fn configure(&self, options: AdConfigOptions) {
        *self.configured.lock().unwrap() = Some((options.preload, options.sound));
        match self.ready_after {
            Some(delay) if delay.is_zero() => (options.on_ready)(),
            Some(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    (options.on_ready)();
                });
            }
            None => {}
        }
    }

    fn can_present(&self) -> bool {
        self.presentable
    }

    fn present(&self, request: AdBreakRequest) {
        self.presented.lock().unwrap().push(request.kind);
        match self.script {
            Script::Complete => {
                request.before_ad();
                request.after_ad();
                request.break_done(BreakStatus::Viewed);
            }
            Script::Dismiss => {
                request.before_ad();
                request.ad_dismissed();
                request.break_done(BreakStatus::Dismissed);
            }
            Script::Chaotic => {
                request.before_ad();
                request.after_ad();
                request.ad_dismissed();
                request.after_ad();
                request.before_ad();
                request.break_done(BreakStatus::Other);
            }
            Script::DoneOnly => {
                request.before_ad();
                request.break_done(BreakStatus::NoAdPreloaded);
            }
            Script::Hold => {
                *self.held.lock().unwrap() = Some(request);
            }
            Script::Drop => drop(request),
            Script::RewardViewed => {
                let shown = Arc::clone(&self.shown);
                request.before_reward(Box::new(move || {
                    shown.fetch_add(1, Ordering::SeqCst);
                }));
                request.ad_viewed();
                request.break_done(BreakStatus::Viewed);
            }
            Script::RewardDismissed => {
                let shown = Arc::clone(&self.shown);
                request.before_reward(Box::new(move || {
                    shown.fetch_add(1, Ordering::SeqCst);
                }));
                request.ad_dismissed();
                request.break_done(BreakStatus::Dismissed);
            }
        }
    }
}

/// Generator that answers after a fixed delay.
pub struct FakeGenerator {
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn succeeding(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(delay: Duration) -> Self {
        Self {
            delay,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate(&self, _photo: &Photo, description: &str) -> Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(AppError::generation(AppError::NoImageGenerated));
        }
        Ok(GeneratedImage::new("image/png", format!("edited:{description}")))
    }
}
