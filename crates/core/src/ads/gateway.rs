use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::GateOutcome;
use super::callbacks::{GateCallbacks, RewardCallbacks, Shared};
use super::capability::{
    AdBreakRequest, AdCapability, AdConfigOptions, AdEnvironment, BreakHooks, BreakKind,
    PlacementInfo, ShowAd, Toggle,
};
use super::placeholder::{self, SkipHandle};
use super::settle::Settlement;
use crate::config::AdSettings;

/// Process-lifetime state mutated by gate invocations.
pub(crate) struct GatewayState {
    pub(crate) initialized: bool,
    pub(crate) last_ad_at: Option<Instant>,
    pub(crate) pending_skip: Option<SkipHandle>,
    pub(crate) next_session: u64,
    capability: Option<Arc<dyn AdCapability>>,
}

pub(crate) fn lock_state(state: &Mutex<GatewayState>) -> MutexGuard<'_, GatewayState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

struct Inner {
    settings: AdSettings,
    state: Mutex<GatewayState>,
    /// Flips to `true` exactly once: on ready, or at the init deadline.
    ready: watch::Sender<bool>,
}

/// Coordinates loading-time ad breaks with the caller's own work.
///
/// The gateway discovers the ad network in the background, rate-limits
/// real ads with a cooldown, and falls back to a skippable placeholder
/// when no network shows up. None of its operations fail: an ad that
/// cannot be shown is a normal outcome.
///
/// Cloning is cheap; clones share state.
///
/// Overlapping invocations are not serialized. Two concurrent placeholder
/// sessions run independently and only the most recent one can be
/// skipped; concurrent real-ad invocations race for the cooldown slot and
/// the loser resolves as [`GateOutcome::CooldownActive`].
#[derive(Clone)]
pub struct AdGateway {
    inner: Arc<Inner>,
}

impl AdGateway {
    /// Creates a gateway and starts the initialization handshake.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, like [`tokio::spawn`].
    pub fn new<E>(environment: E, settings: AdSettings) -> Self
    where
        E: AdEnvironment + 'static,
    {
        let (ready, _) = watch::channel(false);
        let inner = Arc::new(Inner {
            settings,
            state: Mutex::new(GatewayState {
                initialized: false,
                last_ad_at: None,
                pending_skip: None,
                next_session: 0,
                capability: None,
            }),
            ready,
        });

        let deadline = Instant::now() + settings.init_deadline;
        tokio::spawn(handshake(Arc::clone(&inner), environment, deadline));

        Self { inner }
    }

    pub fn settings(&self) -> &AdSettings {
        &self.inner.settings
    }

    /// Whether the ad network has signalled readiness.
    pub fn is_ready(&self) -> bool {
        lock_state(&self.inner.state).initialized
    }

    /// Waits for the handshake to finish and reports whether real ads can
    /// be shown. Never waits past the initialization deadline.
    pub async fn wait_for_initialization(&self) -> bool {
        self.ready_capability().await.is_some()
    }

    /// Whether the cooldown since the last real ad has elapsed.
    pub fn can_show_ad(&self) -> bool {
        let state = lock_state(&self.inner.state);
        cooldown_elapsed(state.last_ad_at, self.inner.settings.cooldown)
    }

    /// Seconds until the cooldown elapses, rounded up; `0` when eligible.
    pub fn time_until_next_ad(&self) -> u64 {
        let Some(last) = lock_state(&self.inner.state).last_ad_at else {
            return 0;
        };
        let remaining = self.inner.settings.cooldown.saturating_sub(last.elapsed());
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    /// Shows a loading-time ad, or the placeholder when no network is
    /// available, and resolves once it is over.
    ///
    /// The returned outcome is informational; callers that only care
    /// about the callbacks can ignore it.
    pub async fn run_loading_gate(&self, callbacks: GateCallbacks) -> GateOutcome {
        let callbacks = Shared::new(callbacks);

        let Some(capability) = self.ready_capability().await else {
            info!("Ads not available, showing placeholder");
            return placeholder::run(
                &self.inner.state,
                self.inner.settings.placeholder_duration,
                callbacks,
            )
            .await;
        };

        if !self.claim_ad_slot() {
            info!(
                retry_in_secs = self.time_until_next_ad(),
                "Ad cooldown active, skipping"
            );
            return GateOutcome::CooldownActive;
        }

        info!("Attempting to show ad");
        self.present_loading_ad(capability, callbacks).await
    }

    /// Shows a rewarded ad and resolves with whether the reward was earned.
    ///
    /// Resolves `false` straight away when the network is not ready. Not
    /// subject to the cooldown.
    pub async fn run_rewarded_gate(&self, callbacks: RewardCallbacks) -> bool {
        let Some(capability) = self.usable_capability() else {
            info!("Rewarded ads not available");
            return false;
        };

        let callbacks = Shared::new(callbacks);
        let rewarded = Arc::new(AtomicBool::new(false));
        let (settlement, outcome) = Settlement::channel();

        let hooks = BreakHooks {
            before_reward: Some(Arc::new(|show: ShowAd| show())),
            ad_viewed: Some({
                let (settlement, callbacks, rewarded) =
                    (Arc::clone(&settlement), callbacks.clone(), Arc::clone(&rewarded));
                Arc::new(move || {
                    rewarded.store(true, Ordering::SeqCst);
                    settlement.settle_with(true, || {
                        info!("Rewarded ad viewed");
                        callbacks.reward();
                    });
                })
            }),
            ad_dismissed: Some({
                let (settlement, callbacks, rewarded) =
                    (Arc::clone(&settlement), callbacks, Arc::clone(&rewarded));
                Arc::new(move || {
                    let value = rewarded.load(Ordering::SeqCst);
                    settlement.settle_with(value, || {
                        info!("Rewarded ad dismissed");
                        callbacks.dismiss();
                    });
                })
            }),
            break_done: Some({
                let (settlement, rewarded) = (Arc::clone(&settlement), Arc::clone(&rewarded));
                let grace = self.inner.settings.grace_delay;
                let runtime = Handle::current();
                Arc::new(move |placement: PlacementInfo| {
                    debug!(?placement, "Rewarded ad break done");
                    let (settlement, rewarded) = (Arc::clone(&settlement), Arc::clone(&rewarded));
                    runtime.spawn(async move {
                        tokio::time::sleep(grace).await;
                        settlement.settle(rewarded.load(Ordering::SeqCst));
                    });
                })
            }),
            ..BreakHooks::default()
        };
        drop(settlement);

        capability.present(AdBreakRequest::new(BreakKind::Reward, "reward-ad", hooks));

        outcome.await.unwrap_or_else(|_| {
            warn!("Ad network dropped the rewarded break without reporting back");
            rewarded.load(Ordering::SeqCst)
        })
    }

    /// Fires the running placeholder's skip trigger.
    ///
    /// Returns `false` when no placeholder is waiting, including when it
    /// already finished.
    pub fn skip_placeholder(&self) -> bool {
        placeholder::skip(&self.inner.state)
    }

    /// Forgets the last ad and any pending skip handle.
    ///
    /// Readiness is left untouched. Meant for tests that reuse a gateway.
    pub fn reset(&self) {
        let mut state = lock_state(&self.inner.state);
        state.last_ad_at = None;
        state.pending_skip = None;
    }

    async fn ready_capability(&self) -> Option<Arc<dyn AdCapability>> {
        let mut ready = self.inner.ready.subscribe();
        // The sender lives as long as `inner`, so this only ends on `true`.
        let _ = ready.wait_for(|ready| *ready).await;
        self.usable_capability()
    }

    fn usable_capability(&self) -> Option<Arc<dyn AdCapability>> {
        let capability = {
            let state = lock_state(&self.inner.state);
            if !state.initialized {
                return None;
            }
            state.capability.clone()
        };
        capability.filter(|capability| capability.can_present())
    }

    /// Checks the cooldown and, if it has elapsed, starts a new one.
    fn claim_ad_slot(&self) -> bool {
        let mut state = lock_state(&self.inner.state);
        if !cooldown_elapsed(state.last_ad_at, self.inner.settings.cooldown) {
            return false;
        }
        state.last_ad_at = Some(Instant::now());
        true
    }

    async fn present_loading_ad(
        &self,
        capability: Arc<dyn AdCapability>,
        callbacks: Shared<GateCallbacks>,
    ) -> GateOutcome {
        let (settlement, outcome) = Settlement::channel();

        let hooks = BreakHooks {
            before_ad: Some({
                let (settlement, callbacks) = (Arc::clone(&settlement), callbacks.clone());
                Arc::new(move || {
                    if !settlement.is_settled() {
                        debug!("Ad starting");
                        callbacks.start();
                    }
                })
            }),
            after_ad: Some({
                let (settlement, callbacks) = (Arc::clone(&settlement), callbacks.clone());
                Arc::new(move || {
                    settlement.settle_with(GateOutcome::Completed, || {
                        info!("Ad completed");
                        callbacks.complete();
                    });
                })
            }),
            ad_dismissed: Some({
                let (settlement, callbacks) = (Arc::clone(&settlement), callbacks);
                Arc::new(move || {
                    settlement.settle_with(GateOutcome::Dismissed, || {
                        info!("Ad dismissed");
                        callbacks.dismiss();
                    });
                })
            }),
            break_done: Some({
                let settlement = Arc::clone(&settlement);
                let grace = self.inner.settings.grace_delay;
                let runtime = Handle::current();
                Arc::new(move |placement: PlacementInfo| {
                    debug!(?placement, "Ad break done");
                    let settlement = Arc::clone(&settlement);
                    runtime.spawn(async move {
                        tokio::time::sleep(grace).await;
                        settlement.settle(GateOutcome::Released);
                    });
                })
            }),
            ..BreakHooks::default()
        };
        // Only the hooks may keep the settlement alive from here on.
        drop(settlement);

        capability.present(AdBreakRequest::new(BreakKind::Next, "loading-ad", hooks));

        outcome.await.unwrap_or_else(|_| {
            warn!("Ad network dropped the break without reporting back");
            GateOutcome::Released
        })
    }
}

fn cooldown_elapsed(last_ad_at: Option<Instant>, cooldown: Duration) -> bool {
    last_ad_at.is_none_or(|last| last.elapsed() >= cooldown)
}

impl Inner {
    /// Resolves the ready signal. Returns `false` if it already was.
    fn mark_ready(&self) -> bool {
        self.ready.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    fn on_capability_ready(&self) {
        lock_state(&self.state).initialized = true;
        if self.mark_ready() {
            info!("Ad gateway initialized and ready");
        } else {
            info!("Ad network became ready after the initialization deadline");
        }
    }

    fn configure(self: &Arc<Self>, capability: Arc<dyn AdCapability>) {
        lock_state(&self.state).capability = Some(Arc::clone(&capability));

        let inner: Weak<Inner> = Arc::downgrade(self);
        capability.configure(AdConfigOptions {
            preload: Toggle::On,
            sound: Toggle::On,
            on_ready: Arc::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.on_capability_ready();
                }
            }),
        });
    }
}

/// Polls for the capability until found or until `deadline`, then makes
/// sure the ready signal resolves no later than `deadline`.
async fn handshake<E: AdEnvironment>(inner: Arc<Inner>, environment: E, deadline: Instant) {
    let poll_interval = inner.settings.poll_interval;
    match tokio::time::timeout_at(deadline, discover(&environment, poll_interval)).await {
        Ok(capability) => {
            debug!("Ad capability found, configuring");
            inner.configure(capability);
        }
        Err(_) => debug!("Ad capability not found before the deadline"),
    }

    tokio::time::sleep_until(deadline).await;
    if inner.mark_ready() {
        info!("Ad gateway initialization timeout, continuing without ads");
    }
}

async fn discover<E: AdEnvironment>(environment: &E, every: Duration) -> Arc<dyn AdCapability> {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Some(capability) = environment.discover() {
            return capability;
        }
    }
}
