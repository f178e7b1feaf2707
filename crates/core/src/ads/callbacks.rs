//! Per-invocation callbacks supplied by the caller of a gate.

use std::fmt;
use std::sync::{Arc, Mutex};

/// A caller-supplied notification. Each one fires at most once.
pub type Callback = Box<dyn FnOnce() + Send>;

/// Notifications for [`AdGateway::run_loading_gate`](super::AdGateway::run_loading_gate).
///
/// `on_start` fires when something is shown. Exactly one of `on_complete`
/// or `on_dismissed` follows it. None of them fire when the cooldown
/// silently skips the invocation.
#[derive(Default)]
pub struct GateCallbacks {
    start: Option<Callback>,
    complete: Option<Callback>,
    dismissed: Option<Callback>,
}

impl GateCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.start = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    pub fn on_dismissed(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.dismissed = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for GateCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateCallbacks")
            .field("on_start", &self.start.is_some())
            .field("on_complete", &self.complete.is_some())
            .field("on_dismissed", &self.dismissed.is_some())
            .finish()
    }
}

/// Notifications for [`AdGateway::run_rewarded_gate`](super::AdGateway::run_rewarded_gate).
#[derive(Default)]
pub struct RewardCallbacks {
    reward: Option<Callback>,
    dismissed: Option<Callback>,
}

impl RewardCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_reward(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.reward = Some(Box::new(f));
        self
    }

    pub fn on_dismissed(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.dismissed = Some(Box::new(f));
        self
    }
}

/// Callbacks shared between hooks that may run on different threads.
pub(crate) struct Shared<C>(Arc<Mutex<C>>);

impl<C> Clone for Shared<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C> Shared<C> {
    pub(crate) fn new(callbacks: C) -> Self {
        Self(Arc::new(Mutex::new(callbacks)))
    }

    /// Takes the selected callback out and runs it without holding the lock.
    fn fire(&self, pick: impl FnOnce(&mut C) -> &mut Option<Callback>) {
        let callback = {
            let mut guard = self.0.lock().unwrap_or_else(|e| e.into_inner());
            pick(&mut guard).take()
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl Shared<GateCallbacks> {
    pub(crate) fn start(&self) {
        self.fire(|c| &mut c.start);
    }

    pub(crate) fn complete(&self) {
        self.fire(|c| &mut c.complete);
    }

    pub(crate) fn dismiss(&self) {
        self.fire(|c| &mut c.dismissed);
    }
}

impl Shared<RewardCallbacks> {
    pub(crate) fn reward(&self) {
        self.fire(|c| &mut c.reward);
    }

    pub(crate) fn dismiss(&self) {
        self.fire(|c| &mut c.dismissed);
    }
}
