//! Local stand-in shown when no ad network is available.
//!
//! The placeholder runs for a fixed duration and can be cut short through
//! the skip handle it publishes on the gateway. Whichever of the two fires
//! first decides the outcome; the other is disarmed.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::info;

use super::GateOutcome;
use super::callbacks::{GateCallbacks, Shared};
use super::gateway::{GatewayState, lock_state};

/// The published skip trigger of the running placeholder session.
pub(crate) struct SkipHandle {
    session: u64,
    trigger: oneshot::Sender<()>,
}

/// Unpublishes the session's skip handle however the session ends.
struct Published<'a> {
    state: &'a Mutex<GatewayState>,
    session: u64,
}

impl Drop for Published<'_> {
    fn drop(&mut self) {
        let mut state = lock_state(self.state);
        if state
            .pending_skip
            .as_ref()
            .is_some_and(|handle| handle.session == self.session)
        {
            state.pending_skip = None;
        }
    }
}

pub(crate) async fn run(
    state: &Mutex<GatewayState>,
    duration: Duration,
    callbacks: Shared<GateCallbacks>,
) -> GateOutcome {
    info!(duration_secs = duration.as_secs(), "Showing placeholder ad");
    callbacks.start();

    let timer = tokio::time::sleep(duration);
    let (trigger, skipped) = oneshot::channel();
    let _published = {
        let mut guard = lock_state(state);
        guard.next_session += 1;
        let session = guard.next_session;
        // A newer session replaces an older one's handle; the older one can
        // then only finish through its timer.
        guard.pending_skip = Some(SkipHandle { session, trigger });
        Published { state, session }
    };

    tokio::select! {
        _ = timer => {
            info!("Placeholder ad auto-completed");
            callbacks.complete();
            GateOutcome::Completed
        }
        Ok(()) = skipped => {
            info!("Placeholder ad skipped");
            callbacks.dismiss();
            GateOutcome::Dismissed
        }
    }
}

/// Fires the pending skip handle, if any. The handle is consumed.
pub(crate) fn skip(state: &Mutex<GatewayState>) -> bool {
    let handle = lock_state(state).pending_skip.take();
    match handle {
        Some(handle) => handle.trigger.send(()).is_ok(),
        None => false,
    }
}
