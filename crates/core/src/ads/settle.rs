//! Single-assignment resolution for one gate invocation.
//!
//! An ad break can report back through several hooks, and a misbehaving
//! network may call more than one of them, or the same one twice. Every
//! hook funnels into a [`Settlement`], which accepts the first value and
//! drops the rest.

use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

enum Resolution<T> {
    Pending(oneshot::Sender<T>),
    Settled,
}

pub(crate) struct Settlement<T> {
    state: Mutex<Resolution<T>>,
}

impl<T> Settlement<T> {
    /// Creates a pending settlement and the receiver that observes it.
    pub(crate) fn channel() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let settlement = Arc::new(Self {
            state: Mutex::new(Resolution::Pending(tx)),
        });
        (settlement, rx)
    }

    pub(crate) fn is_settled(&self) -> bool {
        matches!(*self.lock(), Resolution::Settled)
    }

    /// Resolves with `value` if still pending. Returns whether this call won.
    pub(crate) fn settle(&self, value: T) -> bool {
        self.settle_with(value, || {})
    }

    /// Like [`Settlement::settle`], but runs `on_win` first when this call
    /// is the one that resolves. `on_win` runs outside the lock and before
    /// the receiver is woken.
    pub(crate) fn settle_with(&self, value: T, on_win: impl FnOnce()) -> bool {
        let sender = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, Resolution::Settled) {
                Resolution::Pending(tx) => tx,
                Resolution::Settled => return false,
            }
        };

        on_win();
        // The receiver may already be gone if the caller stopped waiting.
        let _ = sender.send(value);
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Resolution<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_settle_wins() {
        let (settlement, rx) = Settlement::channel();
        assert!(!settlement.is_settled());

        assert!(settlement.settle(1));
        assert!(!settlement.settle(2));
        assert!(settlement.is_settled());
        assert_eq!(rx.await.unwrap(), 1);
    }

    #[test]
    fn losing_settle_skips_callback() {
        let (settlement, _rx) = Settlement::channel();
        let mut fired = Vec::new();

        settlement.settle_with("after", || fired.push("after"));
        settlement.settle_with("dismissed", || fired.push("dismissed"));

        assert_eq!(fired, vec!["after"]);
    }

    #[tokio::test]
    async fn dropping_settlement_closes_receiver() {
        let (settlement, rx) = Settlement::<u8>::channel();
        drop(settlement);
        assert!(rx.await.is_err());
    }
}
