//! One-shot backpressure signals bridging the consumer and control contexts.
//!
//! Each signal is an explicit two-state machine (idle / pending-with-waiter).
//! The control side arms it and awaits; the consumer side resolves it with a
//! non-blocking wake and never waits for delivery. A signal is resolved and
//! reset atomically, and permanently rejected at teardown so no waiter can
//! outlive the stream.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::error::{AudioOutputError, AudioOutputResult};

/// A single awaitable condition, shared by all concurrent waiters.
///
/// At most one pending request exists at a time: callers that arrive while
/// the signal is armed share the same wakeup rather than creating another.
#[derive(Debug, Default)]
pub struct BackpressureSignal {
    pending: AtomicBool,
    rejected: AtomicBool,
    notify: Notify,
}

impl BackpressureSignal {
    /// Create an idle signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Await `ready()` returning `Some`.
    ///
    /// Resolves immediately when the condition already holds. Otherwise arms
    /// the shared pending waiter and sleeps until the consumer side calls
    /// [`resolve`](Self::resolve); the condition is re-read after every wake,
    /// so the woken task always observes post-drain state.
    pub async fn wait<T>(&self, mut ready: impl FnMut() -> Option<T>) -> AudioOutputResult<T> {
        loop {
            if self.rejected.load(Ordering::Acquire) {
                return Err(AudioOutputError::Destroyed);
            }
            if let Some(value) = ready() {
                return Ok(value);
            }

            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            self.pending.store(true, Ordering::Release);

            // Re-check after arming: a drain or teardown may have slipped in
            // between the first check and the store.
            if self.rejected.load(Ordering::Acquire) {
                return Err(AudioOutputError::Destroyed);
            }
            if let Some(value) = ready() {
                return Ok(value);
            }

            notified.await;
        }
    }

    /// Consumer-side resolution: wake the pending waiter, if any, and reset.
    ///
    /// Non-blocking and a no-op when nothing is armed, so the drain path can
    /// call it unconditionally once its condition holds.
    pub fn resolve(&self) {
        if self.pending.swap(false, Ordering::AcqRel) {
            self.notify.notify_waiters();
        }
    }

    /// True while a waiter is armed and unresolved.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Teardown: permanently reject current and future waiters.
    pub fn reject(&self) {
        self.rejected.store(true, Ordering::Release);
        self.pending.store(false, Ordering::Release);
        self.notify.notify_waiters();
    }
}
