// src/watch/delivery.rs

//! Delivery-over notifiers.
//!
//! A raw event is usually fanned out to several listeners by its source. The
//! coalescer must not start draining until that fan-out is over, so every raw
//! event carries a [`DeliveryNotifier`] that runs a callback once the round
//! has finished.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// One-shot callback fired when a delivery round is over.
pub type DeliveryCallback = Box<dyn FnOnce() + Send + 'static>;

/// Completion hook supplied by whoever produces raw events.
///
/// Implementations must run each callback exactly once, after the raw event
/// has been delivered to every listener of its round. Callbacks may run on
/// any thread.
pub trait DeliveryNotifier: Send + Sync {
    fn on_delivery_over(&self, callback: DeliveryCallback);
}

/// Fires callbacks immediately, for sources without a listener chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDelivery;

impl DeliveryNotifier for ImmediateDelivery {
    fn on_delivery_over(&self, callback: DeliveryCallback) {
        callback();
    }
}

#[derive(Default)]
struct RoundState {
    finished: bool,
    callbacks: Vec<DeliveryCallback>,
}

/// A notification round shared by several raw events.
///
/// Callbacks attached before [`DeliveryRound::finish`] are collected and run
/// by `finish`; callbacks attached afterwards run immediately.
#[derive(Clone, Default)]
pub struct DeliveryRound {
    state: Arc<Mutex<RoundState>>,
}

impl fmt::Debug for DeliveryRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("DeliveryRound")
            .field("finished", &state.finished)
            .field("waiting", &state.callbacks.len())
            .finish()
    }
}

impl DeliveryRound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the round as over and run every collected callback on the
    /// calling thread. Calling `finish` again is a no-op.
    pub fn finish(&self) {
        let callbacks = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.finished = true;
            std::mem::take(&mut state.callbacks)
        };

        for callback in callbacks {
            callback();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finished
    }

    /// Number of callbacks waiting for `finish`.
    pub fn waiting(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }
}

impl DeliveryNotifier for DeliveryRound {
    fn on_delivery_over(&self, callback: DeliveryCallback) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !state.finished {
                state.callbacks.push(callback);
                return;
            }
        }
        callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> DeliveryCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn round_defers_until_finish() {
        let fired = Arc::new(AtomicUsize::new(0));
        let round = DeliveryRound::new();

        round.on_delivery_over(counting(&fired));
        round.on_delivery_over(counting(&fired));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(round.waiting(), 2);

        round.finish();
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        // Finishing twice must not re-run anything.
        round.finish();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn late_callbacks_run_immediately() {
        let fired = Arc::new(AtomicUsize::new(0));
        let round = DeliveryRound::new();
        round.finish();

        round.on_delivery_over(counting(&fired));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(round.is_finished());
    }

    #[test]
    fn immediate_fires_inline() {
        let fired = Arc::new(AtomicUsize::new(0));
        ImmediateDelivery.on_delivery_over(counting(&fired));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
