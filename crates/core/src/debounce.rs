//! Delay-and-coalesce for rapid repeated input.
//!
//! The debouncer holds only the latest value and a deadline; it never sleeps itself. Hosts wait
//! until [`Debouncer::deadline`] (e.g. with `tokio::time::sleep_until`) and then call
//! [`Debouncer::poll_ready`].

use tokio::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Records a new value, replacing any pending one and restarting the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// When the pending value becomes ready, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Takes the pending value once input has been quiet for the full delay.
    pub fn poll_ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }
}
