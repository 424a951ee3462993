//! Trailing-edge debouncer driven by explicit timestamps

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Collapses bursts of triggers into a single firing with the latest value.
///
/// Every `trigger` replaces the pending value and restarts the quiet window.
/// The caller drives it with `poll`, so nothing here owns a timer.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }

    pub fn trigger(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.quiet,
        });
    }

    /// Drop the pending value, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Return the pending value once the quiet window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.cancel(),
            _ => None,
        }
    }

    /// Time left before the pending value fires
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| pending.deadline.saturating_duration_since(now))
    }
}
