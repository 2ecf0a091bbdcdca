//! Heartbeat countdown.
//!
//! The countdown starts at the cold-start grace threshold and is rearmed to
//! the steady-state threshold on every accepted heartbeat edge. Reaching zero
//! is a one-shot event: the caller raises a reset request and the counter is
//! reloaded with the steady-state threshold in the same step, so it never
//! rests at zero and never reloads the grace threshold again.
//!
//! The counter is touched by both the edge handler and the tick handler, plus
//! a plain store from the service loop. Handlers run at one interrupt
//! priority and do not preempt each other, so the load/store pairs below are
//! never interleaved with another writer.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::TimeoutTicks;

/// Result of advancing the countdown by one tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CountdownTick {
    /// Counter was already at zero; nothing to do.
    Stopped,
    /// Counter decremented and still running.
    Running(u32),
    /// Counter hit zero and was reloaded with the steady-state threshold.
    Expired,
}

#[derive(Debug)]
pub struct HeartbeatMonitor {
    countdown: AtomicU32,
    grace: AtomicBool,
    cold_start: u32,
    steady: u32,
}

impl HeartbeatMonitor {
    /// Creates a monitor loaded with the cold-start grace threshold.
    #[must_use]
    pub const fn new(timeouts: TimeoutTicks) -> Self {
        Self {
            countdown: AtomicU32::new(timeouts.cold_start),
            grace: AtomicBool::new(true),
            cold_start: timeouts.cold_start,
            steady: timeouts.steady,
        }
    }

    /// Ticks left before the countdown expires.
    #[must_use]
    pub fn countdown(&self) -> u32 {
        self.countdown.load(Ordering::Relaxed)
    }

    /// `true` until the grace threshold has been replaced by the steady one.
    #[must_use]
    pub fn in_grace(&self) -> bool {
        self.grace.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn threshold_in_effect(&self) -> u32 {
        if self.in_grace() {
            self.cold_start
        } else {
            self.steady
        }
    }

    #[must_use]
    pub const fn steady_threshold(&self) -> u32 {
        self.steady
    }

    #[must_use]
    pub const fn cold_start_threshold(&self) -> u32 {
        self.cold_start
    }

    /// Reloads the steady-state threshold and ends the grace period.
    pub fn rearm(&self) {
        // Counter first so it never sits above the threshold in effect.
        self.countdown.store(self.steady, Ordering::Relaxed);
        self.grace.store(false, Ordering::Relaxed);
    }

    /// Advances the countdown by one tick, saturating at zero.
    pub fn tick(&self) -> CountdownTick {
        let remaining = self.countdown.load(Ordering::Relaxed);
        if remaining == 0 {
            return CountdownTick::Stopped;
        }

        let next = remaining - 1;
        if next == 0 {
            self.rearm();
            CountdownTick::Expired
        } else {
            self.countdown.store(next, Ordering::Relaxed);
            CountdownTick::Running(next)
        }
    }
}
