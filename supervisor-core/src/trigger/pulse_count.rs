//! Burst-counting trigger policy.
//!
//! A request is exactly `target` edges with no gap longer than the window
//! between consecutive edges. Every edge reloads the window; if the window
//! runs out first the partial count is treated as noise and dropped. The
//! count resets as soon as the target is reached, so a longer train starts a
//! fresh burst rather than overshooting.
//!
//! A burst is already too structured to come from power-up noise, so the
//! cold-start lock opens on the first heartbeat instead of a trigger edge.

use portable_atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use super::{DetectorKind, EdgeOutcome, TriggerDetector, UnlockEdge, WindowOutcome};
use crate::config::BurstTicks;

#[derive(Debug)]
pub struct PulseCounter {
    target: u8,
    window_ticks: u32,
    count: AtomicU8,
    window: AtomicU32,
    satisfied: AtomicBool,
}

impl PulseCounter {
    #[must_use]
    pub const fn new(burst: BurstTicks) -> Self {
        Self {
            target: burst.target,
            window_ticks: burst.window,
            count: AtomicU8::new(0),
            window: AtomicU32::new(0),
            satisfied: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn target(&self) -> u8 {
        self.target
    }

    #[must_use]
    pub fn count(&self) -> u8 {
        self.count.load(Ordering::Relaxed)
    }

    /// Ticks left before the current burst is abandoned.
    #[must_use]
    pub fn window_remaining(&self) -> u32 {
        self.window.load(Ordering::Relaxed)
    }
}

impl TriggerDetector for PulseCounter {
    const KIND: DetectorKind = DetectorKind::PulseCount;
    const UNLOCK: UnlockEdge = UnlockEdge::FirstHeartbeat;

    fn on_edge(&self) -> EdgeOutcome {
        let next = self.count.load(Ordering::Relaxed).saturating_add(1);
        if next >= self.target {
            self.count.store(0, Ordering::Relaxed);
            self.window.store(0, Ordering::Relaxed);
            self.satisfied.store(true, Ordering::Relaxed);
            EdgeOutcome::Satisfied
        } else {
            self.count.store(next, Ordering::Relaxed);
            self.window.store(self.window_ticks, Ordering::Relaxed);
            EdgeOutcome::Counted(next)
        }
    }

    fn on_tick(&self) -> WindowOutcome {
        let remaining = self.window.load(Ordering::Relaxed);
        if remaining == 0 {
            return WindowOutcome::Idle;
        }

        let next = remaining - 1;
        self.window.store(next, Ordering::Relaxed);
        if next > 0 {
            return WindowOutcome::Open(next);
        }

        match self.count.swap(0, Ordering::Relaxed) {
            0 => WindowOutcome::Idle,
            discarded => WindowOutcome::Expired { discarded },
        }
    }

    fn take_satisfied(&self) -> bool {
        self.satisfied.swap(false, Ordering::Relaxed)
    }

    fn is_pending(&self) -> bool {
        self.satisfied.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.window.store(0, Ordering::Relaxed);
        self.satisfied.store(false, Ordering::Relaxed);
    }

    fn progress(&self) -> Option<u8> {
        Some(self.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BURST: BurstTicks = BurstTicks {
        target: 3,
        window: 4,
    };

    #[test]
    fn exact_target_satisfies_once_and_resets() {
        let counter = PulseCounter::new(BURST);
        assert_eq!(counter.on_edge(), EdgeOutcome::Counted(1));
        assert_eq!(counter.on_edge(), EdgeOutcome::Counted(2));
        assert_eq!(counter.on_edge(), EdgeOutcome::Satisfied);
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.window_remaining(), 0);

        assert!(counter.take_satisfied());
        assert!(!counter.take_satisfied());
    }

    #[test]
    fn each_edge_reloads_the_window() {
        let counter = PulseCounter::new(BURST);
        counter.on_edge();
        assert_eq!(counter.on_tick(), WindowOutcome::Open(3));
        assert_eq!(counter.on_tick(), WindowOutcome::Open(2));
        counter.on_edge();
        assert_eq!(counter.window_remaining(), 4);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn expired_window_discards_partial_burst() {
        let counter = PulseCounter::new(BURST);
        counter.on_edge();
        counter.on_edge();
        for _ in 0..3 {
            assert!(matches!(counter.on_tick(), WindowOutcome::Open(_)));
        }
        assert_eq!(counter.on_tick(), WindowOutcome::Expired { discarded: 2 });
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.on_tick(), WindowOutcome::Idle);
        assert!(!counter.is_pending());
    }

    #[test]
    fn single_edge_target_satisfies_immediately() {
        let counter = PulseCounter::new(BurstTicks {
            target: 1,
            window: 1,
        });
        assert_eq!(counter.on_edge(), EdgeOutcome::Satisfied);
        assert_eq!(counter.progress(), Some(0));
    }
}
