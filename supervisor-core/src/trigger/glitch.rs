//! Single-edge trigger policy.
//!
//! One edge on the trigger line is one remote request. Noise rejection comes
//! from the supervisor's cold-start lock: the host drives one false pulse on
//! the trigger line while it initializes its pins, so the first trigger edge
//! after power-up is swallowed and every later edge is relayed. Heartbeat
//! order plays no part in this.

use portable_atomic::{AtomicBool, Ordering};

use super::{DetectorKind, EdgeOutcome, TriggerDetector, UnlockEdge, WindowOutcome};

#[derive(Debug, Default)]
pub struct GlitchFilter {
    click_pending: AtomicBool,
}

impl GlitchFilter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            click_pending: AtomicBool::new(false),
        }
    }
}

impl TriggerDetector for GlitchFilter {
    const KIND: DetectorKind = DetectorKind::GlitchFilter;
    const UNLOCK: UnlockEdge = UnlockEdge::FirstTrigger;

    fn on_edge(&self) -> EdgeOutcome {
        self.click_pending.store(true, Ordering::Relaxed);
        EdgeOutcome::Pending
    }

    fn on_tick(&self) -> WindowOutcome {
        WindowOutcome::Idle
    }

    fn take_satisfied(&self) -> bool {
        self.click_pending.swap(false, Ordering::Relaxed)
    }

    fn is_pending(&self) -> bool {
        self.click_pending.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.click_pending.store(false, Ordering::Relaxed);
    }
}
