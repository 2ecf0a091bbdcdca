//! Trigger-line detection policies.
//!
//! The supervisor is generic over a [`TriggerDetector`], chosen at build
//! time. Both policies share the same contract: edges arrive from the
//! interrupt path through [`TriggerDetector::on_edge`], the timeout engine
//! advances any sub-timer with [`TriggerDetector::on_tick`], and the state
//! machine consumes a satisfied request exactly once with
//! [`TriggerDetector::take_satisfied`]. All methods take `&self` and only
//! touch single-word atomics so a detector can live inside a `static`.
//!
//! Each policy also names the edge that opens the supervisor's cold-start
//! lock through [`TriggerDetector::UNLOCK`].

use core::fmt;

pub mod glitch;
pub mod pulse_count;

pub use glitch::GlitchFilter;
pub use pulse_count::PulseCounter;

/// Which policy a detector implements.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DetectorKind {
    GlitchFilter,
    PulseCount,
}

impl DetectorKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DetectorKind::GlitchFilter => "glitch-filter",
            DetectorKind::PulseCount => "pulse-count",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Edge that moves the supervisor out of cold start.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnlockEdge {
    /// The first trigger edge is the host's pin-init false pulse. It is
    /// swallowed without reaching the detector and opens the lock; heartbeat
    /// edges only rearm the countdown.
    FirstTrigger,
    /// The first heartbeat edge opens the lock and drops whatever the
    /// trigger line collected while cold.
    FirstHeartbeat,
}

/// What a single trigger edge did to the detector.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeOutcome {
    /// Edge consumed as the cold-start unlock edge. Only the supervisor
    /// reports this; the detector never saw the edge.
    Unlocked,
    /// A request is now waiting for the next tick.
    Pending,
    /// Edge counted toward a burst that is not complete yet.
    Counted(u8),
    /// Edge completed a burst.
    Satisfied,
}

/// What a tick did to the detector's sub-timer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WindowOutcome {
    /// No sub-timer running.
    Idle,
    /// Sub-timer still running with the given ticks left.
    Open(u32),
    /// Sub-timer ran out before the burst completed; the partial count was dropped.
    Expired { discarded: u8 },
}

pub trait TriggerDetector {
    const KIND: DetectorKind;

    /// Edge that opens the cold-start lock for this policy.
    const UNLOCK: UnlockEdge;

    /// Records one edge on the trigger line. Interrupt context, O(1).
    fn on_edge(&self) -> EdgeOutcome;

    /// Advances the detector's sub-timer by one tick.
    fn on_tick(&self) -> WindowOutcome;

    /// Consumes a satisfied request, returning `true` at most once per request.
    fn take_satisfied(&self) -> bool;

    /// `true` while a satisfied request has not been consumed.
    fn is_pending(&self) -> bool;

    /// Drops any partial or pending state.
    fn clear(&self);

    /// Edges collected toward the current burst, if the policy counts edges.
    fn progress(&self) -> Option<u8> {
        None
    }
}
