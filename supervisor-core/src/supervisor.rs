//! Supervisor state machine.
//!
//! Fuses heartbeat edges, trigger edges, and timer ticks into two one-shot
//! requests, then services them from the cooperative loop:
//!
//! * `ColdStart`: the countdown runs on the long grace threshold and trigger
//!   activity is recorded but never relayed. The detector's
//!   [`UnlockEdge`] names the edge that moves the supervisor to `Armed`:
//!   the glitch filter swallows the first trigger edge, the pulse counter
//!   waits for the first heartbeat and drops whatever the trigger line
//!   collected so far. There is no way back.
//! * `Armed`: heartbeat edges rearm the steady-state countdown unless a
//!   trigger request is still in flight, countdown expiry raises a reset
//!   request, and a satisfied detector raises a remote request.
//!
//! Interrupt handlers call [`Supervisor::on_heartbeat_edge`],
//! [`Supervisor::on_trigger_edge`], and [`Supervisor::on_tick`]; the service
//! loop calls [`Supervisor::service`]. Every shared value is its own atomic
//! word with a single writer context, or a flag set by the tick handler and
//! cleared by the loop.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::TimeoutTicks;
use crate::lines::OutputId;
use crate::monitor::{CountdownTick, HeartbeatMonitor};
use crate::output::{OutputDriver, Pulser};
use crate::status::{StatsSnapshot, SupervisorSnapshot};
use crate::telemetry::SupervisorEventKind;
use crate::trigger::{EdgeOutcome, TriggerDetector, UnlockEdge, WindowOutcome};

/// Lifecycle phase. The only transition is `ColdStart -> Armed`.
///
/// The phase tracks the trigger lock, not the countdown. Heartbeats (glitch
/// filter) or an expired grace period can move the countdown to the steady
/// threshold while the lock is still closed, so a snapshot may show
/// `ColdStart` without the grace marker. Read the grace state from
/// [`HeartbeatMonitor::in_grace`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SupervisorPhase {
    /// Trigger lock closed: no remote request can be raised.
    ColdStart,
    Armed,
}

impl SupervisorPhase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SupervisorPhase::ColdStart => "cold-start",
            SupervisorPhase::Armed => "armed",
        }
    }
}

/// What a heartbeat edge did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HeartbeatOutcome {
    /// First heartbeat after power-up opened the trigger lock. Only
    /// policies that unlock on [`UnlockEdge::FirstHeartbeat`] report this.
    Unlocked,
    /// Countdown reloaded with the steady-state threshold.
    Rearmed,
    /// A trigger request is in flight; the countdown was left alone.
    Deferred,
}

/// Everything a single tick changed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TickReport {
    pub reset_raised: bool,
    pub remote_raised: bool,
    /// Edges dropped because a burst window ran out.
    pub noise_discarded: Option<u8>,
    /// A satisfied trigger was dropped because the supervisor is still cold.
    pub cold_start_discard: bool,
}

impl TickReport {
    #[must_use]
    pub const fn raised_request(&self) -> bool {
        self.reset_raised || self.remote_raised
    }

    /// Telemetry events implied by this tick.
    #[must_use]
    pub fn events(&self) -> Vec<SupervisorEventKind, 4> {
        let mut events = Vec::new();
        if self.reset_raised {
            let _ = events.push(SupervisorEventKind::ResetRequested);
        }
        if self.remote_raised {
            let _ = events.push(SupervisorEventKind::RemoteRequested);
        }
        if self.noise_discarded.is_some() {
            let _ = events.push(SupervisorEventKind::NoisyBurst);
        }
        if self.cold_start_discard {
            let _ = events.push(SupervisorEventKind::ColdStartDiscard);
        }
        events
    }
}

/// Outputs pulsed by one pass of the service loop.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ServiceReport {
    pub reset_pulsed: bool,
    pub remote_pulsed: bool,
}

impl ServiceReport {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.reset_pulsed && !self.remote_pulsed
    }
}

/// Event counters. Each counter has exactly one writer context.
#[derive(Debug, Default)]
pub struct SupervisorStats {
    heartbeat_edges: AtomicU32,
    deferred_heartbeats: AtomicU32,
    trigger_edges: AtomicU32,
    cold_start_discards: AtomicU32,
    noisy_bursts: AtomicU32,
    resets_issued: AtomicU32,
    remotes_relayed: AtomicU32,
}

impl SupervisorStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heartbeat_edges: AtomicU32::new(0),
            deferred_heartbeats: AtomicU32::new(0),
            trigger_edges: AtomicU32::new(0),
            cold_start_discards: AtomicU32::new(0),
            noisy_bursts: AtomicU32::new(0),
            resets_issued: AtomicU32::new(0),
            remotes_relayed: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            heartbeat_edges: self.heartbeat_edges.load(Ordering::Relaxed),
            deferred_heartbeats: self.deferred_heartbeats.load(Ordering::Relaxed),
            trigger_edges: self.trigger_edges.load(Ordering::Relaxed),
            cold_start_discards: self.cold_start_discards.load(Ordering::Relaxed),
            noisy_bursts: self.noisy_bursts.load(Ordering::Relaxed),
            resets_issued: self.resets_issued.load(Ordering::Relaxed),
            remotes_relayed: self.remotes_relayed.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU32) {
    counter.store(counter.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
}

pub struct Supervisor<T> {
    monitor: HeartbeatMonitor,
    detector: T,
    armed: AtomicBool,
    reset_request: AtomicBool,
    remote_request: AtomicBool,
    stats: SupervisorStats,
}

impl<T: TriggerDetector> Supervisor<T> {
    /// Creates a supervisor in `ColdStart` with every flag clear.
    #[must_use]
    pub const fn new(timeouts: TimeoutTicks, detector: T) -> Self {
        Self {
            monitor: HeartbeatMonitor::new(timeouts),
            detector,
            armed: AtomicBool::new(false),
            reset_request: AtomicBool::new(false),
            remote_request: AtomicBool::new(false),
            stats: SupervisorStats::new(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> SupervisorPhase {
        if self.armed.load(Ordering::Relaxed) {
            SupervisorPhase::Armed
        } else {
            SupervisorPhase::ColdStart
        }
    }

    #[must_use]
    pub fn monitor(&self) -> &HeartbeatMonitor {
        &self.monitor
    }

    #[must_use]
    pub fn detector(&self) -> &T {
        &self.detector
    }

    #[must_use]
    pub fn stats(&self) -> &SupervisorStats {
        &self.stats
    }

    #[must_use]
    pub fn reset_pending(&self) -> bool {
        self.reset_request.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn remote_pending(&self) -> bool {
        self.remote_request.load(Ordering::Relaxed)
    }

    /// `true` while a trigger request is waiting on the detector or the loop.
    #[must_use]
    pub fn trigger_pending(&self) -> bool {
        self.detector.is_pending() || self.remote_pending()
    }

    #[must_use]
    pub fn has_pending_request(&self) -> bool {
        self.reset_pending() || self.remote_pending()
    }

    /// Heartbeat edge handler. Interrupt context, O(1).
    pub fn on_heartbeat_edge(&self) -> HeartbeatOutcome {
        bump(&self.stats.heartbeat_edges);

        if T::UNLOCK == UnlockEdge::FirstHeartbeat && !self.armed.load(Ordering::Relaxed) {
            self.detector.clear();
            self.monitor.rearm();
            self.armed.store(true, Ordering::Relaxed);
            return HeartbeatOutcome::Unlocked;
        }

        // A pending trigger must not keep pushing the reset deadline out.
        if self.trigger_pending() {
            bump(&self.stats.deferred_heartbeats);
            return HeartbeatOutcome::Deferred;
        }

        self.monitor.rearm();
        HeartbeatOutcome::Rearmed
    }

    /// Trigger edge handler. Interrupt context, O(1).
    pub fn on_trigger_edge(&self) -> EdgeOutcome {
        bump(&self.stats.trigger_edges);

        if T::UNLOCK == UnlockEdge::FirstTrigger && !self.armed.load(Ordering::Relaxed) {
            // The power-up false pulse: swallowed, never relayed.
            self.detector.clear();
            bump(&self.stats.cold_start_discards);
            self.armed.store(true, Ordering::Relaxed);
            return EdgeOutcome::Unlocked;
        }

        self.detector.on_edge()
    }

    /// Timer tick handler. Interrupt context, O(1).
    pub fn on_tick(&self) -> TickReport {
        let mut report = TickReport::default();

        if self.monitor.tick() == CountdownTick::Expired {
            report.reset_raised = !self.reset_request.load(Ordering::Relaxed);
            self.reset_request.store(true, Ordering::Relaxed);
        }

        if let WindowOutcome::Expired { discarded } = self.detector.on_tick() {
            bump(&self.stats.noisy_bursts);
            report.noise_discarded = Some(discarded);
        }

        if self.detector.take_satisfied() {
            if self.armed.load(Ordering::Relaxed) {
                report.remote_raised = !self.remote_request.load(Ordering::Relaxed);
                self.remote_request.store(true, Ordering::Relaxed);
            } else {
                bump(&self.stats.cold_start_discards);
                report.cold_start_discard = true;
            }
        }

        report
    }

    /// Services pending requests. Blocks for the duration of each pulse.
    ///
    /// Reset is serviced first; both are serviced in the same pass when both
    /// are pending. The remote request stays visible until its pulse has
    /// finished, so heartbeat edges arriving during the pulse do not rearm
    /// the countdown. Once the pulse ends the countdown is rearmed: relaying
    /// a remote action proves the host is alive.
    pub fn service<D: OutputDriver, W: DelayNs>(&self, pulser: &mut Pulser<D, W>) -> ServiceReport {
        let mut report = ServiceReport::default();

        if self.reset_request.swap(false, Ordering::Relaxed) {
            pulser.pulse(OutputId::Reset);
            bump(&self.stats.resets_issued);
            report.reset_pulsed = true;
        }

        if self.remote_request.load(Ordering::Relaxed) {
            pulser.pulse(OutputId::Remote);
            self.remote_request.store(false, Ordering::Relaxed);
            self.monitor.rearm();
            bump(&self.stats.remotes_relayed);
            report.remote_pulsed = true;
        }

        report
    }

    /// Copies the current state into plain values for logging and display.
    #[must_use]
    pub fn snapshot(&self) -> SupervisorSnapshot {
        SupervisorSnapshot {
            phase: self.phase(),
            detector: T::KIND,
            countdown_ticks: self.monitor.countdown(),
            threshold_ticks: self.monitor.threshold_in_effect(),
            in_grace: self.monitor.in_grace(),
            reset_pending: self.reset_pending(),
            remote_pending: self.remote_pending(),
            burst_progress: self.detector.progress(),
            stats: self.stats.snapshot(),
        }
    }
}
