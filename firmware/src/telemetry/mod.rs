#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Telemetry ring buffer and logging helpers.
//!
//! Interrupt-side tasks describe what happened as [`TelemetryEvent`]s; the
//! service loop owns the [`TelemetryRecorder`], which keeps the most recent
//! events in a fixed-capacity ring and mirrors each one to defmt (target) or
//! stdout (host).

use embassy_time::{Duration, Instant};
use heapless::{HistoryBuf, OldestOrdered, String, Vec};

use supervisor_core::lines::OutputId;
use supervisor_core::output::PulseWidths;
use supervisor_core::status::{StatusFormatter, SupervisorSnapshot};
use supervisor_core::supervisor::{HeartbeatOutcome, ServiceReport, TickReport};
use supervisor_core::telemetry::SupervisorEventKind;
use supervisor_core::timing::TickPeriod;
use supervisor_core::trigger::EdgeOutcome;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Monotonic identifier assigned to each stored record.
pub type EventId = u32;

pub type TelemetryRing = HistoryBuf<TelemetryRecord, TELEMETRY_RING_CAPACITY>;

/// Extra data attached to an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDetail {
    None,
    /// Trigger edges dropped as noise.
    Discarded(u8),
    /// Output pulse that was just completed.
    Pulse { output: OutputId, width: Duration },
}

/// Event captured in interrupt context, waiting to be recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub timestamp: Instant,
    pub kind: SupervisorEventKind,
    pub detail: EventDetail,
}

impl TelemetryEvent {
    #[must_use]
    pub const fn new(kind: SupervisorEventKind, timestamp: Instant) -> Self {
        Self {
            timestamp,
            kind,
            detail: EventDetail::None,
        }
    }

    /// Events worth reporting for a heartbeat edge. Plain rearms are not.
    #[must_use]
    pub fn from_heartbeat(outcome: HeartbeatOutcome, timestamp: Instant) -> Option<Self> {
        match outcome {
            HeartbeatOutcome::Unlocked => Some(Self::new(SupervisorEventKind::Unlocked, timestamp)),
            HeartbeatOutcome::Deferred => {
                Some(Self::new(SupervisorEventKind::HeartbeatDeferred, timestamp))
            }
            HeartbeatOutcome::Rearmed => None,
        }
    }

    /// A trigger edge only reports when it opened the cold-start lock; the
    /// swallowed false pulse is logged as a discard.
    #[must_use]
    pub fn from_trigger(outcome: EdgeOutcome, timestamp: Instant) -> Option<Self> {
        match outcome {
            EdgeOutcome::Unlocked => Some(Self {
                timestamp,
                kind: SupervisorEventKind::Unlocked,
                detail: EventDetail::Discarded(1),
            }),
            EdgeOutcome::Pending | EdgeOutcome::Counted(_) | EdgeOutcome::Satisfied => None,
        }
    }

    /// Expands a tick report into its events.
    #[must_use]
    pub fn from_tick(report: &TickReport, timestamp: Instant) -> Vec<Self, 4> {
        report
            .events()
            .into_iter()
            .map(|kind| {
                let detail = match (kind, report.noise_discarded) {
                    (SupervisorEventKind::NoisyBurst, Some(count)) => EventDetail::Discarded(count),
                    _ => EventDetail::None,
                };
                Self {
                    timestamp,
                    kind,
                    detail,
                }
            })
            .collect()
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Instant,
    pub event: SupervisorEventKind,
    pub detail: EventDetail,
}

pub struct TelemetryRecorder {
    ring: TelemetryRing,
    next_event_id: EventId,
}

impl TelemetryRecorder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Stores an event handed over from interrupt context and logs it.
    pub fn record(&mut self, event: TelemetryEvent) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp: event.timestamp,
            event: event.kind,
            detail: event.detail,
        });

        log_event(&event);
        id
    }

    /// Records the pulses performed by one service pass.
    pub fn record_service(
        &mut self,
        report: &ServiceReport,
        widths: PulseWidths,
        timestamp: Instant,
    ) {
        if report.reset_pulsed {
            self.record(pulse_event(OutputId::Reset, widths, timestamp));
        }
        if report.remote_pulsed {
            self.record(pulse_event(OutputId::Remote, widths, timestamp));
        }
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn pulse_event(output: OutputId, widths: PulseWidths, timestamp: Instant) -> TelemetryEvent {
    let kind = match output {
        OutputId::Reset => SupervisorEventKind::ResetIssued,
        OutputId::Remote => SupervisorEventKind::RemoteRelayed,
    };
    let width = widths.for_output(output);
    TelemetryEvent {
        timestamp,
        kind,
        detail: EventDetail::Pulse {
            output,
            width: core_duration_to_embassy(width),
        },
    }
}

fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

fn log_event(event: &TelemetryEvent) {
    let label = event.kind.label();
    let timestamp_us = event.timestamp.as_micros();
    match event.detail {
        EventDetail::None => emit_log(label, timestamp_us, None, None),
        EventDetail::Discarded(count) => emit_log(label, timestamp_us, Some(count), None),
        EventDetail::Pulse { output, width } => {
            emit_log(output.line().name, timestamp_us, None, Some(width.as_millis()))
        }
    }
}

#[cfg(target_os = "none")]
fn emit_log(label: &'static str, timestamp_us: u64, discarded: Option<u8>, width_ms: Option<u64>) {
    match (discarded, width_ms) {
        (Some(count), _) => {
            defmt::warn!("telemetry:supervisor {} t={}us discarded={}", label, timestamp_us, count)
        }
        (None, Some(width)) => {
            defmt::info!("telemetry:supervisor pulse {} t={}us width={}ms", label, timestamp_us, width)
        }
        (None, None) => defmt::info!("telemetry:supervisor {} t={}us", label, timestamp_us),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_log(label: &'static str, timestamp_us: u64, discarded: Option<u8>, width_ms: Option<u64>) {
    match (discarded, width_ms) {
        (Some(count), _) => {
            println!("telemetry:supervisor {label} t={timestamp_us}us discarded={count}")
        }
        (None, Some(width)) => {
            println!("telemetry:supervisor pulse {label} t={timestamp_us}us width={width}ms")
        }
        (None, None) => println!("telemetry:supervisor {label} t={timestamp_us}us"),
    }
}

/// Logs the status block, one line at a time.
pub fn log_status(snapshot: &SupervisorSnapshot, tick: TickPeriod) {
    let formatter = StatusFormatter::new(snapshot, tick);
    let mut line: String<128> = String::new();

    if formatter.write_state_line(&mut line).is_ok() {
        emit_status(line.as_str());
    }
    line.clear();
    if formatter.write_pending_line(&mut line).is_ok() {
        emit_status(line.as_str());
    }
    line.clear();
    if formatter.write_counters_line(&mut line).is_ok() {
        emit_status(line.as_str());
    }
}

#[cfg(target_os = "none")]
fn emit_status(line: &str) {
    defmt::info!("status: {}", line);
}

#[cfg(not(target_os = "none"))]
fn emit_status(line: &str) {
    println!("status: {line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use supervisor_core::config::RESET_PULSE;

    fn micros(value: u64) -> Instant {
        Instant::from_micros(value)
    }

    const WIDTHS: PulseWidths = PulseWidths::new(RESET_PULSE, core::time::Duration::from_secs(1));

    #[test]
    fn tick_report_expands_into_events_with_details() {
        let report = TickReport {
            reset_raised: true,
            noise_discarded: Some(7),
            ..TickReport::default()
        };
        let events = TelemetryEvent::from_tick(&report, micros(500));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, SupervisorEventKind::ResetRequested);
        assert_eq!(events[1].kind, SupervisorEventKind::NoisyBurst);
        assert_eq!(events[1].detail, EventDetail::Discarded(7));
    }

    #[test]
    fn only_the_unlocking_trigger_edge_is_reported() {
        assert!(TelemetryEvent::from_trigger(EdgeOutcome::Pending, micros(1)).is_none());
        assert!(TelemetryEvent::from_trigger(EdgeOutcome::Counted(3), micros(1)).is_none());

        let unlocked = TelemetryEvent::from_trigger(EdgeOutcome::Unlocked, micros(2))
            .expect("unlock is reported");
        assert_eq!(unlocked.kind, SupervisorEventKind::Unlocked);
        assert_eq!(unlocked.detail, EventDetail::Discarded(1));
    }

    #[test]
    fn rearmed_heartbeats_are_not_reported() {
        assert!(TelemetryEvent::from_heartbeat(HeartbeatOutcome::Rearmed, micros(1)).is_none());
        let unlocked = TelemetryEvent::from_heartbeat(HeartbeatOutcome::Unlocked, micros(1));
        assert_eq!(
            unlocked.map(|event| event.kind),
            Some(SupervisorEventKind::Unlocked)
        );
    }

    #[test]
    fn service_pulses_are_recorded_in_order() {
        let mut recorder = TelemetryRecorder::new();
        let report = ServiceReport {
            reset_pulsed: true,
            remote_pulsed: true,
        };
        recorder.record_service(&report, WIDTHS, micros(2_000));

        assert_eq!(recorder.len(), 2);
        let records: Vec<TelemetryRecord, 2> = recorder.oldest_first().copied().collect();
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].event, SupervisorEventKind::ResetIssued);
        assert_eq!(
            records[0].detail,
            EventDetail::Pulse {
                output: OutputId::Reset,
                width: Duration::from_millis(100),
            }
        );
        assert_eq!(records[1].event, SupervisorEventKind::RemoteRelayed);
        assert_eq!(recorder.latest().map(|record| record.id), Some(1));
    }

    #[test]
    fn ring_keeps_only_the_most_recent_records() {
        let mut recorder = TelemetryRecorder::new();
        for step in 0..(TELEMETRY_RING_CAPACITY as u64 + 5) {
            recorder.record(TelemetryEvent::new(
                SupervisorEventKind::HeartbeatDeferred,
                micros(step),
            ));
        }
        assert_eq!(recorder.len(), TELEMETRY_RING_CAPACITY);
        assert_eq!(recorder.oldest_first().next().map(|record| record.id), Some(5));
    }
}
