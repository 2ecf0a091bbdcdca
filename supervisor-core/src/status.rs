//! Shared status surface.
//!
//! The firmware logs and the emulator's `status` command both render a
//! [`SupervisorSnapshot`] through [`StatusFormatter`], so the text is the same
//! on every front-end.

use core::fmt;
use core::time::Duration;

use crate::supervisor::SupervisorPhase;
use crate::timing::TickPeriod;
use crate::trigger::DetectorKind;

/// Plain copy of the supervisor's event counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub heartbeat_edges: u32,
    pub deferred_heartbeats: u32,
    pub trigger_edges: u32,
    pub cold_start_discards: u32,
    pub noisy_bursts: u32,
    pub resets_issued: u32,
    pub remotes_relayed: u32,
}

/// Plain copy of the supervisor state at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupervisorSnapshot {
    pub phase: SupervisorPhase,
    pub detector: DetectorKind,
    pub countdown_ticks: u32,
    pub threshold_ticks: u32,
    pub in_grace: bool,
    pub reset_pending: bool,
    pub remote_pending: bool,
    /// Edges collected toward the current burst (pulse-count only).
    pub burst_progress: Option<u8>,
    pub stats: StatsSnapshot,
}

/// Renders a [`SupervisorSnapshot`] into human-readable lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a SupervisorSnapshot,
    tick: TickPeriod,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(snapshot: &'a SupervisorSnapshot, tick: TickPeriod) -> Self {
        Self { snapshot, tick }
    }

    /// Writes the state line (e.g. `state phase=armed policy=glitch-filter countdown=59.9s/60.0s`).
    pub fn write_state_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let snapshot = self.snapshot;
        write!(
            writer,
            "state phase={} policy={} countdown=",
            snapshot.phase.label(),
            snapshot.detector
        )?;
        write_duration(writer, self.tick.duration_of(snapshot.countdown_ticks))?;
        writer.write_char('/')?;
        write_duration(writer, self.tick.duration_of(snapshot.threshold_ticks))?;
        if snapshot.in_grace {
            writer.write_str(" grace")?;
        }
        Ok(())
    }

    /// Writes the pending-request line (e.g. `pending reset=no remote=yes burst=3`).
    pub fn write_pending_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let snapshot = self.snapshot;
        write!(
            writer,
            "pending reset={} remote={}",
            yes_no(snapshot.reset_pending),
            yes_no(snapshot.remote_pending)
        )?;
        if let Some(progress) = snapshot.burst_progress {
            write!(writer, " burst={progress}")?;
        }
        Ok(())
    }

    /// Writes the counter line.
    pub fn write_counters_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let stats = &self.snapshot.stats;
        write!(
            writer,
            "counters heartbeats={} deferred={} triggers={} cold-discards={} noisy={} resets={} remotes={}",
            stats.heartbeat_edges,
            stats.deferred_heartbeats,
            stats.trigger_edges,
            stats.cold_start_discards,
            stats.noisy_bursts,
            stats.resets_issued,
            stats.remotes_relayed
        )
    }
}

impl fmt::Display for StatusFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_state_line(f)?;
        f.write_str("\n")?;
        self.write_pending_line(f)?;
        f.write_str("\n")?;
        self.write_counters_line(f)
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn write_duration<W: fmt::Write>(writer: &mut W, value: Duration) -> fmt::Result {
    if value >= Duration::from_secs(1) {
        let millis = value.as_millis();
        let seconds = millis / 1_000;
        let tenths = (millis % 1_000) / 100;
        write!(writer, "{seconds}.{tenths}s")
    } else {
        write!(writer, "{}ms", value.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn snapshot() -> SupervisorSnapshot {
        SupervisorSnapshot {
            phase: SupervisorPhase::Armed,
            detector: DetectorKind::PulseCount,
            countdown_ticks: 1_199,
            threshold_ticks: 1_200,
            in_grace: false,
            reset_pending: false,
            remote_pending: true,
            burst_progress: Some(3),
            stats: StatsSnapshot {
                heartbeat_edges: 4,
                resets_issued: 1,
                ..StatsSnapshot::default()
            },
        }
    }

    #[test]
    fn state_line_renders_countdown_against_threshold() {
        let snapshot = snapshot();
        let formatter = StatusFormatter::new(&snapshot, TickPeriod::from_millis(50));
        let mut line: String<96> = String::new();
        formatter.write_state_line(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "state phase=armed policy=pulse-count countdown=59.9s/60.0s"
        );
    }

    #[test]
    fn pending_line_includes_burst_progress() {
        let snapshot = snapshot();
        let formatter = StatusFormatter::new(&snapshot, TickPeriod::from_millis(50));
        let mut line: String<64> = String::new();
        formatter.write_pending_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "pending reset=no remote=yes burst=3");
    }

    #[test]
    fn display_joins_the_three_lines() {
        use core::fmt::Write as _;

        let snapshot = snapshot();
        let formatter = StatusFormatter::new(&snapshot, TickPeriod::from_millis(50));
        let mut text: String<256> = String::new();
        write!(text, "{formatter}").unwrap();

        let mut lines = text.split('\n');
        assert!(lines.next().unwrap().starts_with("state phase=armed"));
        assert_eq!(lines.next(), Some("pending reset=no remote=yes burst=3"));
        assert!(lines.next().unwrap().starts_with("counters heartbeats=4"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn short_durations_render_in_millis() {
        let mut line: String<16> = String::new();
        write_duration(&mut line, Duration::from_millis(450)).unwrap();
        assert_eq!(line.as_str(), "450ms");
    }
}
