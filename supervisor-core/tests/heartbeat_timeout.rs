use core::time::Duration;

use embedded_hal::delay::DelayNs;
use supervisor_core::config::{GLITCH_FILTER_CONFIG, PULSE_COUNT_BURST, PULSE_COUNT_CONFIG};
use supervisor_core::lines::{LineDrive, OutputId};
use supervisor_core::output::{OutputDriver, Pulser};
use supervisor_core::supervisor::{HeartbeatOutcome, Supervisor, SupervisorPhase};
use supervisor_core::trigger::{GlitchFilter, PulseCounter};

#[derive(Default)]
struct Recorder {
    applied: Vec<(OutputId, LineDrive)>,
}

impl OutputDriver for Recorder {
    fn drive(&mut self, output: OutputId, drive: LineDrive) {
        self.applied.push((output, drive));
    }
}

#[derive(Default)]
struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _: u32) {}
}

fn glitch_supervisor() -> Supervisor<GlitchFilter> {
    let timeouts = GLITCH_FILTER_CONFIG.timeouts().expect("glitch preset");
    Supervisor::new(timeouts, GlitchFilter::new())
}

fn pulser(recorder: &mut Recorder) -> Pulser<&mut Recorder, NoDelay> {
    Pulser::new(recorder, NoDelay, GLITCH_FILTER_CONFIG.pulse_widths())
}

#[test]
fn silent_host_is_reset_after_cold_start_grace() {
    let supervisor = glitch_supervisor();
    let cold_start = supervisor.monitor().cold_start_threshold();
    assert_eq!(cold_start, 6_000);

    for _ in 0..cold_start - 1 {
        assert!(!supervisor.on_tick().reset_raised);
    }
    assert!(supervisor.on_tick().reset_raised);
    assert_eq!(supervisor.phase(), SupervisorPhase::ColdStart);

    // Expiry reloads the steady threshold, not the cold-start grace.
    assert!(!supervisor.monitor().in_grace());
    assert_eq!(
        supervisor.monitor().countdown(),
        supervisor.monitor().steady_threshold()
    );
}

#[test]
fn steady_timeout_issues_exactly_one_reset() {
    let supervisor = glitch_supervisor();
    let mut recorder = Recorder::default();

    assert_eq!(supervisor.on_heartbeat_edge(), HeartbeatOutcome::Rearmed);
    let steady = supervisor.monitor().steady_threshold();
    assert_eq!(steady, 1_200);

    let mut raised = 0;
    for _ in 0..=steady {
        if supervisor.on_tick().reset_raised {
            raised += 1;
        }
        assert!(supervisor.monitor().countdown() <= steady);
    }
    assert_eq!(raised, 1);

    let report = supervisor.service(&mut pulser(&mut recorder));
    assert!(report.reset_pulsed);
    assert!(!report.remote_pulsed);
    assert_eq!(
        recorder.applied,
        vec![
            (OutputId::Reset, LineDrive::DriveLow),
            (OutputId::Reset, LineDrive::DriveHigh),
        ]
    );

    // Nothing left to do on the next pass.
    assert!(supervisor.service(&mut pulser(&mut recorder)).is_idle());
    assert_eq!(supervisor.stats().snapshot().resets_issued, 1);
}

#[test]
fn regular_heartbeats_hold_off_reset_indefinitely() {
    let supervisor = glitch_supervisor();
    supervisor.on_heartbeat_edge();

    // One heartbeat every 30 s for an hour of ticks.
    for tick in 1..=72_000u32 {
        if tick % 600 == 0 {
            assert_eq!(supervisor.on_heartbeat_edge(), HeartbeatOutcome::Rearmed);
        }
        assert!(!supervisor.on_tick().raised_request());
    }
    assert!(!supervisor.has_pending_request());
}

#[test]
fn pulse_count_build_uses_the_short_steady_timeout() {
    let timeouts = PULSE_COUNT_CONFIG.timeouts().expect("pulse preset");
    let burst = PULSE_COUNT_BURST
        .ticks(PULSE_COUNT_CONFIG.tick)
        .expect("pulse burst");
    let supervisor = Supervisor::new(timeouts, PulseCounter::new(burst));

    supervisor.on_heartbeat_edge();
    let ticks_until_reset = (1..=1_000u32)
        .find(|_| supervisor.on_tick().reset_raised)
        .expect("reset within 50 s");
    assert_eq!(ticks_until_reset, 200);
    assert_eq!(
        PULSE_COUNT_CONFIG.tick.duration_of(ticks_until_reset),
        Duration::from_secs(10)
    );
}
