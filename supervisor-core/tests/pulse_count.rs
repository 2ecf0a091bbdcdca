use core::time::Duration;

use embedded_hal::delay::DelayNs;
use supervisor_core::config::{PULSE_COUNT_BURST, PULSE_COUNT_CONFIG};
use supervisor_core::output::{NoopOutputDriver, Pulser};
use supervisor_core::supervisor::{HeartbeatOutcome, Supervisor};
use supervisor_core::trigger::PulseCounter;

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _: u32) {}
}

fn armed_supervisor() -> Supervisor<PulseCounter> {
    let timeouts = PULSE_COUNT_CONFIG.timeouts().expect("pulse preset");
    let burst = PULSE_COUNT_BURST
        .ticks(PULSE_COUNT_CONFIG.tick)
        .expect("pulse burst");
    let supervisor = Supervisor::new(timeouts, PulseCounter::new(burst));
    supervisor.on_heartbeat_edge();
    supervisor
}

fn ticks(duration: Duration) -> u32 {
    PULSE_COUNT_CONFIG
        .tick
        .ticks_for(duration)
        .expect("duration fits")
}

#[test]
fn ten_edges_at_fifty_ms_raise_one_request() {
    let supervisor = armed_supervisor();
    let mut remote_requests = 0;

    for _ in 0..10 {
        supervisor.on_trigger_edge();
        if supervisor.on_tick().remote_raised {
            remote_requests += 1;
        }
    }
    for _ in 0..ticks(Duration::from_secs(2)) {
        if supervisor.on_tick().remote_raised {
            remote_requests += 1;
        }
    }

    assert_eq!(remote_requests, 1);
    assert!(supervisor.remote_pending());
    assert_eq!(supervisor.stats().snapshot().noisy_bursts, 0);
}

#[test]
fn nine_edges_then_silence_are_discarded_as_noise() {
    let supervisor = armed_supervisor();

    for _ in 0..9 {
        supervisor.on_trigger_edge();
        supervisor.on_tick();
    }

    let mut discarded = None;
    for _ in 0..ticks(Duration::from_millis(1_100)) {
        let report = supervisor.on_tick();
        assert!(!report.remote_raised);
        if let Some(count) = report.noise_discarded {
            discarded = Some(count);
        }
    }

    assert_eq!(discarded, Some(9));
    assert!(!supervisor.remote_pending());
    assert_eq!(supervisor.detector().count(), 0);
    assert_eq!(supervisor.stats().snapshot().noisy_bursts, 1);
}

#[test]
fn twenty_edges_raise_two_distinct_requests() {
    let supervisor = armed_supervisor();
    let mut pulser = Pulser::new(
        NoopOutputDriver::new(),
        NoDelay,
        PULSE_COUNT_CONFIG.pulse_widths(),
    );
    let mut relayed = 0;

    for _ in 0..20 {
        supervisor.on_trigger_edge();
        if supervisor.on_tick().remote_raised {
            relayed += u32::from(supervisor.service(&mut pulser).remote_pulsed);
        }
    }

    assert_eq!(relayed, 2);
    assert_eq!(supervisor.stats().snapshot().remotes_relayed, 2);
}

#[test]
fn heartbeats_are_deferred_while_a_burst_waits_for_service() {
    let supervisor = armed_supervisor();
    for _ in 0..10 {
        supervisor.on_trigger_edge();
    }
    assert!(supervisor.trigger_pending());

    // Detector satisfied but the tick has not promoted it yet.
    assert_eq!(supervisor.on_heartbeat_edge(), HeartbeatOutcome::Deferred);

    supervisor.on_tick();
    assert!(supervisor.remote_pending());
    assert_eq!(supervisor.on_heartbeat_edge(), HeartbeatOutcome::Deferred);

    let mut pulser = Pulser::new(
        NoopOutputDriver::new(),
        NoDelay,
        PULSE_COUNT_CONFIG.pulse_widths(),
    );
    assert!(supervisor.service(&mut pulser).remote_pulsed);
    assert!(!supervisor.trigger_pending());
    assert_eq!(supervisor.on_heartbeat_edge(), HeartbeatOutcome::Rearmed);
    assert_eq!(supervisor.stats().snapshot().deferred_heartbeats, 2);
}
