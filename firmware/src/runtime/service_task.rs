use embassy_time::{Delay, Instant};
use supervisor_core::output::Pulser;

use super::EVENTS;
use crate::board::BoardOutputs;
use crate::policy::{ACTIVE_CONFIG, SUPERVISOR};
use crate::telemetry::{self, TelemetryRecorder};

/// Cooperative service loop.
///
/// Waits for interrupt-side events, records them, and pulses whatever
/// requests are pending. Pulses block this task only; the edge and tick tasks
/// keep running above it.
#[embassy_executor::task]
pub async fn run(outputs: BoardOutputs<'static>, mut telemetry: TelemetryRecorder) -> ! {
    let widths = ACTIVE_CONFIG.pulse_widths();
    let mut pulser = Pulser::new(outputs, Delay, widths);
    let receiver = EVENTS.receiver();

    loop {
        let event = receiver.receive().await;
        telemetry.record(event);

        if !SUPERVISOR.has_pending_request() {
            continue;
        }

        let report = SUPERVISOR.service(&mut pulser);
        telemetry.record_service(&report, widths, Instant::now());
        telemetry::log_status(&SUPERVISOR.snapshot(), ACTIVE_CONFIG.tick);
    }
}
