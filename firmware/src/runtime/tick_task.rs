use embassy_time::{Duration, Instant, Ticker};

use crate::policy::{ACTIVE_CONFIG, SUPERVISOR};
use crate::telemetry::TelemetryEvent;

/// Drives the supervisor's countdown and burst window at the configured tick.
#[embassy_executor::task]
pub async fn run() -> ! {
    let period = Duration::from_micros(u64::from(ACTIVE_CONFIG.tick.as_micros()));
    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;
        let report = SUPERVISOR.on_tick();
        if report.events().is_empty() {
            continue;
        }
        for event in TelemetryEvent::from_tick(&report, Instant::now()) {
            super::publish(event);
        }
    }
}
