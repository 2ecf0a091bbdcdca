//! Edge capture on the two input lines.
//!
//! The heartbeat counts on either edge; the trigger only on its rising edge.
//! Both tasks run on the interrupt executor and do O(1) work per edge, and
//! either one may report the cold-start unlock depending on the policy.

use embassy_stm32::exti::ExtiInput;
use embassy_time::Instant;

use crate::policy::SUPERVISOR;
use crate::telemetry::TelemetryEvent;

#[embassy_executor::task]
pub async fn heartbeat(mut input: ExtiInput<'static>) -> ! {
    loop {
        input.wait_for_any_edge().await;
        let outcome = SUPERVISOR.on_heartbeat_edge();
        if let Some(event) = TelemetryEvent::from_heartbeat(outcome, Instant::now()) {
            super::publish(event);
        }
    }
}

#[embassy_executor::task]
pub async fn trigger(mut input: ExtiInput<'static>) -> ! {
    loop {
        input.wait_for_rising_edge().await;
        let outcome = SUPERVISOR.on_trigger_edge();
        defmt::trace!("trigger edge: {}", defmt::Debug2Format(&outcome));
        if let Some(event) = TelemetryEvent::from_trigger(outcome, Instant::now()) {
            super::publish(event);
        }
    }
}
