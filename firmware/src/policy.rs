#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Build-time trigger policy selection.
//!
//! The default build relays a single trigger edge (glitch filter). Enabling
//! the `pulse-count` feature switches to the burst counter and its shorter
//! steady-state timeout. Thresholds are converted to ticks at compile time,
//! so an invalid preset fails the build instead of the boot.

use supervisor_core::config::{SupervisorConfig, TimeoutTicks};
use supervisor_core::supervisor::Supervisor;
use supervisor_core::trigger::{DetectorKind, TriggerDetector};

#[cfg(not(feature = "pulse-count"))]
use supervisor_core::config::GLITCH_FILTER_CONFIG;
#[cfg(not(feature = "pulse-count"))]
use supervisor_core::trigger::GlitchFilter;

#[cfg(feature = "pulse-count")]
use supervisor_core::config::{BurstTicks, PULSE_COUNT_BURST, PULSE_COUNT_CONFIG};
#[cfg(feature = "pulse-count")]
use supervisor_core::trigger::PulseCounter;

#[cfg(not(feature = "pulse-count"))]
pub type ActiveDetector = GlitchFilter;
#[cfg(not(feature = "pulse-count"))]
pub const ACTIVE_CONFIG: SupervisorConfig = GLITCH_FILTER_CONFIG;

#[cfg(feature = "pulse-count")]
pub type ActiveDetector = PulseCounter;
#[cfg(feature = "pulse-count")]
pub const ACTIVE_CONFIG: SupervisorConfig = PULSE_COUNT_CONFIG;

#[cfg(feature = "pulse-count")]
const BURST: BurstTicks = match PULSE_COUNT_BURST.ticks(ACTIVE_CONFIG.tick) {
    Ok(burst) => burst,
    Err(_) => panic!("pulse burst does not fit the tick period"),
};

pub const ACTIVE_KIND: DetectorKind = <ActiveDetector as TriggerDetector>::KIND;

pub const TIMEOUTS: TimeoutTicks = match ACTIVE_CONFIG.timeouts() {
    Ok(timeouts) => timeouts,
    Err(_) => panic!("supervisor thresholds do not fit the tick period"),
};

#[cfg(not(feature = "pulse-count"))]
const fn detector() -> ActiveDetector {
    GlitchFilter::new()
}

#[cfg(feature = "pulse-count")]
const fn detector() -> ActiveDetector {
    PulseCounter::new(BURST)
}

/// The one supervisor instance shared by every task.
pub static SUPERVISOR: Supervisor<ActiveDetector> = Supervisor::new(TIMEOUTS, detector());

#[cfg(test)]
mod tests {
    use super::*;
    use supervisor_core::supervisor::SupervisorPhase;

    #[test]
    fn thresholds_match_active_policy() {
        assert_eq!(TIMEOUTS.cold_start, 6_000);
        if cfg!(feature = "pulse-count") {
            assert_eq!(TIMEOUTS.steady, 200);
        } else {
            assert_eq!(TIMEOUTS.steady, 1_200);
        }
        assert!(ACTIVE_CONFIG.validate().is_ok());
        assert_eq!(ACTIVE_KIND == DetectorKind::PulseCount, cfg!(feature = "pulse-count"));
    }

    #[test]
    fn shared_supervisor_boots_cold() {
        assert_eq!(SUPERVISOR.phase(), SupervisorPhase::ColdStart);
        assert!(SUPERVISOR.monitor().in_grace());
    }
}
