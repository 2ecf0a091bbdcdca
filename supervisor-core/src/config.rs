//! Compile-time supervisor configuration.
//!
//! There is no runtime configuration surface: thresholds, pulse widths, and
//! the burst shape are constants. Conversions to ticks are `const fn` so an
//! invalid preset fails the build instead of misbehaving on the bench.

use core::fmt;
use core::time::Duration;

use crate::timing::{DEFAULT_TICK, TickPeriod};

/// Grace period granted after power-up before the first heartbeat.
pub const COLD_START_TIMEOUT: Duration = Duration::from_secs(300);
/// Silence tolerated from an armed host in the glitch-filter build.
pub const GLITCH_FILTER_STEADY_TIMEOUT: Duration = Duration::from_secs(60);
/// Silence tolerated from an armed host in the pulse-count build.
pub const PULSE_COUNT_STEADY_TIMEOUT: Duration = Duration::from_secs(10);
/// Width of the pulse on `reset_out`.
pub const RESET_PULSE: Duration = Duration::from_millis(100);
/// Width of the pulse on `remote_out`.
pub const REMOTE_PULSE: Duration = Duration::from_millis(1_000);
/// Edges that make up one remote request in the pulse-count build.
pub const PULSE_TARGET: u8 = 10;
/// Longest gap allowed between two edges of the same burst.
pub const PULSE_WINDOW: Duration = Duration::from_secs(1);

/// Reasons a configuration is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    ZeroTick,
    ZeroTimeout,
    SteadyExceedsColdStart,
    TimeoutOverflow,
    ZeroPulseTarget,
    EmptyBurstWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTick => f.write_str("tick period must be non-zero"),
            ConfigError::ZeroTimeout => f.write_str("heartbeat timeouts must span at least one tick"),
            ConfigError::SteadyExceedsColdStart => {
                f.write_str("steady-state timeout exceeds the cold-start grace period")
            }
            ConfigError::TimeoutOverflow => f.write_str("timeout does not fit the tick counter"),
            ConfigError::ZeroPulseTarget => f.write_str("pulse target must be at least one edge"),
            ConfigError::EmptyBurstWindow => f.write_str("burst window must span at least one tick"),
        }
    }
}

/// Heartbeat thresholds and output pulse widths.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SupervisorConfig {
    pub tick: TickPeriod,
    pub cold_start_timeout: Duration,
    pub steady_timeout: Duration,
    pub reset_pulse: Duration,
    pub remote_pulse: Duration,
}

impl SupervisorConfig {
    /// Converts the heartbeat thresholds to ticks, validating them on the way.
    pub const fn timeouts(&self) -> Result<TimeoutTicks, ConfigError> {
        if self.tick.is_zero() {
            return Err(ConfigError::ZeroTick);
        }

        let cold_start = match self.tick.ticks_for(self.cold_start_timeout) {
            Some(ticks) => ticks,
            None => return Err(ConfigError::TimeoutOverflow),
        };
        let steady = match self.tick.ticks_for(self.steady_timeout) {
            Some(ticks) => ticks,
            None => return Err(ConfigError::TimeoutOverflow),
        };

        if cold_start == 0 || steady == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if steady > cold_start {
            return Err(ConfigError::SteadyExceedsColdStart);
        }

        Ok(TimeoutTicks { cold_start, steady })
    }

    /// Checks the configuration without keeping the converted values.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        match self.timeouts() {
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Pulse widths handed to the output pulser.
    #[must_use]
    pub const fn pulse_widths(&self) -> crate::output::PulseWidths {
        crate::output::PulseWidths::new(self.reset_pulse, self.remote_pulse)
    }
}

/// Heartbeat thresholds expressed in ticks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeoutTicks {
    pub cold_start: u32,
    pub steady: u32,
}

/// Shape of the edge burst accepted by the pulse counter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PulseBurst {
    pub target: u8,
    pub window: Duration,
}

impl PulseBurst {
    pub const fn ticks(&self, tick: TickPeriod) -> Result<BurstTicks, ConfigError> {
        if tick.is_zero() {
            return Err(ConfigError::ZeroTick);
        }
        if self.target == 0 {
            return Err(ConfigError::ZeroPulseTarget);
        }

        match tick.ticks_for(self.window) {
            Some(0) => Err(ConfigError::EmptyBurstWindow),
            Some(window) => Ok(BurstTicks {
                target: self.target,
                window,
            }),
            None => Err(ConfigError::TimeoutOverflow),
        }
    }
}

/// Burst shape expressed in ticks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BurstTicks {
    pub target: u8,
    pub window: u32,
}

/// Glitch-filter build: a single trigger edge relays one remote pulse.
pub const GLITCH_FILTER_CONFIG: SupervisorConfig = SupervisorConfig {
    tick: DEFAULT_TICK,
    cold_start_timeout: COLD_START_TIMEOUT,
    steady_timeout: GLITCH_FILTER_STEADY_TIMEOUT,
    reset_pulse: RESET_PULSE,
    remote_pulse: REMOTE_PULSE,
};

/// Pulse-count build: a burst of [`PULSE_TARGET`] edges relays one remote pulse.
pub const PULSE_COUNT_CONFIG: SupervisorConfig = SupervisorConfig {
    tick: DEFAULT_TICK,
    cold_start_timeout: COLD_START_TIMEOUT,
    steady_timeout: PULSE_COUNT_STEADY_TIMEOUT,
    reset_pulse: RESET_PULSE,
    remote_pulse: REMOTE_PULSE,
};

/// Burst accepted by the pulse-count build.
pub const PULSE_COUNT_BURST: PulseBurst = PulseBurst {
    target: PULSE_TARGET,
    window: PULSE_WINDOW,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_convert_to_expected_ticks() {
        let glitch = GLITCH_FILTER_CONFIG.timeouts().expect("glitch preset");
        assert_eq!(glitch.cold_start, 6_000);
        assert_eq!(glitch.steady, 1_200);

        let pulse = PULSE_COUNT_CONFIG.timeouts().expect("pulse preset");
        assert_eq!(pulse.cold_start, 6_000);
        assert_eq!(pulse.steady, 200);

        let burst = PULSE_COUNT_BURST.ticks(DEFAULT_TICK).expect("burst preset");
        assert_eq!(burst.target, 10);
        assert_eq!(burst.window, 20);
    }

    #[test]
    fn steady_longer_than_cold_start_is_rejected() {
        let config = SupervisorConfig {
            steady_timeout: Duration::from_secs(301),
            ..GLITCH_FILTER_CONFIG
        };
        assert_eq!(config.validate(), Err(ConfigError::SteadyExceedsColdStart));
    }

    #[test]
    fn zero_tick_and_zero_timeout_are_rejected() {
        let zero_tick = SupervisorConfig {
            tick: TickPeriod::from_micros(0),
            ..GLITCH_FILTER_CONFIG
        };
        assert_eq!(zero_tick.validate(), Err(ConfigError::ZeroTick));

        let zero_timeout = SupervisorConfig {
            steady_timeout: Duration::ZERO,
            ..GLITCH_FILTER_CONFIG
        };
        assert_eq!(zero_timeout.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn burst_rejects_empty_shapes() {
        let no_edges = PulseBurst {
            target: 0,
            window: PULSE_WINDOW,
        };
        assert_eq!(no_edges.ticks(DEFAULT_TICK), Err(ConfigError::ZeroPulseTarget));

        let no_window = PulseBurst {
            target: PULSE_TARGET,
            window: Duration::ZERO,
        };
        assert_eq!(no_window.ticks(DEFAULT_TICK), Err(ConfigError::EmptyBurstWindow));
    }
}
