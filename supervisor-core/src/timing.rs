//! Tick period derivation for the timeout engine.
//!
//! Every countdown in the supervisor is expressed in ticks of one periodic
//! timer. The period is derived from the clock feeding that timer, so a change
//! of oscillator or prescaler only needs a new [`TimerClock`] and every
//! threshold is re-derived from it.

use core::time::Duration;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Period of the supervisor tick, stored in microseconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickPeriod {
    micros: u32,
}

impl TickPeriod {
    #[must_use]
    pub const fn from_micros(micros: u32) -> Self {
        Self { micros }
    }

    #[must_use]
    pub const fn from_millis(millis: u32) -> Self {
        Self {
            micros: millis.saturating_mul(1_000),
        }
    }

    #[must_use]
    pub const fn as_micros(self) -> u32 {
        self.micros
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.micros == 0
    }

    /// Returns the period as a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_micros(self.micros as u64)
    }

    /// Number of ticks needed to cover `duration`.
    ///
    /// Rounds up so a countdown never expires before the requested time has
    /// elapsed. Returns `None` for a zero period or when the tick count does
    /// not fit a `u32`.
    #[must_use]
    pub const fn ticks_for(self, duration: Duration) -> Option<u32> {
        if self.micros == 0 {
            return None;
        }

        let ticks = duration.as_micros().div_ceil(self.micros as u128);
        if ticks > u32::MAX as u128 {
            None
        } else {
            Some(ticks as u32)
        }
    }

    /// Wall-clock time covered by `ticks` periods.
    #[must_use]
    pub const fn duration_of(self, ticks: u32) -> Duration {
        Duration::from_micros(self.micros as u64 * ticks as u64)
    }
}

/// Hardware timer feeding the tick interrupt.
///
/// The period is `counts * prescaler * instruction_divider / oscillator_hz`.
/// The compare value (`counts`) is reloaded on every tick rather than left to
/// free-run, so the period stays exact even when the interrupt is serviced
/// late.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimerClock {
    pub oscillator_hz: u32,
    pub instruction_divider: u32,
    pub prescaler: u32,
    pub counts: u32,
}

impl TimerClock {
    #[must_use]
    pub const fn new(oscillator_hz: u32, instruction_divider: u32, prescaler: u32, counts: u32) -> Self {
        Self {
            oscillator_hz,
            instruction_divider,
            prescaler,
            counts,
        }
    }

    /// Oscillator cycles consumed by one tick.
    #[must_use]
    pub const fn cycles_per_tick(&self) -> u64 {
        self.counts as u64 * self.prescaler as u64 * self.instruction_divider as u64
    }

    /// Derives the tick period, rounded to the nearest microsecond.
    ///
    /// A zero oscillator yields a zero period, which configuration
    /// validation rejects.
    #[must_use]
    pub const fn period(&self) -> TickPeriod {
        if self.oscillator_hz == 0 {
            return TickPeriod::from_micros(0);
        }

        let hz = self.oscillator_hz as u64;
        let micros = (self.cycles_per_tick() * MICROS_PER_SECOND + hz / 2) / hz;
        if micros > u32::MAX as u64 {
            TickPeriod::from_micros(u32::MAX)
        } else {
            TickPeriod::from_micros(micros as u32)
        }
    }
}

/// Low-speed internal oscillator driving a 50 ms tick (32 kHz / 16 / 100).
pub const LOW_POWER_TICK_CLOCK: TimerClock = TimerClock::new(32_000, 1, 16, 100);

/// Tick period shared by the default configurations.
pub const DEFAULT_TICK: TickPeriod = LOW_POWER_TICK_CLOCK.period();
