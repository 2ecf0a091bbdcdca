//! Output driver abstractions.
//!
//! [`OutputDriver`] is the hardware seam: it applies a [`LineDrive`] to one of
//! the two outputs. [`Pulser`] turns that into fixed-width pulses using a
//! blocking [`DelayNs`]. Pulses are the only place the service loop blocks;
//! the interrupt path never calls into this module.

use core::time::Duration;

use embedded_hal::delay::DelayNs;

use crate::lines::{LineDrive, OutputId};

/// Abstraction over the physical output pins.
pub trait OutputDriver {
    /// Applies the requested drive to the output.
    fn drive(&mut self, output: OutputId, drive: LineDrive);

    /// Returns every output to its idle drive.
    fn release_all(&mut self) {
        self.drive(OutputId::Reset, OutputId::Reset.line().idle);
        self.drive(OutputId::Remote, OutputId::Remote.line().idle);
    }
}

impl<D: OutputDriver + ?Sized> OutputDriver for &mut D {
    fn drive(&mut self, output: OutputId, drive: LineDrive) {
        (**self).drive(output, drive);
    }

    fn release_all(&mut self) {
        (**self).release_all();
    }
}

/// Output driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopOutputDriver;

impl NoopOutputDriver {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OutputDriver for NoopOutputDriver {
    fn drive(&mut self, _: OutputId, _: LineDrive) {}
}

/// Width of each output's pulse.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PulseWidths {
    pub reset: Duration,
    pub remote: Duration,
}

impl PulseWidths {
    #[must_use]
    pub const fn new(reset: Duration, remote: Duration) -> Self {
        Self { reset, remote }
    }

    #[must_use]
    pub const fn for_output(&self, output: OutputId) -> Duration {
        match output {
            OutputId::Reset => self.reset,
            OutputId::Remote => self.remote,
        }
    }
}

/// Drives timed pulses on the supervisor outputs.
pub struct Pulser<D, T> {
    driver: D,
    delay: T,
    widths: PulseWidths,
}

impl<D: OutputDriver, T: DelayNs> Pulser<D, T> {
    #[must_use]
    pub const fn new(driver: D, delay: T, widths: PulseWidths) -> Self {
        Self {
            driver,
            delay,
            widths,
        }
    }

    #[must_use]
    pub const fn widths(&self) -> PulseWidths {
        self.widths
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[must_use]
    pub fn into_parts(self) -> (D, T) {
        (self.driver, self.delay)
    }

    /// Asserts `output`, blocks for its pulse width, then restores the idle drive.
    ///
    /// The remote output idles as an input; it is switched to a low drive
    /// only for the pulse and floated again afterwards so the external pull
    /// network keeps control of the line between pulses.
    pub fn pulse(&mut self, output: OutputId) -> Duration {
        let line = output.line();
        let width = self.widths.for_output(output);

        self.driver.drive(output, line.active);
        self.delay.delay_us(duration_to_micros(width));
        self.driver.drive(output, line.idle);

        width
    }
}

fn duration_to_micros(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    #[derive(Default)]
    struct Recorder {
        applied: Vec<(OutputId, LineDrive), 8>,
    }

    impl OutputDriver for Recorder {
        fn drive(&mut self, output: OutputId, drive: LineDrive) {
            self.applied.push((output, drive)).expect("recorder full");
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    const WIDTHS: PulseWidths =
        PulseWidths::new(Duration::from_millis(100), Duration::from_millis(1_000));

    #[test]
    fn reset_pulse_drives_low_then_high() {
        let mut pulser = Pulser::new(Recorder::default(), CountingDelay::default(), WIDTHS);
        let width = pulser.pulse(OutputId::Reset);
        assert_eq!(width, Duration::from_millis(100));

        let (driver, delay) = pulser.into_parts();
        assert_eq!(
            driver.applied.as_slice(),
            &[
                (OutputId::Reset, LineDrive::DriveLow),
                (OutputId::Reset, LineDrive::DriveHigh),
            ]
        );
        assert_eq!(delay.total_ns, 100_000_000);
    }

    #[test]
    fn remote_pulse_returns_to_float() {
        let mut pulser = Pulser::new(Recorder::default(), CountingDelay::default(), WIDTHS);
        pulser.pulse(OutputId::Remote);

        let (driver, delay) = pulser.into_parts();
        assert_eq!(
            driver.applied.as_slice(),
            &[
                (OutputId::Remote, LineDrive::DriveLow),
                (OutputId::Remote, LineDrive::Float),
            ]
        );
        assert_eq!(delay.total_ns, 1_000_000_000);
    }

    #[test]
    fn release_all_applies_idle_levels() {
        let mut recorder = Recorder::default();
        recorder.release_all();
        assert_eq!(
            recorder.applied.as_slice(),
            &[
                (OutputId::Reset, LineDrive::DriveHigh),
                (OutputId::Remote, LineDrive::Float),
            ]
        );
    }
}
