//! Board wiring for the STM32G0 supervisor.
//!
//! Both outputs sit on [`Flex`] pins. The reset line is an ordinary
//! push-pull output. The remote line idles as a floating input and is only
//! switched to an output while a pulse is held, so the level is latched
//! before the direction changes and the line never glitches high.

use embassy_stm32::gpio::{Flex, Pull, Speed};
use supervisor_core::lines::{LineDrive, OutputId};
use supervisor_core::output::OutputDriver;

pub struct BoardOutputs<'d> {
    reset: Flex<'d>,
    remote: Flex<'d>,
}

impl<'d> BoardOutputs<'d> {
    /// Wraps the two output pins and parks them at their idle drive.
    #[must_use]
    pub fn new(reset: Flex<'d>, remote: Flex<'d>) -> Self {
        let mut outputs = Self { reset, remote };
        outputs.release_all();
        outputs
    }

    fn pin_mut(&mut self, output: OutputId) -> &mut Flex<'d> {
        match output {
            OutputId::Reset => &mut self.reset,
            OutputId::Remote => &mut self.remote,
        }
    }
}

impl OutputDriver for BoardOutputs<'_> {
    fn drive(&mut self, output: OutputId, drive: LineDrive) {
        let pin = self.pin_mut(output);
        match drive {
            LineDrive::DriveLow => {
                pin.set_low();
                pin.set_as_output(Speed::Low);
            }
            LineDrive::DriveHigh => {
                pin.set_high();
                pin.set_as_output(Speed::Low);
            }
            LineDrive::Float => pin.set_as_input(Pull::None),
        }
    }
}
