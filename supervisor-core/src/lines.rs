//! Signal line catalog shared by firmware and host targets.
//!
//! The supervisor has exactly four wires: two edge-sampled inputs from the
//! host controller and two pulsed outputs. This module records how each one
//! is routed and which electrical level is "active", so the output driver,
//! status formatting, and board bring-up agree on a single table.

/// Identifier for the logical lines exposed by the supervisor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineId {
    Heartbeat,
    Trigger,
    Reset,
    Remote,
}

impl LineId {
    /// Deterministic index for lookups into [`ALL_LINES`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            LineId::Heartbeat => 0,
            LineId::Trigger => 1,
            LineId::Reset => 2,
            LineId::Remote => 3,
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LineId::Heartbeat),
            1 => Some(LineId::Trigger),
            2 => Some(LineId::Reset),
            3 => Some(LineId::Remote),
            _ => None,
        }
    }
}

/// The two lines the supervisor pulses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputId {
    Reset,
    Remote,
}

impl OutputId {
    #[must_use]
    pub const fn line_id(self) -> LineId {
        match self {
            OutputId::Reset => LineId::Reset,
            OutputId::Remote => LineId::Remote,
        }
    }

    #[must_use]
    pub const fn line(self) -> SignalLine {
        line_by_id(self.line_id())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineDirection {
    Input,
    Output,
}

/// Electrical polarity of the asserted state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Polarity {
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    /// Push-pull level that asserts the line.
    #[must_use]
    pub const fn asserted(self) -> LineDrive {
        match self {
            Polarity::ActiveLow => LineDrive::DriveLow,
            Polarity::ActiveHigh => LineDrive::DriveHigh,
        }
    }

    /// Push-pull level that releases the line.
    #[must_use]
    pub const fn released(self) -> LineDrive {
        match self {
            Polarity::ActiveLow => LineDrive::DriveHigh,
            Polarity::ActiveHigh => LineDrive::DriveLow,
        }
    }
}

/// Physical state applied to an output pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineDrive {
    DriveLow,
    DriveHigh,
    /// Pin switched to input; an external network sets the level.
    Float,
}

/// Polarity of the host's reset input. Flip for hosts with an active-high reset.
pub const RESET_POLARITY: Polarity = Polarity::ActiveLow;

/// Metadata describing how a line is routed on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SignalLine {
    pub id: LineId,
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub direction: LineDirection,
    pub polarity: Polarity,
    /// Drive applied while the line is asserted (outputs only).
    pub active: LineDrive,
    /// Drive applied between pulses (outputs only).
    pub idle: LineDrive,
}

impl SignalLine {
    #[must_use]
    pub const fn input(id: LineId, name: &'static str, mcu_pin: &'static str) -> Self {
        Self {
            id,
            name,
            mcu_pin,
            direction: LineDirection::Input,
            polarity: Polarity::ActiveHigh,
            active: LineDrive::Float,
            idle: LineDrive::Float,
        }
    }

    #[must_use]
    pub const fn push_pull(
        id: LineId,
        name: &'static str,
        mcu_pin: &'static str,
        polarity: Polarity,
    ) -> Self {
        Self {
            id,
            name,
            mcu_pin,
            direction: LineDirection::Output,
            polarity,
            active: polarity.asserted(),
            idle: polarity.released(),
        }
    }

    /// Output that idles as an input and pulls low while asserted, standing
    /// in for an open-collector transistor.
    #[must_use]
    pub const fn open_collector(id: LineId, name: &'static str, mcu_pin: &'static str) -> Self {
        Self {
            id,
            name,
            mcu_pin,
            direction: LineDirection::Output,
            polarity: Polarity::ActiveLow,
            active: LineDrive::DriveLow,
            idle: LineDrive::Float,
        }
    }

    #[must_use]
    pub const fn is_output(&self) -> bool {
        matches!(self.direction, LineDirection::Output)
    }
}

/// Compile-time catalog of every line.
pub const ALL_LINES: [SignalLine; 4] = [
    SignalLine::input(LineId::Heartbeat, "HEARTBEAT", "PA0"),
    SignalLine::input(LineId::Trigger, "TRIGGER", "PA1"),
    SignalLine::push_pull(LineId::Reset, "RESET_OUT", "PA4", RESET_POLARITY),
    SignalLine::open_collector(LineId::Remote, "REMOTE_OUT", "PA5"),
];

/// Retrieve line metadata by identifier.
#[must_use]
pub const fn line_by_id(id: LineId) -> SignalLine {
    ALL_LINES[id.as_index()]
}
