//! Supervisor event catalog shared by firmware and host targets.
//!
//! Events serialize to compact numeric codes so they can be kept in a
//! fixed-size ring on the MCU and decoded again by host tooling.

use core::fmt;

/// Discriminated events emitted by the supervisor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SupervisorEventKind {
    Unlocked,
    HeartbeatDeferred,
    ResetRequested,
    RemoteRequested,
    ResetIssued,
    RemoteRelayed,
    NoisyBurst,
    ColdStartDiscard,
    Custom(u16),
}

impl SupervisorEventKind {
    const UNLOCKED_CODE: u16 = 0x0001;
    const HEARTBEAT_DEFERRED_CODE: u16 = 0x0002;
    const RESET_REQUESTED_CODE: u16 = 0x0010;
    const REMOTE_REQUESTED_CODE: u16 = 0x0011;
    const RESET_ISSUED_CODE: u16 = 0x0020;
    const REMOTE_RELAYED_CODE: u16 = 0x0021;
    const NOISY_BURST_CODE: u16 = 0x0030;
    const COLD_START_DISCARD_CODE: u16 = 0x0031;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            SupervisorEventKind::Unlocked => Self::UNLOCKED_CODE,
            SupervisorEventKind::HeartbeatDeferred => Self::HEARTBEAT_DEFERRED_CODE,
            SupervisorEventKind::ResetRequested => Self::RESET_REQUESTED_CODE,
            SupervisorEventKind::RemoteRequested => Self::REMOTE_REQUESTED_CODE,
            SupervisorEventKind::ResetIssued => Self::RESET_ISSUED_CODE,
            SupervisorEventKind::RemoteRelayed => Self::REMOTE_RELAYED_CODE,
            SupervisorEventKind::NoisyBurst => Self::NOISY_BURST_CODE,
            SupervisorEventKind::ColdStartDiscard => Self::COLD_START_DISCARD_CODE,
            SupervisorEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`SupervisorEventKind::Custom`].
    #[must_use]
    pub const fn from_raw(code: u16) -> Self {
        match code {
            Self::UNLOCKED_CODE => SupervisorEventKind::Unlocked,
            Self::HEARTBEAT_DEFERRED_CODE => SupervisorEventKind::HeartbeatDeferred,
            Self::RESET_REQUESTED_CODE => SupervisorEventKind::ResetRequested,
            Self::REMOTE_REQUESTED_CODE => SupervisorEventKind::RemoteRequested,
            Self::RESET_ISSUED_CODE => SupervisorEventKind::ResetIssued,
            Self::REMOTE_RELAYED_CODE => SupervisorEventKind::RemoteRelayed,
            Self::NOISY_BURST_CODE => SupervisorEventKind::NoisyBurst,
            Self::COLD_START_DISCARD_CODE => SupervisorEventKind::ColdStartDiscard,
            other => SupervisorEventKind::Custom(other),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SupervisorEventKind::Unlocked => "unlocked",
            SupervisorEventKind::HeartbeatDeferred => "heartbeat-deferred",
            SupervisorEventKind::ResetRequested => "reset-requested",
            SupervisorEventKind::RemoteRequested => "remote-requested",
            SupervisorEventKind::ResetIssued => "reset-issued",
            SupervisorEventKind::RemoteRelayed => "remote-relayed",
            SupervisorEventKind::NoisyBurst => "noisy-burst",
            SupervisorEventKind::ColdStartDiscard => "cold-start-discard",
            SupervisorEventKind::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for SupervisorEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorEventKind::Custom(code) => write!(f, "custom({code:#06x})"),
            other => f.write_str(other.label()),
        }
    }
}
