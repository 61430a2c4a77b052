//! Outbound application events.
//!
//! The [`MachineService`](super::service::MachineService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use crate::fsm::StateId;

/// What the service reports to its [`EventSink`](super::ports::EventSink).
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Counters and state at the end of a run, or on request.
    Telemetry(TelemetryData),

    /// Emitted once per cycle in which the state changed.
    StateChanged { from: StateId, to: StateId },

    /// The fault word went from zero to non-zero; carries the word.
    FaultDetected(u8),

    /// The fault word returned to zero.
    FaultCleared,

    /// The service has started (carries initial state).
    Started(StateId),

    /// The infinite-energy override was toggled (carries the new value).
    InfiniteEnergy(bool),
}

/// Snapshot carried by [`AppEvent::Telemetry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    pub cycle: u64,
    pub battery_percent: u32,
    pub water_purified: u64,
    pub water_rejected: u64,
    /// Bitmask of enabled devices, bit n = `DeviceId(n)`.
    pub enabled_devices: u16,
    pub fault_flags: u8,
}
