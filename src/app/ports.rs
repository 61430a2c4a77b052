//! Everything the controller needs from the rig, as traits.
//!
//! ```text
//!   SensorPort / SwitchInput ──► MachineService ──► ActuatorPort
//!                                      │
//!                                      └──► EventSink / FrameSink
//! ```
//!
//! Boards, the simulator and test doubles implement these;
//! [`MachineService`](super::service::MachineService) takes them as
//! generic parameters and holds no hardware of its own.

use crate::fsm::StateId;
use crate::fsm::context::MachineStats;
use crate::plant::{DeviceId, Plant};
use crate::sensors::SensorSnapshot;
use crate::sensors::float_switch::SwitchStates;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per cycle for analog data.
pub trait SensorPort {
    /// Read every analog sensor and return a unified snapshot.
    fn read_all(&mut self) -> SensorSnapshot;
}

/// Raw float-switch levels, read from the sampling timer context.
pub trait SwitchInput {
    /// Instantaneous, undebounced switch states.
    fn read_switches(&mut self) -> SwitchStates;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command device outputs.
pub trait ActuatorPort {
    /// Drive a device's enable line.
    fn set_enable(&mut self, device: DeviceId, enabled: bool);

    /// Set a device's PWM duty (0–100).
    fn set_duty(&mut self, device: DeviceId, duty: u8);

    /// Drive every output off.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Frame port (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// Renders the rig once per cycle when graphics are enabled.
pub trait FrameSink {
    fn render(&mut self, state: StateId, plant: &Plant, stats: &MachineStats);
}
