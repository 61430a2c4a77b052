//! Inbound commands to the application service.
//!
//! These represent operator actions (simulator CLI, serial console) that
//! the [`MachineService`](super::service::MachineService) interprets and
//! acts upon.

use core::time::Duration;

use crate::config::MachineConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Run the machine for `cycles` control cycles.
    Run {
        cycles: u64,
        cadence: Duration,
        graphics: bool,
    },

    /// Flip the infinite-energy override.
    ToggleInfiniteEnergy,

    /// Rebuild the rig and counters from the current configuration.
    Reset,

    /// Emit a telemetry snapshot.
    Print,

    /// Replace the configuration and rebuild the rig.
    UpdateConfig(MachineConfig),
}
