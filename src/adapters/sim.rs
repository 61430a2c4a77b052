//! Host simulation adapter.
//!
//! Stands in for the analog sensor buses and the device output lines when
//! the controller runs on a workstation.  Readings are whatever the
//! operator (or a test) set; outputs are recorded.

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::plant::{DeviceId, MAX_DEVICES};
use crate::sensors::SensorSnapshot;

/// Simulated sensors and device outputs.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    /// Returned verbatim by `read_all`.
    pub readings: SensorSnapshot,
    enabled: [bool; MAX_DEVICES],
    duty: [u8; MAX_DEVICES],
}

impl SimulatedRig {
    /// A quiet rig: no analog faults, all potentiometers at full scale.
    pub fn new() -> Self {
        Self {
            readings: SensorSnapshot {
                potentiometers: [u8::MAX; 3],
                ..SensorSnapshot::default()
            },
            enabled: [false; MAX_DEVICES],
            duty: [0; MAX_DEVICES],
        }
    }

    pub fn is_enabled(&self, device: DeviceId) -> bool {
        self.enabled.get(device.0).copied().unwrap_or(false)
    }

    pub fn duty(&self, device: DeviceId) -> u8 {
        self.duty.get(device.0).copied().unwrap_or(0)
    }
}

impl Default for SimulatedRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for SimulatedRig {
    fn read_all(&mut self) -> SensorSnapshot {
        self.readings
    }
}

impl ActuatorPort for SimulatedRig {
    fn set_enable(&mut self, device: DeviceId, enabled: bool) {
        if let Some(slot) = self.enabled.get_mut(device.0) {
            *slot = enabled;
        }
        if !enabled {
            if let Some(duty) = self.duty.get_mut(device.0) {
                *duty = 0;
            }
        }
    }

    fn set_duty(&mut self, device: DeviceId, duty: u8) {
        if let Some(slot) = self.duty.get_mut(device.0) {
            *slot = duty.min(100);
        }
    }

    fn all_off(&mut self) {
        self.enabled = [false; MAX_DEVICES];
        self.duty = [0; MAX_DEVICES];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_outputs() {
        let mut rig = SimulatedRig::new();
        rig.set_enable(DeviceId(2), true);
        rig.set_duty(DeviceId(2), 150);
        assert!(rig.is_enabled(DeviceId(2)));
        assert_eq!(rig.duty(DeviceId(2)), 100);

        rig.set_enable(DeviceId(2), false);
        assert_eq!(rig.duty(DeviceId(2)), 0);

        rig.set_enable(DeviceId(1), true);
        rig.all_off();
        assert!(!rig.is_enabled(DeviceId(1)));
    }

    #[test]
    fn out_of_range_device_is_ignored() {
        let mut rig = SimulatedRig::new();
        rig.set_enable(DeviceId(MAX_DEVICES + 3), true);
        assert!(!rig.is_enabled(DeviceId(MAX_DEVICES + 3)));
    }
}
