//! Device availability.
//!
//! A device may run this cycle iff its sink has room, its source has water
//! and the battery covers its consumption.  The energy check is bypassed
//! entirely under the infinite-energy override.
//!
//! A tank with a float-switch pair is judged by both its debounced level
//! and its quantity against the configured percentages; whichever is more
//! restrictive wins.  Unbounded tanks are never full and never empty.

use crate::config::MachineConfig;
use crate::plant::battery::Battery;
use crate::plant::device::Device;
use crate::plant::tank::{Capacity, Tank, TankLevel};
use crate::plant::{DeviceId, Plant};

#[derive(Debug, Clone, Copy)]
pub struct AvailabilityPolicy {
    pub full_percent: f32,
    pub low_percent: Option<f32>,
    pub infinite_energy: bool,
}

impl AvailabilityPolicy {
    pub fn from_config(config: &MachineConfig) -> Self {
        Self {
            full_percent: config.tank_full_percent,
            low_percent: config.tank_low_percent,
            infinite_energy: config.infinite_energy,
        }
    }

    /// Current level of `tank`: the debounced switch reading when one is
    /// wired, otherwise the quantity-derived level.
    pub fn level(&self, tank: &Tank) -> TankLevel {
        if tank.is_bounded() {
            if let Some(sensed) = tank.sensed {
                return sensed;
            }
        }
        self.quantity_level(tank)
    }

    fn quantity_level(&self, tank: &Tank) -> TankLevel {
        tank.level_from_quantity(self.full_percent, self.low_percent)
    }

    /// True when `tank` cannot accept more water.  Either the switches or
    /// the fill percentage saying full is enough.
    pub fn is_full(&self, tank: &Tank) -> bool {
        match tank.capacity {
            Capacity::Limitless | Capacity::Bottomless => false,
            Capacity::Bounded(_) => {
                matches!(tank.sensed, Some(TankLevel::Full | TankLevel::Undefined))
                    || self.quantity_level(tank) == TankLevel::Full
            }
        }
    }

    /// True when `tank` can supply water.  Either the switches or the fill
    /// percentage saying empty is enough to refuse.
    pub fn has_water(&self, tank: &Tank) -> bool {
        match tank.capacity {
            Capacity::Limitless => true,
            Capacity::Bottomless => false,
            Capacity::Bounded(_) => {
                let sensed_dry = matches!(tank.sensed, Some(TankLevel::Empty | TankLevel::Undefined));
                let measured_dry =
                    self.low_percent.is_some() && self.quantity_level(tank) == TankLevel::Empty;
                !sensed_dry && !measured_dry
            }
        }
    }

    pub fn has_energy(&self, device: &Device, battery: &Battery) -> bool {
        self.infinite_energy || device.power <= battery.remaining()
    }

    pub fn is_available(&self, device: &Device, plant: &Plant) -> bool {
        !self.is_full(plant.tank(device.sink))
            && self.has_water(plant.tank(device.source))
            && self.has_energy(device, &plant.battery)
    }

    pub fn is_device_available(&self, id: DeviceId, plant: &Plant) -> bool {
        self.is_available(plant.device(id), plant)
    }
}
