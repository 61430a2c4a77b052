//! The physical rig: tanks, devices and the battery.
//!
//! ```text
//!   source ──filter──▶ T1 ──ro──▶ T2 ──uv──▶ T3 ──drain──▶ sink
//!                       └──ro-reject──────────────────────▶ sink
//! ```
//!
//! Tanks and devices live in fixed-capacity arenas.  Devices refer to
//! tanks by [`TankId`], so any number of devices can share a tank without
//! aliasing.  Ids are checked when a device is added; indexing with an id
//! from another plant panics.

pub mod battery;
pub mod device;
pub mod tank;
pub mod water;

use heapless::Vec;
use log::debug;

use crate::config::MachineConfig;
use crate::error::ConfigError;
use battery::{Battery, SolarCycle};
use device::Device;
use tank::Tank;

pub const MAX_TANKS: usize = 8;
pub const MAX_DEVICES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TankId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub usize);

pub struct Plant {
    tanks: Vec<Tank, MAX_TANKS>,
    devices: Vec<Device, MAX_DEVICES>,
    pub battery: Battery,
    pub solar: SolarCycle,
}

impl Plant {
    pub fn new(battery: Battery, solar: SolarCycle) -> Self {
        Self {
            tanks: Vec::new(),
            devices: Vec::new(),
            battery,
            solar,
        }
    }

    /// Build the rig described by `config`.
    pub fn from_config(config: &MachineConfig) -> Result<Self, ConfigError> {
        let mut plant = Self::new(
            Battery::new(config.battery_capacity),
            SolarCycle::new(config.cycles_per_day),
        );

        for entry in &config.tanks {
            let mut tank = Tank::new(entry.capacity, entry.quantity, entry.turbidity);
            tank.switch_pair = entry.float_switches;
            plant.add_tank(tank)?;
        }

        for entry in &config.devices {
            let mut device = Device::new(
                entry.name.as_str(),
                entry.flow_rate,
                entry.power,
                TankId(entry.source),
                TankId(entry.sink),
            );
            device.output_turbidity_cap = entry.output_turbidity_cap;
            plant.add_device(device)?;
        }

        Ok(plant)
    }

    pub fn add_tank(&mut self, tank: Tank) -> Result<TankId, ConfigError> {
        self.tanks
            .push(tank)
            .map_err(|_| ConfigError::TooManyTanks)?;
        Ok(TankId(self.tanks.len() - 1))
    }

    pub fn add_device(&mut self, device: Device) -> Result<DeviceId, ConfigError> {
        if device.source.0 >= self.tanks.len() || device.sink.0 >= self.tanks.len() {
            return Err(ConfigError::ValidationFailed("device references unknown tank"));
        }
        self.devices
            .push(device)
            .map_err(|_| ConfigError::TooManyDevices)?;
        Ok(DeviceId(self.devices.len() - 1))
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn tank(&self, id: TankId) -> &Tank {
        &self.tanks[id.0]
    }

    pub fn tank_mut(&mut self, id: TankId) -> &mut Tank {
        &mut self.tanks[id.0]
    }

    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.0]
    }

    pub fn device_mut(&mut self, id: DeviceId) -> &mut Device {
        &mut self.devices[id.0]
    }

    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn tanks_mut(&mut self) -> &mut [Tank] {
        &mut self.tanks
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device_ids(&self) -> impl Iterator<Item = DeviceId> + use<> {
        (0..self.devices.len()).map(DeviceId)
    }

    // ── Operations ────────────────────────────────────────────

    pub fn set_enabled(&mut self, id: DeviceId, enabled: bool) {
        self.devices[id.0].enabled = enabled;
    }

    pub fn disable_all(&mut self) {
        for device in &mut self.devices {
            device.enabled = false;
        }
    }

    /// Run one device for one cycle: pay its energy, then move its flow.
    /// Returns the amount moved, or `None` when the pool cannot cover the
    /// device (nothing moves).  The override skips payment.
    pub fn run_device(&mut self, id: DeviceId, infinite_energy: bool) -> Option<u32> {
        let device = &self.devices[id.0];
        let (source, sink, flow, power) = (device.source, device.sink, device.flow_rate, device.power);
        let incoming = device.output_turbidity(self.tanks[source.0].turbidity);

        if !infinite_energy && !self.battery.drain(power) {
            debug!(
                "{}: needs {power}, battery has {}",
                self.devices[id.0].name,
                self.battery.remaining()
            );
            return None;
        }

        let moved = if source == sink {
            water::recirculate(&mut self.tanks[source.0], flow, incoming)
        } else {
            let (from, to) = self.pair_mut(source, sink);
            water::transfer(from, to, flow, incoming)
        };
        debug!("{}: moved {moved}", self.devices[id.0].name);
        Some(moved)
    }

    /// Recharge from the sun if it is daytime on this cycle.
    pub fn solar_recharge(&mut self, cycle: u64, amount: u32) {
        self.solar.advance(cycle);
        if self.solar.is_daytime() {
            self.battery.recharge(amount);
        }
    }

    fn pair_mut(&mut self, a: TankId, b: TankId) -> (&mut Tank, &mut Tank) {
        debug_assert_ne!(a, b);
        if a.0 < b.0 {
            let (lo, hi) = self.tanks.split_at_mut(b.0);
            (&mut lo[a.0], &mut hi[0])
        } else {
            let (lo, hi) = self.tanks.split_at_mut(a.0);
            (&mut hi[0], &mut lo[b.0])
        }
    }
}
