//! Machine configuration parameters
//!
//! Describes the rig (tanks, devices, pipeline roles) and every tunable
//! threshold of the controller.  The default is the reference rig: an
//! unlimited source, three 25-unit buffer tanks and a bottomless sink.
//! The simulator can override it from a JSON file.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::plant::tank::Capacity;
use crate::plant::{MAX_DEVICES, MAX_TANKS};
use crate::sensors::float_switch::{MAX_DEBOUNCE_PERIOD, MAX_SWITCH_PAIRS};

/// Which state table drives the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerMode {
    /// Every available stage runs concurrently, potentiometer duty.
    High,
    /// One stage at a time in priority order.
    Mid,
    /// Timer-driven UV recirculation only.
    Low,
}

/// One tank of the rig.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankConfig {
    pub capacity: Capacity,
    /// Initial quantity (ignored for unbounded tanks).
    pub quantity: u32,
    pub turbidity: f32,
    /// Float-switch pair wired to this tank, if any.
    pub float_switches: Option<u8>,
}

/// One water-moving device of the rig.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String<16>,
    /// Units moved per cycle.
    pub flow_rate: u32,
    /// Energy drawn per cycle.
    pub power: u32,
    /// Maximum turbidity of the output; `None` passes the source through.
    pub output_turbidity_cap: Option<f32>,
    /// Index into `tanks`.
    pub source: usize,
    /// Index into `tanks`.
    pub sink: usize,
}

/// Device indices for each pipeline role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub filter: usize,
    pub reverse_osmosis: usize,
    /// Runs in lockstep with the RO stage.
    pub ro_reject: Option<usize>,
    pub uv: usize,
    /// Always-on terminal drain.
    pub drain: Option<usize>,
    /// UV recirculation loop on the terminal tank.
    pub recirculate: Option<usize>,
}

/// Analog limits above which the rig halts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Product water conductivity (µS/cm).
    pub max_conductivity: f32,
    /// Dissolved oxygen (mg/L).
    pub max_dissolved_oxygen: f32,
    /// Microfilter inlet pressure (psi).
    pub max_microfilter_psi: f32,
    /// RO membrane inlet pressure (psi).
    pub max_ro_psi: f32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_conductivity: 150.0,
            max_dissolved_oxygen: 150.0,
            max_microfilter_psi: 40.5,
            max_ro_psi: 90.0,
        }
    }
}

/// Core machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    pub power_mode: PowerMode,

    // --- Rig ---
    pub tanks: Vec<TankConfig, MAX_TANKS>,
    pub devices: Vec<DeviceConfig, MAX_DEVICES>,
    pub pipeline: PipelineConfig,

    // --- Tank thresholds ---
    /// Fill percentage at or above which a tank counts as full.
    pub tank_full_percent: f32,
    /// Fill percentage at or below which a tank counts as empty.
    /// `None` disables the source check entirely.
    pub tank_low_percent: Option<f32>,

    // --- Energy ---
    pub battery_capacity: u32,
    /// Energy gained per daytime cycle.
    pub recharge_per_cycle: u32,
    /// Cycles in one day/night period.
    pub cycles_per_day: u32,
    /// Below this the machine drops into Recharge.
    pub battery_low_percent: u8,
    /// Recharge is held until this is reached.
    pub battery_full_percent: u8,
    /// Bypass every energy check and drain.
    pub infinite_energy: bool,

    // --- Float switches ---
    /// Consecutive stable samples required before an edge is trusted.
    pub debounce_period: usize,
    /// Simulated switch samples taken per control cycle.  Must exceed
    /// `debounce_period` so levels settle within the cycle.  `None` when a
    /// board samples the real switches from its own timer through
    /// `MachineService::switch_sampler`.
    pub samples_per_cycle: Option<u32>,

    // --- Recirculation ---
    pub recirculate_on_cycles: u32,
    pub recirculate_off_cycles: u32,

    pub safety: SafetyLimits,
}

impl Default for MachineConfig {
    fn default() -> Self {
        let mut tanks = Vec::new();
        let mut devices = Vec::new();
        for tank in default_tanks() {
            let _ = tanks.push(tank);
        }
        for device in default_devices() {
            let _ = devices.push(device);
        }

        Self {
            power_mode: PowerMode::Mid,
            tanks,
            devices,
            pipeline: PipelineConfig {
                filter: 0,
                reverse_osmosis: 1,
                ro_reject: Some(2),
                uv: 3,
                drain: Some(4),
                recirculate: Some(5),
            },

            tank_full_percent: 90.0,
            tank_low_percent: Some(5.0),

            battery_capacity: 1000,
            recharge_per_cycle: 10,
            cycles_per_day: 24,
            battery_low_percent: 20,
            battery_full_percent: 90,
            infinite_energy: false,

            debounce_period: 4,
            samples_per_cycle: Some(5),

            recirculate_on_cycles: 3,
            recirculate_off_cycles: 5,

            safety: SafetyLimits::default(),
        }
    }
}

fn default_tanks() -> [TankConfig; 5] {
    let buffer = |slot| TankConfig {
        capacity: Capacity::Bounded(25),
        quantity: 0,
        turbidity: 0.0,
        float_switches: Some(slot),
    };
    [
        TankConfig {
            capacity: Capacity::Limitless,
            quantity: 0,
            turbidity: 5.0,
            float_switches: None,
        },
        buffer(0),
        buffer(1),
        buffer(2),
        TankConfig {
            capacity: Capacity::Bottomless,
            quantity: 0,
            turbidity: 0.0,
            float_switches: None,
        },
    ]
}

fn default_devices() -> [DeviceConfig; 6] {
    let device = |name: &str, flow_rate, power, cap, source, sink| DeviceConfig {
        name: String::try_from(name).unwrap_or_default(),
        flow_rate,
        power,
        output_turbidity_cap: cap,
        source,
        sink,
    };
    [
        device("filter", 15, 10, Some(3.0), 0, 1),
        device("ro", 2, 10, Some(0.3), 1, 2),
        device("ro-reject", 8, 0, None, 1, 4),
        device("uv", 100, 50, None, 2, 3),
        device("drain", 50, 0, None, 3, 4),
        device("recirculate", 10, 20, None, 3, 3),
    ]
}

impl MachineConfig {
    /// Reject configurations the controller cannot run safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.tank_full_percent) || self.tank_full_percent == 0.0 {
            return Err(ConfigError::ValidationFailed(
                "tank_full_percent must be in (0, 100]",
            ));
        }
        if let Some(low) = self.tank_low_percent {
            if !(0.0..self.tank_full_percent).contains(&low) {
                return Err(ConfigError::ValidationFailed(
                    "tank_low_percent must be in [0, tank_full_percent)",
                ));
            }
        }
        if self.battery_capacity == 0 {
            return Err(ConfigError::ValidationFailed("battery_capacity must be non-zero"));
        }
        if self.battery_full_percent > 100 || self.battery_low_percent >= self.battery_full_percent
        {
            return Err(ConfigError::ValidationFailed(
                "battery thresholds need low < full <= 100",
            ));
        }
        if self.cycles_per_day < 2 {
            return Err(ConfigError::ValidationFailed("cycles_per_day must be at least 2"));
        }
        if self.debounce_period == 0 || self.debounce_period > MAX_DEBOUNCE_PERIOD {
            return Err(ConfigError::ValidationFailed("debounce_period out of range"));
        }
        if self
            .samples_per_cycle
            .is_some_and(|samples| samples as usize <= self.debounce_period)
        {
            return Err(ConfigError::ValidationFailed(
                "samples_per_cycle must exceed debounce_period",
            ));
        }
        if self.recirculate_on_cycles == 0 || self.recirculate_off_cycles == 0 {
            return Err(ConfigError::ValidationFailed(
                "recirculation periods must be non-zero",
            ));
        }

        let mut slots_seen = 0u8;
        for tank in &self.tanks {
            if let Capacity::Bounded(volume) = tank.capacity {
                if volume == 0 {
                    return Err(ConfigError::ValidationFailed("bounded tank with zero volume"));
                }
                if tank.quantity > volume {
                    return Err(ConfigError::ValidationFailed("tank quantity above volume"));
                }
            }
            if !tank.turbidity.is_finite() || tank.turbidity < 0.0 {
                return Err(ConfigError::ValidationFailed("tank turbidity must be >= 0"));
            }
            if let Some(slot) = tank.float_switches {
                if usize::from(slot) >= MAX_SWITCH_PAIRS {
                    return Err(ConfigError::ValidationFailed("float switch slot out of range"));
                }
                if slots_seen & (1 << slot) != 0 {
                    return Err(ConfigError::ValidationFailed("float switch slot used twice"));
                }
                slots_seen |= 1 << slot;
            }
        }

        for device in &self.devices {
            if device.source >= self.tanks.len() || device.sink >= self.tanks.len() {
                return Err(ConfigError::ValidationFailed("device references unknown tank"));
            }
            if let Some(cap) = device.output_turbidity_cap {
                if !cap.is_finite() || cap < 0.0 {
                    return Err(ConfigError::ValidationFailed(
                        "output_turbidity_cap must be >= 0",
                    ));
                }
            }
        }

        let p = &self.pipeline;
        let roles = [
            Some(p.filter),
            Some(p.reverse_osmosis),
            p.ro_reject,
            Some(p.uv),
            p.drain,
            p.recirculate,
        ];
        let mut roles_seen = 0u16;
        for idx in roles.into_iter().flatten() {
            if idx >= self.devices.len() {
                return Err(ConfigError::ValidationFailed("pipeline references unknown device"));
            }
            if roles_seen & (1 << idx) != 0 {
                return Err(ConfigError::ValidationFailed("device assigned two pipeline roles"));
            }
            roles_seen |= 1 << idx;
        }

        Ok(())
    }
}

// ── Persisted form ────────────────────────────────────────────

impl MachineConfig {
    /// Compact postcard encoding for boards that keep the config in flash.
    pub fn to_bytes(&self) -> Result<std::vec::Vec<u8>, ConfigError> {
        self.validate()?;
        postcard::to_allocvec(self).map_err(|_| ConfigError::Corrupted)
    }

    /// Decode and validate a config written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}
