//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It owns the plant (tanks, devices, battery), the availability
//! policy, the pipeline roles, the recirculation timer and the run
//! counters.  Think of it as the "blackboard" in a blackboard architecture.

use std::sync::Arc;

use log::{debug, info};

use crate::config::{MachineConfig, PipelineConfig};
use crate::error::{ConfigError, SafetyFault};
use crate::events::{TankEvents, TankSignals, TimerEvent};
use crate::plant::tank::TankLevel;
use crate::plant::{DeviceId, MAX_DEVICES, Plant};
use crate::policy::AvailabilityPolicy;
use crate::sensors::SensorSnapshot;
use crate::timer::RecirculationTimer;

use super::StateId;

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// A production stage of the pipeline, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filter,
    ReverseOsmosis,
    Uv,
}

impl Stage {
    /// Upstream first.
    pub const PRIORITY: [Self; 3] = [Self::Filter, Self::ReverseOsmosis, Self::Uv];

    /// The sequential run state for this stage.
    pub fn state(self) -> StateId {
        match self {
            Self::Filter => StateId::RunFilter,
            Self::ReverseOsmosis => StateId::RunReverseOsmosis,
            Self::Uv => StateId::RunUv,
        }
    }

    /// Index of the stage's duty potentiometer.
    pub fn pot_index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Filter => write!(f, "FILTER"),
            Self::ReverseOsmosis => write!(f, "RO"),
            Self::Uv => write!(f, "UV"),
        }
    }
}

/// Device roles resolved from [`PipelineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    pub filter: DeviceId,
    pub reverse_osmosis: DeviceId,
    pub ro_reject: Option<DeviceId>,
    pub uv: DeviceId,
    pub drain: Option<DeviceId>,
    pub recirculate: Option<DeviceId>,
}

impl Pipeline {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            filter: DeviceId(cfg.filter),
            reverse_osmosis: DeviceId(cfg.reverse_osmosis),
            ro_reject: cfg.ro_reject.map(DeviceId),
            uv: DeviceId(cfg.uv),
            drain: cfg.drain.map(DeviceId),
            recirculate: cfg.recirculate.map(DeviceId),
        }
    }

    /// The device that gates a stage.
    pub fn primary(&self, stage: Stage) -> DeviceId {
        match stage {
            Stage::Filter => self.filter,
            Stage::ReverseOsmosis => self.reverse_osmosis,
            Stage::Uv => self.uv,
        }
    }

    /// A device that runs in lockstep with the stage, if any.
    pub fn companion(&self, stage: Stage) -> Option<DeviceId> {
        match stage {
            Stage::ReverseOsmosis => self.ro_reject,
            Stage::Filter | Stage::Uv => None,
        }
    }

    /// The stage a device belongs to, if it belongs to one.
    pub fn stage_of(&self, id: DeviceId) -> Option<Stage> {
        Stage::PRIORITY
            .into_iter()
            .find(|&s| self.primary(s) == id || self.companion(s) == Some(id))
    }
}

// ---------------------------------------------------------------------------
// Run counters
// ---------------------------------------------------------------------------

/// Cycle and volume counters accumulated since the last reconfigure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineStats {
    pub total_cycles: u64,
    pub idle_cycles: u64,
    pub recharge_cycles: u64,
    pub fault_cycles: u64,
    /// Cycles each device actually ran, indexed by `DeviceId`.
    pub device_active_cycles: [u64; MAX_DEVICES],
    /// Volume delivered by the UV stage.
    pub water_purified: u64,
    /// Volume sent to waste by the RO reject line.
    pub water_rejected: u64,
}

impl MachineStats {
    pub fn active_cycles(&self, id: DeviceId) -> u64 {
        self.device_active_cycles.get(id.0).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Rig --
    pub plant: Plant,
    pub policy: AvailabilityPolicy,
    pub pipeline: Pipeline,
    pub config: MachineConfig,

    // -- Events --
    /// Tank-event register shared with the switch sampler.
    pub signals: Arc<TankSignals>,
    pub recirculation: RecirculationTimer,

    // -- Sensor data --
    /// Latest analog readings.  Updated before each FSM tick.
    pub sensors: SensorSnapshot,

    pub stats: MachineStats,

    // -- Safety --
    /// Accumulated safety fault bitmask (see `SafetyFault::mask()`).
    /// Set by the safety supervisor, read by state handlers.
    pub fault_flags: u8,
}

impl FsmContext {
    /// Validate `config` and build the rig it describes.
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        Self::with_signals(config, Arc::new(TankSignals::new()))
    }

    /// As [`FsmContext::new`], sharing an existing event register.
    pub fn with_signals(
        config: MachineConfig,
        signals: Arc<TankSignals>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let plant = Plant::from_config(&config)?;
        Ok(Self {
            ticks_in_state: 0,
            total_ticks: 0,
            plant,
            policy: AvailabilityPolicy::from_config(&config),
            pipeline: Pipeline::from_config(&config.pipeline),
            recirculation: RecirculationTimer::new(
                config.recirculate_on_cycles,
                config.recirculate_off_cycles,
            ),
            config,
            signals,
            sensors: SensorSnapshot::default(),
            stats: MachineStats::default(),
            fault_flags: 0,
        })
    }

    /// Returns `true` if **any** safety fault is active.
    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }

    /// Check whether a specific fault flag is set.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.fault_flags & fault.mask() != 0
    }

    // ── Energy ────────────────────────────────────────────────

    pub fn battery_percent(&self) -> u32 {
        self.plant.battery.percent()
    }

    /// Below the low threshold: production must stop.
    pub fn battery_low(&self) -> bool {
        !self.policy.infinite_energy
            && self.battery_percent() < u32::from(self.config.battery_low_percent)
    }

    /// At or above the full threshold: recharge may end.
    pub fn battery_recovered(&self) -> bool {
        self.policy.infinite_energy
            || self.battery_percent() >= u32::from(self.config.battery_full_percent)
    }

    // ── Stages ────────────────────────────────────────────────

    pub fn stage_available(&self, stage: Stage) -> bool {
        self.policy
            .is_device_available(self.pipeline.primary(stage), &self.plant)
    }

    /// Highest-priority stage that can run this cycle.
    pub fn select_stage(&self) -> Option<Stage> {
        Stage::PRIORITY
            .into_iter()
            .find(|&stage| self.stage_available(stage))
    }

    pub fn set_stage_enabled(&mut self, stage: Stage, enabled: bool) {
        self.plant.set_enabled(self.pipeline.primary(stage), enabled);
        if let Some(companion) = self.pipeline.companion(stage) {
            self.plant.set_enabled(companion, enabled);
        }
    }

    /// Disable every production stage and the recirculation loop.  The
    /// drain is left to its own layer.
    pub fn disable_production(&mut self) {
        for stage in Stage::PRIORITY {
            self.set_stage_enabled(stage, false);
        }
        if let Some(recirculate) = self.pipeline.recirculate {
            self.plant.set_enabled(recirculate, false);
        }
    }

    /// Run one cycle of `stage` and its companion.  Returns the volume the
    /// primary device moved; an unpaid primary moves nothing and keeps the
    /// companion still.
    pub fn run_stage(&mut self, stage: Stage) -> u32 {
        let Some(moved) = self.run_device(self.pipeline.primary(stage)) else {
            return 0;
        };
        if stage == Stage::Uv {
            self.stats.water_purified += u64::from(moved);
        }

        if let Some(companion) = self.pipeline.companion(stage) {
            if self.policy.is_device_available(companion, &self.plant) {
                if let Some(rejected) = self.run_device(companion) {
                    self.stats.water_rejected += u64::from(rejected);
                }
            }
        }
        moved
    }

    /// Run a single device for one cycle.  Only paid runs are counted as
    /// active.
    pub fn run_device(&mut self, id: DeviceId) -> Option<u32> {
        let moved = self.plant.run_device(id, self.policy.infinite_energy)?;
        if let Some(count) = self.stats.device_active_cycles.get_mut(id.0) {
            *count += 1;
        }
        Some(moved)
    }

    // ── Tank events ───────────────────────────────────────────

    /// Events that stop `stage`: its source reporting EMPTY or its sink
    /// reporting FULL.
    pub fn stop_mask(&self, stage: Stage) -> TankEvents {
        let device = self.plant.device(self.pipeline.primary(stage));
        let mut mask = TankEvents::NONE;
        if let Some(slot) = self.plant.tank(device.source).switch_pair {
            mask |= TankEvents::empty(slot);
        }
        if let Some(slot) = self.plant.tank(device.sink).switch_pair {
            mask |= TankEvents::full(slot);
        }
        mask
    }

    /// Consume any pending stop edge for `stage`.
    pub fn take_stop_edges(&self, stage: Stage) -> bool {
        let taken = self.signals.take(self.stop_mask(stage));
        if !taken.is_empty() {
            debug!("{stage}: stop edge {taken}");
        }
        !taken.is_empty()
    }

    // ── Recirculation ─────────────────────────────────────────

    /// Level of the tank the UV stage fills.
    pub fn terminal_level(&self) -> TankLevel {
        let uv = self.plant.device(self.pipeline.uv);
        self.policy.level(self.plant.tank(uv.sink))
    }

    /// True when the terminal tank cannot take more water.
    pub fn terminal_full(&self) -> bool {
        let uv = self.plant.device(self.pipeline.uv);
        self.policy.is_full(self.plant.tank(uv.sink))
    }

    /// True when the pipeline has stalled on a full terminal tank and a
    /// recirculation loop can take over.
    pub fn recirculation_wanted(&self) -> bool {
        self.pipeline.recirculate.is_some()
            && self.terminal_full()
            && self.select_stage().is_none()
    }

    /// Apply pending timer phase changes, then run the loop if it is on.
    pub fn service_recirculation(&mut self) {
        let Some(id) = self.pipeline.recirculate else {
            return;
        };

        while let Some(event) = self.recirculation.poll() {
            let on = event == TimerEvent::RecirculateOn;
            info!("RECIRCULATE: {}", if on { "on" } else { "off" });
            self.plant.set_enabled(id, on);
        }

        let device = self.plant.device(id);
        if device.enabled
            && self.policy.has_energy(device, &self.plant.battery)
            && self.policy.has_water(self.plant.tank(device.source))
        {
            self.run_device(id);
        }
    }

    // ── Drain ─────────────────────────────────────────────────

    /// The always-on terminal drain: runs whenever it is available,
    /// independent of the machine state.
    pub fn service_drain(&mut self) {
        let Some(id) = self.pipeline.drain else {
            return;
        };
        let available = self.policy.is_device_available(id, &self.plant);
        self.plant.set_enabled(id, available);
        if available {
            self.run_device(id);
        }
    }

    pub fn stop_drain(&mut self) {
        if let Some(id) = self.pipeline.drain {
            self.plant.set_enabled(id, false);
        }
    }
}
