//! Machine service, the hexagonal core.
//!
//! [`MachineService`] owns the FSM, the active power profile, the safety
//! supervisor, the float-switch sampler and the shared context.  It exposes
//! a clean, hardware-agnostic API.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  SwitchInput ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  SensorPort  ──▶ │        MachineService        │ ──▶ FrameSink
//! ActuatorPort ◀── │ FSM · Profile · Safety · Mover│
//!                  └──────────────────────────────┘
//! ```

use core::time::Duration;
use std::sync::Arc;

use log::{info, warn};

use crate::config::MachineConfig;
use crate::control::duty::{FULL_DUTY, duty_from_adc};
use crate::error::ConfigError;
use crate::events::TankSignals;
use crate::fsm::context::{FsmContext, MachineStats};
use crate::fsm::{Fsm, StateId};
use crate::plant::{DeviceId, Plant};
use crate::profile::{PowerProfile, profile_for};
use crate::safety::SafetySupervisor;
use crate::sensors::float_switch::{FloatSwitchSampler, SwitchEvents};
use crate::sensors::simulated::SimulatedSwitches;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, EventSink, FrameSink, SensorPort, SwitchInput};

// ───────────────────────────────────────────────────────────────
// MachineService
// ───────────────────────────────────────────────────────────────

/// The machine service orchestrates all domain logic.
pub struct MachineService {
    fsm: Fsm,
    ctx: FsmContext,
    profile: Box<dyn PowerProfile + Send>,
    safety: SafetySupervisor,
    /// Debounces the simulated switches; hardware rigs sample from their
    /// own timer context via [`MachineService::switch_sampler`].
    sampler: FloatSwitchSampler,
    cycle: u64,
}

impl MachineService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`MachineService::start`] next.
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        Self::with_signals(config, Arc::new(TankSignals::new()))
    }

    /// As [`MachineService::new`], sharing an existing tank-event register
    /// with an interrupt-side sampler.
    pub fn with_signals(
        config: MachineConfig,
        signals: Arc<TankSignals>,
    ) -> Result<Self, ConfigError> {
        let ctx = FsmContext::with_signals(config, signals)?;
        let profile = profile_for(ctx.config.power_mode);
        let fsm = Fsm::new(profile.state_table(), StateId::Idle);
        let safety = SafetySupervisor::new(ctx.config.safety);
        let sampler = FloatSwitchSampler::new(ctx.config.debounce_period, ctx.signals.clone());

        Ok(Self {
            fsm,
            ctx,
            profile,
            safety,
            sampler,
            cycle: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in its initial state (Idle).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!(
            "MachineService started in {:?} ({:?} power)",
            self.fsm.current_state(),
            self.profile.mode()
        );
    }

    /// Rebuild the rig, counters and state machine from the current
    /// configuration.  The tank-event register is kept but cleared.
    pub fn reconfigure(&mut self) -> Result<(), ConfigError> {
        let signals = self.ctx.signals.clone();
        let _ = signals.take_all();
        signals.publish_switches(Default::default());

        let config = self.ctx.config.clone();
        *self = Self::with_signals(config, signals)?;
        self.fsm.start(&mut self.ctx);
        info!("rig reconfigured ({:?} power)", self.profile.mode());
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle:
    /// switches → sun → sensors → levels → safety → FSM → drain → counters
    /// → actuators.
    ///
    /// `hw` is read at step 3 and written at the end, so one value serves
    /// as both [`SensorPort`] and [`ActuatorPort`].
    pub fn tick(&mut self, hw: &mut (impl SensorPort + ActuatorPort), sink: &mut impl EventSink) {
        self.cycle += 1;
        let prev_state = self.fsm.current_state();

        // 1. Float switches from the simulated tanks
        let cfg = &self.ctx.config;
        for _ in 0..cfg.samples_per_cycle.unwrap_or(0) {
            let mut input =
                SimulatedSwitches::new(&self.ctx.plant, cfg.tank_full_percent, cfg.tank_low_percent);
            self.sampler.sample(&mut input);
        }

        // 2. Day/night recharge
        let recharge = self.ctx.config.recharge_per_cycle;
        self.ctx.plant.solar_recharge(self.cycle, recharge);

        // 3. Read analog sensors via SensorPort
        self.ctx.sensors = hw.read_all();

        // 4. Debounced levels become the authoritative tank levels
        let switches = self.ctx.signals.switch_states();
        for tank in self.ctx.plant.tanks_mut() {
            tank.sensed = tank.switch_pair.map(|slot| switches.level(slot));
        }

        // 5. Safety evaluation
        let had_faults = self.ctx.has_faults();
        let levels = self.ctx.plant.tanks().iter().filter_map(|tank| tank.sensed);
        let faults = self.safety.evaluate(levels, &self.ctx.sensors);
        self.ctx.fault_flags = faults;

        if faults != 0 && self.fsm.current_state() != StateId::Fault {
            warn!("safety: forcing Fault, flags 0b{faults:08b}");
            self.fsm.force_transition(StateId::Fault, &mut self.ctx);
            sink.emit(&AppEvent::FaultDetected(faults));
        } else if faults == 0 && had_faults {
            sink.emit(&AppEvent::FaultCleared);
        }

        // 6. Recirculation timer
        self.ctx.recirculation.on_tick();

        // 7. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);
        let state = self.fsm.current_state();

        // 8. Always-on drain layer
        if state == StateId::Fault {
            self.ctx.stop_drain();
        } else {
            self.ctx.service_drain();
        }

        // 9. Counters
        let stats = &mut self.ctx.stats;
        stats.total_cycles += 1;
        match state {
            StateId::Idle => stats.idle_cycles += 1,
            StateId::Recharge => stats.recharge_cycles += 1,
            StateId::Fault => stats.fault_cycles += 1,
            _ => {}
        }

        // 10. Apply device outputs via ActuatorPort
        self.apply_actuators(hw);

        // 11. Emit state change if the FSM moved
        if state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: state,
            });
        }
    }

    /// Run `cycles` control cycles, pausing `cadence` between them and
    /// rendering each one when `graphics` is set.  Returns the counters.
    pub fn run_machine(
        &mut self,
        cycles: u64,
        cadence: Duration,
        graphics: bool,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        frames: &mut impl FrameSink,
    ) -> MachineStats {
        info!("running {cycles} cycles, {cadence:?} per cycle");
        for n in 0..cycles {
            self.tick(hw, sink);
            if graphics {
                frames.render(self.fsm.current_state(), &self.ctx.plant, &self.ctx.stats);
            }
            if !cadence.is_zero() && n + 1 < cycles {
                std::thread::sleep(cadence);
            }
        }
        sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        self.ctx.stats
    }

    /// Sample a switch input once (hardware timer context or tests).
    pub fn sample_switches(&mut self, input: &mut impl SwitchInput) -> SwitchEvents {
        self.sampler.sample(input)
    }

    /// A sampler that feeds this service's tank-event register, for
    /// moving into a hardware timer context.
    pub fn switch_sampler(&self) -> FloatSwitchSampler {
        FloatSwitchSampler::new(self.ctx.config.debounce_period, self.ctx.signals.clone())
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        frames: &mut impl FrameSink,
    ) -> Result<(), ConfigError> {
        match cmd {
            AppCommand::Run {
                cycles,
                cadence,
                graphics,
            } => {
                self.run_machine(cycles, cadence, graphics, hw, sink, frames);
            }
            AppCommand::ToggleInfiniteEnergy => {
                let on = self.toggle_infinite_energy();
                sink.emit(&AppEvent::InfiniteEnergy(on));
            }
            AppCommand::Reset => {
                self.reconfigure()?;
                hw.all_off();
                sink.emit(&AppEvent::Started(self.fsm.current_state()));
            }
            AppCommand::Print => {
                sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
            }
            AppCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Configuration rejected: {e}");
                    return Err(e);
                }
                self.ctx.config = new_config;
                self.reconfigure()?;
                hw.all_off();
                info!("config: replaced, rig rebuilt");
                sink.emit(&AppEvent::Started(self.fsm.current_state()));
            }
        }
        Ok(())
    }

    /// Flip the infinite-energy override.  Returns the new setting.
    pub fn toggle_infinite_energy(&mut self) -> bool {
        let on = !self.ctx.policy.infinite_energy;
        self.ctx.policy.infinite_energy = on;
        self.ctx.config.infinite_energy = on;
        info!("infinite energy {}", if on { "ON" } else { "OFF" });
        on
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        let enabled_devices = self
            .ctx
            .plant
            .devices()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.enabled)
            .fold(0u16, |mask, (i, _)| mask | (1 << i));

        TelemetryData {
            state: self.fsm.current_state(),
            cycle: self.cycle,
            battery_percent: self.ctx.battery_percent(),
            water_purified: self.ctx.stats.water_purified,
            water_rejected: self.ctx.stats.water_rejected,
            enabled_devices,
            fault_flags: self.ctx.fault_flags,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Control cycles executed since the last reconfigure.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    pub fn battery_percent(&self) -> u32 {
        self.ctx.battery_percent()
    }

    pub fn plant(&self) -> &Plant {
        &self.ctx.plant
    }

    /// Direct access for operator tooling and tests.
    pub fn plant_mut(&mut self) -> &mut Plant {
        &mut self.ctx.plant
    }

    pub fn stats(&self) -> &MachineStats {
        &self.ctx.stats
    }

    pub fn config(&self) -> &MachineConfig {
        &self.ctx.config
    }

    pub fn signals(&self) -> &Arc<TankSignals> {
        &self.ctx.signals
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate device enable flags into port calls: exactly one enable
    /// write per device, plus its duty while enabled.
    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        let fixed = self.profile.fixed_duty();
        let halted = self.ctx.has_faults();

        for (i, device) in self.ctx.plant.devices().iter().enumerate() {
            let id = DeviceId(i);
            let enabled = device.enabled && !halted;
            hw.set_enable(id, enabled);
            if enabled {
                hw.set_duty(id, fixed.unwrap_or_else(|| self.pot_duty(id)));
            }
        }
    }

    /// Potentiometer duty for a stage device; devices outside the stages
    /// run flat out.
    fn pot_duty(&self, id: DeviceId) -> u8 {
        match self.ctx.pipeline.stage_of(id) {
            Some(stage) => duty_from_adc(self.ctx.sensors.potentiometers[stage.pot_index()]),
            None => FULL_DUTY,
        }
    }
}
