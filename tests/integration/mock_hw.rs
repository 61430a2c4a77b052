//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.

use waterlab::app::events::AppEvent;
use waterlab::app::ports::{ActuatorPort, EventSink, FrameSink, SensorPort, SwitchInput};
use waterlab::fsm::StateId;
use waterlab::fsm::context::MachineStats;
use waterlab::plant::{DeviceId, Plant};
use waterlab::sensors::SensorSnapshot;
use waterlab::sensors::float_switch::SwitchStates;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetEnable { device: DeviceId, enabled: bool },
    SetDuty { device: DeviceId, duty: u8 },
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    /// Returned by every `read_all`.
    pub readings: SensorSnapshot,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            readings: SensorSnapshot {
                potentiometers: [255; 3],
                ..SensorSnapshot::default()
            },
        }
    }

    /// Last enable written for `device`, `false` if never written or
    /// after an `AllOff`.
    pub fn is_enabled(&self, device: DeviceId) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetEnable { device: d, enabled } if *d == device => Some(*enabled),
                ActuatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Last duty written for `device`.
    pub fn duty(&self, device: DeviceId) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::SetDuty { device: d, duty } if *d == device => Some(*duty),
            _ => None,
        })
    }

    pub fn enable_writes(&self, device: DeviceId) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::SetEnable { device: d, .. } if *d == device))
            .count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn set_enable(&mut self, device: DeviceId, enabled: bool) {
        self.calls.push(ActuatorCall::SetEnable { device, enabled });
    }

    fn set_duty(&mut self, device: DeviceId, duty: u8) {
        self.calls.push(ActuatorCall::SetDuty { device, duty });
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self) -> SensorSnapshot {
        self.readings
    }
}

// ── Scripted float switches ───────────────────────────────────

/// Returns the same raw switch word on every read.
pub struct FixedSwitches(pub SwitchStates);

impl SwitchInput for FixedSwitches {
    fn read_switches(&mut self) -> SwitchStates {
        self.0
    }
}

// ── Event sink ────────────────────────────────────────────────

pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn transitions(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Frame sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct CountingFrames {
    pub frames: Vec<(StateId, u64)>,
}

impl FrameSink for CountingFrames {
    fn render(&mut self, state: StateId, _plant: &Plant, stats: &MachineStats) {
        self.frames.push((state, stats.total_cycles));
    }
}
