//! Interlocks evaluated once per cycle, ahead of the state machine.
//!
//! Each interlock owns one bit of the fault word.  A bit is set while its
//! condition holds and dropped as soon as it stops holding:
//!
//! ```text
//!   float pair reads full-but-not-empty ─┐
//!   conductivity / DO over limit ────────┼──► fault word ──► Fault state
//!   microfilter / RO pressure over limit ┘        │
//!                                                 └─ 0 ──► back to Idle
//! ```
//!
//! Readings a rig does not carry (`None`) never fault.  Nothing escalates
//! and nothing gives up; the rig sits in `Fault` until the word is zero.

use log::{error, info};

use crate::config::SafetyLimits;
use crate::error::SafetyFault;
use crate::plant::tank::TankLevel;
use crate::sensors::SensorSnapshot;

pub struct SafetySupervisor {
    limits: SafetyLimits,
    faults: u8,
}

impl SafetySupervisor {
    pub fn new(limits: SafetyLimits) -> Self {
        Self { limits, faults: 0 }
    }

    /// Re-check every interlock and return the new fault word.
    pub fn evaluate(
        &mut self,
        levels: impl IntoIterator<Item = TankLevel>,
        snap: &SensorSnapshot,
    ) -> u8 {
        // ── Float switches ────────────────────────────────────────
        let undefined = levels.into_iter().any(|level| !level.is_defined());
        self.eval_fault(SafetyFault::TankLevelUndefined, undefined);

        // ── Water quality ─────────────────────────────────────────
        self.eval_fault(
            SafetyFault::ConductivityHigh,
            above(snap.conductivity, self.limits.max_conductivity),
        );
        self.eval_fault(
            SafetyFault::DissolvedOxygenHigh,
            above(snap.dissolved_oxygen, self.limits.max_dissolved_oxygen),
        );

        // ── Pressure ──────────────────────────────────────────────
        self.eval_fault(
            SafetyFault::MicrofilterPressureHigh,
            above(snap.microfilter_psi, self.limits.max_microfilter_psi),
        );
        self.eval_fault(
            SafetyFault::RoPressureHigh,
            above(snap.ro_psi, self.limits.max_ro_psi),
        );

        self.faults
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    fn eval_fault(&mut self, fault: SafetyFault, active: bool) {
        let was = self.has_fault(fault);
        match (was, active) {
            (false, true) => error!("safety: {fault} raised"),
            (true, false) => info!("safety: {fault} resolved"),
            _ => {}
        }
        if active {
            self.faults |= fault.mask();
        } else {
            self.faults &= !fault.mask();
        }
    }
}

fn above(reading: Option<f32>, limit: f32) -> bool {
    reading.is_some_and(|value| value > limit)
}
