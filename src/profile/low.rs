//! Low power: only the UV recirculation loop runs, toggled by its timer.
//!
//! ```text
//!  IDLE ──[loop configured]──▶ RECIRCULATE_UV
//! ```
//!
//! Tank levels never end the loop; only a fault or a low battery does.

use log::{info, warn};

use crate::config::PowerMode;
use crate::control::duty::FULL_DUTY;
use crate::fsm::context::FsmContext;
use crate::fsm::states::{self, guard};
use crate::fsm::{StateDescriptor, StateId};

use super::PowerProfile;

pub struct LowPower;

impl PowerProfile for LowPower {
    fn mode(&self) -> PowerMode {
        PowerMode::Low
    }

    fn state_table(&self) -> [StateDescriptor; StateId::COUNT] {
        [
            StateDescriptor {
                id: StateId::Idle,
                name: "Idle",
                on_enter: Some(idle_enter),
                on_exit: None,
                on_update: idle_update,
            },
            states::unused_descriptor(StateId::RunFilter, "RunFilter"),
            states::unused_descriptor(StateId::RunReverseOsmosis, "RunReverseOsmosis"),
            states::unused_descriptor(StateId::RunUv, "RunUv"),
            states::unused_descriptor(StateId::RunParallel, "RunParallel"),
            states::recharge_descriptor(),
            StateDescriptor {
                id: StateId::RecirculateUv,
                name: "RecirculateUv",
                on_enter: Some(states::recirculate_enter),
                on_exit: Some(states::recirculate_exit),
                on_update: recirculate_update,
            },
            states::fault_descriptor(),
        ]
    }

    fn fixed_duty(&self) -> Option<u8> {
        Some(FULL_DUTY)
    }
}

fn idle_enter(ctx: &mut FsmContext) {
    ctx.disable_production();
    if ctx.pipeline.recirculate.is_none() {
        warn!("IDLE: no recirculation device configured, low power has nothing to run");
    } else {
        info!("IDLE: battery {}%", ctx.battery_percent());
    }
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(next) = guard(ctx) {
        return Some(next);
    }
    ctx.pipeline.recirculate.map(|_| StateId::RecirculateUv)
}

fn recirculate_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(next) = guard(ctx) {
        return Some(next);
    }
    ctx.service_recirculation();
    None
}
