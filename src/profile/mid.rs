//! Mid power: the sequential pipeline.
//!
//! ```text
//!         ┌────────────────[stage available]──────────────┐
//!         │                                               ▼
//!  IDLE ──┴─▶ RUN_FILTER ──▶ RUN_RO ──▶ RUN_UV ──▶ (next by priority) ──▶ IDLE
//!    │                                                          ▲
//!    └──[nothing runnable, terminal tank FULL]──▶ RECIRCULATE_UV ┘ [terminal not FULL]
//! ```

use log::info;

use crate::config::PowerMode;
use crate::control::duty::FULL_DUTY;
use crate::fsm::context::FsmContext;
use crate::fsm::states::{self, guard};
use crate::fsm::{StateDescriptor, StateId};

use super::PowerProfile;

pub struct MidPower;

impl PowerProfile for MidPower {
    fn mode(&self) -> PowerMode {
        PowerMode::Mid
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
            StateDescriptor {
                id: StateId::RunFilter,
                name: "RunFilter",
                on_enter: Some(states::run_filter_enter),
                on_exit: Some(states::run_filter_exit),
                on_update: states::run_filter_update,
            },
            StateDescriptor {
                id: StateId::RunReverseOsmosis,
                name: "RunReverseOsmosis",
                on_enter: Some(states::run_ro_enter),
                on_exit: Some(states::run_ro_exit),
                on_update: states::run_ro_update,
            },
            StateDescriptor {
                id: StateId::RunUv,
                name: "RunUv",
                on_enter: Some(states::run_uv_enter),
                on_exit: Some(states::run_uv_exit),
                on_update: states::run_uv_update,
            },
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
    info!("IDLE: battery {}%", ctx.battery_percent());
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(next) = guard(ctx) {
        return Some(next);
    }
    if let Some(stage) = ctx.select_stage() {
        return Some(stage.state());
    }
    if ctx.recirculation_wanted() {
        return Some(StateId::RecirculateUv);
    }
    None
}

fn recirculate_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(next) = guard(ctx) {
        return Some(next);
    }
    if !ctx.terminal_full() {
        info!("RECIRCULATE: terminal tank drawn down, back to the pipeline");
        return Some(StateId::Idle);
    }
    ctx.service_recirculation();
    None
}
