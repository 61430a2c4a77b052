//! High power: every stage that can run does, each cycle.
//!
//! ```text
//!  IDLE ──[any stage available]──▶ RUN_PARALLEL ──[none available]──▶ IDLE
//! ```
//!
//! Stages start and stop independently inside `RunParallel`; each one's
//! duty follows its potentiometer.

use log::{debug, info};

use crate::config::PowerMode;
use crate::fsm::context::{FsmContext, Stage};
use crate::fsm::states::{self, guard};
use crate::fsm::{StateDescriptor, StateId};

use super::PowerProfile;

pub struct HighPower;

impl PowerProfile for HighPower {
    fn mode(&self) -> PowerMode {
        PowerMode::High
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
            StateDescriptor {
                id: StateId::RunParallel,
                name: "RunParallel",
                on_enter: Some(parallel_enter),
                on_exit: Some(parallel_exit),
                on_update: parallel_update,
            },
            states::recharge_descriptor(),
            states::unused_descriptor(StateId::RecirculateUv, "RecirculateUv"),
            states::fault_descriptor(),
        ]
    }

    fn fixed_duty(&self) -> Option<u8> {
        None
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
    ctx.select_stage().map(|_| StateId::RunParallel)
}

fn parallel_enter(ctx: &mut FsmContext) {
    for stage in Stage::PRIORITY {
        let _ = ctx.take_stop_edges(stage);
    }
    info!("RUN PARALLEL: battery {}%", ctx.battery_percent());
}

fn parallel_exit(ctx: &mut FsmContext) {
    ctx.disable_production();
}

fn parallel_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(next) = guard(ctx) {
        return Some(next);
    }

    // Stop edges are consumed once per cycle, before any stage moves water.
    let mut runnable = [false; Stage::PRIORITY.len()];
    for (slot, stage) in runnable.iter_mut().zip(Stage::PRIORITY) {
        let edged = ctx.take_stop_edges(stage);
        *slot = !edged && ctx.stage_available(stage);
        ctx.set_stage_enabled(stage, *slot);
    }

    if !runnable.contains(&true) {
        return Some(StateId::Idle);
    }

    // Stages share one battery: earlier stages may have spent what a later
    // one needs, so each is re-checked right before it runs.
    for (run, stage) in runnable.into_iter().zip(Stage::PRIORITY) {
        if !run {
            continue;
        }
        if ctx.stage_available(stage) {
            let moved = ctx.run_stage(stage);
            debug!("RUN PARALLEL: {stage} moved {moved}");
        } else {
            debug!("RUN PARALLEL: {stage} skipped, battery {}", ctx.plant.battery.remaining());
            ctx.set_stage_enabled(stage, false);
        }
    }
    None
}
