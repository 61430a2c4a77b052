//! State handlers shared by every power profile.
//!
//! Each state is defined by three plain `fn` pointers.  The profiles in
//! [`crate::profile`] assemble them, together with their own production
//! handlers, into a full table.
//!
//! ```text
//!  Any production state ──[battery < low]──▶ RECHARGE ──[battery ≥ full]──▶ IDLE
//!
//!  Any state ──[safety fault]──▶ FAULT ──[faults cleared]──▶ IDLE
//! ```

use log::{info, warn};

use super::context::{FsmContext, Stage};
use super::{StateDescriptor, StateId};

/// Precedence shared by every production state: faults first, then the
/// battery.
pub fn guard(ctx: &FsmContext) -> Option<StateId> {
    if ctx.has_faults() {
        return Some(StateId::Fault);
    }
    if ctx.battery_low() {
        return Some(StateId::Recharge);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  Descriptors
// ═══════════════════════════════════════════════════════════════════════════

pub fn recharge_descriptor() -> StateDescriptor {
    StateDescriptor {
        id: StateId::Recharge,
        name: "Recharge",
        on_enter: Some(recharge_enter),
        on_exit: Some(recharge_exit),
        on_update: recharge_update,
    }
}

pub fn fault_descriptor() -> StateDescriptor {
    StateDescriptor {
        id: StateId::Fault,
        name: "Fault",
        on_enter: Some(fault_enter),
        on_exit: Some(fault_exit),
        on_update: fault_update,
    }
}

/// Row for a state the profile never enters.  Falls back to Idle if it is
/// ever reached.
pub fn unused_descriptor(id: StateId, name: &'static str) -> StateDescriptor {
    StateDescriptor {
        id,
        name,
        on_enter: None,
        on_exit: None,
        on_update: unused_update,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Sequential RUN states (filter, RO, UV)
// ═══════════════════════════════════════════════════════════════════════════

pub fn stage_enter(ctx: &mut FsmContext, stage: Stage) {
    // Edges raised before the stage started describe a previous run.
    let _ = ctx.take_stop_edges(stage);
    ctx.set_stage_enabled(stage, true);
    info!("RUN {stage}: battery {}%", ctx.battery_percent());
}

pub fn stage_exit(ctx: &mut FsmContext, stage: Stage) {
    ctx.set_stage_enabled(stage, false);
}

/// Run `stage` while it stays available, otherwise hand over to the next
/// runnable stage in priority order.
pub fn stage_update(ctx: &mut FsmContext, stage: Stage) -> Option<StateId> {
    if let Some(next) = guard(ctx) {
        return Some(next);
    }

    let edged = ctx.take_stop_edges(stage);
    if !edged && ctx.stage_available(stage) {
        ctx.run_stage(stage);
        return None;
    }

    let next = Stage::PRIORITY
        .into_iter()
        .filter(|&s| s != stage)
        .find(|&s| ctx.stage_available(s));
    match next {
        Some(next) => info!("RUN {stage}: stopped, next {next}"),
        None => info!("RUN {stage}: stopped, nothing runnable"),
    }
    Some(next.map_or(StateId::Idle, Stage::state))
}

pub fn run_filter_enter(ctx: &mut FsmContext) {
    stage_enter(ctx, Stage::Filter);
}

pub fn run_filter_exit(ctx: &mut FsmContext) {
    stage_exit(ctx, Stage::Filter);
}

pub fn run_filter_update(ctx: &mut FsmContext) -> Option<StateId> {
    stage_update(ctx, Stage::Filter)
}

pub fn run_ro_enter(ctx: &mut FsmContext) {
    stage_enter(ctx, Stage::ReverseOsmosis);
}

pub fn run_ro_exit(ctx: &mut FsmContext) {
    stage_exit(ctx, Stage::ReverseOsmosis);
}

pub fn run_ro_update(ctx: &mut FsmContext) -> Option<StateId> {
    stage_update(ctx, Stage::ReverseOsmosis)
}

pub fn run_uv_enter(ctx: &mut FsmContext) {
    stage_enter(ctx, Stage::Uv);
}

pub fn run_uv_exit(ctx: &mut FsmContext) {
    stage_exit(ctx, Stage::Uv);
}

pub fn run_uv_update(ctx: &mut FsmContext) -> Option<StateId> {
    stage_update(ctx, Stage::Uv)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RECIRCULATE_UV state: timer-driven loop on the terminal tank
// ═══════════════════════════════════════════════════════════════════════════

pub fn recirculate_enter(ctx: &mut FsmContext) {
    ctx.recirculation.arm();
    if let Some(id) = ctx.pipeline.recirculate {
        ctx.plant.set_enabled(id, true);
    }
    info!("RECIRCULATE: terminal tank {:?}", ctx.terminal_level());
}

pub fn recirculate_exit(ctx: &mut FsmContext) {
    ctx.recirculation.disarm();
    if let Some(id) = ctx.pipeline.recirculate {
        ctx.plant.set_enabled(id, false);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  RECHARGE state: production halted until the battery recovers
// ═══════════════════════════════════════════════════════════════════════════

fn recharge_enter(ctx: &mut FsmContext) {
    ctx.disable_production();
    ctx.recirculation.disarm();
    info!(
        "RECHARGE: battery at {}%, holding until {}%",
        ctx.battery_percent(),
        ctx.config.battery_full_percent
    );
}

fn recharge_exit(ctx: &mut FsmContext) {
    info!("RECHARGE: battery recovered to {}%", ctx.battery_percent());
}

fn recharge_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.has_faults() {
        return Some(StateId::Fault);
    }
    if ctx.battery_recovered() {
        return Some(StateId::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULT state: safety fault, every device disabled
// ═══════════════════════════════════════════════════════════════════════════

fn fault_enter(ctx: &mut FsmContext) {
    // Kill everything immediately, the drain included.
    ctx.plant.disable_all();
    ctx.recirculation.disarm();
    warn!(
        "FAULT: all devices disabled, fault_flags=0b{:08b}",
        ctx.fault_flags
    );
}

fn fault_exit(_ctx: &mut FsmContext) {
    info!("FAULT: faults cleared, resuming normal operation");
}

fn fault_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Stay in Fault until ALL faults are cleared
    if !ctx.has_faults() {
        return Some(StateId::Idle);
    }
    ctx.plant.disable_all();
    None
}

fn unused_update(ctx: &mut FsmContext) -> Option<StateId> {
    warn!(
        "state not part of the {:?} profile, returning to Idle",
        ctx.config.power_mode
    );
    Some(StateId::Idle)
}
