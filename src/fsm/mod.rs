//! Table-driven state machine.
//!
//! ```text
//!   power profile ──► [StateDescriptor; StateId::COUNT]
//!
//!            ┌──────────────── tick ────────────────┐
//!            ▼                                      │
//!     on_update(current) ── None ──► stay ──────────┤
//!            │                                      │
//!        Some(next)                                 │
//!            ▼                                      │
//!     on_exit(current) ─► current = next ─► on_enter(next)
//! ```
//!
//! Rows are plain function pointers over a shared [`FsmContext`], so a
//! profile is nothing more than a different table.  One row is current at
//! any time, which is what keeps the single-stage profiles from ever
//! running two stages at once.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ── States ────────────────────────────────────────────────────

/// Machine states.  The discriminant is the row index in every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    RunFilter = 1,
    RunReverseOsmosis = 2,
    RunUv = 3,
    /// Every available stage at once (high power).
    RunParallel = 4,
    Recharge = 5,
    RecirculateUv = 6,
    Fault = 7,
}

impl StateId {
    pub const COUNT: usize = 8;

    const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::RunFilter,
        Self::RunReverseOsmosis,
        Self::RunUv,
        Self::RunParallel,
        Self::Recharge,
        Self::RecirculateUv,
        Self::Fault,
    ];

    /// Row index back to a state.  Out-of-range indices map to `Fault`
    /// (and trip a debug assertion).
    pub fn from_index(idx: usize) -> Self {
        debug_assert!(idx < Self::COUNT, "no state at row {idx}");
        Self::ALL.get(idx).copied().unwrap_or(Self::Fault)
    }

    /// True for the sequential single-stage states.
    pub fn is_run_stage(self) -> bool {
        matches!(self, Self::RunFilter | Self::RunReverseOsmosis | Self::RunUv)
    }
}

// ── Table rows ────────────────────────────────────────────────

/// Entry or exit hook.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-cycle handler; `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ── Engine ────────────────────────────────────────────────────

pub struct Fsm {
    rows: [StateDescriptor; StateId::COUNT],
    current: StateId,
    cycles: u64,
    entered_at: u64,
}

impl Fsm {
    pub fn new(rows: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            rows.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            rows,
            current: initial,
            cycles: 0,
            entered_at: 0,
        }
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.rows[id as usize]
    }

    /// Enter the initial state.  Must precede the first [`tick`](Self::tick).
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("fsm: start in {}", self.current_name());
        if let Some(enter) = self.row(self.current).on_enter {
            enter(ctx);
        }
    }

    /// One control cycle: run the current row's update and follow any
    /// transition it asks for.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.cycles += 1;
        ctx.total_ticks = self.cycles;
        ctx.ticks_in_state = self.ticks_in_current_state();

        if let Some(next) = (self.row(self.current).on_update)(ctx) {
            self.force_transition(next, ctx);
        }
    }

    /// Transition without consulting `on_update`.  Requesting the current
    /// state does nothing.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next == self.current {
            return;
        }
        info!("fsm: {} -> {}", self.current_name(), self.row(next).name);

        if let Some(exit) = self.row(self.current).on_exit {
            exit(ctx);
        }
        self.current = next;
        self.entered_at = self.cycles;
        ctx.ticks_in_state = 0;
        if let Some(enter) = self.row(next).on_enter {
            enter(ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn current_name(&self) -> &'static str {
        self.row(self.current).name
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.cycles - self.entered_at
    }
}
