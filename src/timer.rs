//! Recirculation timer.
//!
//! Alternates a short on-period and a long off-period independent of tank
//! levels.  The periodic timer interrupt calls [`RecirculationTimer::on_tick`];
//! phase changes cross into the control loop through the [`TimerQueue`].
//!
//! ```text
//!   arm()                on expiry                on expiry
//!    │  ┌──── ON (short) ────┐  ┌──── OFF (long) ────┐  ┌── ON ...
//!    ▼  │                    ▼  │                    ▼  │
//!  ─────┴────────────────────┴──┴────────────────────┴──┴────────
//!                   RecirculateOff           RecirculateOn
//! ```

use log::{debug, info};

use crate::events::{TimerEvent, TimerQueue, post_timer_event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    On,
    Off,
}

pub struct RecirculationTimer {
    on_cycles: u32,
    off_cycles: u32,
    armed: bool,
    phase: Phase,
    /// Ticks left in the current phase.
    remaining: u32,
    queue: TimerQueue,
}

impl RecirculationTimer {
    pub fn new(on_cycles: u32, off_cycles: u32) -> Self {
        Self {
            on_cycles: on_cycles.max(1),
            off_cycles: off_cycles.max(1),
            armed: false,
            phase: Phase::Off,
            remaining: 0,
            queue: TimerQueue::new(),
        }
    }

    /// Start in the on-phase.
    pub fn arm(&mut self) {
        self.drain();
        self.armed = true;
        self.phase = Phase::On;
        self.remaining = self.on_cycles;
        info!(
            "recirculation timer armed: {} on / {} off",
            self.on_cycles, self.off_cycles
        );
    }

    /// Stop toggling and drop any undelivered phase change.
    pub fn disarm(&mut self) {
        if self.armed {
            info!("recirculation timer disarmed");
        }
        self.armed = false;
        self.drain();
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Timer-interrupt entry point, once per cycle.
    pub fn on_tick(&mut self) {
        if !self.armed {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return;
        }

        let (next, event, period) = match self.phase {
            Phase::On => (Phase::Off, TimerEvent::RecirculateOff, self.off_cycles),
            Phase::Off => (Phase::On, TimerEvent::RecirculateOn, self.on_cycles),
        };
        self.phase = next;
        self.remaining = period;
        debug!("recirculation timer: {next:?} for {period}");
        post_timer_event(&self.queue, event);
    }

    /// Control-loop side: next pending phase change, if any.
    pub fn poll(&self) -> Option<TimerEvent> {
        self.queue.try_receive().ok()
    }

    fn drain(&self) {
        while self.queue.try_receive().is_ok() {}
    }
}
