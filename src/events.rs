//! Interrupt-to-main-loop signalling.
//!
//! Two paths cross the boundary between the periodic timer interrupt and
//! the control loop:
//!
//! ```text
//! ┌────────────────┐  raise (fetch_or)   ┌──────────────┐  take (fetch_and)  ┌───────────┐
//! │ switch sampler │────────────────────▶│ TankSignals  │───────────────────▶│           │
//! └────────────────┘                     └──────────────┘                    │ Main loop │
//! ┌────────────────┐  try_send           ┌──────────────┐  try_receive       │ (consumer)│
//! │ recirc. timer  │────────────────────▶│  TimerQueue  │───────────────────▶│           │
//! └────────────────┘                     └──────────────┘                    └───────────┘
//! ```
//!
//! The producer only ever sets bits and the consumer only ever clears the
//! bits it asked for, so an edge raised between two polls is never lost.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};
use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::sensors::float_switch::SwitchStates;

// ── Tank events ───────────────────────────────────────────────

/// Edge-triggered tank notifications, two bits per float-switch pair:
/// bit `2s` = pair `s` became empty, bit `2s + 1` = pair `s` became full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TankEvents(pub u8);

impl TankEvents {
    pub const NONE: Self = Self(0);

    pub const fn empty(slot: u8) -> Self {
        Self(1 << (2 * slot))
    }

    pub const fn full(slot: u8) -> Self {
        Self(1 << (2 * slot + 1))
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TankEvents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TankEvents {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for TankEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{:08b}", self.0)
    }
}

// ── Shared register ───────────────────────────────────────────

/// Event register and debounced switch states shared between the
/// sampler (writer) and the control loop (reader).
#[derive(Debug, Default)]
pub struct TankSignals {
    pending: AtomicU8,
    switches: AtomicU8,
}

impl TankSignals {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
            switches: AtomicU8::new(0),
        }
    }

    /// Producer side: accumulate events.
    pub fn raise(&self, events: TankEvents) {
        self.pending.fetch_or(events.0, Ordering::AcqRel);
    }

    /// Consumer side: return which of `mask` were pending and clear only those.
    pub fn take(&self, mask: TankEvents) -> TankEvents {
        TankEvents(self.pending.fetch_and(!mask.0, Ordering::AcqRel) & mask.0)
    }

    /// Consumer side: return and clear everything pending.
    pub fn take_all(&self) -> TankEvents {
        TankEvents(self.pending.swap(0, Ordering::AcqRel))
    }

    pub fn peek(&self) -> TankEvents {
        TankEvents(self.pending.load(Ordering::Acquire))
    }

    /// Producer side: publish the latest debounced switch states.
    pub fn publish_switches(&self, states: SwitchStates) {
        self.switches.store(states.0, Ordering::Release);
    }

    pub fn switch_states(&self) -> SwitchStates {
        SwitchStates(self.switches.load(Ordering::Acquire))
    }
}

// ── Timer events ──────────────────────────────────────────────

/// Events posted by the recirculation timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The on-period started.
    RecirculateOn,
    /// The off-period started.
    RecirculateOff,
}

/// Channel depth for timer events.
pub const TIMER_QUEUE_DEPTH: usize = 8;

/// Bounded timer-to-control-loop channel.
pub type TimerQueue = Channel<CriticalSectionRawMutex, TimerEvent, TIMER_QUEUE_DEPTH>;

/// Non-blocking post from timer context.  Returns `false` if the queue is
/// full and the event was dropped.
pub fn post_timer_event(queue: &TimerQueue, event: TimerEvent) -> bool {
    if queue.try_send(event).is_err() {
        warn!("timer queue full, dropped {event:?}");
        return false;
    }
    true
}
