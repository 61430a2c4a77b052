//! Float-switch debouncing and tank event mapping.
//!
//! Each tank carries two float switches: a FULL switch near the top and an
//! EMPTY switch near the bottom.  Pair `s` uses switch `2s` (full) and
//! switch `2s + 1` (empty).
//!
//! ## Debounce rule
//!
//! The debouncer keeps the last `period + 1` samples.  Switch `n` has a real
//! edge when the newest `period` samples of `n` agree and the oldest one
//! differs.  A lone glitch never satisfies this, and a genuine step is
//! reported exactly once, `period` samples after it happened.  An edge back
//! to the level already held is not reported, so a glitch that ages out of
//! the window stays silent.  Each switch is judged on its own bit so
//! activity on one tank cannot mask an edge on another.

use std::sync::Arc;

use heapless::Deque;
use log::debug;

use crate::app::ports::SwitchInput;
use crate::events::{TankEvents, TankSignals};
use crate::plant::tank::TankLevel;

pub const MAX_SWITCH_PAIRS: usize = 4;
pub const MAX_SWITCHES: usize = MAX_SWITCH_PAIRS * 2;
pub const MAX_DEBOUNCE_PERIOD: usize = 15;

const WINDOW_CAPACITY: usize = MAX_DEBOUNCE_PERIOD + 1;

pub const fn full_switch(slot: u8) -> usize {
    2 * slot as usize
}

pub const fn empty_switch(slot: u8) -> usize {
    2 * slot as usize + 1
}

// ── Switch states ─────────────────────────────────────────────

/// One bit per switch, set when the switch floats (is "on").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchStates(pub u8);

impl SwitchStates {
    pub fn is_on(self, switch: usize) -> bool {
        self.0 & (1 << switch) != 0
    }

    #[must_use]
    pub fn with(self, switch: usize, on: bool) -> Self {
        if on {
            Self(self.0 | (1 << switch))
        } else {
            Self(self.0 & !(1 << switch))
        }
    }

    /// Level of the tank wired to pair `slot`.
    pub fn level(self, slot: u8) -> TankLevel {
        TankLevel::from_switches(
            self.is_on(empty_switch(slot)),
            self.is_on(full_switch(slot)),
        )
    }
}

// ── Switch events ─────────────────────────────────────────────

/// Bit `2n` = switch `n` turned on, bit `2n + 1` = switch `n` turned off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchEvents(pub u16);

impl SwitchEvents {
    pub const fn on(switch: usize) -> Self {
        Self(1 << (2 * switch))
    }

    pub const fn off(switch: usize) -> Self {
        Self(1 << (2 * switch + 1))
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Full switch on means the tank filled; empty switch off means it drained.
    pub fn to_tank_events(self) -> TankEvents {
        let mut events = TankEvents::NONE;
        for slot in 0..MAX_SWITCH_PAIRS as u8 {
            if self.contains(Self::on(full_switch(slot))) {
                events |= TankEvents::full(slot);
            }
            if self.contains(Self::off(empty_switch(slot))) {
                events |= TankEvents::empty(slot);
            }
        }
        events
    }
}

// ── Debouncer ─────────────────────────────────────────────────

pub struct FloatSwitchDebouncer {
    period: usize,
    /// Oldest sample at the front.
    history: Deque<u8, WINDOW_CAPACITY>,
    stable: SwitchStates,
}

impl FloatSwitchDebouncer {
    /// History starts with every switch open.
    pub fn new(period: usize) -> Self {
        let period = period.clamp(1, MAX_DEBOUNCE_PERIOD);
        let mut history = Deque::new();
        for _ in 0..=period {
            let _ = history.push_back(0);
        }
        Self {
            period,
            history,
            stable: SwitchStates::default(),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Debounced switch states.
    pub fn stable(&self) -> SwitchStates {
        self.stable
    }

    /// Shift in one raw sample and report the edges it completes.
    pub fn sample(&mut self, raw: SwitchStates) -> SwitchEvents {
        if self.history.len() > self.period {
            self.history.pop_front();
        }
        let _ = self.history.push_back(raw.0);

        let (Some(&oldest), Some(&newest)) = (self.history.front(), self.history.back()) else {
            return SwitchEvents::default();
        };

        let mut events = SwitchEvents::default();
        let changed = oldest ^ newest;
        for switch in 0..MAX_SWITCHES {
            if changed & (1 << switch) == 0 {
                continue;
            }
            let level = newest & (1 << switch);
            let settled = self
                .history
                .iter()
                .skip(1)
                .all(|s| s & (1 << switch) == level);
            let on = level != 0;
            if !settled || self.stable.is_on(switch) == on {
                continue;
            }

            self.stable = self.stable.with(switch, on);
            events.0 |= if on {
                SwitchEvents::on(switch).0
            } else {
                SwitchEvents::off(switch).0
            };
        }

        if !events.is_empty() {
            debug!("float switches: edges 0b{:016b}", events.0);
        }
        events
    }
}

// ── Sampler (timer-interrupt side) ────────────────────────────

/// Samples a [`SwitchInput`] on each timer tick and publishes the results
/// into the shared [`TankSignals`].  Owns nothing the control loop touches
/// directly, so it can be moved into the timer context.
pub struct FloatSwitchSampler {
    debouncer: FloatSwitchDebouncer,
    signals: Arc<TankSignals>,
}

impl FloatSwitchSampler {
    pub fn new(period: usize, signals: Arc<TankSignals>) -> Self {
        Self {
            debouncer: FloatSwitchDebouncer::new(period),
            signals,
        }
    }

    pub fn sample(&mut self, input: &mut impl SwitchInput) -> SwitchEvents {
        let events = self.debouncer.sample(input.read_switches());
        let tank_events = events.to_tank_events();
        if !tank_events.is_empty() {
            self.signals.raise(tank_events);
        }
        self.signals.publish_switches(self.debouncer.stable());
        events
    }
}
