//! Tank bookkeeping and fill-level classification.

use serde::{Deserialize, Serialize};

/// Storage capacity of a tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capacity {
    /// Finite reservoir holding at most this many units.
    Bounded(u32),
    /// Infinite supply.  Never drains and absorbs inflow unchanged.
    Limitless,
    /// Discharge point.  Absorbs any inflow and never accumulates.
    Bottomless,
}

/// Fill level as reported by a float-switch pair or derived from quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TankLevel {
    Empty,
    Mid,
    Full,
    /// Full switch floating while the empty switch is not.  Impossible with
    /// correct wiring, so it is treated as a sensor fault.
    Undefined,
}

impl TankLevel {
    /// Classify a float-switch pair.  `empty_on` is the lower switch,
    /// `full_on` the upper one; a switch is "on" when it floats.
    pub fn from_switches(empty_on: bool, full_on: bool) -> Self {
        match (empty_on, full_on) {
            (false, false) => Self::Empty,
            (true, false) => Self::Mid,
            (true, true) => Self::Full,
            (false, true) => Self::Undefined,
        }
    }

    pub fn is_defined(self) -> bool {
        self != Self::Undefined
    }
}

#[derive(Debug, Clone)]
pub struct Tank {
    pub capacity: Capacity,
    pub quantity: u32,
    pub turbidity: f32,
    /// Float-switch pair wired to this tank.
    pub switch_pair: Option<u8>,
    /// Last debounced level from the float switches.  The policy combines
    /// it with the quantity-derived level.
    pub sensed: Option<TankLevel>,
}

impl Tank {
    pub fn bounded(volume: u32) -> Self {
        Self::new(Capacity::Bounded(volume), 0, 0.0)
    }

    pub fn limitless(turbidity: f32) -> Self {
        Self::new(Capacity::Limitless, 0, turbidity)
    }

    pub fn bottomless() -> Self {
        Self::new(Capacity::Bottomless, 0, 0.0)
    }

    pub fn new(capacity: Capacity, quantity: u32, turbidity: f32) -> Self {
        let quantity = match capacity {
            Capacity::Bounded(volume) => quantity.min(volume),
            Capacity::Limitless | Capacity::Bottomless => 0,
        };
        Self {
            capacity,
            quantity,
            turbidity,
            switch_pair: None,
            sensed: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        if let Capacity::Bounded(volume) = self.capacity {
            self.quantity = quantity.min(volume);
        }
        self
    }

    pub fn with_turbidity(mut self, turbidity: f32) -> Self {
        self.turbidity = turbidity;
        self
    }

    /// Units that can be drawn out right now.
    pub fn available(&self) -> u32 {
        match self.capacity {
            Capacity::Limitless => u32::MAX,
            Capacity::Bounded(_) | Capacity::Bottomless => self.quantity,
        }
    }

    /// Units that can still be poured in.
    pub fn room(&self) -> u32 {
        match self.capacity {
            Capacity::Bounded(volume) => volume.saturating_sub(self.quantity),
            Capacity::Limitless | Capacity::Bottomless => u32::MAX,
        }
    }

    /// Fill percentage of a bounded tank; `None` for unbounded ones.
    pub fn fill_percent(&self) -> Option<f32> {
        match self.capacity {
            Capacity::Bounded(volume) if volume > 0 => {
                Some(self.quantity as f32 * 100.0 / volume as f32)
            }
            _ => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self.capacity, Capacity::Bounded(_))
    }

    /// Level derived from quantity alone.  Unbounded tanks report `Mid`:
    /// they are never full and never empty.
    pub fn level_from_quantity(&self, full_percent: f32, low_percent: Option<f32>) -> TankLevel {
        let Some(pct) = self.fill_percent() else {
            return TankLevel::Mid;
        };
        if pct >= full_percent {
            TankLevel::Full
        } else if low_percent.is_some_and(|low| pct <= low) {
            TankLevel::Empty
        } else {
            TankLevel::Mid
        }
    }
}
