//! Energy pool and the day/night recharge cycle.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battery {
    remaining: u32,
    max: u32,
}

impl Battery {
    /// Full battery of the given size.
    pub fn new(max: u32) -> Self {
        Self { remaining: max, max }
    }

    pub fn with_remaining(max: u32, remaining: u32) -> Self {
        Self {
            remaining: remaining.min(max),
            max,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Integer charge percentage.
    pub fn percent(&self) -> u32 {
        if self.max == 0 {
            return 0;
        }
        (u64::from(self.remaining) * 100 / u64::from(self.max)) as u32
    }

    /// Add energy, saturating at `max`.
    pub fn recharge(&mut self, amount: u32) {
        self.remaining = self.remaining.saturating_add(amount).min(self.max);
    }

    /// Draw `amount` if the pool covers it.  Returns `false` and leaves the
    /// pool untouched otherwise.
    pub fn drain(&mut self, amount: u32) -> bool {
        if amount > self.remaining {
            return false;
        }
        self.remaining -= amount;
        true
    }
}

/// Day/night toggle.  The rig starts at night and flips every half day.
#[derive(Debug, Clone, Copy)]
pub struct SolarCycle {
    cycles_per_day: u32,
    daytime: bool,
}

impl SolarCycle {
    pub fn new(cycles_per_day: u32) -> Self {
        Self {
            cycles_per_day: cycles_per_day.max(2),
            daytime: false,
        }
    }

    pub fn is_daytime(&self) -> bool {
        self.daytime
    }

    /// Advance to control cycle `cycle` (1-based).  Returns `true` when the
    /// sun came up or went down on this cycle.
    pub fn advance(&mut self, cycle: u64) -> bool {
        let half_day = u64::from(self.cycles_per_day / 2);
        if cycle > 0 && cycle % half_day == 0 {
            self.daytime = !self.daytime;
            debug!("solar: {}", if self.daytime { "sunrise" } else { "sunset" });
            return true;
        }
        false
    }
}
