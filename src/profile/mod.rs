//! Power profiles.
//!
//! A profile is a state table plus a duty policy.  All three share the
//! engine in [`crate::fsm`], the availability policy and the water mover;
//! they differ only in which transitions their handlers take.
//!
//! | Profile   | Production                          | Duty            |
//! |-----------|-------------------------------------|-----------------|
//! | High      | every available stage per cycle     | potentiometers  |
//! | Mid       | one stage at a time, by priority    | fixed 100%      |
//! | Low       | UV recirculation only               | fixed 100%      |

mod high;
mod low;
mod mid;

pub use high::HighPower;
pub use low::LowPower;
pub use mid::MidPower;

use crate::config::PowerMode;
use crate::fsm::{StateDescriptor, StateId};

pub trait PowerProfile {
    fn mode(&self) -> PowerMode;

    /// Build the state table.  Called once per (re)configuration.
    fn state_table(&self) -> [StateDescriptor; StateId::COUNT];

    /// Duty applied to every enabled device, or `None` when each stage
    /// follows its potentiometer.
    fn fixed_duty(&self) -> Option<u8>;
}

/// Profile for the configured power mode.
pub fn profile_for(mode: PowerMode) -> Box<dyn PowerProfile + Send> {
    match mode {
        PowerMode::High => Box::new(HighPower),
        PowerMode::Mid => Box::new(MidPower),
        PowerMode::Low => Box::new(LowPower),
    }
}
