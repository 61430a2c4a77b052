//! Float switches modelled from simulated tank quantities.
//!
//! The upper switch floats once a tank reaches the full percentage; the
//! lower one floats while the tank is above the low percentage (or holds
//! any water when no low percentage is configured).

use crate::app::ports::SwitchInput;
use crate::plant::Plant;

use super::float_switch::{SwitchStates, empty_switch, full_switch};

pub struct SimulatedSwitches<'a> {
    plant: &'a Plant,
    full_percent: f32,
    low_percent: Option<f32>,
}

impl<'a> SimulatedSwitches<'a> {
    pub fn new(plant: &'a Plant, full_percent: f32, low_percent: Option<f32>) -> Self {
        Self {
            plant,
            full_percent,
            low_percent,
        }
    }
}

impl SwitchInput for SimulatedSwitches<'_> {
    fn read_switches(&mut self) -> SwitchStates {
        let mut states = SwitchStates::default();
        for tank in self.plant.tanks() {
            let (Some(slot), Some(pct)) = (tank.switch_pair, tank.fill_percent()) else {
                continue;
            };
            let full_on = pct >= self.full_percent;
            let empty_on = match self.low_percent {
                Some(low) => pct > low,
                None => tank.quantity > 0,
            };
            states = states
                .with(full_switch(slot), full_on)
                .with(empty_switch(slot), empty_on);
        }
        states
    }
}
