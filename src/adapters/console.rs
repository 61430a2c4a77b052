//! ASCII frame renderer for the simulator's graphics mode.
//!
//! ```text
//!  cycle 42  RunFilter  battery 87%
//!  T0 ~~~~~~~~~~~~~~~~~~~~  ∞      t=5.00
//!  T1 ██████████░░░░░░░░░░  12/25  t=3.00
//!  ...
//! ```

use std::io::Write;

use crate::app::ports::FrameSink;
use crate::fsm::StateId;
use crate::fsm::context::MachineStats;
use crate::plant::Plant;
use crate::plant::tank::{Capacity, Tank};

const BAR_WIDTH: usize = 20;

/// Writes one frame per cycle to any `Write` (stdout in the simulator).
pub struct ConsoleFrames<W: Write> {
    out: W,
}

impl<W: Write> ConsoleFrames<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, state: StateId, plant: &Plant, stats: &MachineStats) -> std::io::Result<()> {
        writeln!(
            self.out,
            "cycle {:>5}  {:<18} battery {:>3}%  purified {}  rejected {}",
            stats.total_cycles,
            format!("{state:?}"),
            plant.battery.percent(),
            stats.water_purified,
            stats.water_rejected,
        )?;
        for (i, tank) in plant.tanks().iter().enumerate() {
            writeln!(self.out, " T{i} {}  t={:.2}", tank_bar(tank), tank.turbidity)?;
        }
        let devices: String = plant
            .devices()
            .iter()
            .map(|d| if d.enabled { '●' } else { '○' })
            .collect();
        writeln!(self.out, " devices {devices}")?;
        self.out.flush()
    }
}

impl<W: Write> FrameSink for ConsoleFrames<W> {
    fn render(&mut self, state: StateId, plant: &Plant, stats: &MachineStats) {
        if let Err(e) = self.write_frame(state, plant, stats) {
            log::warn!("frame dropped: {e}");
        }
    }
}

fn tank_bar(tank: &Tank) -> String {
    match tank.capacity {
        Capacity::Limitless => format!("{}  source", "~".repeat(BAR_WIDTH)),
        Capacity::Bottomless => format!("{}  sink", " ".repeat(BAR_WIDTH)),
        Capacity::Bounded(volume) => {
            let filled = if volume == 0 {
                0
            } else {
                ((tank.quantity as usize * BAR_WIDTH) / volume as usize).min(BAR_WIDTH)
            };
            format!(
                "{}{}  {}/{}",
                "█".repeat(filled),
                "░".repeat(BAR_WIDTH - filled),
                tank.quantity,
                volume
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;

    #[test]
    fn renders_every_tank() {
        let mut plant = Plant::from_config(&MachineConfig::default()).unwrap();
        plant.tanks_mut()[1].quantity = 10;
        let mut frames = ConsoleFrames::new(Vec::new());
        frames.render(StateId::RunFilter, &plant, &MachineStats::default());

        let text = String::from_utf8(frames.into_inner()).unwrap();
        assert!(text.contains("RunFilter"));
        assert!(text.contains("10/25"));
        assert_eq!(text.lines().count(), 1 + plant.tanks().len() + 1);
    }

    #[test]
    fn bar_is_fixed_width() {
        let tank = Tank::bounded(25).with_quantity(25);
        assert!(tank_bar(&tank).starts_with(&"█".repeat(BAR_WIDTH)));
    }
}
