//! Directed water-moving edges between tanks.

use heapless::String;

use super::TankId;

#[derive(Debug, Clone)]
pub struct Device {
    pub name: String<16>,
    pub enabled: bool,
    /// Units per cycle.
    pub flow_rate: u32,
    /// Energy per cycle.
    pub power: u32,
    /// `None` passes source turbidity through unmodified.
    pub output_turbidity_cap: Option<f32>,
    pub source: TankId,
    pub sink: TankId,
}

impl Device {
    pub fn new(name: &str, flow_rate: u32, power: u32, source: TankId, sink: TankId) -> Self {
        Self {
            name: String::try_from(name).unwrap_or_default(),
            enabled: false,
            flow_rate,
            power,
            output_turbidity_cap: None,
            source,
            sink,
        }
    }

    pub fn with_cap(mut self, cap: f32) -> Self {
        self.output_turbidity_cap = Some(cap);
        self
    }

    /// Turbidity of the water this device delivers given the source's.
    pub fn output_turbidity(&self, source_turbidity: f32) -> f32 {
        match self.output_turbidity_cap {
            Some(cap) if cap < source_turbidity => cap,
            _ => source_turbidity,
        }
    }

    /// A device whose source and sink are the same tank.
    pub fn is_loop(&self) -> bool {
        self.source == self.sink
    }
}
