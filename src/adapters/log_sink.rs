//! [`EventSink`] that turns every event into one log line on
//! the `log` facade (env_logger in the simulator, the board logger on a
//! real rig).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | cycle={} state={:?} | battery={}% | purified={} rejected={} | \
                     devices=0b{:010b} | faults=0b{:08b}",
                    t.cycle,
                    t.state,
                    t.battery_percent,
                    t.water_purified,
                    t.water_rejected,
                    t.enabled_devices,
                    t.fault_flags,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from:?} => {to:?}");
            }
            AppEvent::FaultDetected(flags) => {
                warn!("FAULT | raised 0b{flags:08b}");
            }
            AppEvent::FaultCleared => {
                info!("FAULT | clear");
            }
            AppEvent::Started(state) => {
                info!("START | {state:?}");
            }
            AppEvent::InfiniteEnergy(on) => {
                info!("ENERGY | infinite={on}");
            }
        }
    }
}
