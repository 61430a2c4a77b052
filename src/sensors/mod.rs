//! Sensor inputs.
//!
//! Float switches are sampled on the timer tick and debounced in
//! [`float_switch`].  Analog readings (conductivity, dissolved oxygen,
//! pressure) arrive already converted from their bus drivers and are
//! gathered into a [`SensorSnapshot`] once per control cycle.

pub mod float_switch;
pub mod simulated;

/// A point-in-time snapshot of every analog sensor.  `None` means the
/// sensor is not fitted; a missing reading never raises a fault.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Product water conductivity (µS/cm).
    pub conductivity: Option<f32>,
    /// Dissolved oxygen (mg/L).
    pub dissolved_oxygen: Option<f32>,
    /// Microfilter inlet pressure (psi).
    pub microfilter_psi: Option<f32>,
    /// RO membrane inlet pressure (psi).
    pub ro_psi: Option<f32>,
    /// Raw 8-bit duty potentiometers for the filter, RO and UV stages.
    pub potentiometers: [u8; 3],
}
