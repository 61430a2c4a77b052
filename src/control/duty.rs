//! PWM duty cycle from the stage potentiometers.
//!
//! Duty is a pass-through side channel: it shapes how hard an enabled
//! device is driven and never feeds back into which device runs.

/// Duty applied when a profile does not use the potentiometers.
pub const FULL_DUTY: u8 = 100;

/// Map a raw 8-bit ADC reading to a 0–100 % duty cycle.
pub fn duty_from_adc(raw: u8) -> u8 {
    let duty = u16::from(raw) * 100 / 255;
    duty.min(u16::from(FULL_DUTY)) as u8
}
