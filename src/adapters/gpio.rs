//! embedded-hal adapters for a physical rig.
//!
//! Each device has an enable line and, optionally, a PWM channel.  Float
//! switches are open-drain to ground with pull-ups, so a closed switch
//! reads low.
//!
//! Pin errors never reach the control loop: they are logged and the
//! output is left as the HAL left it.  The next cycle writes every line
//! again.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;
use log::warn;

use crate::app::ports::{ActuatorPort, SwitchInput};
use crate::error::{Error, Result};
use crate::plant::{DeviceId, MAX_DEVICES};
use crate::sensors::float_switch::{MAX_SWITCHES, SwitchStates};

// ── Device outputs ────────────────────────────────────────────

/// Enable line plus optional PWM channel for one device.
pub struct DeviceLine<P, W> {
    enable: P,
    pwm: Option<W>,
}

impl<P: OutputPin, W: SetDutyCycle> DeviceLine<P, W> {
    pub fn new(enable: P, pwm: Option<W>) -> Self {
        Self { enable, pwm }
    }
}

/// Device outputs indexed by `DeviceId`.
pub struct GpioActuators<P, W> {
    lines: Vec<DeviceLine<P, W>, MAX_DEVICES>,
}

impl<P: OutputPin, W: SetDutyCycle> GpioActuators<P, W> {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Attach the next device's line; the first call wires `DeviceId(0)`.
    pub fn add(&mut self, line: DeviceLine<P, W>) -> Result<DeviceId> {
        self.lines
            .push(line)
            .map_err(|_| Error::Hardware("too many device lines"))?;
        Ok(DeviceId(self.lines.len() - 1))
    }

    fn write_enable(&mut self, device: DeviceId, enabled: bool) -> Result<()> {
        let line = self
            .lines
            .get_mut(device.0)
            .ok_or(Error::Hardware("unwired device"))?;
        line.enable
            .set_state(PinState::from(enabled))
            .map_err(|_| Error::Hardware("enable line"))
    }

    fn write_duty(&mut self, device: DeviceId, duty: u8) -> Result<()> {
        let line = self
            .lines
            .get_mut(device.0)
            .ok_or(Error::Hardware("unwired device"))?;
        match line.pwm.as_mut() {
            Some(pwm) => pwm
                .set_duty_cycle_percent(duty.min(100))
                .map_err(|_| Error::Hardware("pwm channel")),
            None => Ok(()),
        }
    }
}

impl<P: OutputPin, W: SetDutyCycle> Default for GpioActuators<P, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin, W: SetDutyCycle> ActuatorPort for GpioActuators<P, W> {
    fn set_enable(&mut self, device: DeviceId, enabled: bool) {
        if let Err(e) = self.write_enable(device, enabled) {
            warn!("device {}: {e}", device.0);
        }
        if !enabled {
            if let Err(e) = self.write_duty(device, 0) {
                warn!("device {}: {e}", device.0);
            }
        }
    }

    fn set_duty(&mut self, device: DeviceId, duty: u8) {
        if let Err(e) = self.write_duty(device, duty) {
            warn!("device {}: {e}", device.0);
        }
    }

    fn all_off(&mut self) {
        for i in 0..self.lines.len() {
            self.set_enable(DeviceId(i), false);
        }
    }
}

// ── Float switches ────────────────────────────────────────────

/// Switch inputs indexed by switch number (`2s` full, `2s + 1` empty).
pub struct GpioSwitches<I> {
    pins: Vec<I, MAX_SWITCHES>,
}

impl<I: InputPin> GpioSwitches<I> {
    pub fn new() -> Self {
        Self { pins: Vec::new() }
    }

    pub fn add(&mut self, pin: I) -> Result<usize> {
        self.pins
            .push(pin)
            .map_err(|_| Error::Hardware("too many switch inputs"))?;
        Ok(self.pins.len() - 1)
    }
}

impl<I: InputPin> Default for GpioSwitches<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: InputPin> SwitchInput for GpioSwitches<I> {
    fn read_switches(&mut self) -> SwitchStates {
        let mut states = SwitchStates::default();
        for (n, pin) in self.pins.iter_mut().enumerate() {
            // An unreadable switch reads open.
            let on = pin.is_low().unwrap_or(false);
            states = states.with(n, on);
        }
        states
    }
}
