//! Application core: orchestration with no direct I/O.
//!
//! This module ties the plant, the power profile, the safety supervisor
//! and the float-switch sampler into one control cycle.  All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
