//! waterlab: controller for a small battery-powered water-purification rig.
//!
//! Exposes the pure-logic modules for the simulator binary, integration
//! testing and board crates.  Hardware is reached only through the port
//! traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod fsm;
pub mod plant;
pub mod policy;
pub mod profile;
pub mod safety;
pub mod sensors;
pub mod timer;
