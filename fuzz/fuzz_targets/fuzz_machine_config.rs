//! Fuzz target: configuration loading
//!
//! Arbitrary JSON goes through the same path as `--config`: deserialize,
//! validate, then build the service.  A config that validates must always
//! build, and nothing may panic along the way.
//!
//! cargo fuzz run fuzz_machine_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use waterlab::app::service::MachineService;
use waterlab::config::MachineConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<MachineConfig>(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }
    let service = MachineService::new(config);
    assert!(service.is_ok(), "validated config failed to build");
});
