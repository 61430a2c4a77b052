//! Fuzz target: `FloatSwitchDebouncer::sample`
//!
//! First byte picks the debounce period, the rest is a raw switch stream.
//! Every reported edge must agree with the new stable state, and a switch
//! may only change its stable state after holding for a full window.
//!
//! cargo fuzz run fuzz_debouncer

#![no_main]

use libfuzzer_sys::fuzz_target;
use waterlab::sensors::float_switch::{
    FloatSwitchDebouncer, MAX_SWITCHES, SwitchEvents, SwitchStates,
};

fuzz_target!(|data: &[u8]| {
    let Some((&period, stream)) = data.split_first() else {
        return;
    };
    let mut debouncer = FloatSwitchDebouncer::new(usize::from(period));
    let window = debouncer.period();
    let mut held = [0usize; MAX_SWITCHES];
    let mut last = 0u8;

    for &raw in stream {
        let before = debouncer.stable();
        let events = debouncer.sample(SwitchStates(raw));
        let after = debouncer.stable();

        for (switch, run) in held.iter_mut().enumerate() {
            let bit = 1 << switch;
            *run = if (raw ^ last) & bit == 0 { *run + 1 } else { 1 };

            let went_on = events.contains(SwitchEvents::on(switch));
            let went_off = events.contains(SwitchEvents::off(switch));
            assert!(!(went_on && went_off), "switch {switch} reported both edges");
            assert_eq!(went_on, !before.is_on(switch) && after.is_on(switch));
            assert_eq!(went_off, before.is_on(switch) && !after.is_on(switch));
            if went_on || went_off {
                assert!(*run >= window, "switch {switch} flipped after {run} samples");
            }
        }
        last = raw;
    }
});
