//! Property tests for the plant model, availability policy, debouncer and
//! state machine.
//!
//! Runs on host only; proptest is not available for embedded targets.

#![cfg(not(target_os = "espidf"))]

use proptest::prelude::*;

use waterlab::adapters::log_sink::LogEventSink;
use waterlab::adapters::sim::SimulatedRig;
use waterlab::app::service::MachineService;
use waterlab::config::MachineConfig;
use waterlab::plant::battery::{Battery, SolarCycle};
use waterlab::plant::device::Device;
use waterlab::plant::tank::{Tank, TankLevel};
use waterlab::plant::water::transfer;
use waterlab::plant::{DeviceId, Plant, TankId};
use waterlab::policy::AvailabilityPolicy;
use waterlab::sensors::float_switch::{FloatSwitchDebouncer, SwitchStates};

fn bounded(volume: u32, quantity: u32, turbidity: f32) -> Tank {
    Tank::bounded(volume)
        .with_quantity(quantity.min(volume))
        .with_turbidity(turbidity)
}

// ── QA-9a: transfers respect capacity and conserve water ─────

proptest! {
    #[test]
    fn transfer_is_bounded_and_conserving(
        src_vol in 1u32..200,
        src_q in 0u32..200,
        dst_vol in 1u32..200,
        dst_q in 0u32..200,
        requested in 0u32..300,
    ) {
        let mut src = bounded(src_vol, src_q, 2.0);
        let mut dst = bounded(dst_vol, dst_q, 1.0);
        let (src_before, dst_before) = (src.quantity, dst.quantity);

        let moved = transfer(&mut src, &mut dst, requested, 0.5);

        prop_assert!(moved <= requested);
        prop_assert!(moved <= src_before);
        prop_assert!(moved <= dst_vol - dst_before);
        prop_assert!(dst.quantity <= dst_vol);
        prop_assert_eq!(src.quantity + dst.quantity, src_before + dst_before);
    }

    #[test]
    fn blended_turbidity_stays_between_inputs(
        dst_q in 0u32..=50,
        dst_turb in 0.0f32..20.0,
        incoming in 0.0f32..20.0,
        requested in 1u32..60,
    ) {
        let mut src = Tank::limitless(incoming);
        let mut dst = bounded(50, dst_q, dst_turb);

        let moved = transfer(&mut src, &mut dst, requested, incoming);

        if moved > 0 {
            let lo = dst_turb.min(incoming);
            let hi = dst_turb.max(incoming);
            prop_assert!(dst.turbidity >= lo && dst.turbidity <= hi,
                "{} outside [{lo}, {hi}]", dst.turbidity);
        } else {
            prop_assert_eq!(dst.turbidity, dst_turb);
        }
    }

    #[test]
    fn zero_transfer_changes_nothing(
        src_q in 0u32..=25,
        dst_q in 0u32..=25,
        src_turb in 0.0f32..10.0,
        dst_turb in 0.0f32..10.0,
    ) {
        let mut src = bounded(25, src_q, src_turb);
        let mut dst = bounded(25, dst_q, dst_turb);

        prop_assert_eq!(transfer(&mut src, &mut dst, 0, 99.0), 0);
        prop_assert_eq!((src.quantity, src.turbidity), (src_q, src_turb));
        prop_assert_eq!((dst.quantity, dst.turbidity), (dst_q, dst_turb));
    }
}

// ── QA-9b: a full sink is never available ────────────────────

proptest! {
    #[test]
    fn full_sink_blocks_device(
        (volume, full_percent, quantity) in (1u32..100, 50.0f32..=100.0).prop_flat_map(|(v, pct)| {
            let least_full = ((v as f32 * pct / 100.0).ceil() as u32).min(v);
            (Just(v), Just(pct), least_full..=v)
        }),
        infinite_energy in any::<bool>(),
        sensed in proptest::option::of(prop_oneof![
            Just(TankLevel::Empty),
            Just(TankLevel::Mid),
            Just(TankLevel::Full),
        ]),
    ) {
        let mut sink = Tank::bounded(volume).with_quantity(quantity);
        prop_assume!(sink.fill_percent().is_some_and(|pct| pct >= full_percent));
        // A lagging float switch must not reopen a full tank.
        sink.sensed = sensed;

        let mut plant = Plant::new(Battery::new(1000), SolarCycle::new(24));
        let from = plant.add_tank(Tank::limitless(1.0)).unwrap();
        let to = plant.add_tank(sink).unwrap();
        let pump = plant.add_device(Device::new("pump", 5, 1, from, to)).unwrap();

        let policy = AvailabilityPolicy {
            full_percent,
            low_percent: Some(5.0),
            infinite_energy,
        };
        prop_assert!(!policy.is_device_available(pump, &plant));
    }
}

// ── QA-9c: short glitches never produce edges ────────────────

proptest! {
    #[test]
    fn debouncer_rejects_short_glitches(
        (period, glitch_len) in (2usize..=8).prop_flat_map(|p| (Just(p), 1..p)),
        glitch in 1u8..=255,
    ) {
        let mut d = FloatSwitchDebouncer::new(period);
        let quiet = SwitchStates::default();

        for _ in 0..=period {
            prop_assert!(d.sample(quiet).is_empty());
        }
        for _ in 0..glitch_len {
            prop_assert!(d.sample(SwitchStates(glitch)).is_empty());
        }
        for _ in 0..=period {
            prop_assert!(d.sample(quiet).is_empty());
        }
        prop_assert_eq!(d.stable(), quiet);
    }

    #[test]
    fn debouncer_settles_on_held_level(
        period in 1usize..=8,
        level in 0u8..=255,
    ) {
        let mut d = FloatSwitchDebouncer::new(period);
        for _ in 0..=period {
            d.sample(SwitchStates(level));
        }
        prop_assert_eq!(d.stable(), SwitchStates(level));
    }
}

// ── QA-9d: mid power never runs two stages at once ───────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn at_most_one_stage_enabled(
        disturbances in proptest::collection::vec((1usize..=3, 0u32..=25, 0u32..=1000), 1..12),
        gap in 1usize..15,
    ) {
        let mut svc = MachineService::new(MachineConfig::default()).unwrap();
        let mut rig = SimulatedRig::new();
        let mut sink = LogEventSink::new();
        svc.start(&mut sink);

        for (tank, quantity, energy) in disturbances {
            svc.plant_mut().tank_mut(TankId(tank)).quantity = quantity;
            svc.plant_mut().battery = Battery::with_remaining(1000, energy);
            for _ in 0..gap {
                svc.tick(&mut rig, &mut sink);
                let running = [0, 1, 3]
                    .into_iter()
                    .filter(|&d| rig.is_enabled(DeviceId(d)))
                    .count();
                prop_assert!(running <= 1, "{running} stages on in {:?}", svc.state());
            }
        }
    }
}
