//! Integration tests for the MachineService → FSM → actuators pipeline.
//!
//! These run on the host and drive whole control cycles through mock
//! ports: sensors and outputs from [`MockHardware`], float switches either
//! simulated from the plant or scripted through the interrupt-side sampler.

use std::time::Duration;

use super::mock_hw::{ActuatorCall, CountingFrames, FixedSwitches, LogSink, MockHardware};

use waterlab::app::commands::AppCommand;
use waterlab::app::events::AppEvent;
use waterlab::app::service::MachineService;
use waterlab::config::{MachineConfig, PipelineConfig, PowerMode};
use waterlab::error::SafetyFault;
use waterlab::fsm::StateId;
use waterlab::plant::battery::Battery;
use waterlab::plant::tank::Capacity;
use waterlab::plant::{DeviceId, TankId};
use waterlab::sensors::float_switch::{SwitchStates, empty_switch, full_switch};

const FILTER: DeviceId = DeviceId(0);
const RO: DeviceId = DeviceId(1);
const RO_REJECT: DeviceId = DeviceId(2);
const UV: DeviceId = DeviceId(3);
const RECIRCULATE: DeviceId = DeviceId(5);

fn make_service(config: MachineConfig) -> (MachineService, MockHardware, LogSink) {
    let mut svc = MachineService::new(config).unwrap();
    let hw = MockHardware::new();
    let mut sink = LogSink::new();
    svc.start(&mut sink);
    (svc, hw, sink)
}

fn without(drain: bool, recirculate: bool) -> MachineConfig {
    let base = MachineConfig::default();
    MachineConfig {
        pipeline: PipelineConfig {
            drain: if drain { None } else { base.pipeline.drain },
            recirculate: if recirculate { None } else { base.pipeline.recirculate },
            ..base.pipeline
        },
        ..base
    }
}

fn assert_tanks_within_capacity(svc: &MachineService) {
    for (i, tank) in svc.plant().tanks().iter().enumerate() {
        if let Capacity::Bounded(volume) = tank.capacity {
            assert!(tank.quantity <= volume, "tank {i} overflowed: {}", tank.quantity);
        }
    }
}

// ── QA-1: low battery → Recharge, held until the full threshold ──

#[test]
fn low_battery_recharges_until_full_threshold() {
    let cfg = MachineConfig {
        recharge_per_cycle: 100,
        ..MachineConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);
    svc.plant_mut().battery = Battery::with_remaining(1000, 150);

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::Recharge);

    let mut left_at = None;
    for _ in 0..40 {
        svc.tick(&mut hw, &mut sink);
        if svc.state() != StateId::Recharge {
            left_at = Some(svc.cycle());
            break;
        }
        assert!(svc.battery_percent() < 90, "held in Recharge above the threshold");
        for device in [FILTER, RO, RO_REJECT, UV] {
            assert!(!hw.is_enabled(device), "{device:?} ran during Recharge");
        }
    }

    // Night until cycle 12, then +100 per daytime cycle: 150 → 950 at cycle 19.
    assert_eq!(left_at, Some(19));
    assert_eq!(svc.state(), StateId::Idle);
    assert!(svc.battery_percent() >= 90);
    assert!(sink.transitions().contains(&(StateId::Recharge, StateId::Idle)));
    assert!(svc.stats().recharge_cycles >= 17);
}

#[test]
fn low_battery_interrupts_a_running_stage() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunFilter);
    assert!(hw.is_enabled(FILTER));

    svc.plant_mut().battery = Battery::with_remaining(1000, 100);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::Recharge);
    assert!(!hw.is_enabled(FILTER));
}

// ── QA-2: purified and rejected water are counted once each ──

#[test]
fn purified_volume_matches_terminal_tank() {
    let cfg = MachineConfig {
        infinite_energy: true,
        ..without(true, true)
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);

    for _ in 0..300 {
        svc.tick(&mut hw, &mut sink);
        assert_tanks_within_capacity(&svc);
    }

    let stats = *svc.stats();
    assert_eq!(stats.total_cycles, 300);
    assert!(stats.water_purified > 0);
    assert!(stats.water_rejected > 0);
    // UV is the only inflow to the terminal tank and nothing drains it.
    assert_eq!(
        stats.water_purified,
        u64::from(svc.plant().tank(TankId(3)).quantity)
    );
    assert!(stats.active_cycles(RO_REJECT) <= stats.active_cycles(RO));
}

// ── QA-3: exactly one enable write per device per cycle ──

#[test]
fn every_device_gets_one_enable_per_cycle() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    let devices = svc.plant().devices().len();

    for _ in 0..120 {
        hw.calls.clear();
        svc.tick(&mut hw, &mut sink);
        for i in 0..devices {
            assert_eq!(hw.enable_writes(DeviceId(i)), 1, "device {i}");
        }
    }
}

#[test]
fn mid_power_never_runs_two_stages() {
    let cfg = MachineConfig {
        infinite_energy: true,
        ..MachineConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);

    for _ in 0..300 {
        svc.tick(&mut hw, &mut sink);
        let running = [FILTER, RO, UV]
            .into_iter()
            .filter(|&d| hw.is_enabled(d))
            .count();
        assert!(running <= 1, "cycle {}: {running} stages on", svc.cycle());
    }
}

// ── QA-4: safety fault halts everything, then recovers ──

#[test]
fn analog_fault_disables_all_devices_until_cleared() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunFilter);

    hw.readings.conductivity = Some(200.0);
    hw.calls.clear();
    svc.tick(&mut hw, &mut sink);

    assert_eq!(svc.state(), StateId::Fault);
    assert!(
        hw.calls
            .iter()
            .all(|c| matches!(c, ActuatorCall::SetEnable { enabled: false, .. })),
        "only disables may be written in Fault: {:?}",
        hw.calls
    );
    assert!(
        sink.events
            .contains(&AppEvent::FaultDetected(SafetyFault::ConductivityHigh.mask()))
    );

    for _ in 0..5 {
        svc.tick(&mut hw, &mut sink);
        assert_eq!(svc.state(), StateId::Fault);
    }
    assert_eq!(svc.stats().fault_cycles, 6);

    hw.readings.conductivity = Some(120.0);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::Idle);
    assert!(sink.events.contains(&AppEvent::FaultCleared));

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunFilter);
}

#[test]
fn contradictory_switch_pair_faults() {
    let cfg = MachineConfig {
        samples_per_cycle: None,
        ..MachineConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);

    // Full float up, empty float down: physically impossible.
    let mut sampler = svc.switch_sampler();
    let sampler = std::thread::spawn(move || {
        let mut input = FixedSwitches(SwitchStates::default().with(full_switch(1), true));
        for _ in 0..8 {
            sampler.sample(&mut input);
        }
        sampler
    })
    .join()
    .unwrap();

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::Fault);
    assert_ne!(
        svc.fault_flags() & SafetyFault::TankLevelUndefined.mask(),
        0
    );

    let mut sampler = sampler;
    let mut open = FixedSwitches(SwitchStates::default());
    for _ in 0..8 {
        sampler.sample(&mut open);
    }
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::Idle);
    assert_eq!(svc.fault_flags(), 0);
}

// ── QA-5: float-switch edges stop a stage ──

#[test]
fn full_edge_hands_filter_over_to_reverse_osmosis() {
    let cfg = MachineConfig {
        samples_per_cycle: None,
        ..MachineConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunFilter);

    let full = SwitchStates::default()
        .with(full_switch(0), true)
        .with(empty_switch(0), true);
    let period = svc.config().debounce_period;
    for _ in 0..period {
        svc.sample_switches(&mut FixedSwitches(full));
    }

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunReverseOsmosis);
    assert!(
        sink.transitions()
            .contains(&(StateId::RunFilter, StateId::RunReverseOsmosis))
    );
}

#[test]
fn glitch_shorter_than_period_is_ignored() {
    let cfg = MachineConfig {
        samples_per_cycle: None,
        ..MachineConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);

    let full = SwitchStates::default().with(full_switch(0), true);
    svc.sample_switches(&mut FixedSwitches(full));
    for _ in 0..8 {
        svc.sample_switches(&mut FixedSwitches(SwitchStates::default()));
    }

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunFilter);
    assert!(svc.signals().peek().is_empty());
}

// ── QA-6: recirculation on a saturated pipeline ──

#[test]
fn saturated_pipeline_recirculates_on_timer() {
    let (mut svc, mut hw, mut sink) = make_service(without(true, false));
    for tank in 1..=3 {
        svc.plant_mut().tank_mut(TankId(tank)).quantity = 25;
    }

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RecirculateUv);
    assert!(hw.is_enabled(RECIRCULATE));
    assert_eq!(hw.duty(RECIRCULATE), Some(100));

    let mut pattern = Vec::new();
    for _ in 0..10 {
        svc.tick(&mut hw, &mut sink);
        pattern.push(hw.is_enabled(RECIRCULATE));
    }
    assert_eq!(
        pattern,
        [true, true, false, false, false, false, false, true, true, true]
    );
    assert_eq!(svc.plant().tank(TankId(3)).quantity, 25);
    assert_eq!(svc.stats().active_cycles(RECIRCULATE), 5);

    svc.plant_mut().tank_mut(TankId(3)).quantity = 10;
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::Idle);
    assert!(!hw.is_enabled(RECIRCULATE));

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunUv);
}

// ── QA-7: power profiles ──

#[test]
fn high_power_runs_stages_in_parallel_with_pot_duty() {
    let cfg = MachineConfig {
        power_mode: PowerMode::High,
        ..MachineConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);
    svc.plant_mut().tank_mut(TankId(1)).quantity = 10;
    svc.plant_mut().tank_mut(TankId(2)).quantity = 10;
    hw.readings.potentiometers = [128, 255, 0];

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RunParallel);
    svc.tick(&mut hw, &mut sink);

    for device in [FILTER, RO, RO_REJECT, UV] {
        assert!(hw.is_enabled(device), "{device:?} should run");
    }
    assert_eq!(hw.duty(FILTER), Some(50));
    assert_eq!(hw.duty(RO), Some(100));
    assert_eq!(hw.duty(RO_REJECT), Some(100));
    assert_eq!(hw.duty(UV), Some(0));
}

#[test]
fn high_power_only_runs_what_the_battery_pays_for() {
    let cfg = MachineConfig {
        power_mode: PowerMode::High,
        ..without(true, true)
    };
    let (mut svc, mut hw, mut sink) = make_service(cfg);
    svc.plant_mut().battery = Battery::with_remaining(100, 60);
    svc.plant_mut().tank_mut(TankId(1)).quantity = 10;
    svc.plant_mut().tank_mut(TankId(2)).quantity = 10;

    let device_ids: Vec<DeviceId> = svc.plant().device_ids().collect();
    let mut cycles: Vec<u64> = device_ids.iter().map(|&id| svc.stats().active_cycles(id)).collect();

    // Night for the whole run: nothing recharges the battery.
    for _ in 0..6 {
        let before = svc.plant().battery.remaining();
        svc.tick(&mut hw, &mut sink);

        let mut paid = 0;
        for (i, &id) in device_ids.iter().enumerate() {
            let now = svc.stats().active_cycles(id);
            paid += (now - cycles[i]) as u32 * svc.plant().device(id).power;
            cycles[i] = now;
        }
        assert_eq!(before - svc.plant().battery.remaining(), paid);
        assert_tanks_within_capacity(&svc);
    }

    // Filter and RO leave 40 units after the first parallel cycle, short of UV's 50.
    assert!(svc.stats().active_cycles(FILTER) > 0);
    assert_eq!(svc.stats().active_cycles(UV), 0);
    assert_eq!(svc.stats().water_purified, 0);
    assert_eq!(svc.plant().tank(TankId(3)).quantity, 0);
    assert!(!hw.is_enabled(UV));
}

#[test]
fn update_config_switches_to_low_power() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    let mut frames = CountingFrames::default();

    let mut cfg = svc.config().clone();
    cfg.power_mode = PowerMode::Low;
    svc.handle_command(AppCommand::UpdateConfig(cfg), &mut hw, &mut sink, &mut frames)
        .unwrap();
    assert_eq!(svc.state(), StateId::Idle);

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), StateId::RecirculateUv);

    let bad = MachineConfig {
        battery_capacity: 0,
        ..MachineConfig::default()
    };
    assert!(
        svc.handle_command(AppCommand::UpdateConfig(bad), &mut hw, &mut sink, &mut frames)
            .is_err()
    );
    assert_eq!(svc.config().power_mode, PowerMode::Low);
    assert_eq!(svc.state(), StateId::RecirculateUv);
}

// ── QA-8: operator commands ──

#[test]
fn infinite_energy_keeps_battery_full() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    let mut frames = CountingFrames::default();

    svc.handle_command(AppCommand::ToggleInfiniteEnergy, &mut hw, &mut sink, &mut frames)
        .unwrap();
    assert!(sink.events.contains(&AppEvent::InfiniteEnergy(true)));

    for _ in 0..60 {
        svc.tick(&mut hw, &mut sink);
    }
    assert_eq!(svc.plant().battery.remaining(), 1000);
    assert!(svc.stats().active_cycles(FILTER) > 0);
}

#[test]
fn reset_rebuilds_rig_and_counters() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    let mut frames = CountingFrames::default();
    for _ in 0..20 {
        svc.tick(&mut hw, &mut sink);
    }
    assert!(svc.plant().tank(TankId(1)).quantity > 0 || svc.stats().water_rejected > 0);

    svc.handle_command(AppCommand::Reset, &mut hw, &mut sink, &mut frames)
        .unwrap();
    assert_eq!(svc.cycle(), 0);
    assert_eq!(svc.stats().total_cycles, 0);
    assert_eq!(svc.state(), StateId::Idle);
    for tank in 1..=3 {
        assert_eq!(svc.plant().tank(TankId(tank)).quantity, 0);
    }
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
}

#[test]
fn run_renders_each_cycle_and_reports() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    let mut frames = CountingFrames::default();

    svc.handle_command(
        AppCommand::Run {
            cycles: 5,
            cadence: Duration::ZERO,
            graphics: true,
        },
        &mut hw,
        &mut sink,
        &mut frames,
    )
    .unwrap();

    let cycles: Vec<u64> = frames.frames.iter().map(|(_, c)| *c).collect();
    assert_eq!(cycles, [1, 2, 3, 4, 5]);
    match sink.events.last() {
        Some(AppEvent::Telemetry(t)) => assert_eq!(t.cycle, 5),
        other => panic!("expected telemetry, got {other:?}"),
    }
}

#[test]
fn print_emits_telemetry_without_ticking() {
    let (mut svc, mut hw, mut sink) = make_service(MachineConfig::default());
    let mut frames = CountingFrames::default();
    svc.handle_command(AppCommand::Print, &mut hw, &mut sink, &mut frames)
        .unwrap();
    assert!(matches!(sink.events.last(), Some(AppEvent::Telemetry(_))));
    assert_eq!(svc.cycle(), 0);
    assert!(frames.frames.is_empty());
}
