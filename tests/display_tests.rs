//! End-to-end rendering tests on the mock HAL

use split_flap::alphabet::{flap_index, STEPS_PER_REVOLUTION};
use split_flap::calibration::target_position;
use split_flap::hal::{MockClock, MockOutputPin, PinLog, SimulatedHall};
use split_flap::traits::Clock;
use split_flap::{DisplayConfig, RenderOutcome, SplitFlapDisplay, StepDirection};

type SimDisplay =
    SplitFlapDisplay<MockOutputPin, MockOutputPin, MockOutputPin, SimulatedHall, MockClock>;

const DELAY_US: u32 = 1000;

/// Spreads the reels around the revolution so homing takes a different
/// number of steps on every unit.
fn start_angle(unit: usize) -> u32 {
    (unit as u32 * 977 + 123) % STEPS_PER_REVOLUTION
}

fn build(config: &DisplayConfig, log: &PinLog) -> SimDisplay {
    let halls = (0..config.units.len()).map(|unit| SimulatedHall::new(start_angle(unit)));
    SplitFlapDisplay::from_config(
        config,
        MockOutputPin::new("data", log),
        MockOutputPin::new("clock", log),
        MockOutputPin::new("latch", log),
        halls,
        MockClock::new(),
    )
    .unwrap()
}

fn reference_display(log: &PinLog) -> SimDisplay {
    build(&DisplayConfig::default(), log)
}

fn expected_target(display: &SimDisplay, unit: usize, symbol: char) -> u32 {
    target_position(flap_index(symbol), display.units()[unit].calibration())
}

// ============================================================================
// Reference Scenario
// ============================================================================

#[test]
fn hi_on_ten_units_homes_and_settles_everything() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    assert_eq!(display.len(), 10);

    let report = display.display("HI", DELAY_US).unwrap();

    assert_eq!(report.outcome, RenderOutcome::Complete);
    assert_eq!(display.units()[0].target(), expected_target(&display, 0, 'H'));
    assert_eq!(display.units()[1].target(), expected_target(&display, 1, 'I'));
    for unit in 2..10 {
        assert_eq!(display.units()[unit].target(), expected_target(&display, unit, ' '));
    }

    let state = display.state();
    assert!(state.all_homed());
    for unit in state.units.iter() {
        assert_eq!(unit.position, unit.target);
    }
    assert!(state.is_settled());
    assert!(report.homed.iter().all(|&h| h));
}

#[test]
fn first_render_takes_at_most_one_extra_revolution() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    let report = display.display("SPLIT FLAP", DELAY_US).unwrap();

    let worst = display
        .units()
        .iter()
        .map(|unit| u64::from(STEPS_PER_REVOLUTION + unit.target()))
        .max()
        .unwrap();
    assert!(display.timer().now_us() <= worst * u64::from(DELAY_US));

    for &steps in report.steps.iter() {
        assert!(steps <= 2 * STEPS_PER_REVOLUTION);
    }
}

// ============================================================================
// Synchronization
// ============================================================================

#[test]
fn units_finish_together() {
    let log = PinLog::new();
    let mut display = reference_display(&log);

    let report = display.display("AAAAAAAAAA", DELAY_US).unwrap();
    assert!(report.finish_spread_us().unwrap() <= u64::from(DELAY_US));

    let report = display.display("0123456789", DELAY_US).unwrap();
    assert_eq!(report.moved_units(), 10);
    assert!(report.finish_spread_us().unwrap() <= u64::from(DELAY_US));
}

#[test]
fn busiest_unit_runs_at_full_speed() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    display.display("", DELAY_US).unwrap();

    let started = display.timer().now_us();
    let report = display.display("9", DELAY_US).unwrap();
    let elapsed = display.timer().now_us() - started;

    // Only unit 0 moves, 44 flaps forward, with nothing to wait for.
    assert_eq!(report.moved_units(), 1);
    let steps = u64::from(report.steps[0]);
    assert_eq!(elapsed, steps * u64::from(DELAY_US));
}

#[test]
fn no_unit_steps_faster_than_min_delay() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    display.display("WAIT", DELAY_US).unwrap();

    let started = display.timer().now_us();
    let report = display.display("RUSH HOUR", DELAY_US).unwrap();
    let elapsed = display.timer().now_us() - started;

    let most = report.steps.iter().copied().max().unwrap();
    assert!(elapsed >= u64::from(most) * u64::from(DELAY_US));
}

// ============================================================================
// Idle and Repeat Renders
// ============================================================================

#[test]
fn repeating_a_message_does_nothing() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    display.display("REPEAT", DELAY_US).unwrap();
    let before = display.state();
    let now = display.timer().now_us();

    let report = display.display("REPEAT", DELAY_US).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.iterations, 0);
    assert_eq!(report.total_steps(), 0);
    assert_eq!(report.finish_spread_us(), None);
    assert_eq!(display.timer().now_us(), now);
    assert_eq!(display.state(), before);
}

#[test]
fn settled_units_stay_idle() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    display.display("HI", DELAY_US).unwrap();

    let report = display.display("HO", DELAY_US).unwrap();

    assert_eq!(report.moved_units(), 1);
    assert!(report.steps[1] > 0);
    for unit in [0, 2, 3, 4, 5, 6, 7, 8, 9] {
        assert_eq!(report.steps[unit], 0, "unit {} moved", unit);
        assert_eq!(report.last_step_us[unit], None);
    }
    assert!(display.state().is_settled());
}

#[test]
fn homed_units_never_need_a_full_revolution() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    display.display("ZZZZZZZZZZ", DELAY_US).unwrap();

    let report = display.display("          ", DELAY_US).unwrap();
    for &steps in report.steps.iter() {
        assert!(steps < STEPS_PER_REVOLUTION);
    }
    assert!(display.state().is_settled());
}

// ============================================================================
// Bus Behaviour
// ============================================================================

#[test]
fn one_flush_per_iteration_plus_release() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    log.clear();

    let report = display.display("BUS", DELAY_US).unwrap();
    assert_eq!(log.latch_count(), report.iterations as usize + 1);
}

#[test]
fn motors_are_released_after_render() {
    let log = PinLog::new();
    let mut display = reference_display(&log);
    display.display("IDLE", DELAY_US).unwrap();

    let latched = log.latched();
    assert_eq!(latched.len(), 40);
    assert!(latched.iter().all(|&bit| !bit));
}

// ============================================================================
// Configuration Variants
// ============================================================================

#[test]
fn forward_wired_display_walks_the_phase_table_forward() {
    let log = PinLog::new();
    let config = DisplayConfig::uniform(1).with_advance(StepDirection::Forward);
    let mut display = build(&config, &log);
    let report = display.display("F", DELAY_US).unwrap();
    assert!(display.state().is_settled());

    let steps = report.steps[0] as usize;
    assert_eq!(display.units()[0].phase(), steps % 8);
}

#[test]
fn reverse_wired_display_walks_the_phase_table_backward() {
    let log = PinLog::new();
    let config = DisplayConfig::uniform(1).with_advance(StepDirection::Reverse);
    let mut display = build(&config, &log);
    let report = display.display("F", DELAY_US).unwrap();
    assert!(display.state().is_settled());

    let steps = report.steps[0] as usize;
    assert_eq!(display.units()[0].phase(), (8 - steps % 8) % 8);
}

#[test]
fn full_forward_display_settles() {
    let log = PinLog::new();
    let config = DisplayConfig::default().with_advance(StepDirection::Forward);
    let mut display = build(&config, &log);
    display.display("FWD", DELAY_US).unwrap();
    assert!(display.state().is_settled());
}

#[test]
fn uniform_display_lands_on_flap_boundaries() {
    let log = PinLog::new();
    let mut display = build(&DisplayConfig::uniform(4), &log);
    display.display("ABC", DELAY_US).unwrap();

    let positions: Vec<u32> = display.units().iter().map(|u| u.position()).collect();
    assert_eq!(positions, [91, 182, 273, 0]);
}

#[test]
fn single_unit_always_runs_at_full_speed() {
    for delay in [800, 1000, 2500] {
        let log = PinLog::new();
        let mut display = build(&DisplayConfig::uniform(1), &log);
        let report = display.display("K", delay).unwrap();
        assert_eq!(
            display.timer().now_us(),
            u64::from(report.steps[0]) * u64::from(delay)
        );
    }
}
