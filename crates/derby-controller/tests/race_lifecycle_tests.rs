//! End-to-end race lifecycle tests on the mock platform.

use std::time::Duration;

use derby_controller::prelude::*;
use derby_test_helpers::prelude::*;
use derby_timing::{RaceConfig, Ticks};
use proptest::prelude::*;

fn four_lanes() -> Result<RaceConfig, Box<dyn std::error::Error>> {
    let mut config = RaceConfig::default();
    config.set_lane_count(4)?;
    Ok(config)
}

/// Boot, close the gate at t=0 and run the two passes that start the race.
fn start_race(config: RaceConfig) -> (RaceController<MockPlatform>, MockHandle) {
    let (mut controller, hw) = mock_controller(config);
    hw.take_serial();
    assert!(hw.gate_ready());
    controller.poll();
    controller.poll();
    (controller, hw)
}

#[test]
fn test_gate_ready_then_next_pass_starts_race() -> TestResult {
    let (mut controller, hw) = mock_controller(four_lanes()?);
    hw.take_serial();

    hw.gate_ready();
    controller.poll();
    assert_eq!(controller.state(), RaceState::Preparing);
    assert!(hw.armed_lanes().iter().all(|armed| !armed));

    controller.poll();
    assert_eq!(controller.state(), RaceState::Racing);
    assert_eq!(
        hw.armed_lanes(),
        vec![true, true, true, true, false, false, false, false]
    );
    assert!(!hw.gate_armed());

    let timers = hw.pending_timers();
    assert_eq!(timers.len(), 1);
    let timeout = must_some(timers.first(), "race timeout scheduled");
    assert_eq!(timeout.delay, Duration::from_secs(10));
    assert_eq!(timeout.token.purpose(), TimerPurpose::RaceTimeout);

    assert_eq!(hw.take_serial(), vec!["They're off!".to_string()]);
    for lane in 0..4 {
        assert_eq!(hw.display(lane), DisplayCell::Blank);
    }
    Ok(())
}

#[test]
fn test_masked_lane_is_not_armed() -> TestResult {
    let (mut controller, hw) = mock_controller(four_lanes()?);
    controller.handle_line("OM2");
    hw.gate_ready();
    controller.poll();
    controller.poll();
    assert_eq!(
        hw.armed_lanes(),
        vec![true, false, true, true, false, false, false, false]
    );
    Ok(())
}

#[test]
fn test_timeout_scores_missing_lane_as_dnf() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    hw.take_serial();

    hw.advance_us(1_000);
    assert!(hw.trigger_lane(0));
    assert!(hw.trigger_lane(1));
    hw.advance_us(1_500);
    assert!(hw.trigger_lane(2));
    controller.poll();
    assert_eq!(controller.state(), RaceState::Racing);
    assert!(hw.lane_armed(3));
    assert!(!hw.lane_armed(0));

    hw.advance(Duration::from_secs(10));
    controller.poll();
    assert_eq!(controller.state(), RaceState::Racing);
    assert!(!hw.lane_armed(3));

    controller.poll();
    assert_eq!(controller.state(), RaceState::ReportingTimes);
    let positions: Vec<u8> = controller.lanes().active(4).map(|l| l.position()).collect();
    assert_eq!(positions, vec![1, 1, 3, 0]);
    assert_eq!(
        hw.take_serial(),
        vec![
            "Race did not complete".to_string(),
            "A=0.0010a B=0.0010a C=0.0025c D=10.0000  ".to_string(),
        ]
    );
    assert!(hw.gate_armed());
    Ok(())
}

#[test]
fn test_natural_finish_reports_in_same_pass() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    let race_timeout = must_some(hw.pending_timers().first().copied(), "timeout");

    hw.advance_us(3_123_490);
    for lane in 0..4 {
        hw.trigger_lane(lane);
        hw.advance_us(100_000);
    }
    controller.poll();

    assert_eq!(controller.state(), RaceState::ReportingTimes);
    assert!(hw.cancelled_timers().contains(&race_timeout.handle));
    let pending = hw.pending_timers();
    assert_eq!(pending.len(), 1);
    assert!(
        pending
            .iter()
            .all(|t| t.token.purpose() == TimerPurpose::ShowPositions
                && t.delay == Duration::from_secs(4))
    );
    assert_eq!(
        hw.last_line().as_deref(),
        Some("A=3.1234a B=3.2234b C=3.3234c D=3.4234d ")
    );
    assert_eq!(hw.display(0), DisplayCell::Time("3.123".to_string()));
    assert_eq!(hw.display(3), DisplayCell::Time("3.423".to_string()));
    Ok(())
}

#[test]
fn test_display_cycles_until_gate_reopens() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    hw.advance_us(200_000);
    hw.trigger_lane(1);
    controller.poll();
    controller.handle_line("RA");
    assert_eq!(controller.state(), RaceState::ReportingTimes);
    assert_eq!(hw.display(0), DisplayCell::Text("dnF".to_string()));
    assert_eq!(hw.display(1), DisplayCell::Time("0.200".to_string()));

    hw.advance(Duration::from_secs(4));
    controller.poll();
    assert_eq!(controller.state(), RaceState::ReportingPositions);

    hw.advance(Duration::from_secs(4));
    controller.poll();
    assert_eq!(controller.state(), RaceState::ReportingTimes);

    assert!(hw.gate_reopen());
    controller.poll();
    assert_eq!(controller.state(), RaceState::Idle);
    assert!(hw.pending_timers().is_empty());
    Ok(())
}

#[test]
fn test_positions_phase_shows_ranks() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    controller.handle_line("OM4");
    hw.advance_us(2_000);
    hw.trigger_lane(2);
    hw.advance_us(1_000);
    hw.trigger_lane(0);
    controller.poll();
    controller.handle_line("RA");
    assert!(controller.advance_display());
    assert_eq!(controller.state(), RaceState::ReportingPositions);

    assert_eq!(hw.display(0).as_str(), "  2 ");
    assert_eq!(hw.display(1).as_str(), "dnF");
    assert_eq!(hw.display(2).as_str(), "  1 ");
    assert_eq!(hw.display(3).as_str(), "dnF");
    Ok(())
}

#[test]
fn test_force_finish_marks_unfinished_lanes_dnf() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    hw.advance_us(500_000);
    hw.trigger_lane(3);
    controller.poll();
    hw.take_serial();

    controller.handle_line("ra");
    assert_eq!(controller.state(), RaceState::ReportingTimes);
    assert!(hw.armed_lanes().iter().all(|armed| !armed));
    assert_eq!(
        hw.take_serial(),
        vec!["A=10.0000  B=10.0000  C=10.0000  D=0.5000a ".to_string()]
    );

    controller.handle_line("RA");
    assert_eq!(
        hw.take_serial(),
        vec!["A=10.0000  B=10.0000  C=10.0000  D=0.5000a ".to_string()]
    );
    Ok(())
}

#[test]
fn test_force_finish_scores_capture_not_yet_polled() -> TestResult {
    let mut config = RaceConfig::default();
    config.set_lane_count(2)?;
    let (mut controller, hw) = start_race(config);
    hw.take_serial();

    hw.advance_us(2_000_000);
    assert!(hw.trigger_lane(0));
    controller.handle_line("RA");

    assert_eq!(controller.state(), RaceState::ReportingTimes);
    assert_eq!(
        controller.lanes().get(0).map(|lane| lane.elapsed()),
        Some(Ticks::new(200_000))
    );
    assert_eq!(hw.take_serial(), vec!["A=2.0000a B=10.0000  ".to_string()]);

    controller.poll();
    assert_eq!(
        controller.lanes().get(0).map(|lane| lane.elapsed()),
        Some(Ticks::new(200_000))
    );
    Ok(())
}

#[test]
fn test_masking_racing_lane_lets_race_finish() -> TestResult {
    let mut config = RaceConfig::default();
    config.set_lane_count(2)?;
    let (mut controller, hw) = start_race(config);
    hw.take_serial();

    controller.handle_line("OM2");
    assert!(!hw.lane_armed(1));
    assert!(!hw.trigger_lane(1));

    hw.advance_us(1_000_000);
    assert!(hw.trigger_lane(0));
    controller.poll();

    assert_eq!(controller.state(), RaceState::ReportingTimes);
    assert_eq!(
        hw.take_serial(),
        vec!["OK".to_string(), "A=1.0000a B=10.0000  ".to_string()]
    );
    Ok(())
}

#[test]
fn test_stale_timer_is_ignored() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    controller.handle_line("RA");
    let show_positions = must_some(hw.pending_timers().first().copied(), "cycle timer");

    assert!(controller.advance_display());
    assert!(controller.advance_display());
    assert_eq!(controller.state(), RaceState::ReportingTimes);

    controller.timer_sink().fired(show_positions.token);
    controller.poll();
    assert_eq!(controller.state(), RaceState::ReportingTimes);
    Ok(())
}

#[test]
fn test_gate_ready_while_reporting_starts_new_race() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    controller.handle_line("RA");
    hw.advance_us(3_000_000);

    assert!(hw.gate_ready());
    controller.poll();
    assert_eq!(controller.state(), RaceState::Preparing);
    assert!(hw.pending_timers().is_empty());
    assert_eq!(controller.start_us(), 3_000_000);

    controller.poll();
    assert_eq!(controller.state(), RaceState::Racing);
    assert!(controller.lanes().active(4).all(|l| l.elapsed().is_dnf()));
    Ok(())
}

#[test]
fn test_reset_from_racing() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    hw.take_serial();
    controller.handle_line("R");
    assert_eq!(hw.take_serial(), vec!["OK".to_string()]);
    assert_eq!(controller.state(), RaceState::Idle);
    assert!(hw.gate_armed());
    assert!(hw.armed_lanes().iter().all(|armed| !armed));
    assert!(hw.pending_timers().is_empty());
    Ok(())
}

#[test]
fn test_sensor_test_mode() -> TestResult {
    let (mut controller, hw) = mock_controller(four_lanes()?);
    hw.take_serial();

    controller.handle_line("RT");
    assert_eq!(hw.take_serial(), vec!["OK".to_string()]);
    assert_eq!(controller.state(), RaceState::ArmedTest);
    assert_eq!(hw.display(2).as_str(), "----");
    assert!(hw.lane_armed(2));

    controller.poll();
    assert_eq!(controller.state(), RaceState::Testing);

    assert!(hw.trigger_lane(2));
    controller.poll();
    assert_eq!(controller.state(), RaceState::Testing);
    assert_eq!(hw.display(2), DisplayCell::Blank);
    assert!(!hw.lane_armed(2));
    assert!(hw.lane_armed(1));
    assert!(controller.lanes().active(4).all(|l| l.position() == 0));

    controller.handle_line("R");
    assert_eq!(controller.state(), RaceState::Idle);
    assert!(!hw.lane_armed(1));
    Ok(())
}

#[test]
fn test_sensor_test_rejected_while_racing() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    hw.take_serial();
    controller.handle_line("RT");
    assert_eq!(hw.take_serial(), vec!["?".to_string()]);
    assert_eq!(controller.state(), RaceState::Racing);
    Ok(())
}

#[test]
fn test_first_edge_wins_on_bouncing_sensor() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    hw.raw_lane_edge(0, 4_000);
    hw.raw_lane_edge(0, 3_000);
    controller.poll();
    assert_eq!(
        controller.lanes().get(0).map(|l| l.elapsed().get()),
        Some(400)
    );
    Ok(())
}

#[test]
fn test_edge_on_unarmed_lane_is_ignored() -> TestResult {
    let (mut controller, hw) = start_race(four_lanes()?);
    hw.raw_lane_edge(6, 1_000);
    controller.poll();
    assert!(controller.lanes().get(6).is_some_and(|l| l.elapsed().is_dnf()));
    assert_eq!(controller.state(), RaceState::Racing);
    Ok(())
}

#[test]
fn test_event_overflow_is_counted() -> TestResult {
    let (mut controller, hw) = mock_controller(four_lanes()?);
    for _ in 0..70 {
        hw.gate_reopen();
    }
    assert_eq!(controller.dropped_events(), 6);
    controller.poll();
    assert_eq!(controller.state(), RaceState::Idle);
    assert_eq!(controller.dropped_events(), 6);
    Ok(())
}

proptest! {
    #[test]
    fn prop_force_finish_keeps_every_captured_finish(
        finishes in proptest::collection::vec(
            proptest::option::of((1u64..4_000_000, any::<bool>())),
            1..=4,
        )
    ) {
        let mut config = RaceConfig::default();
        let lanes = u8::try_from(finishes.len()).unwrap_or(4);
        prop_assert!(config.set_lane_count(lanes).is_ok());
        let (mut controller, hw) = start_race(config);

        let mut crossings: Vec<(u64, usize, bool)> = finishes
            .iter()
            .enumerate()
            .filter_map(|(lane, finish)| finish.map(|(at_us, poll)| (at_us, lane, poll)))
            .collect();
        crossings.sort_unstable();

        let mut now_us = 0;
        for (at_us, lane, poll) in crossings {
            hw.advance_us(at_us.saturating_sub(now_us));
            now_us = at_us;
            prop_assert!(hw.trigger_lane(lane));
            if poll {
                controller.poll();
            }
        }
        controller.handle_line("RA");

        prop_assert_eq!(controller.state(), RaceState::ReportingTimes);
        for (lane, finish) in finishes.iter().enumerate() {
            let expected = finish.map_or(Ticks::DNF, |(at_us, _)| Ticks::between(0, at_us));
            prop_assert_eq!(controller.lanes().get(lane).map(|l| l.elapsed()), Some(expected));
        }
    }
}
