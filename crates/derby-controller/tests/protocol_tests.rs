//! Serial command tests through the controller and the mock platform.

use derby_controller::prelude::*;
use derby_test_helpers::prelude::*;
use derby_timing::RaceConfig;
use proptest::prelude::*;

type Booted = (RaceController<MockPlatform>, MockHandle);

fn booted(lanes: u8) -> Result<Booted, Box<dyn std::error::Error>> {
    let mut config = RaceConfig::default();
    config.set_lane_count(lanes)?;
    let (controller, hw) = mock_controller(config);
    hw.take_serial();
    Ok((controller, hw))
}

/// Send `line` and return every reply line it produced.
fn ask(controller: &mut RaceController<MockPlatform>, hw: &MockHandle, line: &str) -> Vec<String> {
    controller.handle_line(line);
    hw.take_serial()
}

#[test]
fn test_decimal_places_query_set_query() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    assert_eq!(ask(&mut controller, &hw, "OD"), vec!["4"]);
    assert_eq!(ask(&mut controller, &hw, "OD3"), vec!["OK"]);
    assert_eq!(ask(&mut controller, &hw, "OD"), vec!["3"]);
    assert_eq!(controller.config().decimal_places(), 3);
    Ok(())
}

#[test]
fn test_rejected_commands_answer_question_mark() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    for line in ["OD9", "ON0", "ON9", "OM5", "OL4", "OP7", "X", "RZ", "O", "Ax", "OD33"] {
        assert_eq!(ask(&mut controller, &hw, line), vec!["?"], "line {line:?}");
    }
    assert_eq!(controller.config().decimal_places(), 4);
    assert_eq!(controller.config().lane_count(), 4);
    Ok(())
}

#[test]
fn test_version_identifies_controller() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    assert_eq!(ask(&mut controller, &hw, "V"), vec!["PiDerby"]);
    assert_eq!(ask(&mut controller, &hw, "v"), vec!["PiDerby"]);
    Ok(())
}

#[test]
fn test_lane_levels_mark_masked_lanes() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    hw.set_lane_level(1, false);
    assert_eq!(ask(&mut controller, &hw, "RL"), vec!["1011"]);

    assert_eq!(ask(&mut controller, &hw, "OM3"), vec!["OK"]);
    assert_eq!(ask(&mut controller, &hw, "RL"), vec!["10-1"]);
    Ok(())
}

#[test]
fn test_mask_query_and_clear() -> TestResult {
    let (mut controller, hw) = booted(6)?;
    assert_eq!(ask(&mut controller, &hw, "OM"), vec![""]);
    ask(&mut controller, &hw, "OM5");
    ask(&mut controller, &hw, "OM2");
    ask(&mut controller, &hw, "OM2");
    assert_eq!(ask(&mut controller, &hw, "OM"), vec!["25"]);
    assert_eq!(ask(&mut controller, &hw, "OM0"), vec!["OK"]);
    assert_eq!(ask(&mut controller, &hw, "OM"), vec![""]);
    Ok(())
}

#[test]
fn test_gate_level_queries() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    assert_eq!(ask(&mut controller, &hw, "RR"), vec!["0"]);
    assert_eq!(ask(&mut controller, &hw, "RS"), vec!["1"]);

    hw.gate_ready();
    assert_eq!(ask(&mut controller, &hw, "RR"), vec!["1"]);
    assert_eq!(ask(&mut controller, &hw, "RS"), vec!["0"]);
    Ok(())
}

#[test]
fn test_repeat_result_before_any_race() -> TestResult {
    let (mut controller, hw) = booted(2)?;
    assert_eq!(ask(&mut controller, &hw, "RP"), vec!["A=10.0000  B=10.0000  "]);
    Ok(())
}

#[test]
fn test_label_tables_change_result_line() -> TestResult {
    let (mut controller, hw) = booted(2)?;
    hw.gate_ready();
    controller.poll();
    controller.poll();
    hw.advance_us(1_500_000);
    hw.trigger_lane(1);
    controller.poll();
    controller.handle_line("RA");
    hw.take_serial();

    assert_eq!(ask(&mut controller, &hw, "OL1"), vec!["OK"]);
    assert_eq!(ask(&mut controller, &hw, "OP3"), vec!["OK"]);
    assert_eq!(ask(&mut controller, &hw, "OL"), vec!["1"]);
    assert_eq!(ask(&mut controller, &hw, "OP"), vec!["!"]);
    assert_eq!(ask(&mut controller, &hw, "RP"), vec!["1=10.0000  2=1.5000! "]);
    Ok(())
}

#[test]
fn test_tie_allowance_and_auto_reset_round_trip() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    assert_eq!(ask(&mut controller, &hw, "A"), vec!["1"]);
    assert_eq!(ask(&mut controller, &hw, "A250"), vec!["OK"]);
    assert_eq!(ask(&mut controller, &hw, "A"), vec!["250"]);
    assert_eq!(ask(&mut controller, &hw, "OR"), vec!["0"]);
    assert_eq!(ask(&mut controller, &hw, "OR30"), vec!["OK"]);
    assert_eq!(ask(&mut controller, &hw, "OR"), vec!["30"]);
    Ok(())
}

#[test]
fn test_compatibility_options_accepted() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    for line in ["OF", "OV1", "OW"] {
        assert_eq!(ask(&mut controller, &hw, line), vec!["OK"], "line {line:?}");
    }
    Ok(())
}

#[test]
fn test_lane_count_change_applies_to_next_race() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    assert_eq!(ask(&mut controller, &hw, "ON2"), vec!["OK"]);
    hw.gate_ready();
    controller.poll();
    controller.poll();
    assert_eq!(
        hw.armed_lanes(),
        vec![true, true, false, false, false, false, false, false]
    );
    Ok(())
}

#[test]
fn test_receive_assembles_lines() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    controller.receive(b"O");
    assert!(hw.serial_lines().is_empty());
    controller.receive(b"D\r\nV\r\n");
    assert_eq!(hw.transcript(), "4\r\nPiDerby\r\n");
    Ok(())
}

#[test]
fn test_receive_rejects_overlong_line() -> TestResult {
    let (mut controller, hw) = booted(4)?;
    let mut bytes = vec![b'A'; 60];
    bytes.extend_from_slice(b"\rV\r");
    controller.receive(&bytes);
    assert_eq!(hw.take_serial(), vec!["?", "PiDerby"]);
    Ok(())
}

proptest! {
    #[test]
    fn prop_every_line_gets_exactly_one_reply(line in "[ -~]{0,12}") {
        let (mut controller, hw) = mock_controller(RaceConfig::default());
        hw.take_serial();
        controller.handle_line(&line);
        prop_assert_eq!(hw.take_serial().len(), 1);
    }
}
