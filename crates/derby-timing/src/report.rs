//! Text produced for the serial link and the lane displays.

use crate::config::RaceConfig;
use crate::lane::{Lane, Lanes};

/// Display text for a lane without a valid finish.
pub const DNF_TEXT: &str = "dnF";

/// Display text on a lane armed for a sensor test.
pub const TEST_PLACEHOLDER: &str = "----";

/// Decimal places of a time pushed to a lane display (`D.DDD`).
pub const DISPLAY_DECIMALS: u8 = 3;

/// What one lane display should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneDisplay {
    /// A `D.DDD` elapsed time.
    Time(String),
    /// Free text of at most five characters.
    Text(String),
}

impl LaneDisplay {
    fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Banner shown on lane `index` at boot (` L1 `, ` L2 `, ...).
#[must_use]
pub fn lane_banner(index: usize) -> String {
    format!(" L{} ", index.saturating_add(1))
}

/// Position text shown in the positions phase (`"  2 "`).
#[must_use]
pub fn position_text(position: u8) -> String {
    format!("  {position} ")
}

/// Time field written in place of a masked lane's value: `10.` padded with
/// zeros to the configured decimal places.
#[must_use]
pub fn masked_placeholder(decimal_places: u8) -> String {
    format!("10.{}", "0".repeat(usize::from(decimal_places)))
}

/// Scored result line, without the line terminator.
///
/// One `L=T.TTTTp ` field per configured lane: label, time truncated to the
/// configured decimal places, then a position symbol or a space.
#[must_use]
pub fn result_line(lanes: &Lanes, config: &RaceConfig) -> String {
    let decimals = config.decimal_places();
    let mut line = String::with_capacity(config.lanes().saturating_mul(10));
    for lane in lanes.active(config.lanes()) {
        let time = if lane.is_masked() {
            masked_placeholder(decimals)
        } else {
            lane.elapsed().seconds_text(decimals)
        };
        let place = config.position_label(lane.position()).unwrap_or(' ');
        line.push(config.lane_label(lane.index()));
        line.push('=');
        line.push_str(&time);
        line.push(place);
        line.push(' ');
    }
    line
}

fn time_display(lane: &Lane) -> LaneDisplay {
    if lane.elapsed().is_dnf() {
        LaneDisplay::text(DNF_TEXT)
    } else {
        LaneDisplay::Time(lane.elapsed().seconds_text(DISPLAY_DECIMALS))
    }
}

/// Times phase of the results display. Masked lanes are left untouched.
#[must_use]
pub fn times_frame(lanes: &Lanes, config: &RaceConfig) -> Vec<(usize, LaneDisplay)> {
    lanes
        .active(config.lanes())
        .filter(|lane| !lane.is_masked())
        .map(|lane| (lane.index(), time_display(lane)))
        .collect()
}

/// Positions phase of the results display. Lanes without a position,
/// masked ones included, show [`DNF_TEXT`].
#[must_use]
pub fn positions_frame(lanes: &Lanes, config: &RaceConfig) -> Vec<(usize, LaneDisplay)> {
    lanes
        .active(config.lanes())
        .map(|lane| {
            let display = match lane.position() {
                0 => LaneDisplay::text(DNF_TEXT),
                position => LaneDisplay::Text(position_text(position)),
            };
            (lane.index(), display)
        })
        .collect()
}
