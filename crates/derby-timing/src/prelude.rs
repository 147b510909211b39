//! Prelude for derby-timing.

pub use crate::MAX_LANES;
pub use crate::config::{DISPLAY_CYCLE, IDENTIFICATION, RaceConfig, RaceConfigBuilder};
pub use crate::finish_order::rank;
pub use crate::lane::{Lane, Lanes};
pub use crate::report::{LaneDisplay, lane_banner, positions_frame, result_line, times_frame};
pub use crate::ticks::{DNF_TICKS, RACE_TIMEOUT, Ticks};
