//! Race domain for the derby timer: tick arithmetic, lane state, configuration,
//! finish-order scoring and the text shown on the serial link and lane displays.
//!
//! Everything here is pure data and pure functions. The interrupt-side capture
//! cells live in `derby-atomic`; the state machine that drives these types lives
//! in `derby-controller`.
//!
//! # Example
//!
//! ```
//! use derby_timing::prelude::*;
//!
//! let mut config = RaceConfig::default();
//! config.set_lane_count(4).unwrap();
//!
//! let mut lanes = Lanes::new();
//! lanes.prepare_race(config.lanes());
//! for (index, ticks) in [100, 100, 250].into_iter().enumerate() {
//!     lanes.get_mut(index).unwrap().record_finish(Ticks::new(ticks));
//! }
//! lanes.score(&config);
//!
//! assert_eq!(result_line(&lanes, &config), "A=0.0010a B=0.0010a C=0.0025c D=10.0000  ");
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod finish_order;
pub mod lane;
pub mod prelude;
pub mod report;
pub mod ticks;

pub use config::{DISPLAY_CYCLE, IDENTIFICATION, RaceConfig, RaceConfigBuilder};
pub use finish_order::rank;
pub use lane::{Lane, Lanes};
pub use report::{
    DNF_TEXT, LaneDisplay, TEST_PLACEHOLDER, lane_banner, positions_frame, result_line,
    times_frame,
};
pub use ticks::{DNF_TICKS, RACE_TIMEOUT, Ticks};

/// Number of sensor/display slots on the controller.
pub const MAX_LANES: usize = 8;
