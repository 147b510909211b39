//! Prelude for derby-controller.
//!
//! ```
//! use derby_controller::prelude::*;
//!
//! assert_eq!(RaceState::default(), RaceState::Idle);
//! ```

pub use crate::controller::RaceController;
pub use crate::events::{GateEdge, SensorSink, TimerSink};
pub use crate::machine::{Notice, RaceState};
pub use crate::ports::{Clock, DisplayAdapter, Platform, SensorPort, SerialLink, TimerService};
pub use crate::protocol::{Command, LineAssembler, parse};
pub use crate::timers::{TimerHandle, TimerPurpose, TimerToken};
