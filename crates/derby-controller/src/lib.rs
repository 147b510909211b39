//! Race control for the derby timer.
//!
//! This crate ties the pure race domain (`derby-timing`) to a platform:
//!
//! - [`ports`]: the traits a platform implements (clock, sensors, timers,
//!   displays, serial link)
//! - [`events`]: the interrupt-side [`SensorSink`] and [`TimerSink`]
//! - [`timers`]: one timer slot per purpose, with stale-expiry detection
//! - [`machine`]: the race lifecycle as a pure transition function
//! - [`protocol`]: line assembly, command parsing and configuration commands
//! - [`controller`]: [`RaceController`], the cooperative control loop
//!
//! # Concurrency model
//!
//! Interrupt handlers only call [`SensorSink`] and [`TimerSink`]; those touch a
//! capture cell or push onto a bounded queue and return. Everything else runs
//! on the control loop through [`RaceController::poll`] and
//! [`RaceController::handle_line`].
//!
//! # Example
//!
//! ```ignore
//! let mut controller = RaceController::new(platform, RaceConfig::default());
//! platform_irq.install(controller.sensor_sink(), controller.timer_sink());
//! controller.boot();
//! loop {
//!     controller.poll();
//!     if let Some(bytes) = uart.read() {
//!         controller.receive(bytes);
//!     }
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod controller;
pub mod events;
pub mod machine;
pub mod ports;
pub mod prelude;
pub mod protocol;
pub mod timers;

pub use controller::RaceController;
pub use events::{GateEdge, PlatformEvent, SensorSink, TimerSink};
pub use machine::{Effect, Event, Notice, RaceState, Transition, transition};
pub use ports::{Clock, DisplayAdapter, Platform, SensorPort, SerialLink, TimerService};
pub use timers::{TimerHandle, TimerPurpose, TimerSlots, TimerToken};
