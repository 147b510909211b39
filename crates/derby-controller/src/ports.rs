//! Port traits separating the race controller from the hardware.
//!
//! The controller only ever talks to the outside world through these traits.
//! Implementations are simple I/O wrappers (GPIO, display bus, UART, a host
//! simulation or a test mock); none of them feed anything back into the core
//! except through [`SensorSink`](crate::SensorSink) and
//! [`TimerSink`](crate::TimerSink).

use core::time::Duration;

use crate::timers::{TimerHandle, TimerToken};

/// Monotonic microsecond clock.
pub trait Clock {
    /// Current reading in microseconds. Never goes backwards.
    fn now_us(&self) -> u64;
}

/// Lane and gate sensor control.
///
/// Arming decides whether the platform delivers edges for that sensor at all.
pub trait SensorPort {
    /// Enable or disable falling-edge delivery for `lane`.
    fn set_lane_armed(&mut self, lane: usize, armed: bool);

    /// Enable or disable gate edge delivery.
    fn set_gate_armed(&mut self, armed: bool);

    /// Raw level of the lane sensor (`true` = high).
    fn lane_level(&self, lane: usize) -> bool;

    /// Raw level of the gate sensor (`true` = open/started).
    fn gate_level(&self) -> bool;
}

/// One-shot cancelable timers.
///
/// Expiry is not a callback: the platform reports it by pushing the token
/// through a [`TimerSink`](crate::TimerSink), so it reaches the control loop
/// on the same queue as the gate edges.
pub trait TimerService {
    /// Schedule `token` to fire once after `delay`.
    fn schedule_once(&mut self, delay: Duration, token: TimerToken) -> TimerHandle;

    /// Cancel a scheduled timer. Cancelling a fired or unknown handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Per-lane numeric display, fire-and-forget.
pub trait DisplayAdapter {
    /// Blank the display.
    fn clear(&mut self, lane: usize);

    /// Show up to five characters.
    fn show_text(&mut self, lane: usize, text: &str);

    /// Show a `D.DDD` time.
    fn show_time(&mut self, lane: usize, time: &str);
}

/// Line-oriented serial output.
pub trait SerialLink {
    /// Write `line` followed by CR LF.
    fn write_line(&mut self, line: &str);
}

/// Everything the controller needs from the platform.
pub trait Platform: Clock + SensorPort + TimerService + DisplayAdapter + SerialLink {}

impl<T> Platform for T where T: Clock + SensorPort + TimerService + DisplayAdapter + SerialLink {}
