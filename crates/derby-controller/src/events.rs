//! Interrupt-side entry points.
//!
//! The platform's interrupt handlers and timer callbacks get a
//! [`SensorSink`] and a [`TimerSink`]. Both only read their arguments and
//! perform a bounded number of atomic operations: lane edges land in the
//! capture bank, gate edges and timer expirations in the event queue.
//!
//! # Interrupt Safety
//!
//! Every method here is interrupt-safe: no allocation, no locks, no logging.

use std::sync::Arc;

use derby_atomic::{CaptureBank, EventQueue};
use derby_timing::MAX_LANES;

use crate::timers::TimerToken;

/// Direction of a start gate transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateEdge {
    /// Gate moved to its ready position; the race clock starts here.
    Ready,
    /// Gate reopened; the operator is resetting for the next heat.
    Reopened,
}

/// Event queued for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// Gate transition observed at `at_us`.
    Gate {
        /// Transition direction
        edge: GateEdge,
        /// Clock reading in the interrupt context
        at_us: u64,
    },
    /// A scheduled timer expired.
    TimerFired(TimerToken),
}

pub(crate) type Captures = Arc<CaptureBank<MAX_LANES>>;
pub(crate) type Events = Arc<EventQueue<PlatformEvent>>;

/// Handle given to the sensor interrupt handlers.
#[derive(Debug, Clone)]
pub struct SensorSink {
    captures: Captures,
    events: Events,
}

impl SensorSink {
    pub(crate) fn new(captures: Captures, events: Events) -> Self {
        Self { captures, events }
    }

    /// A lane sensor produced a falling edge at `at_us`.
    ///
    /// Only the first edge per lane is kept until the control loop consumes it.
    #[inline]
    pub fn lane_triggered(&self, lane: usize, at_us: u64) {
        self.captures.record(lane, at_us);
    }

    /// The gate changed state at `at_us`.
    #[inline]
    pub fn gate_edge(&self, edge: GateEdge, at_us: u64) {
        self.events.push(PlatformEvent::Gate { edge, at_us });
    }
}

/// Handle given to the platform's timer service.
#[derive(Debug, Clone)]
pub struct TimerSink {
    events: Events,
}

impl TimerSink {
    pub(crate) fn new(events: Events) -> Self {
        Self { events }
    }

    /// The timer scheduled with `token` expired.
    #[inline]
    pub fn fired(&self, token: TimerToken) {
        self.events.push(PlatformEvent::TimerFired(token));
    }
}
