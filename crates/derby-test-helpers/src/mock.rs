//! Deterministic in-memory platform.
//!
//! [`MockPlatform`] implements every port with shared state behind a
//! `parking_lot::Mutex`; the matching [`MockHandle`] stays with the test and
//! plays the role of the hardware: it moves the manual clock, fires due
//! timers through the controller's [`TimerSink`], and raises sensor edges
//! through its [`SensorSink`] only when the controller armed that sensor.

use std::sync::Arc;
use std::time::Duration;

use derby_controller::{
    Clock, DisplayAdapter, GateEdge, RaceController, SensorPort, SensorSink, SerialLink, TimerHandle,
    TimerService, TimerSink, TimerToken,
};
use derby_timing::{MAX_LANES, RaceConfig};
use parking_lot::Mutex;

/// What a mock lane display currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayCell {
    /// Nothing written yet, or cleared.
    #[default]
    Blank,
    /// Text written with `show_text`.
    Text(String),
    /// Time written with `show_time`.
    Time(String),
}

impl DisplayCell {
    /// Shown characters, empty when blank.
    pub fn as_str(&self) -> &str {
        match self {
            DisplayCell::Blank => "",
            DisplayCell::Text(s) | DisplayCell::Time(s) => s,
        }
    }
}

/// A timer the controller has scheduled and not cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    /// Clock reading at which it fires.
    pub due_us: u64,
    /// Requested delay.
    pub delay: Duration,
    /// Token handed back on expiry.
    pub token: TimerToken,
    /// Handle returned to the controller.
    pub handle: TimerHandle,
}

#[derive(Debug)]
struct MockState {
    now_us: u64,
    lane_armed: [bool; MAX_LANES],
    lane_levels: [bool; MAX_LANES],
    gate_armed: bool,
    gate_open: bool,
    timers: Vec<ScheduledTimer>,
    next_handle: u64,
    cancelled: Vec<TimerHandle>,
    displays: [DisplayCell; MAX_LANES],
    serial: Vec<String>,
    sensor_sink: Option<SensorSink>,
    timer_sink: Option<TimerSink>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            now_us: 0,
            lane_armed: [false; MAX_LANES],
            lane_levels: [true; MAX_LANES],
            gate_armed: false,
            gate_open: true,
            timers: Vec::new(),
            next_handle: 0,
            cancelled: Vec::new(),
            displays: Default::default(),
            serial: Vec::new(),
            sensor_sink: None,
            timer_sink: None,
        }
    }
}

/// Platform side of the mock, owned by the controller.
#[derive(Debug)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

/// Test side of the mock.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    /// Create a platform and the handle that drives it.
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockHandle { state },
        )
    }
}

/// Build a booted controller on a fresh mock platform with its sinks connected.
pub fn mock_controller(config: RaceConfig) -> (RaceController<MockPlatform>, MockHandle) {
    let (platform, handle) = MockPlatform::new();
    let mut controller = RaceController::new(platform, config);
    handle.connect(controller.sensor_sink(), controller.timer_sink());
    controller.boot();
    (controller, handle)
}

impl Clock for MockPlatform {
    fn now_us(&self) -> u64 {
        self.state.lock().now_us
    }
}

impl SensorPort for MockPlatform {
    fn set_lane_armed(&mut self, lane: usize, armed: bool) {
        if let Some(slot) = self.state.lock().lane_armed.get_mut(lane) {
            *slot = armed;
        }
    }

    fn set_gate_armed(&mut self, armed: bool) {
        self.state.lock().gate_armed = armed;
    }

    fn lane_level(&self, lane: usize) -> bool {
        self.state.lock().lane_levels.get(lane).copied().unwrap_or(false)
    }

    fn gate_level(&self) -> bool {
        self.state.lock().gate_open
    }
}

impl TimerService for MockPlatform {
    fn schedule_once(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = TimerHandle(state.next_handle);
        let due_us = state.now_us + u64::try_from(delay.as_micros()).unwrap_or(u64::MAX);
        state.timers.push(ScheduledTimer {
            due_us,
            delay,
            token,
            handle,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut state = self.state.lock();
        state.timers.retain(|timer| timer.handle != handle);
        state.cancelled.push(handle);
    }
}

impl DisplayAdapter for MockPlatform {
    fn clear(&mut self, lane: usize) {
        if let Some(cell) = self.state.lock().displays.get_mut(lane) {
            *cell = DisplayCell::Blank;
        }
    }

    fn show_text(&mut self, lane: usize, text: &str) {
        if let Some(cell) = self.state.lock().displays.get_mut(lane) {
            *cell = DisplayCell::Text(text.to_string());
        }
    }

    fn show_time(&mut self, lane: usize, time: &str) {
        if let Some(cell) = self.state.lock().displays.get_mut(lane) {
            *cell = DisplayCell::Time(time.to_string());
        }
    }
}

impl SerialLink for MockPlatform {
    fn write_line(&mut self, line: &str) {
        self.state.lock().serial.push(line.to_string());
    }
}

impl MockHandle {
    /// Wire the controller's interrupt-side handles into the mock hardware.
    pub fn connect(&self, sensors: SensorSink, timers: TimerSink) {
        let mut state = self.state.lock();
        state.sensor_sink = Some(sensors);
        state.timer_sink = Some(timers);
    }

    /// Current clock reading.
    pub fn now_us(&self) -> u64 {
        self.state.lock().now_us
    }

    /// Move the clock forward, firing every timer that falls due on the way
    /// in due order.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock();
        let target = state.now_us + u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        loop {
            let next = state
                .timers
                .iter()
                .enumerate()
                .filter(|(_, timer)| timer.due_us <= target)
                .min_by_key(|(_, timer)| timer.due_us)
                .map(|(index, _)| index);
            let Some(index) = next else { break };
            let timer = state.timers.remove(index);
            state.now_us = state.now_us.max(timer.due_us);
            if let Some(sink) = &state.timer_sink {
                sink.fired(timer.token);
            }
        }
        state.now_us = target;
    }

    /// Move the clock forward by `us` microseconds.
    pub fn advance_us(&self, us: u64) {
        self.advance(Duration::from_micros(us));
    }

    /// Close the gate into its ready position. The edge is delivered only
    /// while the gate sensor is armed.
    pub fn gate_ready(&self) -> bool {
        let mut state = self.state.lock();
        state.gate_open = false;
        Self::deliver_gate(&state, GateEdge::Ready)
    }

    /// Reopen the gate. The edge is delivered only while the gate sensor is armed.
    pub fn gate_reopen(&self) -> bool {
        let mut state = self.state.lock();
        state.gate_open = true;
        Self::deliver_gate(&state, GateEdge::Reopened)
    }

    fn deliver_gate(state: &MockState, edge: GateEdge) -> bool {
        match (&state.sensor_sink, state.gate_armed) {
            (Some(sink), true) => {
                sink.gate_edge(edge, state.now_us);
                true
            }
            _ => false,
        }
    }

    /// A car crosses `lane` now. The edge is delivered only while the lane
    /// sensor is armed; returns whether it was.
    pub fn trigger_lane(&self, lane: usize) -> bool {
        let state = self.state.lock();
        let armed = state.lane_armed.get(lane).copied().unwrap_or(false);
        match (&state.sensor_sink, armed) {
            (Some(sink), true) => {
                sink.lane_triggered(lane, state.now_us);
                true
            }
            _ => false,
        }
    }

    /// Raise an edge on `lane` at `at_us` regardless of arming, as a glitching
    /// sensor would.
    pub fn raw_lane_edge(&self, lane: usize, at_us: u64) {
        if let Some(sink) = &self.state.lock().sensor_sink {
            sink.lane_triggered(lane, at_us);
        }
    }

    /// Set the raw level reported for `lane`.
    pub fn set_lane_level(&self, lane: usize, high: bool) {
        if let Some(level) = self.state.lock().lane_levels.get_mut(lane) {
            *level = high;
        }
    }

    /// Whether the controller has `lane` armed.
    pub fn lane_armed(&self, lane: usize) -> bool {
        self.state.lock().lane_armed.get(lane).copied().unwrap_or(false)
    }

    /// Armed state of every lane slot.
    pub fn armed_lanes(&self) -> Vec<bool> {
        self.state.lock().lane_armed.to_vec()
    }

    /// Whether the controller has the gate armed.
    pub fn gate_armed(&self) -> bool {
        self.state.lock().gate_armed
    }

    /// Timers scheduled and not yet fired or cancelled.
    pub fn pending_timers(&self) -> Vec<ScheduledTimer> {
        self.state.lock().timers.clone()
    }

    /// Handles the controller cancelled, in order.
    pub fn cancelled_timers(&self) -> Vec<TimerHandle> {
        self.state.lock().cancelled.clone()
    }

    /// What `lane` currently shows.
    pub fn display(&self, lane: usize) -> DisplayCell {
        self.state
            .lock()
            .displays
            .get(lane)
            .cloned()
            .unwrap_or_default()
    }

    /// Every serial line written so far, without terminators.
    pub fn serial_lines(&self) -> Vec<String> {
        self.state.lock().serial.clone()
    }

    /// Serial lines written since the last call, draining them.
    pub fn take_serial(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().serial)
    }

    /// The most recent serial line.
    pub fn last_line(&self) -> Option<String> {
        self.state.lock().serial.last().cloned()
    }

    /// The serial output as it appears on the wire, CR LF terminated.
    pub fn transcript(&self) -> String {
        self.state
            .lock()
            .serial
            .iter()
            .map(|line| format!("{line}\r\n"))
            .collect()
    }
}
