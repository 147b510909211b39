//! Host platform for running the controller on a desktop.
//!
//! Timers are tokio tasks that hand their token back through the controller's
//! [`TimerSink`]; the clock is tokio's, so a runtime started paused gives the
//! demo a virtual clock. Sensors are simulated by [`Track`]: edges are raised
//! only while the controller has that sensor armed, as real hardware would.
//! Serial output is collected in an outbox the caller flushes to stdout.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use derby_controller::{
    Clock, DisplayAdapter, GateEdge, SensorPort, SensorSink, SerialLink, TimerHandle,
    TimerService, TimerSink, TimerToken,
};
use derby_timing::MAX_LANES;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::CliError;

#[derive(Debug)]
struct Wiring {
    epoch: Instant,
    lane_armed: [bool; MAX_LANES],
    lane_levels: [bool; MAX_LANES],
    gate_armed: bool,
    gate_open: bool,
    sensors: Option<SensorSink>,
    timers: Option<TimerSink>,
}

impl Wiring {
    fn now_us(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Platform side, owned by the controller.
#[derive(Debug)]
pub struct HostPlatform {
    wiring: Arc<Mutex<Wiring>>,
    next_handle: u64,
    pending: HashMap<u64, JoinHandle<()>>,
    displays: [String; MAX_LANES],
    outbox: Vec<String>,
}

/// Simulated track: the gate and the lane sensors.
#[derive(Debug, Clone)]
pub struct Track {
    wiring: Arc<Mutex<Wiring>>,
}

impl HostPlatform {
    /// Create the platform and the track it senses. The clock starts now.
    pub fn new() -> (Self, Track) {
        let wiring = Arc::new(Mutex::new(Wiring {
            epoch: Instant::now(),
            lane_armed: [false; MAX_LANES],
            lane_levels: [true; MAX_LANES],
            gate_armed: false,
            gate_open: true,
            sensors: None,
            timers: None,
        }));
        let platform = Self {
            wiring: Arc::clone(&wiring),
            next_handle: 0,
            pending: HashMap::new(),
            displays: Default::default(),
            outbox: Vec::new(),
        };
        (platform, Track { wiring })
    }

    /// Serial lines written since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// What every lane display shows.
    pub fn displays(&self) -> &[String] {
        &self.displays
    }

    fn set_display(&mut self, lane: usize, text: &str) {
        if let Some(cell) = self.displays.get_mut(lane) {
            text.clone_into(cell);
            debug!(lane, text, "display");
        }
    }
}

impl Clock for HostPlatform {
    fn now_us(&self) -> u64 {
        self.wiring.lock().now_us()
    }
}

impl SensorPort for HostPlatform {
    fn set_lane_armed(&mut self, lane: usize, armed: bool) {
        if let Some(slot) = self.wiring.lock().lane_armed.get_mut(lane) {
            *slot = armed;
        }
    }

    fn set_gate_armed(&mut self, armed: bool) {
        self.wiring.lock().gate_armed = armed;
    }

    fn lane_level(&self, lane: usize) -> bool {
        self.wiring.lock().lane_levels.get(lane).copied().unwrap_or(false)
    }

    fn gate_level(&self) -> bool {
        self.wiring.lock().gate_open
    }
}

impl TimerService for HostPlatform {
    fn schedule_once(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = self.next_handle;
        self.pending.retain(|_, task| !task.is_finished());

        let sink = self.wiring.lock().timers.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(sink) = sink {
                sink.fired(token);
            }
        });
        self.pending.insert(handle, task);
        trace!(handle, ?delay, timer = %token.purpose(), "timer scheduled");
        TimerHandle(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.pending.remove(&handle.0) {
            task.abort();
        }
    }
}

impl DisplayAdapter for HostPlatform {
    fn clear(&mut self, lane: usize) {
        self.set_display(lane, "");
    }

    fn show_text(&mut self, lane: usize, text: &str) {
        self.set_display(lane, text);
    }

    fn show_time(&mut self, lane: usize, time: &str) {
        self.set_display(lane, time);
    }
}

impl SerialLink for HostPlatform {
    fn write_line(&mut self, line: &str) {
        self.outbox.push(line.to_string());
    }
}

impl Track {
    /// Wire the controller's interrupt-side handles to the track and timers.
    pub fn connect(&self, sensors: SensorSink, timers: TimerSink) {
        let mut wiring = self.wiring.lock();
        wiring.sensors = Some(sensors);
        wiring.timers = Some(timers);
    }

    /// Microseconds since the platform was created.
    pub fn now_us(&self) -> u64 {
        self.wiring.lock().now_us()
    }

    /// Close the gate. Returns whether the edge reached the controller.
    pub fn ready(&self) -> bool {
        let mut wiring = self.wiring.lock();
        wiring.gate_open = false;
        Self::gate_edge(&wiring, GateEdge::Ready)
    }

    /// Open the gate. Returns whether the edge reached the controller.
    pub fn reopen(&self) -> bool {
        let mut wiring = self.wiring.lock();
        wiring.gate_open = true;
        Self::gate_edge(&wiring, GateEdge::Reopened)
    }

    fn gate_edge(wiring: &Wiring, edge: GateEdge) -> bool {
        match (&wiring.sensors, wiring.gate_armed) {
            (Some(sink), true) => {
                sink.gate_edge(edge, wiring.now_us());
                true
            }
            _ => false,
        }
    }

    /// A car crosses the finish on the 0-based `lane` now.
    pub fn finish(&self, lane: usize) -> bool {
        let now_us = self.now_us();
        self.finish_at(lane, now_us)
    }

    /// A car crossed the finish on `lane` at `at_us`.
    pub fn finish_at(&self, lane: usize, at_us: u64) -> bool {
        let wiring = self.wiring.lock();
        let armed = wiring.lane_armed.get(lane).copied().unwrap_or(false);
        match (&wiring.sensors, armed) {
            (Some(sink), true) => {
                sink.lane_triggered(lane, at_us);
                true
            }
            _ => false,
        }
    }

    /// Set the raw level of the 0-based `lane`.
    pub fn set_level(&self, lane: usize, high: bool) {
        if let Some(level) = self.wiring.lock().lane_levels.get_mut(lane) {
            *level = high;
        }
    }

    /// Apply a typed-in track command.
    pub fn apply(&self, command: TrackCommand) {
        let delivered = match command {
            TrackCommand::Ready => self.ready(),
            TrackCommand::Reopen => self.reopen(),
            TrackCommand::Finish(lane) => self.finish(lane),
            TrackCommand::Level { lane, high } => {
                self.set_level(lane, high);
                true
            }
        };
        if !delivered {
            warn!(?command, "sensor not armed, edge not delivered");
        }
    }
}

/// Simulated track input typed after a `!` on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackCommand {
    /// `!ready`
    Ready,
    /// `!reopen`
    Reopen,
    /// `!lane N`, N 1-based
    Finish(usize),
    /// `!level N 0|1`, N 1-based
    Level { lane: usize, high: bool },
}

impl FromStr for TrackCommand {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || CliError::TrackCommand(s.to_string());
        let mut words = s.split_whitespace();
        let command = match (words.next(), words.next(), words.next()) {
            (Some("ready"), None, None) => TrackCommand::Ready,
            (Some("reopen"), None, None) => TrackCommand::Reopen,
            (Some("lane"), Some(number), None) => {
                TrackCommand::Finish(lane_index(number).ok_or_else(unknown)?)
            }
            (Some("level"), Some(number), Some(level)) => TrackCommand::Level {
                lane: lane_index(number).ok_or_else(unknown)?,
                high: match level {
                    "1" => true,
                    "0" => false,
                    _ => return Err(unknown()),
                },
            },
            _ => return Err(unknown()),
        };
        if words.next().is_some() {
            return Err(unknown());
        }
        Ok(command)
    }
}

fn lane_index(number: &str) -> Option<usize> {
    let number: usize = number.parse().ok()?;
    number.checked_sub(1).filter(|index| *index < MAX_LANES)
}
