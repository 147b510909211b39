//! The cooperative control loop.
//!
//! [`RaceController`] owns the platform, the configuration, the lane state and
//! the timer slots. Everything that is not an interrupt happens here, on one
//! thread, driven by repeated calls to [`RaceController::poll`] and by command
//! lines handed to [`RaceController::handle_line`].

use std::sync::Arc;

use derby_atomic::{CaptureBank, EventQueue};
use derby_errors::{DerbyError, ProtocolError, ProtocolResult};
use derby_timing::report::TEST_PLACEHOLDER;
use derby_timing::{
    IDENTIFICATION, LaneDisplay, Lanes, MAX_LANES, RaceConfig, Ticks, lane_banner,
    positions_frame, result_line, times_frame,
};
use tracing::{debug, info, trace, warn};

use crate::events::{Captures, Events, GateEdge, PlatformEvent, SensorSink, TimerSink};
use crate::machine::{Effect, Event, RaceState, transition};
use crate::ports::Platform;
use crate::protocol::{Command, LineAssembler, OK_REPLY, RaceCommand, apply_config, parse};
use crate::timers::TimerSlots;

/// Race controller bound to a platform.
#[derive(Debug)]
pub struct RaceController<P: Platform> {
    platform: P,
    config: RaceConfig,
    lanes: Lanes,
    state: RaceState,
    start_us: u64,
    timers: TimerSlots,
    captures: Captures,
    events: Events,
    reported_drops: u64,
    assembler: LineAssembler,
}

impl<P: Platform> RaceController<P> {
    /// Create a controller in [`RaceState::Idle`].
    ///
    /// Nothing is written to the platform until [`boot`](Self::boot).
    pub fn new(platform: P, config: RaceConfig) -> Self {
        Self {
            platform,
            config,
            lanes: Lanes::new(),
            state: RaceState::Idle,
            start_us: 0,
            timers: TimerSlots::new(),
            captures: Arc::new(CaptureBank::new()),
            events: Arc::new(EventQueue::new()),
            reported_drops: 0,
            assembler: LineAssembler::new(),
        }
    }

    /// Handle for the sensor interrupt handlers.
    #[must_use]
    pub fn sensor_sink(&self) -> SensorSink {
        SensorSink::new(Arc::clone(&self.captures), Arc::clone(&self.events))
    }

    /// Handle for the platform timer service.
    #[must_use]
    pub fn timer_sink(&self) -> TimerSink {
        TimerSink::new(Arc::clone(&self.events))
    }

    /// Announce the controller: identification line, gate armed, lanes
    /// disarmed and a lane banner on every configured display.
    pub fn boot(&mut self) {
        self.platform.write_line(IDENTIFICATION);
        self.platform.set_gate_armed(true);
        for lane in 0..MAX_LANES {
            self.platform.set_lane_armed(lane, false);
        }
        for lane in 0..self.config.lanes() {
            self.platform.show_text(lane, &lane_banner(lane));
        }
        info!(lanes = self.config.lane_count(), "derby timer ready");
    }

    /// One control-loop pass.
    ///
    /// Consumes lane captures, lets the state machine make progress, then
    /// drains gate edges and timer expirations in arrival order.
    pub fn poll(&mut self) {
        self.service_captures();

        let all_disarmed = self.lanes.is_settled(self.config.lanes());
        self.dispatch(Event::Poll { all_disarmed });

        let events = Arc::clone(&self.events);
        for event in events.drain() {
            match event {
                PlatformEvent::Gate { edge, at_us } => {
                    let event = match edge {
                        GateEdge::Ready => Event::GateReady { at_us },
                        GateEdge::Reopened => Event::GateReopened,
                    };
                    if !self.dispatch(event) {
                        trace!(?edge, state = %self.state, "gate edge ignored");
                    }
                }
                PlatformEvent::TimerFired(token) => match self.timers.accept(token) {
                    Some(purpose) => {
                        self.dispatch(Event::TimerFired(purpose));
                    }
                    None => trace!(timer = %token.purpose(), "stale timer ignored"),
                },
            }
        }

        let dropped = events.dropped();
        if dropped > self.reported_drops {
            warn!(
                dropped,
                new = dropped - self.reported_drops,
                "platform events dropped, control loop is falling behind"
            );
            self.reported_drops = dropped;
        }
    }

    /// Hand every pending capture on an armed lane to the state machine.
    fn service_captures(&mut self) {
        for lane in 0..MAX_LANES {
            let Some(at_us) = self.captures.take(lane) else {
                continue;
            };
            if self.lanes.get(lane).is_some_and(|l| l.is_armed()) {
                self.dispatch(Event::LaneTriggered { lane, at_us });
            } else {
                trace!(lane, at_us, "capture on disarmed lane ignored");
            }
        }
    }

    /// Feed raw serial bytes, executing every completed line.
    pub fn receive(&mut self, bytes: &[u8]) {
        for line in self.assembler.extend(bytes) {
            match line {
                Ok(line) => self.handle_line(&line),
                Err(err) => self.reject(err),
            }
        }
    }

    /// Execute one command line and write its reply.
    pub fn handle_line(&mut self, line: &str) {
        debug!(line, "command");
        match parse(line).and_then(|command| self.execute(command)) {
            Ok(Some(reply)) => self.platform.write_line(&reply),
            Ok(None) => {}
            Err(err) => self.reject(err),
        }
    }

    /// Advance the results display to its next phase now.
    ///
    /// Returns `false` outside the reporting states.
    pub fn advance_display(&mut self) -> bool {
        self.dispatch(Event::CycleDisplay)
    }

    /// Platform events lost to a full queue so far.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RaceState {
        self.state
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Lane state of the current or last race.
    #[must_use]
    pub fn lanes(&self) -> &Lanes {
        &self.lanes
    }

    /// Start reference of the current or last race.
    #[must_use]
    pub fn start_us(&self) -> u64 {
        self.start_us
    }

    /// The result line as `RP` would write it.
    #[must_use]
    pub fn result_line(&self) -> String {
        result_line(&self.lanes, &self.config)
    }

    /// The platform.
    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The platform, mutably.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    fn reject(&mut self, err: ProtocolError) {
        self.platform.write_line(err.reply());
        let err = DerbyError::from(err);
        debug!(error = %err, category = %err.category(), "command rejected");
    }

    /// Returns the reply line, or `None` when the command writes its own output.
    fn execute(&mut self, command: Command) -> ProtocolResult<Option<String>> {
        let race = match command {
            Command::Race(race) => race,
            Command::Version => return Ok(Some(IDENTIFICATION.to_string())),
            config => {
                let reply = apply_config(config, &mut self.config, &mut self.lanes)?;
                self.sync_lane_arming();
                return Ok(Some(reply));
            }
        };

        match race {
            RaceCommand::Reset => {
                self.dispatch(Event::Reset);
                Ok(Some(OK_REPLY.to_string()))
            }
            RaceCommand::ForceFinish => {
                self.service_captures();
                self.dispatch(Event::ForceFinish);
                Ok(None)
            }
            RaceCommand::Test => {
                if self.dispatch(Event::EnterTest) {
                    Ok(Some(OK_REPLY.to_string()))
                } else {
                    Err(ProtocolError::NotAvailable {
                        command: "RT",
                        state: self.state.name(),
                    })
                }
            }
            RaceCommand::RepeatResult => Ok(Some(self.result_line())),
            RaceCommand::LaneLevels => Ok(Some(self.lane_levels())),
            RaceCommand::GateReady => Ok(Some(level(!self.platform.gate_level()))),
            RaceCommand::GateStarted => Ok(Some(level(self.platform.gate_level()))),
        }
    }

    fn lane_levels(&self) -> String {
        self.lanes
            .active(self.config.lanes())
            .map(|lane| {
                if lane.is_masked() {
                    '-'
                } else if self.platform.lane_level(lane.index()) {
                    '1'
                } else {
                    '0'
                }
            })
            .collect()
    }

    /// Run `event` through the state machine. Returns whether it applied.
    fn dispatch(&mut self, event: Event) -> bool {
        let Some(step) = transition(self.state, event) else {
            return false;
        };
        if step.next != self.state {
            debug!(from = %self.state, to = %step.next, ?event, "state change");
        }
        self.state = step.next;
        for effect in step.effects {
            self.apply(effect);
        }
        true
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::BeginRun { start_us } => {
                self.start_us = start_us;
                debug!(start_us, "gate ready, race pending");
            }
            Effect::ArmRaceLanes => {
                self.captures.discard_all();
                self.lanes.prepare_race(self.config.lanes());
                self.sync_lane_arming();
            }
            Effect::RecordFinish { lane, at_us } => {
                let elapsed = Ticks::between(self.start_us, at_us);
                if let Some(slot) = self.lanes.get_mut(lane) {
                    slot.record_finish(elapsed);
                }
                self.platform.set_lane_armed(lane, false);
                debug!(lane, ticks = elapsed.get(), "lane finished");
            }
            Effect::ArmTestLanes => {
                self.captures.discard_all();
                for index in 0..self.config.lanes() {
                    let Some(lane) = self.lanes.get_mut(index) else {
                        continue;
                    };
                    if lane.is_masked() {
                        lane.disarm();
                    } else {
                        lane.arm();
                        self.platform.show_text(index, TEST_PLACEHOLDER);
                    }
                }
                self.sync_lane_arming();
            }
            Effect::ClearLane(lane) => self.platform.clear(lane),
            Effect::DisarmLane(lane) => {
                if let Some(slot) = self.lanes.get_mut(lane) {
                    slot.disarm();
                }
                self.platform.set_lane_armed(lane, false);
            }
            Effect::DisarmLanes => {
                self.lanes.disarm_all();
                self.sync_lane_arming();
            }
            Effect::ClearDisplays => {
                for lane in 0..self.config.lanes() {
                    self.platform.clear(lane);
                }
            }
            Effect::SetGateArmed(armed) => self.platform.set_gate_armed(armed),
            Effect::StartTimer(purpose) => {
                self.timers.start(&mut self.platform, purpose);
            }
            Effect::CancelTimers => self.timers.cancel_all(&mut self.platform),
            Effect::ScoreRace => {
                self.lanes.score(&self.config);
                info!(result = %self.result_line(), "race scored");
            }
            Effect::SendResults => {
                let line = self.result_line();
                self.platform.write_line(&line);
            }
            Effect::ShowTimes => {
                let frame = times_frame(&self.lanes, &self.config);
                self.show(frame);
            }
            Effect::ShowPositions => {
                let frame = positions_frame(&self.lanes, &self.config);
                self.show(frame);
            }
            Effect::Emit(notice) => {
                info!(notice = notice.text(), "notice");
                self.platform.write_line(notice.text());
            }
        }
    }

    fn sync_lane_arming(&mut self) {
        for lane in self.lanes.iter() {
            self.platform.set_lane_armed(lane.index(), lane.is_armed());
        }
    }

    fn show(&mut self, frame: Vec<(usize, LaneDisplay)>) {
        for (lane, display) in frame {
            match display {
                LaneDisplay::Time(time) => self.platform.show_time(lane, &time),
                LaneDisplay::Text(text) => self.platform.show_text(lane, &text),
            }
        }
    }
}

fn level(high: bool) -> String {
    if high { "1" } else { "0" }.to_string()
}
