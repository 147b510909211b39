//! Race lifecycle state machine.
//!
//! [`transition`] is a pure function from `(state, event)` to the next state
//! and the side effects the controller must carry out, in order. It never
//! touches the platform, so every transition is testable on its own.
//!
//! | From                | Event                     | To                  |
//! |---------------------|---------------------------|---------------------|
//! | Idle                | gate ready                | Preparing           |
//! | Preparing           | poll                      | Racing              |
//! | Racing              | poll, all lanes disarmed  | ReportingTimes      |
//! | Racing              | race timeout              | Racing (lanes out)  |
//! | Racing              | `RA`                      | ReportingTimes      |
//! | ReportingTimes      | 4 s timer / cycle         | ReportingPositions  |
//! | ReportingPositions  | 4 s timer / cycle         | ReportingTimes      |
//! | reporting           | gate reopened             | Idle                |
//! | reporting, test     | gate ready                | Preparing           |
//! | Idle, test          | `RT`                      | ArmedTest           |
//! | ArmedTest           | poll                      | Testing             |
//! | any                 | `R`                       | Idle                |

use core::fmt;

use crate::timers::TimerPurpose;

/// Race lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RaceState {
    /// Waiting for the gate. Initial state.
    #[default]
    Idle,
    /// Sensor test requested; lanes armed with a placeholder.
    ArmedTest,
    /// Sensor test running; each firing lane clears itself.
    Testing,
    /// Gate ready edge seen; lanes are armed on the next pass.
    Preparing,
    /// Lanes armed, race clock running.
    Racing,
    /// Results shown as elapsed times.
    ReportingTimes,
    /// Results shown as finish positions.
    ReportingPositions,
}

impl RaceState {
    /// Lower-case name used in logs and protocol diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RaceState::Idle => "idle",
            RaceState::ArmedTest => "armed-test",
            RaceState::Testing => "testing",
            RaceState::Preparing => "preparing",
            RaceState::Racing => "racing",
            RaceState::ReportingTimes => "reporting-times",
            RaceState::ReportingPositions => "reporting-positions",
        }
    }

    /// Whether the results display cycle is running.
    #[must_use]
    pub fn is_reporting(self) -> bool {
        matches!(
            self,
            RaceState::ReportingTimes | RaceState::ReportingPositions
        )
    }
}

impl fmt::Display for RaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Gate reached its ready position at `at_us`.
    GateReady {
        /// Start reference for the race
        at_us: u64,
    },
    /// Gate reopened.
    GateReopened,
    /// An armed lane produced its capture.
    LaneTriggered {
        /// 0-based lane index
        lane: usize,
        /// Capture timestamp
        at_us: u64,
    },
    /// One control-loop pass.
    Poll {
        /// No lane is armed any more
        all_disarmed: bool,
    },
    /// A current (not superseded) timer expired.
    TimerFired(TimerPurpose),
    /// Operator `RA`.
    ForceFinish,
    /// Operator `R`.
    Reset,
    /// Operator `RT`.
    EnterTest,
    /// Advance the results display without waiting for its timer.
    CycleDisplay,
}

/// Line written on the serial link outside of a command reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Lanes are armed and the clock is running.
    RaceStarted,
    /// The race timeout expired with lanes still armed.
    RaceIncomplete,
}

impl Notice {
    /// Text of the notice.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Notice::RaceStarted => "They're off!",
            Notice::RaceIncomplete => "Race did not complete",
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Remember `start_us` as the race start reference.
    BeginRun {
        /// Start reference
        start_us: u64,
    },
    /// Discard stale captures, reset race data and arm every non-masked lane.
    ArmRaceLanes,
    /// Record the finish of `lane` captured at `at_us` and disarm it.
    RecordFinish {
        /// 0-based lane index
        lane: usize,
        /// Capture timestamp
        at_us: u64,
    },
    /// Arm every non-masked lane for a sensor test with a placeholder display.
    ArmTestLanes,
    /// Blank one lane display.
    ClearLane(usize),
    /// Disarm one lane.
    DisarmLane(usize),
    /// Disarm every lane.
    DisarmLanes,
    /// Blank every configured lane display.
    ClearDisplays,
    /// Arm or disarm the gate sensor.
    SetGateArmed(bool),
    /// Schedule a timer, cancelling any other.
    StartTimer(TimerPurpose),
    /// Cancel every pending timer.
    CancelTimers,
    /// Run the finish order calculation.
    ScoreRace,
    /// Write the result line.
    SendResults,
    /// Push elapsed times to the displays.
    ShowTimes,
    /// Push finish positions to the displays.
    ShowPositions,
    /// Write a notice line.
    Emit(Notice),
}

/// Outcome of an applicable event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub next: RaceState,
    /// Effects to apply, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: RaceState, effects: impl Into<Vec<Effect>>) -> Option<Self> {
        Some(Self {
            next,
            effects: effects.into(),
        })
    }
}

fn end_of_race(mut effects: Vec<Effect>) -> Option<Transition> {
    effects.extend([
        Effect::CancelTimers,
        Effect::ScoreRace,
        Effect::SetGateArmed(true),
        Effect::ShowTimes,
        Effect::StartTimer(TimerPurpose::ShowPositions),
        Effect::SendResults,
    ]);
    Transition::to(RaceState::ReportingTimes, effects)
}

fn show_positions() -> Option<Transition> {
    Transition::to(
        RaceState::ReportingPositions,
        [
            Effect::ShowPositions,
            Effect::StartTimer(TimerPurpose::ShowTimes),
        ],
    )
}

fn show_times() -> Option<Transition> {
    Transition::to(
        RaceState::ReportingTimes,
        [
            Effect::ShowTimes,
            Effect::StartTimer(TimerPurpose::ShowPositions),
        ],
    )
}

/// Compute the transition for `event` in `state`.
///
/// Returns `None` when the event does not apply in `state`; the caller leaves
/// the state unchanged.
#[must_use]
pub fn transition(state: RaceState, event: Event) -> Option<Transition> {
    use RaceState as S;

    match (state, event) {
        (_, Event::Reset) => Transition::to(
            S::Idle,
            [
                Effect::CancelTimers,
                Effect::SetGateArmed(true),
                Effect::DisarmLanes,
            ],
        ),

        // A new heat may start from anywhere the gate is armed.
        (S::Idle, Event::GateReady { at_us }) => {
            Transition::to(S::Preparing, [Effect::BeginRun { start_us: at_us }])
        }
        (S::ArmedTest | S::Testing, Event::GateReady { at_us }) => Transition::to(
            S::Preparing,
            [Effect::DisarmLanes, Effect::BeginRun { start_us: at_us }],
        ),
        (S::ReportingTimes | S::ReportingPositions, Event::GateReady { at_us }) => {
            Transition::to(
                S::Preparing,
                [Effect::CancelTimers, Effect::BeginRun { start_us: at_us }],
            )
        }

        (S::Preparing, Event::Poll { .. }) => Transition::to(
            S::Racing,
            [
                Effect::ArmRaceLanes,
                Effect::StartTimer(TimerPurpose::RaceTimeout),
                Effect::ClearDisplays,
                Effect::SetGateArmed(false),
                Effect::Emit(Notice::RaceStarted),
            ],
        ),

        (S::Racing, Event::LaneTriggered { lane, at_us }) => {
            Transition::to(S::Racing, [Effect::RecordFinish { lane, at_us }])
        }
        (S::Racing, Event::Poll { all_disarmed: true }) => end_of_race(Vec::new()),
        (S::Racing, Event::TimerFired(TimerPurpose::RaceTimeout)) => Transition::to(
            S::Racing,
            [Effect::Emit(Notice::RaceIncomplete), Effect::DisarmLanes],
        ),
        (S::Racing, Event::ForceFinish) => end_of_race(vec![Effect::DisarmLanes]),
        (_, Event::ForceFinish) => Transition::to(state, [Effect::SendResults]),

        (S::ReportingTimes, Event::TimerFired(TimerPurpose::ShowPositions))
        | (S::ReportingTimes, Event::CycleDisplay) => show_positions(),
        (S::ReportingPositions, Event::TimerFired(TimerPurpose::ShowTimes))
        | (S::ReportingPositions, Event::CycleDisplay) => show_times(),
        (S::ReportingTimes | S::ReportingPositions, Event::GateReopened) => {
            Transition::to(S::Idle, [Effect::CancelTimers])
        }

        (S::Idle | S::ArmedTest | S::Testing, Event::EnterTest) => {
            Transition::to(S::ArmedTest, [Effect::ArmTestLanes])
        }
        (S::ArmedTest, Event::Poll { .. }) => Transition::to(S::Testing, Vec::new()),
        (S::ArmedTest | S::Testing, Event::LaneTriggered { lane, .. }) => Transition::to(
            state,
            [Effect::ClearLane(lane), Effect::DisarmLane(lane)],
        ),

        _ => None,
    }
}
