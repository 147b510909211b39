//! Single-slot-per-purpose timer bookkeeping.
//!
//! The race timeout and the two display-cycle timers belong to different
//! lifecycle stages and must never overlap. [`TimerSlots::start`] cancels
//! every other slot before scheduling, and each scheduled token carries a
//! generation number so a timer that fires after being superseded is ignored
//! instead of driving the wrong state.

use core::fmt;
use core::time::Duration;

use derby_timing::{DISPLAY_CYCLE, RACE_TIMEOUT};
use tracing::trace;

use crate::ports::TimerService;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// Force unfinished lanes out of the race.
    RaceTimeout,
    /// Switch the displays from times to positions.
    ShowPositions,
    /// Switch the displays from positions back to times.
    ShowTimes,
}

impl TimerPurpose {
    /// Every purpose, in slot order.
    pub const ALL: [TimerPurpose; 3] = [
        TimerPurpose::RaceTimeout,
        TimerPurpose::ShowPositions,
        TimerPurpose::ShowTimes,
    ];

    /// Delay this timer is scheduled with.
    #[must_use]
    pub fn delay(self) -> Duration {
        match self {
            TimerPurpose::RaceTimeout => RACE_TIMEOUT,
            TimerPurpose::ShowPositions | TimerPurpose::ShowTimes => DISPLAY_CYCLE,
        }
    }

    fn slot(self) -> usize {
        match self {
            TimerPurpose::RaceTimeout => 0,
            TimerPurpose::ShowPositions => 1,
            TimerPurpose::ShowTimes => 2,
        }
    }
}

impl fmt::Display for TimerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerPurpose::RaceTimeout => write!(f, "race-timeout"),
            TimerPurpose::ShowPositions => write!(f, "show-positions"),
            TimerPurpose::ShowTimes => write!(f, "show-times"),
        }
    }
}

/// Identifies one scheduling of a timer; handed to the platform and returned
/// through the [`TimerSink`](crate::TimerSink) when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    purpose: TimerPurpose,
    generation: u32,
}

impl TimerToken {
    /// What the timer is for.
    #[must_use]
    pub fn purpose(&self) -> TimerPurpose {
        self.purpose
    }

    /// Scheduling generation.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Platform-assigned handle used to cancel a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    token: TimerToken,
    handle: TimerHandle,
}

/// One slot per [`TimerPurpose`], at most one of them occupied.
#[derive(Debug, Default)]
pub struct TimerSlots {
    slots: [Option<Scheduled>; 3],
    generation: u32,
}

impl TimerSlots {
    /// All slots empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every pending timer, then schedule `purpose`.
    pub fn start<S>(&mut self, service: &mut S, purpose: TimerPurpose) -> TimerToken
    where
        S: TimerService + ?Sized,
    {
        self.cancel_all(service);
        self.generation = self.generation.wrapping_add(1);
        let token = TimerToken {
            purpose,
            generation: self.generation,
        };
        let handle = service.schedule_once(purpose.delay(), token);
        if let Some(slot) = self.slots.get_mut(purpose.slot()) {
            *slot = Some(Scheduled { token, handle });
        }
        trace!(timer = %purpose, generation = token.generation, "timer scheduled");
        token
    }

    /// Cancel every pending timer.
    pub fn cancel_all<S>(&mut self, service: &mut S)
    where
        S: TimerService + ?Sized,
    {
        for slot in &mut self.slots {
            if let Some(scheduled) = slot.take() {
                service.cancel(scheduled.handle);
                trace!(timer = %scheduled.token.purpose, "timer cancelled");
            }
        }
    }

    /// Consume a fired token.
    ///
    /// Returns the purpose if the token is the one currently scheduled in its
    /// slot; a superseded or already-consumed token yields `None`.
    pub fn accept(&mut self, token: TimerToken) -> Option<TimerPurpose> {
        let slot = self.slots.get_mut(token.purpose.slot())?;
        match slot {
            Some(scheduled) if scheduled.token == token => {
                *slot = None;
                Some(token.purpose)
            }
            _ => None,
        }
    }

    /// Whether `purpose` is currently scheduled.
    #[must_use]
    pub fn is_pending(&self, purpose: TimerPurpose) -> bool {
        self.slots
            .get(purpose.slot())
            .is_some_and(|slot| slot.is_some())
    }

    /// The scheduled timer, if any.
    #[must_use]
    pub fn pending(&self) -> Option<TimerPurpose> {
        TimerPurpose::ALL
            .into_iter()
            .find(|purpose| self.is_pending(*purpose))
    }
}
