//! Control-loop side lane state.
//!
//! A [`Lane`] holds the fields owned by the control loop: armed, masked,
//! elapsed time and finish position. The capture timestamp and triggered
//! flag are owned by the interrupt context and live in `derby-atomic`.

use derby_errors::{ConfigError, ConfigResult};

use crate::MAX_LANES;
use crate::config::RaceConfig;
use crate::finish_order::rank;
use crate::ticks::Ticks;

/// One timing channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    index: usize,
    armed: bool,
    masked: bool,
    elapsed: Ticks,
    position: u8,
}

impl Lane {
    const fn new(index: usize) -> Self {
        Self {
            index,
            armed: false,
            masked: false,
            elapsed: Ticks::DNF,
            position: 0,
        }
    }

    /// Fixed 0-based identity.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the sensor is live.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether the operator excluded this lane.
    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Elapsed time of the current or last race.
    #[must_use]
    pub fn elapsed(&self) -> Ticks {
        self.elapsed
    }

    /// 1-based finish position, or 0 for not finished / excluded.
    #[must_use]
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Record a finish and disarm the lane.
    pub fn record_finish(&mut self, elapsed: Ticks) {
        self.elapsed = elapsed;
        self.armed = false;
    }

    /// Arm the lane (sensor live).
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Disarm the lane without touching its elapsed time.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

/// Every lane slot on the controller, configured or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lanes {
    slots: [Lane; MAX_LANES],
}

impl Default for Lanes {
    fn default() -> Self {
        Self::new()
    }
}

impl Lanes {
    /// All lanes disarmed, unmasked, at the DNF sentinel with no position.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(Lane::new),
        }
    }

    /// Lane at `index`, if it exists.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.slots.get(index)
    }

    /// Mutable lane at `index`, if it exists.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Lane> {
        self.slots.get_mut(index)
    }

    /// The first `count` lanes.
    pub fn active(&self, count: usize) -> impl Iterator<Item = &Lane> {
        self.slots.iter().take(count)
    }

    /// Every lane slot.
    pub fn iter(&self) -> impl Iterator<Item = &Lane> {
        self.slots.iter()
    }

    /// Mask and disarm the 1-based lane `number`. Masking an already-masked
    /// lane is a no-op.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoSuchLane`] if `number` is 0 or beyond `lane_count`.
    pub fn mask(&mut self, number: u8, lane_count: u8) -> ConfigResult {
        if number == 0 || number > lane_count {
            return Err(ConfigError::no_such_lane(number, lane_count));
        }
        let lane = self
            .slots
            .get_mut(usize::from(number - 1))
            .ok_or(ConfigError::no_such_lane(number, lane_count))?;
        lane.masked = true;
        lane.armed = false;
        Ok(())
    }

    /// Clear every mask.
    pub fn clear_masks(&mut self) {
        for lane in &mut self.slots {
            lane.masked = false;
        }
    }

    /// 1-based numbers of the masked lanes among the first `count`, as digits.
    #[must_use]
    pub fn masked_numbers(&self, count: usize) -> String {
        self.active(count)
            .filter(|lane| lane.masked)
            .filter_map(|lane| char::from_digit(u32::try_from(lane.index + 1).ok()?, 10))
            .collect()
    }

    /// Reset race data and arm every non-masked lane among the first `count`.
    ///
    /// Every lane returns to the DNF sentinel with no position; lanes outside
    /// the configured count stay disarmed.
    pub fn prepare_race(&mut self, count: usize) {
        for lane in &mut self.slots {
            lane.elapsed = Ticks::DNF;
            lane.position = 0;
            lane.armed = lane.index < count && !lane.masked;
        }
    }

    /// Disarm every lane, leaving elapsed times as they are.
    pub fn disarm_all(&mut self) {
        for lane in &mut self.slots {
            lane.armed = false;
        }
    }

    /// Whether every non-masked lane among the first `count` is disarmed.
    #[must_use]
    pub fn is_settled(&self, count: usize) -> bool {
        self.active(count)
            .filter(|lane| !lane.masked)
            .all(|lane| !lane.armed)
    }

    /// Run the finish order calculation over the configured lanes.
    ///
    /// Masked lanes and lanes beyond the configured count score 0.
    pub fn score(&mut self, config: &RaceConfig) {
        let count = config.lanes();
        let times: Vec<Option<Ticks>> = self
            .active(count)
            .map(|lane| (!lane.masked).then_some(lane.elapsed))
            .collect();
        let positions = rank(&times, config.tie_allowance());
        for (index, lane) in self.slots.iter_mut().enumerate() {
            lane.position = positions.get(index).copied().unwrap_or(0);
        }
    }
}
