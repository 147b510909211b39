//! Race configuration.
//!
//! One [`RaceConfig`] lives for the whole process. The protocol handler is the
//! only writer; every setter validates its argument and leaves the previous
//! value in place on failure.

use core::time::Duration;
use std::ops::RangeInclusive;

use derby_errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Accepted lane counts; the upper bound is [`crate::MAX_LANES`].
pub const LANE_COUNT_RANGE: RangeInclusive<u8> = 1..=8;

/// Accepted number of decimal places in reported times.
pub const DECIMAL_PLACES_RANGE: RangeInclusive<u8> = 3..=5;

/// Accepted symbol table indices for lane and position labels.
pub const LABEL_INDEX_RANGE: RangeInclusive<u8> = 0..=3;

/// Base symbols for lane labels; lane `i` is labelled `base + i`.
pub const LANE_LABELS: [u8; 4] = *b"A1aA";

/// Base symbols for position labels; position `p` is labelled `base + p - 1`.
pub const POSITION_LABELS: [u8; 4] = *b"aA1!";

/// Interval between the times and positions phases of the results display.
pub const DISPLAY_CYCLE: Duration = Duration::from_secs(4);

/// Reply to the `V` command.
pub const IDENTIFICATION: &str = "PiDerby";

/// Process-wide race configuration.
///
/// # Example
///
/// ```
/// use derby_timing::RaceConfig;
///
/// let mut config = RaceConfig::default();
/// assert_eq!(config.decimal_places(), 4);
///
/// assert!(config.set_decimal_places(6).is_err());
/// assert_eq!(config.decimal_places(), 4);
///
/// config.set_decimal_places(3).unwrap();
/// assert_eq!(config.decimal_places(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    lane_count: u8,
    decimal_places: u8,
    tie_allowance: u32,
    lane_label_index: u8,
    position_label_index: u8,
    auto_reset_delay_secs: u32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            lane_count: 8,
            decimal_places: 4,
            tie_allowance: 1,
            lane_label_index: 0,
            position_label_index: 0,
            auto_reset_delay_secs: 0,
        }
    }
}

fn check_range(field: &'static str, value: u8, range: &RangeInclusive<u8>) -> ConfigResult {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(
            field,
            value,
            *range.start(),
            *range.end(),
        ))
    }
}

impl RaceConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> RaceConfigBuilder {
        RaceConfigBuilder::default()
    }

    /// Validate every field, e.g. after deserializing a config file.
    ///
    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn validate(&self) -> ConfigResult {
        check_range("lane_count", self.lane_count, &LANE_COUNT_RANGE)?;
        check_range("decimal_places", self.decimal_places, &DECIMAL_PLACES_RANGE)?;
        check_range("lane_label_index", self.lane_label_index, &LABEL_INDEX_RANGE)?;
        check_range(
            "position_label_index",
            self.position_label_index,
            &LABEL_INDEX_RANGE,
        )?;
        Ok(())
    }

    /// Number of lanes in use.
    #[must_use]
    pub fn lane_count(&self) -> u8 {
        self.lane_count
    }

    /// Number of lanes in use, as an index bound.
    #[must_use]
    pub fn lanes(&self) -> usize {
        usize::from(self.lane_count)
    }

    /// Set the lane count (1..=8).
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] if `count` is outside [`LANE_COUNT_RANGE`].
    pub fn set_lane_count(&mut self, count: u8) -> ConfigResult {
        check_range("lane_count", count, &LANE_COUNT_RANGE)?;
        self.lane_count = count;
        Ok(())
    }

    /// Digits shown after the decimal point.
    #[must_use]
    pub fn decimal_places(&self) -> u8 {
        self.decimal_places
    }

    /// Set the number of decimal places (3..=5).
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] if `places` is outside [`DECIMAL_PLACES_RANGE`].
    pub fn set_decimal_places(&mut self, places: u8) -> ConfigResult {
        check_range("decimal_places", places, &DECIMAL_PLACES_RANGE)?;
        self.decimal_places = places;
        Ok(())
    }

    /// Largest tick gap between consecutively sorted lanes still scored as a tie.
    #[must_use]
    pub fn tie_allowance(&self) -> u32 {
        self.tie_allowance
    }

    /// Set the tie allowance in ticks. Every value is accepted.
    pub fn set_tie_allowance(&mut self, ticks: u32) {
        self.tie_allowance = ticks;
    }

    /// Selected lane label table entry.
    #[must_use]
    pub fn lane_label_index(&self) -> u8 {
        self.lane_label_index
    }

    /// Select the lane label table entry (0..=3).
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] if `index` is outside [`LABEL_INDEX_RANGE`].
    pub fn set_lane_label_index(&mut self, index: u8) -> ConfigResult {
        check_range("lane_label_index", index, &LABEL_INDEX_RANGE)?;
        self.lane_label_index = index;
        Ok(())
    }

    /// Selected position label table entry.
    #[must_use]
    pub fn position_label_index(&self) -> u8 {
        self.position_label_index
    }

    /// Select the position label table entry (0..=3).
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] if `index` is outside [`LABEL_INDEX_RANGE`].
    pub fn set_position_label_index(&mut self, index: u8) -> ConfigResult {
        check_range("position_label_index", index, &LABEL_INDEX_RANGE)?;
        self.position_label_index = index;
        Ok(())
    }

    /// Idle seconds before an automatic reset. Stored only; nothing in the
    /// controller acts on it.
    #[must_use]
    pub fn auto_reset_delay_secs(&self) -> u32 {
        self.auto_reset_delay_secs
    }

    /// Set the auto-reset delay.
    pub fn set_auto_reset_delay_secs(&mut self, secs: u32) {
        self.auto_reset_delay_secs = secs;
    }

    /// Base symbol of the selected lane label table entry.
    #[must_use]
    pub fn lane_symbol(&self) -> char {
        char::from(table_entry(&LANE_LABELS, self.lane_label_index))
    }

    /// Base symbol of the selected position label table entry.
    #[must_use]
    pub fn position_symbol(&self) -> char {
        char::from(table_entry(&POSITION_LABELS, self.position_label_index))
    }

    /// Label of the 0-based lane `index` (`A`, `B`, ... with the default table).
    #[must_use]
    pub fn lane_label(&self, index: usize) -> char {
        offset_symbol(table_entry(&LANE_LABELS, self.lane_label_index), index)
    }

    /// Label of the 1-based finish `position`; `None` for position 0.
    #[must_use]
    pub fn position_label(&self, position: u8) -> Option<char> {
        let ordinal = position.checked_sub(1)?;
        Some(offset_symbol(
            table_entry(&POSITION_LABELS, self.position_label_index),
            usize::from(ordinal),
        ))
    }
}

fn table_entry(table: &[u8; 4], index: u8) -> u8 {
    let [first, ..] = *table;
    table.get(usize::from(index)).copied().unwrap_or(first)
}

fn offset_symbol(base: u8, offset: usize) -> char {
    u8::try_from(offset)
        .ok()
        .and_then(|offset| base.checked_add(offset))
        .map_or('?', char::from)
}

/// Builder for [`RaceConfig`].
#[derive(Debug, Default)]
pub struct RaceConfigBuilder {
    config: RaceConfig,
}

impl RaceConfigBuilder {
    /// Set the lane count.
    #[must_use]
    pub fn lane_count(mut self, count: u8) -> Self {
        self.config.lane_count = count;
        self
    }

    /// Set the decimal places.
    #[must_use]
    pub fn decimal_places(mut self, places: u8) -> Self {
        self.config.decimal_places = places;
        self
    }

    /// Set the tie allowance in ticks.
    #[must_use]
    pub fn tie_allowance(mut self, ticks: u32) -> Self {
        self.config.tie_allowance = ticks;
        self
    }

    /// Select the lane label table entry.
    #[must_use]
    pub fn lane_label_index(mut self, index: u8) -> Self {
        self.config.lane_label_index = index;
        self
    }

    /// Select the position label table entry.
    #[must_use]
    pub fn position_label_index(mut self, index: u8) -> Self {
        self.config.position_label_index = index;
        self
    }

    /// Set the auto-reset delay in seconds.
    #[must_use]
    pub fn auto_reset_delay_secs(mut self, secs: u32) -> Self {
        self.config.auto_reset_delay_secs = secs;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn build(self) -> ConfigResult<RaceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
