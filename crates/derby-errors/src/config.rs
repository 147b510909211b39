//! Race configuration validation errors.
//!
//! These are `Copy` and carry only static field names and integers, so they
//! can be produced on the control-loop path without allocating.

/// A configuration change was rejected; the previous value is still in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Value outside the accepted range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// The rejected value
        value: u64,
        /// Minimum allowed value
        min: u64,
        /// Maximum allowed value
        max: u64,
    },

    /// Lane number does not name a configured lane
    #[error("lane {lane} does not exist (lane count is {lane_count})")]
    NoSuchLane {
        /// 1-based lane number that was requested
        lane: u8,
        /// Currently configured lane count
        lane_count: u8,
    },
}

impl ConfigError {
    /// Create an out-of-range error.
    #[must_use]
    pub fn out_of_range(
        field: &'static str,
        value: impl Into<u64>,
        min: impl Into<u64>,
        max: impl Into<u64>,
    ) -> Self {
        Self::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Create a no-such-lane error.
    #[must_use]
    pub fn no_such_lane(lane: u8, lane_count: u8) -> Self {
        Self::NoSuchLane { lane, lane_count }
    }

    /// Name of the field this error refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::OutOfRange { field, .. } => field,
            Self::NoSuchLane { .. } => "lane_mask",
        }
    }
}

/// Result type for configuration changes.
pub type ConfigResult<T = ()> = std::result::Result<T, ConfigError>;
