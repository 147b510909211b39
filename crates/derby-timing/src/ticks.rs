//! Elapsed-time arithmetic in fixed 10 µs ticks.
//!
//! All scoring works on [`Ticks`], never on floating point. The race timeout is
//! also the "did not finish" sentinel: a lane that never triggered keeps
//! [`Ticks::DNF`], and any capture at or past the timeout is clamped to it.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Microseconds per tick.
pub const TICK_MICROS: u64 = 10;

/// Ticks per second.
pub const TICKS_PER_SECOND: u32 = 100_000;

/// How long a race may run before unfinished lanes are forced out.
pub const RACE_TIMEOUT: Duration = Duration::from_secs(10);

/// Sentinel elapsed time for a lane that did not finish (the race timeout).
pub const DNF_TICKS: u32 = 1_000_000;

/// Number of fractional digits carried by [`Ticks::seconds_text`] before cutting.
const FRACTION_DIGITS: u8 = 5;

/// Elapsed time since the start reference, in 10 µs units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ticks(u32);

impl Ticks {
    /// Zero elapsed time.
    pub const ZERO: Ticks = Ticks(0);

    /// The did-not-finish sentinel.
    pub const DNF: Ticks = Ticks(DNF_TICKS);

    /// Wrap a raw tick count, clamping it to the sentinel.
    #[must_use]
    pub const fn new(ticks: u32) -> Self {
        if ticks >= DNF_TICKS {
            Self::DNF
        } else {
            Self(ticks)
        }
    }

    /// Raw tick count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Elapsed ticks between two monotonic microsecond clock readings.
    ///
    /// A capture earlier than the start reads as zero; anything at or past the
    /// race timeout reads as [`Ticks::DNF`].
    ///
    /// ```
    /// use derby_timing::Ticks;
    ///
    /// assert_eq!(Ticks::between(1_000, 3_345).get(), 234);
    /// assert_eq!(Ticks::between(5_000, 4_000), Ticks::ZERO);
    /// assert!(Ticks::between(0, 10_000_000).is_dnf());
    /// ```
    #[must_use]
    pub fn between(start_us: u64, at_us: u64) -> Self {
        let ticks = at_us.saturating_sub(start_us) / TICK_MICROS;
        u32::try_from(ticks).map_or(Self::DNF, Self::new)
    }

    /// Whether this is the did-not-finish sentinel.
    #[must_use]
    pub const fn is_dnf(self) -> bool {
        self.0 >= DNF_TICKS
    }

    /// Gap to an earlier (or equal) time; zero if `earlier` is actually later.
    #[must_use]
    pub const fn gap_since(self, earlier: Ticks) -> u32 {
        self.0.saturating_sub(earlier.0)
    }

    /// Whole seconds.
    #[must_use]
    pub const fn whole_seconds(self) -> u32 {
        self.0 / TICKS_PER_SECOND
    }

    /// Sub-second part as five decimal digits (0..=99 999).
    #[must_use]
    pub const fn fraction(self) -> u32 {
        self.0 % TICKS_PER_SECOND
    }

    /// Seconds with `decimals` fractional digits, truncated (never rounded).
    ///
    /// `decimals` is capped at five, the resolution of a tick.
    ///
    /// ```
    /// use derby_timing::Ticks;
    ///
    /// let t = Ticks::new(312_349);
    /// assert_eq!(t.seconds_text(3), "3.123");
    /// assert_eq!(t.seconds_text(5), "3.12349");
    /// assert_eq!(Ticks::DNF.seconds_text(4), "10.0000");
    /// ```
    #[must_use]
    pub fn seconds_text(self, decimals: u8) -> String {
        let decimals = decimals.min(FRACTION_DIGITS);
        let divisor = 10u32.pow(u32::from(FRACTION_DIGITS - decimals));
        let width = usize::from(decimals);
        if width == 0 {
            return format!("{}.", self.whole_seconds());
        }
        format!(
            "{}.{:0width$}",
            self.whole_seconds(),
            self.fraction() / divisor
        )
    }

    /// Duration represented by this tick count.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_micros(u64::from(self.0) * TICK_MICROS)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:05}", self.whole_seconds(), self.fraction())
    }
}
