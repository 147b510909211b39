//! Finish order calculation.
//!
//! Lanes are sorted by elapsed time (lane index breaks exact ties) and walked
//! in order. Each lane is then scored as follows:
//!
//! 1. a lane at the DNF sentinel scores 0;
//! 2. a lane within `tie_allowance` ticks of the lane sorted just before it
//!    inherits that lane's position;
//! 3. otherwise the lane takes its 1-based sorted rank.
//!
//! Rule 3 uses the sorted rank, not the number of distinct groups, so a tie
//! leaves a gap: two lanes tied for first are followed by third.

use crate::ticks::Ticks;

/// Compute finish positions.
///
/// `times` holds one entry per lane; `None` marks a masked lane, which scores
/// 0 and takes no part in the tie comparison. The returned vector has the same
/// length as `times`.
///
/// ```
/// use derby_timing::{Ticks, rank};
///
/// let times = [100, 100, 250, 1_000_000].map(|t| Some(Ticks::new(t)));
/// assert_eq!(rank(&times, 1), vec![1, 1, 3, 0]);
/// ```
#[must_use]
pub fn rank(times: &[Option<Ticks>], tie_allowance: u32) -> Vec<u8> {
    let mut positions = vec![0u8; times.len()];

    let mut order: Vec<(Ticks, usize)> = times
        .iter()
        .enumerate()
        .filter_map(|(index, ticks)| ticks.map(|ticks| (ticks, index)))
        .collect();
    order.sort_unstable();

    let mut previous: Option<(Ticks, u8)> = None;
    for (sorted_index, &(ticks, index)) in order.iter().enumerate() {
        let sorted_rank = u8::try_from(sorted_index.saturating_add(1)).unwrap_or(u8::MAX);
        let position = if ticks.is_dnf() {
            0
        } else {
            match previous {
                Some((earlier, position)) if ticks.gap_since(earlier) <= tie_allowance => position,
                _ => sorted_rank,
            }
        };
        if let Some(slot) = positions.get_mut(index) {
            *slot = position;
        }
        previous = Some((ticks, position));
    }

    positions
}
