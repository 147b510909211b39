//! Property-based tests for the finish order calculation.

use derby_timing::prelude::*;
use proptest::prelude::*;

fn finished(raw: &[u32]) -> Vec<Option<Ticks>> {
    raw.iter().map(|&t| Some(Ticks::new(t))).collect()
}

/// Lane times below the sentinel, all pairwise distinct.
fn distinct_times() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::btree_set(0u32..DNF_TICKS, 1..=MAX_LANES)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #[test]
    fn prop_distinct_times_rank_as_permutation(raw in distinct_times()) {
        let positions = rank(&finished(&raw), 0);

        let mut sorted = positions.clone();
        sorted.sort_unstable();
        let expected: Vec<u8> = (1..=u8::try_from(raw.len()).unwrap_or(u8::MAX)).collect();
        prop_assert_eq!(sorted, expected);

        for (a, b) in raw.iter().zip(&positions) {
            for (c, d) in raw.iter().zip(&positions) {
                if a < c {
                    prop_assert!(b < d);
                }
            }
        }
    }

    #[test]
    fn prop_masked_lanes_excluded(raw in distinct_times(), mask_bits in any::<u8>()) {
        let times: Vec<Option<Ticks>> = raw
            .iter()
            .enumerate()
            .map(|(i, &t)| (mask_bits & (1 << i) == 0).then_some(Ticks::new(t)))
            .collect();
        let positions = rank(&times, 0);
        let active = times.iter().filter(|t| t.is_some()).count();

        for (time, position) in times.iter().zip(&positions) {
            if time.is_none() {
                prop_assert_eq!(*position, 0);
            } else {
                prop_assert!(usize::from(*position) >= 1 && usize::from(*position) <= active);
            }
        }
    }

    #[test]
    fn prop_lanes_within_allowance_tie(
        base in 0u32..900_000,
        gap in 0u32..50,
        allowance in 0u32..50,
        others in proptest::collection::vec(0u32..DNF_TICKS, 0..6),
    ) {
        prop_assume!(gap <= allowance);
        let mut raw = vec![base, base + gap];
        raw.extend(others);
        let positions = rank(&finished(&raw), allowance);
        prop_assert_eq!(positions.first(), positions.get(1));
    }

    #[test]
    fn prop_larger_allowance_only_merges(
        raw in proptest::collection::vec(0u32..2_000, 1..=MAX_LANES),
        small in 0u32..20,
        extra in 0u32..20,
    ) {
        let times = finished(&raw);
        let tight = rank(&times, small);
        let loose = rank(&times, small + extra);
        for i in 0..raw.len() {
            for j in 0..raw.len() {
                if tight.get(i) == tight.get(j) {
                    prop_assert_eq!(loose.get(i), loose.get(j));
                }
            }
        }
    }

    #[test]
    fn prop_dnf_always_scores_zero(
        raw in proptest::collection::vec(0u32..=DNF_TICKS, 1..=MAX_LANES),
        allowance in any::<u32>(),
    ) {
        let positions = rank(&finished(&raw), allowance);
        for (ticks, position) in raw.iter().zip(&positions) {
            if *ticks == DNF_TICKS {
                prop_assert_eq!(*position, 0);
            }
        }
    }

    #[test]
    fn prop_identical_input_identical_output(
        raw in proptest::collection::vec(0u32..=DNF_TICKS, 0..=MAX_LANES),
        allowance in 0u32..100,
    ) {
        let times = finished(&raw);
        prop_assert_eq!(rank(&times, allowance), rank(&times, allowance));
    }

    #[test]
    fn prop_masking_is_idempotent(number in 1u8..=8, lane_count in 1u8..=8) {
        let mut once = Lanes::new();
        let once_result = once.mask(number, lane_count);
        let mut twice = once.clone();
        let twice_result = twice.mask(number, lane_count);
        prop_assert_eq!(once_result, twice_result);
        prop_assert_eq!(&once, &twice);

        once.clear_masks();
        twice.clear_masks();
        twice.clear_masks();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_seconds_text_truncates(raw in 0u32..DNF_TICKS, decimals in 3u8..=5) {
        let text = Ticks::new(raw).seconds_text(decimals);
        let (whole, fraction) = text.split_once('.').unwrap_or_default();
        prop_assert_eq!(fraction.len(), usize::from(decimals));
        let scale = 10u32.pow(5 - u32::from(decimals));
        let shown: u32 = format!("{whole}{fraction}").parse().unwrap_or(u32::MAX);
        prop_assert_eq!(shown, raw / scale);
    }
}
