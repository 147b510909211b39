//! Property-based tests for derby-atomic using quickcheck.
//!
//! These tests verify invariants that should hold for all inputs.

use derby_atomic::{CaptureBank, EventQueue, LaneCapture};
use quickcheck_macros::quickcheck;

#[quickcheck]
fn prop_first_recorded_timestamp_is_returned(first: u64, rest: Vec<u64>) -> bool {
    let cell = LaneCapture::new();
    cell.record(first);
    for ts in rest {
        cell.record(ts);
    }
    cell.take() == Some(first) && cell.take().is_none()
}

#[quickcheck]
fn prop_lanes_are_independent(lane: u8, ts: u64) -> bool {
    let bank: CaptureBank<8> = CaptureBank::new();
    let lane = usize::from(lane % 8);
    bank.record(lane, ts);

    (0..8).all(|other| {
        if other == lane {
            bank.is_pending(other)
        } else {
            !bank.is_pending(other)
        }
    }) && bank.take(lane) == Some(ts)
}

#[quickcheck]
fn prop_queue_preserves_order_and_counts_drops(capacity: u8, events: Vec<u16>) -> bool {
    let capacity = usize::from(capacity.max(1));
    let queue = EventQueue::with_capacity(capacity);
    for event in &events {
        queue.push(*event);
    }

    let kept = events.len().min(capacity);
    let drained: Vec<u16> = queue.drain().collect();
    drained.as_slice() == events.get(..kept).unwrap_or_default()
        && queue.dropped() == (events.len() - kept) as u64
}
