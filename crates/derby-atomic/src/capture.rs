//! Per-lane capture cells written from the sensor interrupt context.
//!
//! This module provides [`LaneCapture`], the only piece of lane state the
//! interrupt handler may touch, and [`CaptureBank`], a fixed array of them.
//!
//! # Interrupt Safety
//!
//! All `record` methods are interrupt-safe:
//! - Two atomic stores, no read-modify-write loops
//! - No heap allocations
//! - No syscalls, no logging

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Capture cell for one lane sensor.
///
/// The interrupt context writes the timestamp first and then publishes it by
/// setting the triggered flag with `Release`. The control loop consumes the flag
/// with an `Acquire` swap, which makes the timestamp written before it visible.
///
/// The first edge wins: while a capture is pending, later edges on the same lane
/// are ignored so contact bounce can never move a finish time backwards in the
/// ranking.
///
/// # Example
///
/// ```rust
/// use derby_atomic::LaneCapture;
///
/// let cell = LaneCapture::new();
/// cell.record(500);
/// cell.record(900); // bounce, ignored
/// assert_eq!(cell.take(), Some(500));
/// assert!(!cell.is_pending());
/// ```
#[derive(Debug)]
pub struct LaneCapture {
    timestamp_us: AtomicU64,
    triggered: AtomicBool,
}

impl Default for LaneCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneCapture {
    /// Create an empty capture cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timestamp_us: AtomicU64::new(0),
            triggered: AtomicBool::new(false),
        }
    }

    /// Record a falling edge at `timestamp_us`.
    ///
    /// # Interrupt Safety
    ///
    /// Interrupt-safe. One load and at most two stores.
    #[inline]
    pub fn record(&self, timestamp_us: u64) {
        if self.triggered.load(Ordering::Acquire) {
            return;
        }
        self.timestamp_us.store(timestamp_us, Ordering::Relaxed);
        self.triggered.store(true, Ordering::Release);
    }

    /// Consume a pending capture, returning its timestamp.
    ///
    /// Called by the control loop only.
    #[inline]
    #[must_use]
    pub fn take(&self) -> Option<u64> {
        if self.triggered.swap(false, Ordering::Acquire) {
            Some(self.timestamp_us.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Whether a capture is waiting to be consumed.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Drop any pending capture without reading it.
    ///
    /// Used before arming a lane for a new race so a stale edge from the
    /// previous heat cannot leak in.
    #[inline]
    pub fn discard(&self) {
        self.triggered.store(false, Ordering::Release);
    }
}

/// Fixed-capacity bank of [`LaneCapture`] cells, one per sensor slot.
///
/// Out-of-range lane indices are ignored on write and read as empty, so a
/// misrouted interrupt can never panic.
#[derive(Debug)]
pub struct CaptureBank<const N: usize> {
    lanes: [LaneCapture; N],
}

impl<const N: usize> Default for CaptureBank<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CaptureBank<N> {
    /// Create a bank with every cell empty.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lanes: [const { LaneCapture::new() }; N],
        }
    }

    /// Number of slots in the bank.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Record an edge on `lane` (interrupt context).
    #[inline]
    pub fn record(&self, lane: usize, timestamp_us: u64) {
        if let Some(cell) = self.lanes.get(lane) {
            cell.record(timestamp_us);
        }
    }

    /// Consume the pending capture on `lane`, if any (control loop).
    #[inline]
    #[must_use]
    pub fn take(&self, lane: usize) -> Option<u64> {
        self.lanes.get(lane).and_then(LaneCapture::take)
    }

    /// Whether `lane` has a pending capture.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, lane: usize) -> bool {
        self.lanes.get(lane).is_some_and(LaneCapture::is_pending)
    }

    /// Discard every pending capture (control loop).
    pub fn discard_all(&self) {
        for cell in &self.lanes {
            cell.discard();
        }
    }

    /// Number of lanes with a pending capture.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lanes.iter().filter(|cell| cell.is_pending()).count()
    }
}
