//! Bounded lock-free event queue between the asynchronous event sources and
//! the control loop.
//!
//! Gate edges and timer expirations are pushed from their own contexts and
//! drained in order by the control loop, so the loop sees a single serialized
//! stream instead of a second source of unsynchronized concurrency.
//!
//! # Interrupt Safety
//!
//! `push` is interrupt-safe:
//! - Bounded capacity (no allocation on push)
//! - Lock-free implementation
//! - Drop on overflow, counted in [`EventQueue::dropped`]
//!
//! # Overflow Behavior
//!
//! When the queue is full the new event is dropped and the drop counter is
//! incremented. The control loop reports the counter; with a loop that polls
//! every few hundred microseconds and a handful of events per race, overflow
//! indicates a stalled loop.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crossbeam::queue::ArrayQueue;

/// Default capacity for the platform event queue.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Bounded multi-producer event queue drained by the control loop.
///
/// # Example
///
/// ```rust
/// use derby_atomic::queue::EventQueue;
///
/// let queue: EventQueue<u32> = EventQueue::with_capacity(2);
/// queue.push(1);
/// queue.push(2);
/// queue.push(3); // dropped
///
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), None);
/// assert_eq!(queue.dropped(), 1);
/// ```
pub struct EventQueue<T> {
    events: ArrayQueue<T>,
    dropped: AtomicU64,
}

impl<T> fmt::Debug for EventQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.events.len())
            .field("capacity", &self.events.capacity())
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    /// Create a queue with [`DEFAULT_EVENT_CAPACITY`].
    ///
    /// Initialization-time operation; allocates the ring storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a queue with a specific capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: ArrayQueue::new(capacity.max(1)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Push an event, dropping it if the queue is full.
    ///
    /// # Interrupt Safety
    ///
    /// Interrupt-safe. Non-blocking, O(1).
    #[inline]
    pub fn push(&self, event: T) {
        if self.events.push(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Pop the oldest event.
    #[inline]
    #[must_use]
    pub fn pop(&self) -> Option<T> {
        self.events.pop()
    }

    /// Number of queued events.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events dropped because the queue was full.
    #[inline]
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drain every queued event, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = T> + '_ {
        core::iter::from_fn(move || self.events.pop())
    }
}
