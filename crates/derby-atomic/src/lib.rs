//! # derby-atomic
//!
//! Interrupt-safe primitives shared between the sensor interrupt context and
//! the cooperative control loop of the derby timer.
//!
//! ## Field ownership
//!
//! | Field              | Written by          | Read by       |
//! |--------------------|---------------------|---------------|
//! | capture timestamp  | interrupt context   | control loop  |
//! | triggered flag     | interrupt (set), control loop (consume) | control loop |
//! | armed / masked / elapsed / position | control loop | control loop, protocol |
//!
//! Only the first two live in this crate. Everything else is plain data owned by
//! the control loop, so no lock is needed anywhere.
//!
//! ## Interrupt Safety
//!
//! - **No heap allocations** on the interrupt path
//! - **No blocking operations** - every method is a bounded number of atomic ops
//! - The timestamp is stored before the flag is published with `Release`, and
//!   consumed with `Acquire`, so a flagged timestamp is never stale
//!
//! ## Usage
//!
//! ```rust
//! use derby_atomic::CaptureBank;
//!
//! let bank: CaptureBank<4> = CaptureBank::new();
//!
//! // Interrupt context
//! bank.record(2, 1_234_567);
//!
//! // Control loop
//! assert_eq!(bank.take(2), Some(1_234_567));
//! assert_eq!(bank.take(2), None);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod capture;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod queue;

pub mod prelude;

pub use capture::{CaptureBank, LaneCapture};

#[cfg(feature = "std")]
pub use queue::{DEFAULT_EVENT_CAPACITY, EventQueue};
