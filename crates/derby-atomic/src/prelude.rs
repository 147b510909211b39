//! Prelude for derby-atomic.
//!
//! # Example
//!
//! ```rust
//! use derby_atomic::prelude::*;
//!
//! let bank: CaptureBank<8> = CaptureBank::new();
//! bank.record(0, 10);
//! ```

pub use crate::capture::{CaptureBank, LaneCapture};

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub use crate::queue::{DEFAULT_EVENT_CAPACITY, EventQueue};
