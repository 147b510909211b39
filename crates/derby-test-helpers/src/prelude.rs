//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use derby_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some, must_with};

#[cfg(feature = "mock")]
pub use crate::mock::{DisplayCell, MockHandle, MockPlatform, ScheduledTimer, mock_controller};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
