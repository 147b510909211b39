//! Centralized error types for the derby timer
//!
//! # Architecture
//!
//! - [`config`]: range validation failures when changing the race configuration
//! - [`protocol`]: malformed or rejected serial command lines
//! - [`common`]: the top-level [`DerbyError`] and its classification
//!
//! # Operator-facing behaviour
//!
//! Configuration and protocol errors are always recovered locally. The serial
//! link only ever shows [`REJECT_REPLY`] for them; the typed error exists so the
//! control loop can log what went wrong.
//!
//! # Example
//!
//! ```
//! use derby_errors::prelude::*;
//!
//! fn set_places(places: u8) -> ConfigResult<u8> {
//!     if !(3..=5).contains(&places) {
//!         return Err(ConfigError::out_of_range("decimal_places", places, 3u8, 5u8));
//!     }
//!     Ok(places)
//! }
//!
//! let err: DerbyError = set_places(7).unwrap_err().into();
//! assert_eq!(err.category(), ErrorCategory::Config);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod config;
pub mod prelude;
pub mod protocol;

pub use common::{DerbyError, ErrorCategory};
pub use config::{ConfigError, ConfigResult};
pub use protocol::{ProtocolError, ProtocolResult, REJECT_REPLY};

/// A specialized `Result` type for derby timer operations.
pub type Result<T> = std::result::Result<T, DerbyError>;
