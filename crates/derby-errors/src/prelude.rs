//! Prelude module for convenient error handling imports.

pub use crate::{
    Result,
    common::{DerbyError, ErrorCategory},
    config::{ConfigError, ConfigResult},
    protocol::{ProtocolError, ProtocolResult, REJECT_REPLY},
};
