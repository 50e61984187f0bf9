//! Utility modules for the health monitor
//!
//! - **error**: crate error type and result alias
//! - **logging**: `tracing` subscriber setup

pub mod error;
pub mod logging;

pub use error::{MonitorError, Result};
pub use logging::{LogLevel, init_logging};
