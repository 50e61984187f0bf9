//! Error handling for the health monitor
//!
//! This module defines all error types used throughout the crate.

#![allow(missing_docs)]

mod helpers;
mod types;

pub use types::{MonitorError, Result};
