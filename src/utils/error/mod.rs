//! Error handling utilities
//!
//! This module provides the crate error type and its helpers.

pub mod error;

pub use error::*;
