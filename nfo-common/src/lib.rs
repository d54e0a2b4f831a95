//! # NFO Editor Common Library
//!
//! Shared code for the NFO editor workspace:
//! - Common error type
//! - TOML configuration loading and resolution
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
