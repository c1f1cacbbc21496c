//! # ser-common
//!
//! Shared code for the speech-emotion ensemble service:
//! - Error type shared by configuration and startup code
//! - TOML configuration resolution and loading
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
