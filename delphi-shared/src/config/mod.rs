//! # Configuration
//!
//! Client-side configuration for the Delphi console: where the backend
//! lives, how aggressively to poll the bot pipeline, and how to log.

pub mod client;

pub use client::{ClientConfig, ConfigError, LogFormat, LoggingConfig, PollConfig};
