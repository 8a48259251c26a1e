//! Core module - Application configuration
//!
//! - [`ClientConfig`] - service URLs, timeouts, player identity and AI settings,
//!   read from the environment by [`ClientConfig::from_env`]

pub mod config;

pub use config::{ClientConfig, ConfigError};
