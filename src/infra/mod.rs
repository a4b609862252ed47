//! Infrastructure - configuration and errors
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults, validation)
//! - `error` - Recorder contract errors

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::RecorderError;
