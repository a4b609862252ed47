//! Latency recorder library
//!
//! Exposes modules for integration testing and binary reuse.

pub mod infra;
pub mod recorder;
pub mod services;
