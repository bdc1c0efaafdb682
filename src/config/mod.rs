//! Configuration
//!
//! Defaults, JSON file loading, and environment overrides.

pub mod loader;
pub mod types;
