//! Execution control
//!
//! Spawns one child per stage with a wall-clock bound and collects its output.

pub mod executor;
