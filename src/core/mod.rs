//! Language-agnostic execution types.
//!
//! Results, compile reports, and the run workspace handed to judge adapters.

pub mod types;
