//! Judge adapters.
//!
//! The sandbox stays language-agnostic. Adapters define compile/run argv
//! for Python and C++ against the discovered toolchain.

pub mod adapter;
pub mod languages;
pub mod registry;
pub mod toolchain;
