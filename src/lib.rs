//! transbox: Python-subset to C++17 translation with a sandboxed compile/run loop
//!
//! # Architecture
//!
//! ## Translation ([`translate`])
//! - [`translate::lexer`]: indentation-aware tokenizer
//! - [`translate::parser`]: recursive-descent parser into [`translate::ast`]
//! - [`translate::emitter`]: scoped line emitter and unsupported-construct log
//! - [`translate::expr`], [`translate::stmt`]: expression and statement rules
//! - [`translate::preamble`]: fixed runtime support block of every program
//!
//! ## Sandbox ([`sandbox`])
//! - [`sandbox::Sandbox`]: compile, run and compare in throwaway workspaces
//! - [`judge`]: compiler discovery and per-language compile/run adapters
//! - [`exec::executor`]: child process spawning with a wall clock bound
//! - [`safety::workspace`]: run-scoped directories removed on every exit path
//! - [`utils::output`]: bounded stdout/stderr collection
//!
//! ## Repair ([`repair`])
//! - [`repair::ollama`]: HTTP client for an Ollama-compatible generator
//! - [`repair::convert`]: bounded compile-repair loop
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: settings, error taxonomy and `Result` alias
//! - [`config::loader`]: `transbox.json` loading and environment overrides
//!
//! Expected outcomes (compile errors, runtime errors, timeouts, a missing
//! toolchain) are values. `Err` is kept for faults of the tool itself.

// Python-subset to C++ translation
pub mod translate;

// Execution control
pub mod exec;

// Shared result types
pub mod core;

// Language adapters and toolchain discovery
pub mod judge;

// Workspace lifecycle
pub mod safety;

// Compile/run façade
pub mod sandbox;

// AI-assisted conversion
pub mod repair;

// Configuration
pub mod config;

// Utilities
pub mod utils;

// CLI entrypoint wiring for the transbox binary.
pub mod cli;

pub use crate::config::types::{GeneratorConfig, Result, SandboxConfig, TransboxConfig, TransboxError};
pub use crate::core::types::{CompileReport, Comparison, ExecutionResult, ExecutionStatus};
pub use repair::{convert_with_repairs, CodeGenerator, CompileCheck, RepairOutcome};
pub use sandbox::Sandbox;
pub use translate::{py_to_cpp, transpile, Translation, Unsupported};
