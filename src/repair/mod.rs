//! AI-assisted conversion with compiler-driven repair.
//!
//! The code generator is an external service; this module only fixes the
//! request/response contract ([`CodeGenerator`]) and drives the bounded
//! compile-repair loop against anything that can compile-check C++
//! ([`CompileCheck`], implemented by [`crate::sandbox::Sandbox`]).

pub mod convert;
pub mod ollama;
pub mod prompts;

use crate::config::types::Result;
use crate::core::types::CompileReport;

pub use convert::{convert_with_repairs, RepairOutcome};
pub use ollama::OllamaGenerator;
pub use prompts::{extract_code, initial_request, repair_request, SYSTEM_PROMPT};

/// One prompt to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
}

/// Produces free text (expected to hold one fenced code block) for a request.
pub trait CodeGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Compiles candidate C++ and reports `(status, diagnostics)`.
pub trait CompileCheck {
    fn compile_check(&self, code: &str) -> Result<CompileReport>;
}
