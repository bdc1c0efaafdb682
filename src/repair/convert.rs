use crate::config::types::Result;
use crate::repair::prompts::{extract_code, initial_request, repair_request};
use crate::repair::{CodeGenerator, CompileCheck};
use serde::Serialize;

/// Final candidate of a conversion and whether it compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairOutcome {
    #[serde(rename = "cpp")]
    pub code: String,
    pub compiled: bool,
    /// Generation calls made, first draft included
    pub attempts: u32,
}

/// Ask the generator for a first draft, then compile-check and request a
/// repair from the diagnostics until it compiles or `max_repairs` repairs
/// have been spent. The last candidate is returned whether or not it compiles.
pub fn convert_with_repairs(
    generator: &dyn CodeGenerator,
    checker: &dyn CompileCheck,
    python_source: &str,
    max_repairs: u32,
) -> Result<RepairOutcome> {
    let mut code = extract_code(&generator.generate(&initial_request(python_source))?);
    let mut attempts = 1;

    for repair in 0..=max_repairs {
        let report = checker.compile_check(&code)?;
        if report.success() {
            log::info!("Candidate compiled after {} generation(s)", attempts);
            return Ok(RepairOutcome {
                code,
                compiled: true,
                attempts,
            });
        }
        if repair == max_repairs {
            break;
        }

        log::info!("Repair attempt {} of {}", repair + 1, max_repairs);
        code = extract_code(&generator.generate(&repair_request(&report.diagnostics))?);
        attempts += 1;
    }

    log::warn!(
        "Candidate still fails to compile after {} repair(s); returning it as is",
        max_repairs
    );
    Ok(RepairOutcome {
        code,
        compiled: false,
        attempts,
    })
}
