use crate::core::types::RunWorkspace;

/// One stage of a language pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Stage does not exist for this language
    Skip,
    /// Run this argv inside the workspace
    Run(Vec<String>),
    /// Required tool is missing; carries the message reported to the caller
    Unavailable(&'static str),
}

/// Judge adapter contract for language-specific compile/run stages.
pub trait JudgeAdapter: Send + Sync {
    fn language(&self) -> &'static str;

    /// File name the source is written under
    fn source_name(&self) -> &'static str;

    fn artifact_name(&self) -> &'static str {
        "a.out"
    }

    /// Normalise source text before it is written to the workspace.
    fn prepare_source(&self, source: &str) -> String {
        source.to_string()
    }

    fn compile_step(&self, workspace: &RunWorkspace) -> Step;

    fn run_step(&self, workspace: &RunWorkspace) -> Step;

    /// Rewritten source for a single retry after a failed compile, if the
    /// diagnostics point at something the adapter knows how to work around.
    fn recover_source(&self, _source: &str, _diagnostics: &str) -> Option<String> {
        None
    }
}
