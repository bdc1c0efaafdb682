use crate::core::types::RunWorkspace;
use crate::judge::adapter::{JudgeAdapter, Step};
use std::path::PathBuf;

pub const NO_INTERPRETER_MESSAGE: &str = "Python interpreter not found.";

#[derive(Debug, Clone, Default)]
pub struct PythonAdapter {
    interpreter: Option<PathBuf>,
}

impl PythonAdapter {
    pub fn new(interpreter: Option<PathBuf>) -> Self {
        Self { interpreter }
    }
}

impl JudgeAdapter for PythonAdapter {
    fn language(&self) -> &'static str {
        "python"
    }

    fn source_name(&self) -> &'static str {
        "main.py"
    }

    fn prepare_source(&self, source: &str) -> String {
        dedent(source)
    }

    fn compile_step(&self, _workspace: &RunWorkspace) -> Step {
        Step::Skip
    }

    fn run_step(&self, workspace: &RunWorkspace) -> Step {
        match &self.interpreter {
            Some(interpreter) => Step::Run(vec![
                interpreter.to_string_lossy().to_string(),
                workspace.source.to_string_lossy().to_string(),
            ]),
            None => Step::Unavailable(NO_INTERPRETER_MESSAGE),
        }
    }
}

/// Remove the leading whitespace shared by every non-blank line.
/// Whitespace-only lines are emptied and do not count toward the margin.
pub fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    text.split_inclusive('\n')
        .map(|line| {
            let body = line.trim_end_matches(['\n', '\r']);
            let ending = &line[body.len()..];
            if body.trim().is_empty() {
                ending.to_string()
            } else {
                format!("{}{}", &body[margin.len()..], ending)
            }
        })
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedent_removes_common_margin() {
        let source = "    x = 1\n    if x:\n        print(x)\n";
        assert_eq!(dedent(source), "x = 1\nif x:\n    print(x)\n");
    }

    #[test]
    fn dedent_ignores_blank_lines() {
        let source = "  a = 1\n\n   \n  b = 2";
        assert_eq!(dedent(source), "a = 1\n\n\nb = 2");
    }

    #[test]
    fn dedent_mixed_tabs_and_spaces_keep_only_shared_prefix() {
        let source = "\tx = 1\n    y = 2\n";
        assert_eq!(dedent(source), source);
    }

    #[test]
    fn run_step_without_interpreter() {
        let adapter = PythonAdapter::new(None);
        let layout = RunWorkspace {
            workdir: PathBuf::from("/tmp/run"),
            source: PathBuf::from("/tmp/run/main.py"),
            artifact: PathBuf::from("/tmp/run/a.out"),
        };
        assert_eq!(adapter.compile_step(&layout), Step::Skip);
        assert_eq!(
            adapter.run_step(&layout),
            Step::Unavailable(NO_INTERPRETER_MESSAGE)
        );
    }
}
