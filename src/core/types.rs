use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Status code reported when a run is killed at the wall clock bound.
pub const TIMEOUT_STATUS: i32 = -1;
/// Message replacing any captured output after a timeout kill.
pub const TIMEOUT_MESSAGE: &str = "Time limit exceeded";
/// Status code reported when no compiler or interpreter can be found.
pub const NOT_FOUND_STATUS: i32 = 127;
/// Message reported when compiler discovery comes up empty.
pub const NO_COMPILER_MESSAGE: &str = "No C++ compiler found. Install Xcode CLT or Homebrew GCC.";

/// Runtime execution profile consumed by the executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionProfile {
    pub command: Vec<String>,
    pub stdin_data: Option<String>,
    pub environment: Vec<(String, String)>,
    pub workdir: PathBuf,
    pub wall_time_limit_ms: u64,
    /// Per-stream capture limit in bytes
    pub output_limit_bytes: usize,
}

impl ExecutionProfile {
    pub fn new(command: Vec<String>, workdir: &Path, wall_time_limit_ms: u64) -> Self {
        Self {
            command,
            stdin_data: None,
            environment: Vec::new(),
            workdir: workdir.to_path_buf(),
            wall_time_limit_ms,
            output_limit_bytes: 64 * 1024 * 1024,
        }
    }

    pub fn with_stdin(mut self, stdin: &str) -> Self {
        self.stdin_data = Some(stdin.to_string());
        self
    }

    pub fn with_output_limit(mut self, bytes: usize) -> Self {
        self.output_limit_bytes = bytes;
        self
    }
}

/// Paths of one run's files, handed to language adapters when building commands.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunWorkspace {
    pub workdir: PathBuf,
    pub source: PathBuf,
    pub artifact: PathBuf,
}

/// Coarse classification of a finished operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "RE")]
    RuntimeError,
    #[serde(rename = "TLE")]
    TimeLimit,
    #[serde(rename = "CE")]
    CompileError,
    #[serde(rename = "IE")]
    InternalError,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "OK",
            Self::RuntimeError => "RE",
            Self::TimeLimit => "TLE",
            Self::CompileError => "CE",
            Self::InternalError => "IE",
        };
        f.write_str(label)
    }
}

/// Outcome of running a program. `timed_out` never coexists with `status_code == 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "rc")]
    pub status_code: i32,
    #[serde(rename = "timedOut")]
    pub timed_out: bool,
    #[serde(skip)]
    pub status: Option<ExecutionStatus>,
}

impl ExecutionResult {
    /// Result of a process that exited on its own.
    pub fn finished(stdout: String, stderr: String, status_code: i32) -> Self {
        let status = if status_code == 0 {
            ExecutionStatus::Ok
        } else {
            ExecutionStatus::RuntimeError
        };
        Self {
            stdout,
            stderr,
            status_code,
            timed_out: false,
            status: Some(status),
        }
    }

    /// Result of a process killed at the wall clock bound; partial output is dropped.
    pub fn timeout() -> Self {
        Self {
            stdout: String::new(),
            stderr: TIMEOUT_MESSAGE.to_string(),
            status_code: TIMEOUT_STATUS,
            timed_out: true,
            status: Some(ExecutionStatus::TimeLimit),
        }
    }

    /// Compile failure surfaced through the run path.
    pub fn compile_failure(diagnostics: String, status_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: diagnostics,
            status_code,
            timed_out: false,
            status: Some(ExecutionStatus::CompileError),
        }
    }

    /// Missing toolchain or similar environment fault.
    pub fn environment_failure(message: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.to_string(),
            status_code: NOT_FOUND_STATUS,
            timed_out: false,
            status: Some(ExecutionStatus::InternalError),
        }
    }

    pub fn success(&self) -> bool {
        self.status_code == 0 && !self.timed_out
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status.unwrap_or(if self.timed_out {
            ExecutionStatus::TimeLimit
        } else if self.status_code == 0 {
            ExecutionStatus::Ok
        } else {
            ExecutionStatus::RuntimeError
        })
    }
}

/// Compile outcome borrowing its artifact from the workspace that produced it.
#[derive(Debug)]
pub struct CompileResult<'ws> {
    pub artifact: Option<&'ws Path>,
    pub diagnostics: String,
    pub status_code: i32,
    /// Compiler killed at the compile wall clock bound
    pub timed_out: bool,
}

impl CompileResult<'_> {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }

    /// Owned summary that outlives the workspace.
    pub fn report(&self) -> CompileReport {
        CompileReport {
            status_code: self.status_code,
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Owned `(status, diagnostics)` pair returned once the workspace is gone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileReport {
    #[serde(rename = "rc")]
    pub status_code: i32,
    pub diagnostics: String,
}

impl CompileReport {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

/// Side-by-side run of a script and its translation on the same input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comparison {
    pub python: ExecutionResult,
    pub cpp: ExecutionResult,
    #[serde(rename = "outputsMatch")]
    pub outputs_match: bool,
}

/// Normalise program output for comparison: trailing whitespace on every line
/// and trailing blank lines are ignored.
pub fn normalize_output(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |idx| idx + 1);
    lines[..end].join("\n")
}

pub fn outputs_match(left: &str, right: &str) -> bool {
    normalize_output(left) == normalize_output(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_result_shape() {
        let result = ExecutionResult::timeout();
        assert!(result.timed_out);
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "Time limit exceeded");
        assert_eq!(result.status_code, -1);
        assert!(!result.success());
        assert_eq!(result.status(), ExecutionStatus::TimeLimit);
    }

    #[test]
    fn test_execution_result_json_uses_wire_names() {
        let result = ExecutionResult::finished("3\n".to_string(), String::new(), 0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rc"], 0);
        assert_eq!(json["timedOut"], false);
        assert_eq!(json["stdout"], "3\n");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_status_inferred_after_deserialize() {
        let result: ExecutionResult =
            serde_json::from_str(r#"{"stdout":"","stderr":"boom","rc":1,"timedOut":false}"#)
                .unwrap();
        assert_eq!(result.status(), ExecutionStatus::RuntimeError);
    }

    #[test]
    fn test_normalize_output_ignores_trailing_whitespace() {
        assert!(outputs_match("1 2 \n3\n\n\n", "1 2\n3"));
        assert!(!outputs_match("1 2\n3", "1 2\n4"));
        assert!(!outputs_match(" 1", "1"));
        assert_eq!(normalize_output("\n\n"), "");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ExecutionStatus::CompileError.to_string(), "CE");
        assert_eq!(ExecutionStatus::TimeLimit.to_string(), "TLE");
    }
}
