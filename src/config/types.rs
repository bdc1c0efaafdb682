/// Core configuration and error types for transbox
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Sandbox configuration, resolved once at startup and passed into [`crate::sandbox::Sandbox`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Per-run time limit in seconds; the enforced wall clock bound adds one second of grace
    pub time_limit_secs: u64,
    /// Wall clock bound for the compile step in seconds
    pub compile_time_limit_secs: u64,
    /// Directory that holds one run-scoped workspace per operation
    pub workspace_root: PathBuf,
    /// Package-manager prefixes searched for versioned `g++-<N>` installs
    pub compiler_prefixes: Vec<PathBuf>,
    /// Generic compiler tried after the versioned installs
    pub primary_compiler: String,
    /// Generic compiler tried last (treated as clang)
    pub secondary_compiler: String,
    /// Interpreter used for direct script execution
    pub python: String,
    /// Language standard flag
    pub std_flag: String,
    /// Optimisation and pipe flags
    pub opt_flags: Vec<String>,
    /// Per-stream capture limit in bytes
    pub output_limit_bytes: usize,
}

impl SandboxConfig {
    /// Runtime root directory scoped by effective UID.
    /// Keeps root and non-root runs from colliding on a shared temp dir.
    pub fn runtime_root_dir() -> PathBuf {
        let euid = nix::unistd::geteuid().as_raw();
        std::env::temp_dir().join(format!("transbox-uid-{}", euid))
    }

    /// Wall clock bound applied to program runs.
    pub fn run_wall_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs + 1)
    }

    /// Wall clock bound applied to the compiler.
    pub fn compile_wall_limit(&self) -> Duration {
        Duration::from_secs(self.compile_time_limit_secs)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 2,
            compile_time_limit_secs: 30,
            workspace_root: Self::runtime_root_dir(),
            compiler_prefixes: vec![
                PathBuf::from("/opt/homebrew/bin"),
                PathBuf::from("/usr/local/bin"),
            ],
            primary_compiler: "g++".to_string(),
            secondary_compiler: "clang++".to_string(),
            python: "python3".to_string(),
            std_flag: "-std=gnu++17".to_string(),
            opt_flags: vec!["-O2".to_string(), "-pipe".to_string()],
            output_limit_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Settings for the external code-generation service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Repair attempts after the first candidate
    pub max_repairs: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5-coder:7b".to_string(),
            temperature: 0.15,
            top_p: 0.9,
            request_timeout_secs: 600,
            max_repairs: 2,
        }
    }
}

/// Full `transbox.json` structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransboxConfig {
    pub sandbox: SandboxConfig,
    pub generator: GeneratorConfig,
}

/// Custom error types for transbox
#[derive(Error, Debug)]
pub enum TransboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Generator error: {0}")]
    Generator(String),
}

impl From<nix::errno::Errno> for TransboxError {
    fn from(err: nix::errno::Errno) -> Self {
        TransboxError::Process(err.to_string())
    }
}

/// Result type alias for transbox operations
pub type Result<T> = std::result::Result<T, TransboxError>;
