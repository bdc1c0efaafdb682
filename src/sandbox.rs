//! Compile and execute façade.
//!
//! Every operation gets its own [`Workspace`], which is removed before the
//! call returns. Compile failures, runtime errors, timeouts and a missing
//! toolchain are values in the returned result; `Err` is left for faults in
//! the sandbox itself (workspace creation, spawning, I/O).

use crate::config::types::{Result, SandboxConfig, TransboxError};
use crate::core::types::{
    outputs_match, CompileReport, CompileResult, Comparison, ExecutionProfile, ExecutionResult,
    RunWorkspace, NOT_FOUND_STATUS,
};
use crate::exec::executor::ProcessExecutor;
use crate::judge::adapter::{JudgeAdapter, Step};
use crate::judge::registry::adapter_for;
use crate::judge::toolchain::Toolchain;
use crate::repair::CompileCheck;
use crate::safety::workspace::{Workspace, WorkspaceManager};
use std::io::ErrorKind;
use std::time::Duration;

pub struct Sandbox {
    config: SandboxConfig,
    toolchain: Toolchain,
    executor: ProcessExecutor,
    workspaces: WorkspaceManager,
}

impl Sandbox {
    /// Discover the toolchain once and prepare the workspace root.
    pub fn new(config: SandboxConfig) -> Result<Self> {
        let toolchain = Toolchain::discover(&config);
        Self::with_toolchain(config, toolchain)
    }

    pub fn with_toolchain(config: SandboxConfig, toolchain: Toolchain) -> Result<Self> {
        let workspaces = WorkspaceManager::new(config.workspace_root.clone())?;
        Ok(Self {
            config,
            toolchain,
            executor: ProcessExecutor::new(),
            workspaces,
        })
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Tools this sandbox resolved at construction
    pub fn check_toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Remove workspaces orphaned by killed processes.
    pub fn sweep_stale_workspaces(&self, max_age: Duration) -> Result<usize> {
        self.workspaces.cleanup_old_workspaces(max_age)
    }

    /// Compile C++ text and report `(status, diagnostics)`.
    pub fn compile_only(&self, cpp_source: &str) -> Result<CompileReport> {
        let adapter = self.adapter("cpp")?;
        let mut workspace = self.workspaces.create_workspace()?;
        let layout = workspace.layout(adapter.source_name(), adapter.artifact_name());

        let report = self
            .compile_in(adapter.as_ref(), &mut workspace, &layout, cpp_source)?
            .report();
        workspace.cleanup()?;
        Ok(report)
    }

    /// Compile C++ text and, if that succeeds, run the binary on `stdin`.
    pub fn compile_and_run(&self, cpp_source: &str, stdin: &str) -> Result<ExecutionResult> {
        self.execute("cpp", cpp_source, stdin)
    }

    /// Run a Python script with the interpreter.
    pub fn run_direct(&self, python_source: &str, stdin: &str) -> Result<ExecutionResult> {
        self.execute("python", python_source, stdin)
    }

    /// Run the script and the C++ text on the same input and compare stdout.
    pub fn run_both(
        &self,
        python_source: &str,
        cpp_source: &str,
        stdin: &str,
    ) -> Result<Comparison> {
        let python = self.run_direct(python_source, stdin)?;
        let cpp = self.compile_and_run(cpp_source, stdin)?;
        let outputs_match =
            python.success() && cpp.success() && outputs_match(&python.stdout, &cpp.stdout);
        Ok(Comparison {
            python,
            cpp,
            outputs_match,
        })
    }

    /// Build (if the language needs it) and run `code` in a fresh workspace.
    pub fn execute(&self, language: &str, code: &str, stdin: &str) -> Result<ExecutionResult> {
        let adapter = self.adapter(language)?;
        let mut workspace = self.workspaces.create_workspace()?;
        let layout = workspace.layout(adapter.source_name(), adapter.artifact_name());

        let result = {
            let compiled = self.compile_in(adapter.as_ref(), &mut workspace, &layout, code)?;
            if compiled.success() {
                self.run_in(adapter.as_ref(), &layout, stdin)?
            } else if compiled.status_code == NOT_FOUND_STATUS {
                ExecutionResult::environment_failure(&compiled.diagnostics)
            } else if compiled.timed_out {
                ExecutionResult::timeout()
            } else {
                ExecutionResult::compile_failure(compiled.diagnostics, compiled.status_code)
            }
        };

        workspace.cleanup()?;
        Ok(result)
    }

    fn adapter(&self, language: &str) -> Result<Box<dyn JudgeAdapter>> {
        adapter_for(language, &self.toolchain, &self.config)
    }

    /// Write the source and run the adapter's compile step, retrying once
    /// with the adapter's rewritten source when it offers one.
    fn compile_in<'ws>(
        &self,
        adapter: &dyn JudgeAdapter,
        workspace: &'ws mut Workspace,
        layout: &RunWorkspace,
        code: &str,
    ) -> Result<CompileResult<'ws>> {
        let source = adapter.prepare_source(code);
        workspace.write_source(adapter.source_name(), &source)?;
        workspace.reserve_artifact(adapter.artifact_name());

        let argv = match adapter.compile_step(layout) {
            Step::Skip => {
                return Ok(CompileResult {
                    artifact: None,
                    diagnostics: String::new(),
                    status_code: 0,
                    timed_out: false,
                })
            }
            Step::Unavailable(message) => {
                log::warn!("{} toolchain unavailable: {}", adapter.language(), message);
                return Ok(CompileResult {
                    artifact: None,
                    diagnostics: message.to_string(),
                    status_code: NOT_FOUND_STATUS,
                    timed_out: false,
                });
            }
            Step::Run(argv) => argv,
        };

        let mut outcome = self.run_compiler(&argv, layout)?;
        if !outcome.success() && !outcome.timed_out {
            if let Some(rewritten) = adapter.recover_source(&source, &outcome.stderr) {
                log::info!("Compile failed on the aggregate header; retrying with explicit headers");
                workspace.write_source(adapter.source_name(), &rewritten)?;
                outcome = self.run_compiler(&argv, layout)?;
            }
        }

        let workspace: &'ws Workspace = workspace;
        Ok(CompileResult {
            artifact: if outcome.success() {
                workspace.artifact_file()
            } else {
                None
            },
            diagnostics: outcome.stderr,
            status_code: outcome.status_code,
            timed_out: outcome.timed_out,
        })
    }

    fn run_compiler(&self, argv: &[String], layout: &RunWorkspace) -> Result<ExecutionResult> {
        let profile = ExecutionProfile::new(
            argv.to_vec(),
            &layout.workdir,
            self.config.compile_wall_limit().as_millis() as u64,
        )
        .with_output_limit(self.config.output_limit_bytes);

        match self.executor.execute(&profile) {
            Err(TransboxError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Compiler {} disappeared: {}", argv[0], e);
                Ok(ExecutionResult::environment_failure(
                    crate::core::types::NO_COMPILER_MESSAGE,
                ))
            }
            other => other,
        }
    }

    fn run_in(
        &self,
        adapter: &dyn JudgeAdapter,
        layout: &RunWorkspace,
        stdin: &str,
    ) -> Result<ExecutionResult> {
        let argv = match adapter.run_step(layout) {
            Step::Run(argv) => argv,
            Step::Unavailable(message) => {
                log::warn!("{} toolchain unavailable: {}", adapter.language(), message);
                return Ok(ExecutionResult::environment_failure(message));
            }
            Step::Skip => {
                return Err(TransboxError::Config(format!(
                    "{} adapter has no run step",
                    adapter.language()
                )))
            }
        };

        let profile = ExecutionProfile::new(
            argv,
            &layout.workdir,
            self.config.run_wall_limit().as_millis() as u64,
        )
        .with_stdin(stdin)
        .with_output_limit(self.config.output_limit_bytes);

        match self.executor.execute(&profile) {
            Err(TransboxError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                Ok(ExecutionResult::environment_failure(&format!(
                    "{} not found: {}",
                    profile.command[0], e
                )))
            }
            other => other,
        }
    }
}

impl CompileCheck for Sandbox {
    fn compile_check(&self, code: &str) -> Result<CompileReport> {
        self.compile_only(code)
    }
}
