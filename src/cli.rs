use crate::config::types::{SandboxConfig, TransboxConfig};
use crate::core::types::ExecutionResult;
use crate::repair::{convert_with_repairs, OllamaGenerator};
use crate::sandbox::Sandbox;
use crate::translate::transpile;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Workspaces older than this are leftovers of killed runs
const STALE_WORKSPACE_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./transbox.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a Python file to C++ and print the result
    Transpile {
        /// Python source file
        file: PathBuf,
        /// Emit {"cpp": ..., "unsupported": [...]} instead of plain C++
        #[arg(long)]
        json: bool,
    },
    /// Run a Python file with the interpreter
    RunPython {
        file: PathBuf,
        /// File whose contents are passed to stdin
        #[arg(long, value_name = "FILE")]
        stdin: Option<PathBuf>,
    },
    /// Compile and run a C++ file
    RunCpp {
        file: PathBuf,
        /// File whose contents are passed to stdin
        #[arg(long, value_name = "FILE")]
        stdin: Option<PathBuf>,
    },
    /// Compile a C++ file and report diagnostics
    Compile { file: PathBuf },
    /// Run a Python file and a C++ file on the same input and compare stdout
    Compare {
        python: PathBuf,
        cpp: PathBuf,
        /// File whose contents are passed to stdin
        #[arg(long, value_name = "FILE")]
        stdin: Option<PathBuf>,
    },
    /// Convert a Python file with the code generator, repairing compile errors
    Convert {
        file: PathBuf,
        /// Repair attempts after the first draft (overrides the config)
        #[arg(long)]
        max_repairs: Option<u32>,
    },
    /// Check that a Python interpreter and a C++ compiler are available
    CheckDeps {
        /// Print tool paths and versions
        #[arg(long, short)]
        verbose: bool,
    },
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = TransboxConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Transpile { file, json } => {
            let source = read_source(&file)?;
            let translation = transpile(&source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&translation)?);
            } else {
                println!("{}", translation.code);
                for item in &translation.unsupported {
                    eprintln!(
                        "⚠️  line {}: unsupported {}",
                        item.line, item.construct
                    );
                }
            }
            Ok(())
        }
        Commands::RunPython { file, stdin } => {
            let sandbox = open_sandbox(config.sandbox)?;
            let result = sandbox.run_direct(&read_source(&file)?, &read_stdin(stdin.as_deref())?)?;
            emit_result(&result)
        }
        Commands::RunCpp { file, stdin } => {
            let sandbox = open_sandbox(config.sandbox)?;
            let result =
                sandbox.compile_and_run(&read_source(&file)?, &read_stdin(stdin.as_deref())?)?;
            emit_result(&result)
        }
        Commands::Compile { file } => {
            let sandbox = open_sandbox(config.sandbox)?;
            let report = sandbox.compile_only(&read_source(&file)?)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Compare { python, cpp, stdin } => {
            let sandbox = open_sandbox(config.sandbox)?;
            let comparison = sandbox.run_both(
                &read_source(&python)?,
                &read_source(&cpp)?,
                &read_stdin(stdin.as_deref())?,
            )?;
            println!("{}", serde_json::to_string_pretty(&comparison)?);
            if comparison.outputs_match {
                eprintln!("✅ Outputs match");
            } else {
                eprintln!("❌ Outputs differ");
            }
            Ok(())
        }
        Commands::Convert { file, max_repairs } => {
            let source = read_source(&file)?;
            let max_repairs = max_repairs.unwrap_or(config.generator.max_repairs);
            let sandbox = open_sandbox(config.sandbox)?;
            let generator = OllamaGenerator::new(config.generator)?;
            let outcome = convert_with_repairs(&generator, &sandbox, &source, max_repairs)?;
            println!("{}", outcome.code);
            if !outcome.compiled {
                eprintln!(
                    "❌ Candidate still fails to compile after {} generation(s)",
                    outcome.attempts
                );
            }
            Ok(())
        }
        Commands::CheckDeps { verbose } => check_toolchain(&config, verbose),
    }
}

fn open_sandbox(config: SandboxConfig) -> Result<Sandbox> {
    let sandbox = Sandbox::new(config)?;
    match sandbox.sweep_stale_workspaces(STALE_WORKSPACE_AGE) {
        Ok(0) => {}
        Ok(removed) => log::info!("Removed {} stale workspace(s)", removed),
        Err(e) => log::warn!("Stale workspace sweep failed: {}", e),
    }
    Ok(sandbox)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_stdin(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => read_source(path),
        None => Ok(String::new()),
    }
}

/// Print the `{stdout, stderr, rc, timedOut}` object
fn emit_result(result: &ExecutionResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn tool_version(path: &Path) -> String {
    match std::process::Command::new(path).arg("--version").output() {
        Ok(output) => {
            let text = if !output.stdout.is_empty() {
                String::from_utf8_lossy(&output.stdout)
            } else {
                String::from_utf8_lossy(&output.stderr)
            };
            text.lines().next().unwrap_or("").trim().to_string()
        }
        Err(_) => "FAILED".to_string(),
    }
}

fn check_toolchain(config: &TransboxConfig, verbose: bool) -> Result<()> {
    println!("🔍 Checking toolchain...");
    println!();

    let sandbox = Sandbox::new(config.sandbox.clone())?;
    let toolchain = sandbox.check_toolchain();
    let mut missing = Vec::new();

    match &toolchain.interpreter {
        Some(path) => {
            println!("✅ Python - OK");
            if verbose {
                println!("  {} -> {}", path.display(), tool_version(path));
            }
        }
        None => {
            println!("❌ Python - MISSING ({} not on PATH)", config.sandbox.python);
            missing.push("Python");
        }
    }

    match &toolchain.compiler {
        Some(compiler) => {
            println!("✅ C++ - OK ({:?})", compiler.family);
            if verbose {
                println!(
                    "  {} -> {}",
                    compiler.path.display(),
                    tool_version(&compiler.path)
                );
            }
        }
        None => {
            println!("❌ C++ - MISSING");
            missing.push("C++");
        }
    }

    println!();
    if missing.is_empty() {
        println!("✅ transbox is ready to use");
        return Ok(());
    }

    println!("❌ Missing toolchain: {}", missing.join(", "));
    println!();
    println!("Install manually:");
    for tool in &missing {
        match *tool {
            "Python" => println!("  • Python: sudo apt install python3"),
            "C++" => println!("  • C++: sudo apt install g++ (or Xcode CLT / Homebrew GCC on macOS)"),
            _ => {}
        }
    }
    std::process::exit(1);
}
