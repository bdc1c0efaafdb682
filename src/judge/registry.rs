use crate::config::types::{Result, SandboxConfig, TransboxError};
use crate::judge::adapter::JudgeAdapter;
use crate::judge::languages::{cpp::CppAdapter, python::PythonAdapter};
use crate::judge::toolchain::Toolchain;

pub fn adapter_for(
    language: &str,
    toolchain: &Toolchain,
    config: &SandboxConfig,
) -> Result<Box<dyn JudgeAdapter>> {
    match language.to_ascii_lowercase().as_str() {
        "python" | "py" | "python3" => Ok(Box::new(PythonAdapter::new(
            toolchain.interpreter.clone(),
        ))),
        "cpp" | "c++" | "cxx" | "cc" => Ok(Box::new(CppAdapter::new(
            toolchain.compiler.clone(),
            config,
        ))),
        _ => Err(TransboxError::Config(format!(
            "unsupported language adapter: {language}"
        ))),
    }
}
