//! Compiler and interpreter discovery.
//!
//! Resolved once when a [`crate::sandbox::Sandbox`] is built and passed down
//! to the adapters; nothing here is consulted per request.

use crate::config::types::SandboxConfig;
use serde::Serialize;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CompilerFamily {
    Gcc,
    Clang,
}

/// A discovered C++ compiler
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Compiler {
    pub path: PathBuf,
    pub family: CompilerFamily,
}

impl Compiler {
    /// Arguments that must precede the common flag set.
    pub fn family_args(&self) -> &'static [&'static str] {
        match self.family {
            CompilerFamily::Gcc => &[],
            CompilerFamily::Clang => &["-stdlib=libc++"],
        }
    }
}

/// Tools available on this host
#[derive(Clone, Debug, Default, Serialize)]
pub struct Toolchain {
    pub compiler: Option<Compiler>,
    pub interpreter: Option<PathBuf>,
}

impl Toolchain {
    pub fn discover(config: &SandboxConfig) -> Self {
        let toolchain = Self {
            compiler: discover_compiler(config),
            interpreter: find_executable(&config.python),
        };
        match &toolchain.compiler {
            Some(compiler) => log::info!("Using C++ compiler {}", compiler.path.display()),
            None => log::warn!("No C++ compiler found"),
        }
        if toolchain.interpreter.is_none() {
            log::warn!("Interpreter '{}' not found on PATH", config.python);
        }
        toolchain
    }
}

/// Search order: the newest versioned `g++-<N>` install across all prefixes,
/// then the primary compiler name, then the secondary one.
pub fn discover_compiler(config: &SandboxConfig) -> Option<Compiler> {
    if let Some(path) = versioned_installs(&config.compiler_prefixes).into_iter().next() {
        return Some(Compiler {
            path,
            family: CompilerFamily::Gcc,
        });
    }

    if let Some(path) = find_executable(&config.primary_compiler) {
        return Some(Compiler {
            path,
            family: CompilerFamily::Gcc,
        });
    }

    find_executable(&config.secondary_compiler).map(|path| Compiler {
        path,
        family: CompilerFamily::Clang,
    })
}

/// `g++-<N>` executables under every prefix as one list, newest first.
/// Equal versions keep prefix order.
pub fn versioned_installs(prefixes: &[PathBuf]) -> Vec<PathBuf> {
    let mut found: Vec<(Vec<u64>, PathBuf)> = prefixes
        .iter()
        .flat_map(|prefix| versioned_in(prefix))
        .collect();

    found.sort_by(|a, b| b.0.cmp(&a.0));
    found.into_iter().map(|(_, path)| path).collect()
}

fn versioned_in(prefix: &Path) -> Vec<(Vec<u64>, PathBuf)> {
    let entries = match fs::read_dir(prefix) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let version = parse_version(name.strip_prefix("g++-")?)?;
            let path = entry.path();
            is_executable(&path).then_some((version, path))
        })
        .collect()
}

fn parse_version(text: &str) -> Option<Vec<u64>> {
    text.split('.').map(|part| part.parse::<u64>().ok()).collect()
}

/// Resolve `name` against `PATH`, or check it directly when it contains a slash.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_tool(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn scratch() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("transbox_tc_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn versioned_installs_sort_numerically() {
        let dir = scratch();
        fake_tool(&dir, "g++-9");
        fake_tool(&dir, "g++-13");
        fake_tool(&dir, "g++-12");
        fake_tool(&dir, "g++-fake");
        fs::write(dir.join("g++-14"), "not executable").unwrap();

        let names: Vec<String> = versioned_installs(&[dir.clone()])
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["g++-13", "g++-12", "g++-9"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn newest_install_wins_across_prefixes() {
        let root = scratch();
        let brew = root.join("brew");
        let local = root.join("local");
        fs::create_dir_all(&brew).unwrap();
        fs::create_dir_all(&local).unwrap();
        fake_tool(&brew, "g++-12");
        let expected = fake_tool(&local, "g++-14");
        fake_tool(&local, "g++-9");

        let config = SandboxConfig {
            compiler_prefixes: vec![brew.clone(), local.clone()],
            ..SandboxConfig::default()
        };
        let compiler = discover_compiler(&config).unwrap();
        assert_eq!(compiler.path, expected);
        assert_eq!(compiler.family, CompilerFamily::Gcc);

        let all = versioned_installs(&config.compiler_prefixes);
        assert_eq!(all, vec![expected, brew.join("g++-12"), local.join("g++-9")]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn prefixes_win_over_generic_names() {
        let dir = scratch();
        let expected = fake_tool(&dir, "g++-11");
        let config = SandboxConfig {
            compiler_prefixes: vec![dir.clone()],
            ..SandboxConfig::default()
        };
        let compiler = discover_compiler(&config).unwrap();
        assert_eq!(compiler.path, expected);
        assert_eq!(compiler.family, CompilerFamily::Gcc);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn secondary_compiler_is_clang() {
        let dir = scratch();
        let clang = fake_tool(&dir, "my-clang");
        let config = SandboxConfig {
            compiler_prefixes: Vec::new(),
            primary_compiler: "/nonexistent/g++".to_string(),
            secondary_compiler: clang.to_string_lossy().to_string(),
            ..SandboxConfig::default()
        };
        let compiler = discover_compiler(&config).unwrap();
        assert_eq!(compiler.family, CompilerFamily::Clang);
        assert_eq!(compiler.family_args(), &["-stdlib=libc++"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn nothing_found() {
        let config = SandboxConfig {
            compiler_prefixes: vec![PathBuf::from("/nonexistent/prefix")],
            primary_compiler: "/nonexistent/g++".to_string(),
            secondary_compiler: "/nonexistent/clang++".to_string(),
            ..SandboxConfig::default()
        };
        assert!(discover_compiler(&config).is_none());
    }

    #[test]
    fn find_executable_on_path() {
        assert!(find_executable("sh").is_some());
        assert!(find_executable("definitely-not-a-real-tool-xyz").is_none());
    }
}
