use crate::config::types::SandboxConfig;
use crate::core::types::{RunWorkspace, NO_COMPILER_MESSAGE};
use crate::judge::adapter::{JudgeAdapter, Step};
use crate::judge::toolchain::Compiler;

/// Replacement for the aggregate header on toolchains that lack it.
pub const FALLBACK_HEADERS: &str = "#include <iostream>
#include <vector>
#include <string>
#include <algorithm>
#include <numeric>
#include <cmath>
#include <map>
#include <unordered_map>
#include <set>
#include <unordered_set>
#include <queue>
#include <stack>
#include <deque>
#include <tuple>
#include <utility>
#include <sstream>
#include <iomanip>
#include <limits>
#include <array>
#include <bitset>
#include <functional>
#include <cstring>
#include <chrono>
using namespace std;";

const AGGREGATE_HEADER: &str = "bits/stdc++.h";

/// `#include <bits/stdc++.h>` with any spacing
fn is_aggregate_include(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact == "#include<bits/stdc++.h>"
}

#[derive(Debug, Clone)]
pub struct CppAdapter {
    compiler: Option<Compiler>,
    std_flag: String,
    opt_flags: Vec<String>,
}

impl CppAdapter {
    pub fn new(compiler: Option<Compiler>, config: &SandboxConfig) -> Self {
        Self {
            compiler,
            std_flag: config.std_flag.clone(),
            opt_flags: config.opt_flags.clone(),
        }
    }

    pub fn compiler(&self) -> Option<&Compiler> {
        self.compiler.as_ref()
    }
}

impl JudgeAdapter for CppAdapter {
    fn language(&self) -> &'static str {
        "cpp"
    }

    fn source_name(&self) -> &'static str {
        "main.cpp"
    }

    fn compile_step(&self, workspace: &RunWorkspace) -> Step {
        let compiler = match &self.compiler {
            Some(compiler) => compiler,
            None => return Step::Unavailable(NO_COMPILER_MESSAGE),
        };

        let mut argv = vec![compiler.path.to_string_lossy().to_string()];
        argv.extend(compiler.family_args().iter().map(|a| a.to_string()));
        argv.push(self.std_flag.clone());
        argv.extend(self.opt_flags.iter().cloned());
        argv.push(workspace.source.to_string_lossy().to_string());
        argv.push("-o".to_string());
        argv.push(workspace.artifact.to_string_lossy().to_string());
        Step::Run(argv)
    }

    fn run_step(&self, workspace: &RunWorkspace) -> Step {
        Step::Run(vec![workspace.artifact.to_string_lossy().to_string()])
    }

    fn recover_source(&self, source: &str, diagnostics: &str) -> Option<String> {
        if !diagnostics.contains(AGGREGATE_HEADER) {
            return None;
        }
        if !source.lines().any(is_aggregate_include) {
            return None;
        }

        let rewritten = source
            .split_inclusive('\n')
            .map(|line| {
                if is_aggregate_include(line) {
                    let ending = &line[line.trim_end_matches(['\n', '\r']).len()..];
                    format!("{}{}", FALLBACK_HEADERS, ending)
                } else {
                    line.to_string()
                }
            })
            .collect();
        Some(rewritten)
    }
}
