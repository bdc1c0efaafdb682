//! Python-subset to C++17 translation.
//!
//! `source -> tokens -> ast::Module -> Emitter lines`. Output always starts
//! with the fixed preamble, followed by top-level functions and a `main`
//! holding every other top-level statement.

pub mod ast;
pub mod emitter;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod preamble;
pub mod stmt;

use serde::Serialize;

use crate::config::types::Result;
use crate::translate::ast::{Module, StmtKind};
use crate::translate::emitter::Emitter;
pub use crate::translate::emitter::Unsupported;

/// Generated C++ and every construct that was replaced by a marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    #[serde(rename = "cpp")]
    pub code: String,
    pub unsupported: Vec<Unsupported>,
}

impl Translation {
    pub fn is_complete(&self) -> bool {
        self.unsupported.is_empty()
    }
}

pub fn transpile(source: &str) -> Result<Translation> {
    let module = parser::parse_module(source)?;
    let translation = assemble(&module);
    log::debug!(
        "translated {} statements, {} unsupported constructs",
        module.body.len(),
        translation.unsupported.len()
    );
    Ok(translation)
}

/// Text-only form of [`transpile`]
pub fn py_to_cpp(source: &str) -> Result<String> {
    transpile(source).map(|t| t.code)
}

fn assemble(module: &Module) -> Translation {
    let mut em = Emitter::new();
    for line in preamble::PREAMBLE {
        em.write(line);
    }

    for stmt in &module.body {
        if let StmtKind::FunctionDef { name, params, body } = &stmt.kind {
            stmt::translate_function(stmt.line, name, params, body, &mut em);
        }
    }

    em.write("int main(){");
    em.indent();
    em.write("fastio;");
    em.write("");
    em.scoped(|em| {
        for s in &module.body {
            if !matches!(s.kind, StmtKind::FunctionDef { .. }) {
                stmt::translate_stmt(s, em);
            }
        }
        em.write("return 0;");
    });
    em.dedent();
    em.write("}");

    let (code, unsupported) = em.finish();
    Translation { code, unsupported }
}
