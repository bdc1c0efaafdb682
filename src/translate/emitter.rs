//! Line buffer with indentation and declaration scopes.

use serde::Serialize;
use std::collections::HashSet;

const INDENT: &str = "    ";

/// A construct that was replaced by an inline marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unsupported {
    pub line: usize,
    pub construct: String,
}

#[derive(Debug)]
pub struct Emitter {
    lines: Vec<String>,
    level: usize,
    scopes: Vec<HashSet<String>>,
    unsupported: Vec<Unsupported>,
    source_line: usize,
    temp_counter: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            level: 0,
            scopes: vec![HashSet::new()],
            unsupported: Vec::new(),
            source_line: 0,
            temp_counter: 0,
        }
    }

    /// Append one line at the current depth. Empty lines carry no indentation.
    pub fn write(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if line.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines
                .push(format!("{}{}", INDENT.repeat(self.level), line));
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        assert!(self.level > 0, "dedent below column zero");
        self.level -= 1;
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "popped the root scope");
        self.scopes.pop();
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Run `body` inside a fresh scope; the scope is popped on every path out.
    pub fn scoped<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> T {
        self.push_scope();
        let result = body(self);
        self.pop_scope();
        result
    }

    /// Source line that subsequent diagnostics are attributed to
    pub fn set_source_line(&mut self, line: usize) {
        self.source_line = line;
    }

    pub fn unsupported(&mut self, construct: impl Into<String>) {
        self.unsupported.push(Unsupported {
            line: self.source_line,
            construct: construct.into(),
        });
    }

    pub fn diagnostics(&self) -> &[Unsupported] {
        &self.unsupported
    }

    /// `__tmp_<stem>_<n>__`, unique within this translation
    pub fn fresh_temp(&mut self, stem: &str) -> String {
        let name = format!("__tmp_{}_{}__", stem, self.temp_counter);
        self.temp_counter += 1;
        name
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    pub fn finish(self) -> (String, Vec<Unsupported>) {
        (self.render(), self.unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_applies_to_non_empty_lines() {
        let mut e = Emitter::new();
        e.write("int main(){");
        e.indent();
        e.write("fastio;");
        e.write("");
        e.dedent();
        e.write("}");
        assert_eq!(e.render(), "int main(){\n    fastio;\n\n}");
    }

    #[test]
    #[should_panic(expected = "dedent below column zero")]
    fn dedent_at_zero_panics() {
        Emitter::new().dedent();
    }

    #[test]
    fn names_resolve_through_enclosing_scopes() {
        let mut e = Emitter::new();
        e.declare("n");
        e.scoped(|e| {
            e.declare("i");
            assert!(e.is_declared("n"));
            assert!(e.is_declared("i"));
        });
        assert!(!e.is_declared("i"));
        assert_eq!(e.scope_depth(), 1);
    }

    #[test]
    #[should_panic(expected = "root scope")]
    fn root_scope_cannot_be_popped() {
        Emitter::new().pop_scope();
    }

    #[test]
    fn diagnostics_carry_the_current_line() {
        let mut e = Emitter::new();
        e.set_source_line(4);
        e.write("auto x = /*attr*/0;");
        e.unsupported("attribute access");
        let rendered = e.render();
        let (code, diagnostics) = e.finish();
        assert_eq!(code, rendered);
        assert_eq!(
            diagnostics,
            vec![Unsupported {
                line: 4,
                construct: "attribute access".to_string()
            }]
        );
    }

    #[test]
    fn temporaries_are_unique() {
        let mut e = Emitter::new();
        assert_eq!(e.fresh_temp("unpack"), "__tmp_unpack_0__");
        assert_eq!(e.fresh_temp("cmp"), "__tmp_cmp_1__");
    }
}
