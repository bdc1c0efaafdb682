//! Recursive-descent parser producing [`crate::translate::ast`] nodes.
//!
//! Follows Python's precedence ladder. Constructs outside the translated
//! subset are still consumed so the rest of the file parses; they come back
//! as `StmtKind::Unsupported` or `Expr::Unrecognized`.

use crate::config::types::{Result, TransboxError};
use crate::translate::ast::*;
use crate::translate::lexer::{tokenize, Position, StrKind, Token, TokenKind};

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

/// Simple statements skipped to the end of the statement
const SKIPPED_SIMPLE: &[&str] = &[
    "import", "from", "global", "nonlocal", "del", "assert", "raise", "yield", "await",
];

/// Compound statements skipped along with their block
const SKIPPED_COMPOUND: &[&str] = &["class", "with", "try", "async", "except", "finally"];

const AUGMENTED: &[&str] = &[
    "+=", "-=", "*=", "@=", "/=", "//=", "%=", "**=", "<<=", ">>=", "&=", "|=", "^=",
];

pub fn parse_module(source: &str) -> Result<Module> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_module()
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    // ------------------------------------------------------------------
    // token helpers

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + offset).map(|t| &t.kind)
    }

    fn pos(&self) -> Position {
        self.peek().pos
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::EndOfFile)
    }

    fn check_op(&self, op: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Op(o) if *o == op)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Name(n) if n == keyword)
    }

    fn check_newline(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Newline | TokenKind::EndOfFile)
    }

    fn match_op(&mut self, op: &str) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        let pos = self.pos();
        Err(TransboxError::Parse {
            line: pos.line,
            column: pos.column,
            message: message.into(),
        })
    }

    fn consume_op(&mut self, op: &str, context: &str) -> Result<()> {
        if self.match_op(op) {
            Ok(())
        } else {
            self.error(format!("expected '{}' {}", op, context))
        }
    }

    fn consume_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            self.error(format!("expected '{}'", keyword))
        }
    }

    fn consume_newline(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::EndOfFile => Ok(()),
            _ => self.error("invalid syntax"),
        }
    }

    fn consume_identifier(&mut self, context: &str) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Name(name) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => self.error(format!("expected identifier {}", context)),
        }
    }

    fn current_keyword(&self) -> Option<&str> {
        match &self.peek().kind {
            TokenKind::Name(name) if KEYWORDS.contains(&name.as_str()) => Some(name.as_str()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // statements

    pub fn parse_module(&mut self) -> Result<Module> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            if matches!(self.peek().kind, TokenKind::Newline) {
                self.advance();
                continue;
            }
            body.extend(self.parse_statement()?);
        }
        Ok(Module { body })
    }

    fn parse_statement(&mut self) -> Result<Vec<Stmt>> {
        let line = self.pos().line;

        if matches!(self.peek().kind, TokenKind::Indent) {
            return self.error("unexpected indent");
        }
        if self.check_op("@") {
            self.skip_line()?;
            return Ok(vec![unsupported(line, "decorator")]);
        }

        let keyword = self.current_keyword().map(str::to_string);
        match keyword.as_deref() {
            Some("def") => Ok(vec![self.parse_function_def()?]),
            Some("if") => Ok(vec![self.parse_if()?]),
            Some("while") => Ok(vec![self.parse_while()?]),
            Some("for") => Ok(vec![self.parse_for()?]),
            Some("elif") | Some("else") => self.error("invalid syntax"),
            Some(kw) if SKIPPED_COMPOUND.contains(&kw) => Ok(vec![self.skip_compound(kw)?]),
            _ => self.parse_simple_statements(),
        }
    }

    fn parse_simple_statements(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = vec![self.parse_simple_statement()?];
        while self.match_op(";") {
            if self.check_newline() {
                break;
            }
            stmts.push(self.parse_simple_statement()?);
        }
        self.consume_newline()?;
        Ok(stmts)
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt> {
        let line = self.pos().line;
        let keyword = self.current_keyword().map(str::to_string);

        let kind = match keyword.as_deref() {
            Some("pass") => {
                self.advance();
                StmtKind::Pass
            }
            Some("break") => {
                self.advance();
                StmtKind::Break
            }
            Some("continue") => {
                self.advance();
                StmtKind::Continue
            }
            Some("return") => {
                self.advance();
                if self.check_newline() || self.check_op(";") {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_expr_list()?))
                }
            }
            Some(kw) if SKIPPED_SIMPLE.contains(&kw) => {
                let construct = kw.to_string();
                self.skip_simple();
                StmtKind::Unsupported { construct }
            }
            _ => self.parse_expression_statement()?,
        };

        Ok(Stmt { line, kind })
    }

    fn parse_expression_statement(&mut self) -> Result<StmtKind> {
        let first = self.parse_expr_list()?;

        if let TokenKind::Op(op) = self.peek().kind {
            if AUGMENTED.contains(&op) {
                self.advance();
                let symbol = &op[..op.len() - 1];
                let bin = BinOp::from_symbol(symbol)
                    .ok_or_else(|| self.parse_error(format!("unknown operator '{}'", op)))?;
                let value = self.parse_expr_list()?;
                return Ok(StmtKind::AugAssign {
                    target: first,
                    op: bin,
                    value,
                });
            }
        }

        if self.match_op(":") {
            self.parse_test()?;
            if self.match_op("=") {
                self.parse_expr_list()?;
            }
            return Ok(StmtKind::Unsupported {
                construct: "annotated assignment".to_string(),
            });
        }

        if self.check_op("=") {
            let mut targets = vec![first];
            let mut value = None;
            while self.match_op("=") {
                let next = self.parse_expr_list()?;
                if let Some(previous) = value.replace(next) {
                    targets.push(previous);
                }
            }
            let value = match value {
                Some(value) => value,
                None => return self.error("expected expression after '='"),
            };
            return Ok(StmtKind::Assign { targets, value });
        }

        Ok(StmtKind::Expr(first))
    }

    fn parse_error(&self, message: String) -> TransboxError {
        let pos = self.pos();
        TransboxError::Parse {
            line: pos.line,
            column: pos.column,
            message,
        }
    }

    fn parse_function_def(&mut self) -> Result<Stmt> {
        let line = self.pos().line;
        self.consume_keyword("def")?;
        let name = self.consume_identifier("after 'def'")?;
        self.consume_op("(", "after function name")?;
        let params = self.parse_parameters()?;
        if self.match_op("->") {
            self.parse_test()?;
        }
        self.consume_op(":", "after function signature")?;
        let body = self.parse_suite()?;
        Ok(Stmt {
            line,
            kind: StmtKind::FunctionDef { name, params, body },
        })
    }

    /// Positional parameter names; defaults, annotations and the
    /// `*`/`**`/`/` forms are consumed and dropped.
    fn parse_parameters(&mut self) -> Result<Vec<String>> {
        let mut params = Vec::new();
        let mut keyword_only = false;

        while !self.check_op(")") {
            if self.match_op("**") {
                self.consume_identifier("after '**'")?;
            } else if self.match_op("*") {
                keyword_only = true;
                if !self.check_op(",") && !self.check_op(")") {
                    self.consume_identifier("after '*'")?;
                }
            } else if self.match_op("/") {
            } else {
                let name = self.consume_identifier("in parameter list")?;
                if self.match_op(":") {
                    self.parse_test()?;
                }
                if self.match_op("=") {
                    self.parse_test()?;
                }
                if !keyword_only {
                    params.push(name);
                }
            }

            if !self.match_op(",") {
                break;
            }
        }

        self.consume_op(")", "to close parameter list")?;
        Ok(params)
    }

    fn parse_suite(&mut self) -> Result<Vec<Stmt>> {
        if !matches!(self.peek().kind, TokenKind::Newline) {
            return self.parse_simple_statements();
        }
        self.advance();

        if !matches!(self.peek().kind, TokenKind::Indent) {
            return self.error("expected an indented block");
        }
        self.advance();

        let mut body = Vec::new();
        while !matches!(self.peek().kind, TokenKind::Dedent | TokenKind::EndOfFile) {
            if matches!(self.peek().kind, TokenKind::Newline) {
                self.advance();
                continue;
            }
            body.extend(self.parse_statement()?);
        }
        if matches!(self.peek().kind, TokenKind::Dedent) {
            self.advance();
        }
        Ok(body)
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let line = self.pos().line;
        self.advance(); // 'if' or 'elif'
        let test = self.parse_named_test()?;
        self.consume_op(":", "after condition")?;
        let body = self.parse_suite()?;

        let orelse = if self.check_keyword("elif") {
            vec![self.parse_if()?]
        } else if self.match_keyword("else") {
            self.consume_op(":", "after 'else'")?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        Ok(Stmt {
            line,
            kind: StmtKind::If { test, body, orelse },
        })
    }

    fn parse_else_clause(&mut self) -> Result<Vec<Stmt>> {
        if self.match_keyword("else") {
            self.consume_op(":", "after 'else'")?;
            self.parse_suite()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let line = self.pos().line;
        self.consume_keyword("while")?;
        let test = self.parse_named_test()?;
        self.consume_op(":", "after condition")?;
        let body = self.parse_suite()?;
        let orelse = self.parse_else_clause()?;
        Ok(Stmt {
            line,
            kind: StmtKind::While { test, body, orelse },
        })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let line = self.pos().line;
        self.consume_keyword("for")?;
        let target = self.parse_target_list()?;
        self.consume_keyword("in")?;
        let iter = self.parse_expr_list()?;
        self.consume_op(":", "after for clause")?;
        let body = self.parse_suite()?;
        let orelse = self.parse_else_clause()?;
        Ok(Stmt {
            line,
            kind: StmtKind::For {
                target,
                iter,
                body,
                orelse,
            },
        })
    }

    fn parse_target_list(&mut self) -> Result<Expr> {
        let first = self.parse_star_or(Self::parse_bitor)?;
        if !self.check_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_op(",") {
            if self.check_keyword("in") {
                break;
            }
            items.push(self.parse_star_or(Self::parse_bitor)?);
        }
        Ok(Expr::Tuple(items))
    }

    /// Consume the rest of a simple statement
    fn skip_simple(&mut self) {
        while !self.check_newline() && !self.check_op(";") {
            self.advance();
        }
    }

    /// Consume through the end of the current logical line
    fn skip_line(&mut self) -> Result<()> {
        while !self.check_newline() {
            self.advance();
        }
        self.consume_newline()
    }

    /// Consume a header line and, when it opens a block, the whole block.
    fn skip_block_statement(&mut self) -> Result<()> {
        let mut ends_with_colon = false;
        while !self.check_newline() {
            ends_with_colon = self.check_op(":");
            self.advance();
        }
        self.consume_newline()?;

        if ends_with_colon && matches!(self.peek().kind, TokenKind::Indent) {
            let mut depth = 0usize;
            loop {
                match self.advance().kind {
                    TokenKind::Indent => depth += 1,
                    TokenKind::Dedent => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    TokenKind::EndOfFile => break,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn skip_compound(&mut self, keyword: &str) -> Result<Stmt> {
        let line = self.pos().line;
        self.skip_block_statement()?;
        if keyword == "try" {
            while self.check_keyword("except")
                || self.check_keyword("else")
                || self.check_keyword("finally")
            {
                self.skip_block_statement()?;
            }
        }
        Ok(unsupported(line, keyword))
    }

    // ------------------------------------------------------------------
    // expressions

    /// testlist: one expression, or a tuple when commas appear
    pub fn parse_expr_list(&mut self) -> Result<Expr> {
        let first = self.parse_star_or(Self::parse_test)?;
        if !self.check_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_op(",") {
            if !self.starts_expression() {
                break;
            }
            items.push(self.parse_star_or(Self::parse_test)?);
        }
        Ok(Expr::Tuple(items))
    }

    fn starts_expression(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Name(name) => {
                !KEYWORDS.contains(&name.as_str())
                    || matches!(
                        name.as_str(),
                        "not" | "lambda" | "True" | "False" | "None" | "await"
                    )
            }
            TokenKind::Int(_) | TokenKind::Float(_) | TokenKind::Imaginary | TokenKind::Str { .. } => true,
            TokenKind::Op(op) => matches!(*op, "(" | "[" | "{" | "-" | "+" | "~" | "*" | "..."),
            _ => false,
        }
    }

    fn parse_star_or(&mut self, parse: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        if self.match_op("*") {
            parse(self)?;
            return Ok(Expr::Unrecognized("starred expression".to_string()));
        }
        parse(self)
    }

    /// test with an optional `:=` binding
    fn parse_named_test(&mut self) -> Result<Expr> {
        let expr = self.parse_test()?;
        if self.match_op(":=") {
            self.parse_test()?;
            return Ok(Expr::Unrecognized("assignment expression".to_string()));
        }
        Ok(expr)
    }

    pub fn parse_test(&mut self) -> Result<Expr> {
        if self.match_keyword("lambda") {
            return self.parse_lambda_rest();
        }

        let body = self.parse_or()?;
        if self.match_keyword("if") {
            let test = self.parse_or()?;
            self.consume_keyword("else")?;
            let orelse = self.parse_test()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_lambda_rest(&mut self) -> Result<Expr> {
        while !self.check_op(":") {
            if self.check_newline() {
                return self.error("expected ':' in lambda");
            }
            if self.check_op("=") {
                self.advance();
                self.parse_test()?;
                continue;
            }
            self.advance();
        }
        self.advance();
        self.parse_test()?;
        Ok(Expr::Unrecognized("lambda".to_string()))
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let first = self.parse_and()?;
        if !self.check_keyword("or") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.match_keyword("or") {
            values.push(self.parse_and()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            values,
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let first = self.parse_not()?;
        if !self.check_keyword("and") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.match_keyword("and") {
            values.push(self.parse_not()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::And,
            values,
        })
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.match_keyword("not") {
            let operand = self.parse_not()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn comparison_operator(&mut self) -> Option<CmpOp> {
        let op = match &self.peek().kind {
            TokenKind::Op("<") => CmpOp::Lt,
            TokenKind::Op("<=") => CmpOp::LtE,
            TokenKind::Op(">") => CmpOp::Gt,
            TokenKind::Op(">=") => CmpOp::GtE,
            TokenKind::Op("==") => CmpOp::Eq,
            TokenKind::Op("!=") => CmpOp::NotEq,
            TokenKind::Name(n) if n == "in" => CmpOp::In,
            TokenKind::Name(n) if n == "is" => {
                if matches!(self.peek_kind_at(1), Some(TokenKind::Name(m)) if m == "not") {
                    self.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            TokenKind::Name(n) if n == "not" => {
                if matches!(self.peek_kind_at(1), Some(TokenKind::Name(m)) if m == "in") {
                    self.advance();
                    CmpOp::NotIn
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.comparison_operator() {
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    fn parse_binary_level(
        &mut self,
        symbols: &[&str],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut left = next(self)?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Op(op) if symbols.contains(op) => BinOp::from_symbol(op),
                _ => None,
            };
            let op = match op {
                Some(op) => op,
                None => break,
            };
            self.advance();
            let right = next(self)?;
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["|"], Self::parse_bitxor)
    }

    fn parse_bitxor(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["^"], Self::parse_bitand)
    }

    fn parse_bitand(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["&"], Self::parse_shift)
    }

    fn parse_shift(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["<<", ">>"], Self::parse_arith)
    }

    fn parse_arith(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["+", "-"], Self::parse_term)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        self.parse_binary_level(&["*", "/", "//", "%", "@"], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let op = match &self.peek().kind {
            TokenKind::Op("+") => Some(UnaryOp::UAdd),
            TokenKind::Op("-") => Some(UnaryOp::USub),
            TokenKind::Op("~") => Some(UnaryOp::Invert),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_factor()?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr> {
        if self.match_keyword("await") {
            self.parse_power()?;
            return Ok(Expr::Unrecognized("await".to_string()));
        }
        let base = self.parse_atom_expr()?;
        if self.match_op("**") {
            let exponent = self.parse_factor()?;
            return Ok(Expr::BinOp {
                left: Box::new(base),
                op: BinOp::Pow,
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_atom_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.match_op("(") {
                expr = self.parse_call_rest(expr)?;
            } else if self.match_op("[") {
                let index = self.parse_subscript_list()?;
                self.consume_op("]", "to close subscript")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.match_op(".") {
                let attr = self.consume_identifier("after '.'")?;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_call_rest(&mut self, func: Expr) -> Result<Expr> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !self.check_op(")") {
            if self.match_op("**") {
                self.parse_test()?;
                args.push(Expr::Unrecognized("keyword unpacking".to_string()));
            } else if self.match_op("*") {
                self.parse_test()?;
                args.push(Expr::Unrecognized("starred expression".to_string()));
            } else if matches!(self.peek().kind, TokenKind::Name(_))
                && matches!(self.peek_kind_at(1), Some(TokenKind::Op("=")))
            {
                let name = self.consume_identifier("for keyword argument")?;
                self.advance();
                let value = self.parse_test()?;
                keywords.push(Keyword { name, value });
            } else {
                let arg = self.parse_named_test()?;
                if self.check_keyword("for") || self.check_keyword("async") {
                    self.skip_to_close(")")?;
                    args.push(Expr::Unrecognized("generator expression".to_string()));
                    break;
                }
                args.push(arg);
            }

            if !self.match_op(",") {
                break;
            }
        }

        self.consume_op(")", "to close call")?;
        Ok(Expr::Call {
            func: Box::new(func),
            args,
            keywords,
        })
    }

    fn parse_subscript_list(&mut self) -> Result<Expr> {
        let first = self.parse_subscript_item()?;
        if !self.check_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_op(",") {
            if self.check_op("]") {
                break;
            }
            items.push(self.parse_subscript_item()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_subscript_item(&mut self) -> Result<Expr> {
        let lower = if self.check_op(":") {
            None
        } else {
            Some(self.parse_named_test()?)
        };
        if !self.match_op(":") {
            return match lower {
                Some(expr) => Ok(expr),
                None => self.error("expected subscript"),
            };
        }

        let upper = if self.check_op(":") || self.check_op("]") || self.check_op(",") {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };
        let step = if self.match_op(":") && !self.check_op("]") && !self.check_op(",") {
            Some(Box::new(self.parse_test()?))
        } else {
            None
        };
        Ok(Expr::Slice {
            lower: lower.map(Box::new),
            upper,
            step,
        })
    }

    /// Skip tokens up to and excluding the bracket closing the current one.
    fn skip_to_close(&mut self, close: &str) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match &self.peek().kind {
                TokenKind::EndOfFile => return self.error(format!("expected '{}'", close)),
                TokenKind::Op("(" | "[" | "{") => depth += 1,
                TokenKind::Op(")" | "]" | "}") => {
                    if depth == 0 {
                        return if self.check_op(close) {
                            Ok(())
                        } else {
                            self.error(format!("expected '{}'", close))
                        };
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::Constant(Constant::Int(value)))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::Constant(Constant::Float(value)))
            }
            TokenKind::Imaginary => {
                self.advance();
                Ok(Expr::Unrecognized("complex literal".to_string()))
            }
            TokenKind::Str { .. } => self.parse_strings(),
            TokenKind::Name(name) => match name.as_str() {
                "True" => {
                    self.advance();
                    Ok(Expr::Constant(Constant::Bool(true)))
                }
                "False" => {
                    self.advance();
                    Ok(Expr::Constant(Constant::Bool(false)))
                }
                "None" => {
                    self.advance();
                    Ok(Expr::Constant(Constant::None))
                }
                kw if KEYWORDS.contains(&kw) => self.error("invalid syntax"),
                ident => {
                    let name = Expr::name(ident);
                    self.advance();
                    Ok(name)
                }
            },
            TokenKind::Op("(") => {
                self.advance();
                self.parse_parenthesized()
            }
            TokenKind::Op("[") => {
                self.advance();
                self.parse_list_display()
            }
            TokenKind::Op("{") => {
                self.advance();
                let construct = if self.check_op("}") {
                    "dict display"
                } else {
                    "dict or set display"
                };
                self.skip_to_close("}")?;
                self.advance();
                Ok(Expr::Unrecognized(construct.to_string()))
            }
            TokenKind::Op("...") => {
                self.advance();
                Ok(Expr::Unrecognized("Ellipsis".to_string()))
            }
            _ => self.error("invalid syntax"),
        }
    }

    /// Adjacent literals concatenate, as in Python
    fn parse_strings(&mut self) -> Result<Expr> {
        let mut value = String::new();
        let mut special = None;
        while let TokenKind::Str { value: part, kind } = &self.peek().kind {
            match kind {
                StrKind::Plain => value.push_str(part),
                StrKind::Format => special = Some("f-string"),
                StrKind::Bytes => special = Some("bytes literal"),
            }
            self.advance();
        }
        match special {
            Some(construct) => Ok(Expr::Unrecognized(construct.to_string())),
            None => Ok(Expr::Constant(Constant::Str(value))),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Expr> {
        if self.match_op(")") {
            return Ok(Expr::Tuple(Vec::new()));
        }
        if self.match_keyword("yield") {
            self.skip_to_close(")")?;
            self.advance();
            return Ok(Expr::Unrecognized("yield".to_string()));
        }

        let first = self.parse_star_or(Self::parse_named_test)?;
        if self.check_keyword("for") || self.check_keyword("async") {
            self.skip_to_close(")")?;
            self.advance();
            return Ok(Expr::Unrecognized("generator expression".to_string()));
        }
        if self.match_op(")") {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_op(",") {
            if self.check_op(")") {
                break;
            }
            items.push(self.parse_star_or(Self::parse_named_test)?);
        }
        self.consume_op(")", "to close parenthesis")?;
        Ok(Expr::Tuple(items))
    }

    fn parse_list_display(&mut self) -> Result<Expr> {
        if self.match_op("]") {
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.parse_star_or(Self::parse_named_test)?;
        if self.check_keyword("for") || self.check_keyword("async") {
            self.skip_to_close("]")?;
            self.advance();
            return Ok(Expr::Unrecognized("list comprehension".to_string()));
        }

        let mut items = vec![first];
        while self.match_op(",") {
            if self.check_op("]") {
                break;
            }
            items.push(self.parse_star_or(Self::parse_named_test)?);
        }
        self.consume_op("]", "to close list")?;
        Ok(Expr::List(items))
    }
}

fn unsupported(line: usize, construct: &str) -> Stmt {
    Stmt {
        line,
        kind: StmtKind::Unsupported {
            construct: construct.to_string(),
        },
    }
}
