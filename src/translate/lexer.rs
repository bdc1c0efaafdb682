//! Indentation-aware tokenizer for the Python subset.
//!
//! Produces the same logical-line structure as the reference tokenizer:
//! `Newline` ends a logical line, `Indent`/`Dedent` bracket blocks, and
//! newlines inside brackets or after a backslash continuation are ignored.

use crate::config::types::{Result, TransboxError};

/// Position information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrKind {
    Plain,
    Bytes,
    Format,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    Int(u128),
    Float(f64),
    Imaginary,
    Str { value: String, kind: StrKind },
    Op(&'static str),
    Newline,
    Indent,
    Dedent,
    EndOfFile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

/// Longest first, so `**=` wins over `**` and `*`.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "**", "//", "<<", ">>", "<=", ">=", "==", "!=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "+", "-", "*", "/", "%", "@", "<", ">",
    "=", "&", "|", "^", "~", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";",
];

const TAB_SIZE: usize = 8;

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    idx: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    brackets: Vec<(char, Position)>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            idx: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
        }
    }

    fn pos(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn error<T>(&self, pos: Position, message: impl Into<String>) -> Result<T> {
        Err(TransboxError::Parse {
            line: pos.line,
            column: pos.column,
            message: message.into(),
        })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.get(self.idx).copied()?;
        self.idx += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn push(&mut self, kind: TokenKind, pos: Position) {
        self.tokens.push(Token { kind, pos });
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut at_line_start = true;

        loop {
            if at_line_start && self.brackets.is_empty() {
                if !self.handle_indentation()? {
                    break;
                }
                at_line_start = false;
            }

            let ch = match self.peek() {
                Some(ch) => ch,
                None => break,
            };
            let pos = self.pos();

            match ch {
                ' ' | '\t' | '\x0c' | '\r' => {
                    self.bump();
                }
                '#' => self.skip_comment(),
                '\n' => {
                    self.bump();
                    if self.brackets.is_empty() {
                        self.push(TokenKind::Newline, pos);
                        at_line_start = true;
                    }
                }
                '\\' => {
                    self.bump();
                    if self.peek() == Some('\r') {
                        self.bump();
                    }
                    if self.peek() != Some('\n') {
                        return self.error(pos, "unexpected character after line continuation character");
                    }
                    self.bump();
                }
                '\'' | '"' => self.lex_string(String::new(), pos)?,
                c if c.is_ascii_digit() => self.lex_number(pos)?,
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(pos)?,
                c if c == '_' || c.is_alphabetic() => self.lex_name(pos)?,
                _ => self.lex_operator(pos)?,
            }
        }

        if let Some((open, pos)) = self.brackets.last() {
            return self.error(*pos, format!("'{}' was never closed", open));
        }

        let end = self.pos();
        if !matches!(
            self.tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline) | Some(TokenKind::Dedent)
        ) {
            self.push(TokenKind::Newline, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end);
        }
        self.push(TokenKind::EndOfFile, end);
        Ok(self.tokens)
    }

    /// Measure leading whitespace of the next non-blank line and emit
    /// indent/dedent tokens. Returns false at end of input.
    fn handle_indentation(&mut self) -> Result<bool> {
        loop {
            let mut width = 0;
            while let Some(ch) = self.peek() {
                match ch {
                    ' ' => width += 1,
                    '\t' => width = (width / TAB_SIZE + 1) * TAB_SIZE,
                    '\x0c' => width = 0,
                    _ => break,
                }
                self.bump();
            }

            match self.peek() {
                None => return Ok(false),
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                Some('\r') | Some('\n') => {
                    while matches!(self.peek(), Some('\r')) {
                        self.bump();
                    }
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }

            let pos = self.pos();
            let current = self.indents.last().copied().unwrap_or(0);
            if width > current {
                self.indents.push(width);
                self.push(TokenKind::Indent, pos);
            } else if width < current {
                while self.indents.last().is_some_and(|&w| w > width) {
                    self.indents.pop();
                    self.push(TokenKind::Dedent, pos);
                }
                if self.indents.last().copied() != Some(width) {
                    return self.error(pos, "unindent does not match any outer indentation level");
                }
            }
            return Ok(true);
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn lex_name(&mut self, pos: Position) -> Result<()> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch == '_' || ch.is_alphanumeric() {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        let is_prefix = matches!(
            name.to_ascii_lowercase().as_str(),
            "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
        );
        if is_prefix && matches!(self.peek(), Some('\'') | Some('"')) {
            return self.lex_string(name, pos);
        }

        self.push(TokenKind::Name(name), pos);
        Ok(())
    }

    fn lex_string(&mut self, prefix: String, pos: Position) -> Result<()> {
        let prefix = prefix.to_ascii_lowercase();
        let raw = prefix.contains('r');
        let kind = if prefix.contains('b') {
            StrKind::Bytes
        } else if prefix.contains('f') {
            StrKind::Format
        } else {
            StrKind::Plain
        };

        let quote = match self.bump() {
            Some(q) => q,
            None => return self.error(pos, "unterminated string literal"),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            let ch = match self.peek() {
                Some(ch) => ch,
                None => {
                    let what = if triple { "triple-quoted string" } else { "string" };
                    return self.error(pos, format!("unterminated {} literal", what));
                }
            };

            if ch == quote {
                if !triple {
                    self.bump();
                    break;
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.bump();
                    self.bump();
                    self.bump();
                    break;
                }
                value.push(ch);
                self.bump();
                continue;
            }

            if ch == '\n' && !triple {
                return self.error(pos, "unterminated string literal");
            }

            if ch == '\\' {
                self.bump();
                let escaped = match self.bump() {
                    Some(e) => e,
                    None => return self.error(pos, "unterminated string literal"),
                };
                if raw {
                    value.push('\\');
                    value.push(escaped);
                } else {
                    self.push_escape(escaped, &mut value);
                }
                continue;
            }

            value.push(ch);
            self.bump();
        }

        self.push(TokenKind::Str { value, kind }, pos);
        Ok(())
    }

    fn push_escape(&mut self, escaped: char, value: &mut String) {
        match escaped {
            '\n' => {}
            '\\' => value.push('\\'),
            '\'' => value.push('\''),
            '"' => value.push('"'),
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'a' => value.push('\x07'),
            'b' => value.push('\x08'),
            'f' => value.push('\x0c'),
            'v' => value.push('\x0b'),
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                value.extend(char::from_u32(code));
            }
            'x' | 'u' | 'U' => {
                let digits = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut hex = String::new();
                while hex.len() < digits {
                    match self.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(c);
                            self.bump();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(c) if hex.len() == digits => value.push(c),
                    _ => {
                        value.push('\\');
                        value.push(escaped);
                        value.push_str(&hex);
                    }
                }
            }
            other => {
                value.push('\\');
                value.push(other);
            }
        }
    }

    fn lex_number(&mut self, pos: Position) -> Result<()> {
        let radix = match (self.peek(), self.peek_at(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };

        if let Some(radix) = radix {
            self.bump();
            self.bump();
            let digits = self.take_digits(|c| c.is_digit(radix));
            let value = u128::from_str_radix(&digits, radix)
                .or_else(|_| self.error(pos, "invalid integer literal"))?;
            self.push(TokenKind::Int(value), pos);
            return Ok(());
        }

        let mut text = self.take_digits(|c| c.is_ascii_digit());
        let mut is_float = false;

        if self.peek() == Some('.') {
            is_float = true;
            text.push('.');
            self.bump();
            text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_at(1);
            let has_exponent = match sign {
                Some('+' | '-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if has_exponent {
                is_float = true;
                text.push('e');
                self.bump();
                if let Some(s @ ('+' | '-')) = self.peek() {
                    text.push(s);
                    self.bump();
                }
                text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
            }
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            self.bump();
            self.push(TokenKind::Imaginary, pos);
            return Ok(());
        }

        if is_float {
            let value: f64 = text
                .parse()
                .or_else(|_| self.error(pos, "invalid float literal"))?;
            self.push(TokenKind::Float(value), pos);
        } else {
            let value: u128 = text
                .parse()
                .or_else(|_| self.error(pos, "integer literal too large"))?;
            self.push(TokenKind::Int(value), pos);
        }
        Ok(())
    }

    /// Digits accepted by `accept`, with `_` separators dropped
    fn take_digits(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut digits = String::new();
        while let Some(ch) = self.peek() {
            if accept(ch) {
                digits.push(ch);
            } else if ch != '_' || !self.peek_at(1).is_some_and(&accept) {
                break;
            }
            self.bump();
        }
        digits
    }

    fn lex_operator(&mut self, pos: Position) -> Result<()> {
        let rest: String = self.chars[self.idx..self.chars.len().min(self.idx + 3)]
            .iter()
            .collect();
        let op = match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => *op,
            None => {
                let ch = self.peek().unwrap_or(' ');
                return self.error(pos, format!("invalid character '{}'", ch));
            }
        };
        for _ in 0..op.chars().count() {
            self.bump();
        }

        match op {
            "(" | "[" | "{" => {
                let open = op.chars().next().unwrap_or('(');
                self.brackets.push((open, pos));
            }
            ")" | "]" | "}" => {
                let expected = match op {
                    ")" => '(',
                    "]" => '[',
                    _ => '{',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, _)) => {
                        return self.error(
                            pos,
                            format!("closing parenthesis '{}' does not match opening parenthesis '{}'", op, open),
                        )
                    }
                    None => return self.error(pos, format!("unmatched '{}'", op)),
                }
            }
            _ => {}
        }

        self.push(TokenKind::Op(op), pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn name(s: &str) -> TokenKind {
        TokenKind::Name(s.to_string())
    }

    #[test]
    fn indentation_produces_block_tokens() {
        let tokens = kinds("if x:\n    y = 1\nz = 2\n");
        assert_eq!(
            tokens,
            vec![
                name("if"),
                name("x"),
                TokenKind::Op(":"),
                TokenKind::Newline,
                TokenKind::Indent,
                name("y"),
                TokenKind::Op("="),
                TokenKind::Int(1),
                TokenKind::Newline,
                TokenKind::Dedent,
                name("z"),
                TokenKind::Op("="),
                TokenKind::Int(2),
                TokenKind::Newline,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn blank_lines_and_comments_are_ignored() {
        let tokens = kinds("x = 1  # note\n\n   # indented comment\ny = 2");
        assert_eq!(tokens.iter().filter(|t| **t == TokenKind::Newline).count(), 2);
        assert!(!tokens.contains(&TokenKind::Indent));
    }

    #[test]
    fn newlines_inside_brackets_are_joined() {
        let tokens = kinds("a = [1,\n     2]\n");
        assert_eq!(tokens.iter().filter(|t| **t == TokenKind::Newline).count(), 1);
        assert!(!tokens.contains(&TokenKind::Indent));
    }

    #[test]
    fn backslash_continuation() {
        let tokens = kinds("x = 1 + \\\n    2\n");
        assert!(!tokens.contains(&TokenKind::Indent));
        assert_eq!(tokens.iter().filter(|t| **t == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn dedents_closed_at_eof() {
        let tokens = kinds("def f():\n    if x:\n        pass");
        let dedents = tokens.iter().filter(|t| **t == TokenKind::Dedent).count();
        assert_eq!(dedents, 2);
        assert_eq!(tokens.last(), Some(&TokenKind::EndOfFile));
    }

    #[test]
    fn number_forms() {
        assert_eq!(
            kinds("0x1F 0o17 0b101 1_000 3.5 1e3 .5 2j")[..8],
            [
                TokenKind::Int(31),
                TokenKind::Int(15),
                TokenKind::Int(5),
                TokenKind::Int(1000),
                TokenKind::Float(3.5),
                TokenKind::Float(1000.0),
                TokenKind::Float(0.5),
                TokenKind::Imaginary,
            ]
        );
    }

    #[test]
    fn string_escapes_and_prefixes() {
        let tokens = kinds(r#"'a\n"b"' r'\d' f"{x}" b'x' """multi
line""""#);
        assert_eq!(
            tokens[..5],
            [
                TokenKind::Str {
                    value: "a\n\"b\"".to_string(),
                    kind: StrKind::Plain
                },
                TokenKind::Str {
                    value: "\\d".to_string(),
                    kind: StrKind::Plain
                },
                TokenKind::Str {
                    value: "{x}".to_string(),
                    kind: StrKind::Format
                },
                TokenKind::Str {
                    value: "x".to_string(),
                    kind: StrKind::Bytes
                },
                TokenKind::Str {
                    value: "multi\nline".to_string(),
                    kind: StrKind::Plain
                },
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("a **= 2 // 3")[..5],
            [
                name("a"),
                TokenKind::Op("**="),
                TokenKind::Int(2),
                TokenKind::Op("//"),
                TokenKind::Int(3),
            ]
        );
    }

    #[test]
    fn tabs_advance_to_multiple_of_eight() {
        assert!(tokenize("if x:\n\ty = 1\n        z = 2\n").is_ok());
    }

    #[test]
    fn errors_carry_positions() {
        match tokenize("x = 'abc\n") {
            Err(TransboxError::Parse { line, column, .. }) => {
                assert_eq!((line, column), (1, 5));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(tokenize("x = (1,\n").is_err());
        assert!(tokenize("x = 1)\n").is_err());
        assert!(tokenize("if x:\n        a\n    b\n").is_err());
        assert!(tokenize("x = $\n").is_err());
    }
}
