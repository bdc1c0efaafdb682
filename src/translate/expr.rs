//! Expression translation.
//!
//! Every expression maps to C++ text. Anything without a translation
//! becomes an inert placeholder value and is recorded on the emitter.

use crate::translate::ast::{BinOp, BoolOp, CmpOp, Constant, Expr, UnaryOp};
use crate::translate::emitter::Emitter;

pub const ATTR_PLACEHOLDER: &str = "/*attr*/0";
pub const SLICE_PLACEHOLDER: &str = "/*slice*/0";
pub const MAP_PLACEHOLDER: &str = "/*map*/0";
pub const CALL_PLACEHOLDER: &str = "/*call*/0";
pub const EXPR_PLACEHOLDER: &str = "/*expr?*/0";

pub fn translate_expr(expr: &Expr, em: &mut Emitter) -> String {
    match expr {
        Expr::Constant(constant) => constant_literal(constant),
        Expr::Name(name) => name.clone(),
        Expr::BinOp { left, op, right } => binary(left, *op, right, em),
        Expr::UnaryOp { op, operand } => {
            let symbol = match op {
                UnaryOp::UAdd => "+",
                UnaryOp::USub => "-",
                UnaryOp::Not => "!",
                UnaryOp::Invert => "~",
            };
            format!("({}{})", symbol, translate_expr(operand, em))
        }
        Expr::Compare {
            left,
            ops,
            comparators,
        } => comparison(left, ops, comparators, em),
        Expr::BoolOp { op, values } => {
            let joiner = match op {
                BoolOp::And => " && ",
                BoolOp::Or => " || ",
            };
            let parts: Vec<String> = values.iter().map(|v| translate_expr(v, em)).collect();
            format!("({})", parts.join(joiner))
        }
        Expr::Call { func, args, .. } => match func.as_name() {
            Some(name) => builtin_call(name, args, em),
            None => {
                em.unsupported(match **func {
                    Expr::Attribute { ref attr, .. } => format!("method call .{}()", attr),
                    _ => "call of a computed callee".to_string(),
                });
                CALL_PLACEHOLDER.to_string()
            }
        },
        Expr::Attribute { attr, .. } => {
            em.unsupported(format!("attribute access .{}", attr));
            ATTR_PLACEHOLDER.to_string()
        }
        Expr::List(items) => {
            let parts: Vec<String> = items.iter().map(|e| translate_expr(e, em)).collect();
            format!("vector<long long>{{{}}}", parts.join(", "))
        }
        Expr::Subscript { value, index } => {
            let base = translate_expr(value, em);
            if matches!(**index, Expr::Slice { .. }) {
                em.unsupported("slice");
                return SLICE_PLACEHOLDER.to_string();
            }
            format!("{}[{}]", base, translate_expr(index, em))
        }
        Expr::Slice { .. } => {
            em.unsupported("slice");
            SLICE_PLACEHOLDER.to_string()
        }
        Expr::Tuple(_) => placeholder(em, "tuple"),
        Expr::IfExp { .. } => placeholder(em, "conditional expression"),
        Expr::Unrecognized(construct) => placeholder(em, construct.clone()),
    }
}

fn placeholder(em: &mut Emitter, construct: impl Into<String>) -> String {
    em.unsupported(construct);
    EXPR_PLACEHOLDER.to_string()
}

fn constant_literal(constant: &Constant) -> String {
    match constant {
        Constant::Bool(true) => "true".to_string(),
        Constant::Bool(false) => "false".to_string(),
        Constant::Str(s) => string_literal(s),
        Constant::Int(v) => v.to_string(),
        Constant::Float(v) if v.is_finite() => format!("{:?}", v),
        Constant::Float(_) => "HUGE_VAL".to_string(),
        Constant::None => "0".to_string(),
    }
}

/// `string("...")` with backslash, quote, newline and tab escaped
pub fn string_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 10);
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    format!("string(\"{}\")", escaped)
}

/// C++ spelling for the operators that have one
pub fn operator_symbol(op: BinOp) -> Option<&'static str> {
    match op {
        BinOp::FloorDiv => Some("/"),
        BinOp::Pow | BinOp::MatMult => None,
        other => Some(other.symbol()),
    }
}

fn binary(left: &Expr, op: BinOp, right: &Expr, em: &mut Emitter) -> String {
    if op == BinOp::Pow {
        let l = translate_expr(left, em);
        let r = translate_expr(right, em);
        return format!("pow({}, {})", l, r);
    }
    match operator_symbol(op) {
        Some(symbol) => {
            let l = translate_expr(left, em);
            let r = translate_expr(right, em);
            format!("({} {} {})", l, symbol, r)
        }
        None => placeholder(em, format!("operator {}", op.symbol())),
    }
}

fn comparison_symbol(op: CmpOp) -> Option<&'static str> {
    match op {
        CmpOp::Lt => Some("<"),
        CmpOp::LtE => Some("<="),
        CmpOp::Gt => Some(">"),
        CmpOp::GtE => Some(">="),
        CmpOp::Eq => Some("=="),
        CmpOp::NotEq => Some("!="),
        CmpOp::In | CmpOp::NotIn | CmpOp::Is | CmpOp::IsNot => None,
    }
}

/// Names and literals can be repeated in the output without re-evaluation
fn is_simple_operand(expr: &Expr) -> bool {
    matches!(expr, Expr::Name(_) | Expr::Constant(_))
}

fn comparison(left: &Expr, ops: &[CmpOp], comparators: &[Expr], em: &mut Emitter) -> String {
    let mut symbols = Vec::with_capacity(ops.len());
    for op in ops {
        match comparison_symbol(*op) {
            Some(symbol) => symbols.push(symbol),
            None => return placeholder(em, "membership or identity comparison"),
        }
    }

    let left_is_simple = is_simple_operand(left);
    let left = translate_expr(left, em);
    if let ([symbol], [right]) = (symbols.as_slice(), comparators) {
        return format!("({} {} {})", left, symbol, translate_expr(right, em));
    }

    let last = comparators.len().saturating_sub(1);
    if comparators[..last].iter().all(is_simple_operand) {
        // `&&` already evaluates left to right and stops at the first failure
        let mut parts = Vec::with_capacity(symbols.len());
        let mut current = left;
        for (symbol, rhs) in symbols.iter().zip(comparators) {
            let text = translate_expr(rhs, em);
            parts.push(format!("({} {} {})", current, symbol, text));
            current = text;
        }
        return format!("({})", parts.join(" && "));
    }

    // A computed shared operand: evaluate in source order inside an
    // immediately-invoked lambda, binding each non-trivial operand once and
    // returning at the first failed link.
    let mut steps = Vec::new();
    let mut current = if left_is_simple {
        left
    } else {
        let temp = em.fresh_temp("cmp");
        steps.push(format!("auto {} = {};", temp, left));
        temp
    };
    for (i, (symbol, rhs)) in symbols.iter().zip(comparators).enumerate() {
        let mut text = translate_expr(rhs, em);
        if i == last {
            steps.push(format!("return ({} {} {});", current, symbol, text));
            break;
        }
        if !is_simple_operand(rhs) {
            let temp = em.fresh_temp("cmp");
            steps.push(format!("auto {} = {};", temp, text));
            text = temp;
        }
        steps.push(format!("if (!({} {} {})) return false;", current, symbol, text));
        current = text;
    }
    format!("([&]{{ {} }}())", steps.join(" "))
}

/// `map(int, <expr>.split(...))`
pub fn is_int_split_map(expr: &Expr) -> bool {
    match expr {
        Expr::Call { func, args, .. } if func.as_name() == Some("map") => match args.as_slice() {
            [conv, Expr::Call { func: split, .. }] => {
                conv.as_name() == Some("int")
                    && matches!(**split, Expr::Attribute { ref attr, .. } if attr == "split")
            }
            _ => false,
        },
        _ => false,
    }
}

fn is_input_call(expr: &Expr) -> bool {
    expr.is_call_to("input")
}

fn builtin_call(name: &str, args: &[Expr], em: &mut Emitter) -> String {
    match (name, args) {
        ("print", []) => "(cout << '\\n', 0)".to_string(),
        ("print", args) => {
            let parts: Vec<String> = args.iter().map(|a| translate_expr(a, em)).collect();
            format!("(_print({}), 0)", parts.join(", "))
        }
        ("len", [arg]) => format!("((int){}.size())", translate_expr(arg, em)),
        ("int", [arg]) if is_input_call(arg) => "read_int()".to_string(),
        ("int", [arg]) => format!("(long long)({})", convert_text(arg, "to_ll", em)),
        ("float", [arg]) => format!("(double)({})", convert_text(arg, "to_double", em)),
        ("input", _) => "read_line()".to_string(),
        ("list", [arg]) if is_int_split_map(arg) => "read_int_list()".to_string(),
        ("list", _) => "vector<long long>{}".to_string(),
        ("map", _) => {
            em.unsupported("map");
            MAP_PLACEHOLDER.to_string()
        }
        ("max" | "min", [a, b]) => {
            let a = translate_expr(a, em);
            let b = translate_expr(b, em);
            format!("{}({}, {})", name, a, b)
        }
        _ => {
            em.unsupported(format!("call to {}()", name));
            CALL_PLACEHOLDER.to_string()
        }
    }
}

/// Argument of `int(...)`/`float(...)`: text sources go through the
/// zero-defaulting parse helper, everything else is cast directly.
fn convert_text(arg: &Expr, helper: &str, em: &mut Emitter) -> String {
    if is_input_call(arg) {
        return format!("{}(read_line())", helper);
    }
    let text = translate_expr(arg, em);
    if text.starts_with("string(") || text.starts_with("read_line()") {
        format!("{}({})", helper, text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::parser::parse_module;
    use crate::translate::ast::StmtKind;

    fn render(source: &str) -> (String, Emitter) {
        let module = parse_module(source).unwrap();
        let expr = match &module.body[0].kind {
            StmtKind::Expr(e) => e.clone(),
            other => panic!("expected expression, got {:?}", other),
        };
        let mut em = Emitter::new();
        let text = translate_expr(&expr, &mut em);
        (text, em)
    }

    fn text(source: &str) -> String {
        render(source).0
    }

    #[test]
    fn literals() {
        assert_eq!(text("True"), "true");
        assert_eq!(text("None"), "0");
        assert_eq!(text("42"), "42");
        assert_eq!(text("2.5"), "2.5");
        assert_eq!(text("'a\"b\\n'"), r#"string("a\"b\n")"#);
        assert_eq!(text("'tab\\there'"), r#"string("tab\there")"#);
    }

    #[test]
    fn arithmetic() {
        assert_eq!(text("a + b * c"), "(a + (b * c))");
        assert_eq!(text("a // b"), "(a / b)");
        assert_eq!(text("a ** 2"), "pow(a, 2)");
        assert_eq!(text("-x"), "(-x)");
        assert_eq!(text("not x"), "(!x)");
        assert_eq!(text("~x"), "(~x)");
        assert_eq!(text("a and b or c"), "((a && b) || c)");
    }

    #[test]
    fn comparisons() {
        assert_eq!(text("x > 3"), "(x > 3)");
        assert_eq!(text("a < b < c"), "((a < b) && (b < c))");
        assert_eq!(
            text("a < b + 1 <= c"),
            "([&]{ auto __tmp_cmp_0__ = (b + 1); if (!(a < __tmp_cmp_0__)) return false; return (__tmp_cmp_0__ <= c); }())"
        );
    }

    #[test]
    fn chained_comparison_keeps_source_order() {
        assert_eq!(
            text("int(input()) < int(input()) < int(input())"),
            "([&]{ auto __tmp_cmp_0__ = read_int(); auto __tmp_cmp_1__ = read_int(); \
             if (!(__tmp_cmp_0__ < __tmp_cmp_1__)) return false; \
             return (__tmp_cmp_1__ < read_int()); }())"
        );
        assert_eq!(
            text("a <= b * 2 < c * 3 != d"),
            "([&]{ auto __tmp_cmp_0__ = (b * 2); if (!(a <= __tmp_cmp_0__)) return false; \
             auto __tmp_cmp_1__ = (c * 3); if (!(__tmp_cmp_0__ < __tmp_cmp_1__)) return false; \
             return (__tmp_cmp_1__ != d); }())"
        );
        let (out, em) = render("x in xs");
        assert_eq!(out, EXPR_PLACEHOLDER);
        assert_eq!(em.diagnostics().len(), 1);
    }

    #[test]
    fn input_idioms() {
        assert_eq!(text("int(input())"), "read_int()");
        assert_eq!(text("float(input())"), "(double)(to_double(read_line()))");
        assert_eq!(text("int(s)"), "(long long)(s)");
        assert_eq!(text("int('12')"), r#"(long long)(to_ll(string("12")))"#);
        assert_eq!(text("input()"), "read_line()");
        assert_eq!(text("list(map(int, input().split()))"), "read_int_list()");
        assert_eq!(text("list(range(3))"), "vector<long long>{}");
    }

    #[test]
    fn builtins() {
        assert_eq!(text("len(a)"), "((int)a.size())");
        assert_eq!(text("max(a, b)"), "max(a, b)");
        assert_eq!(text("min(a, 1)"), "min(a, 1)");
        assert_eq!(text("print(a, b)"), "(_print(a, b), 0)");
        assert_eq!(text("[1, 2]"), "vector<long long>{1, 2}");
        assert_eq!(text("a[i + 1]"), "a[(i + 1)]");
    }

    #[test]
    fn placeholders_are_recorded() {
        for (source, marker) in [
            ("a.b", ATTR_PLACEHOLDER),
            ("a[1:]", SLICE_PLACEHOLDER),
            ("map(int, xs)", MAP_PLACEHOLDER),
            ("foo(1)", CALL_PLACEHOLDER),
            ("s.strip()", CALL_PLACEHOLDER),
            ("max(a, b, c)", CALL_PLACEHOLDER),
            ("a if c else b", EXPR_PLACEHOLDER),
            ("[x for x in y]", EXPR_PLACEHOLDER),
        ] {
            let (out, em) = render(source);
            assert_eq!(out, marker, "for {source}");
            assert_eq!(em.diagnostics().len(), 1, "for {source}");
        }
    }
}
