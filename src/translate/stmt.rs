//! Statement translation: one rule per supported statement kind and a
//! single fallback marker for everything else.

use crate::translate::ast::{Expr, Stmt, StmtKind};
use crate::translate::emitter::Emitter;
use crate::translate::expr::{is_int_split_map, operator_symbol, translate_expr};

pub const FALLBACK_MARKER: &str = "// [unsupported in MVP]";
pub const COMPLEX_UNPACK_MARKER: &str = "// [unsupported: complex unpack]";
pub const UNPACK_PATTERN_MARKER: &str = "// [unsupported: tuple unpacking pattern not recognized]";
pub const LOOP_ELSE_MARKER: &str = "// [unsupported: loop else clause]";

pub fn translate_block(body: &[Stmt], em: &mut Emitter) {
    for stmt in body {
        translate_stmt(stmt, em);
    }
}

/// Translate a statement list as one brace block with its own scope.
fn translate_scoped_block(body: &[Stmt], em: &mut Emitter) {
    em.indent();
    em.scoped(|em| translate_block(body, em));
    em.dedent();
}

pub fn translate_stmt(stmt: &Stmt, em: &mut Emitter) {
    em.set_source_line(stmt.line);

    match &stmt.kind {
        StmtKind::Assign { targets, value } => match targets.as_slice() {
            [Expr::Tuple(items)] => unpack(items, value, em),
            [target] => assign(target, value, em),
            _ => fallback(em, "chained assignment"),
        },
        StmtKind::AugAssign { target, op, value } => match operator_symbol(*op) {
            Some(symbol) => {
                let target = translate_expr(target, em);
                let value = translate_expr(value, em);
                em.write(format!("{} {}= {};", target, symbol, value));
            }
            None => fallback(em, format!("augmented assignment {}=", op.symbol())),
        },
        StmtKind::Expr(expr) => expression_statement(expr, em),
        StmtKind::If { test, body, orelse } => conditional(test, body, orelse, em),
        StmtKind::While { test, body, orelse } => {
            let test = translate_expr(test, em);
            em.write(format!("while ({}) {{", test));
            translate_scoped_block(body, em);
            em.write("}");
            loop_else(orelse, em);
        }
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
        } => {
            if iter.is_call_to("range") {
                range_loop(target, iter, body, em);
            } else {
                each_loop(target, iter, body, em);
            }
            loop_else(orelse, em);
        }
        StmtKind::Return(Some(value)) => {
            let value = translate_expr(value, em);
            em.write(format!("return {};", value));
        }
        StmtKind::Return(None) => em.write("return;"),
        StmtKind::Pass => em.write(";"),
        StmtKind::Break => em.write("break;"),
        StmtKind::Continue => em.write("continue;"),
        StmtKind::FunctionDef { .. } => fallback(em, "nested function definition"),
        StmtKind::Unsupported { construct } => fallback(em, construct.clone()),
    }
}

fn fallback(em: &mut Emitter, construct: impl Into<String>) {
    em.unsupported(construct);
    em.write(FALLBACK_MARKER);
}

fn assign(target: &Expr, value: &Expr, em: &mut Emitter) {
    let target_text = translate_expr(target, em);
    let value_text = translate_expr(value, em);
    match target.as_name() {
        Some(name) if !em.is_declared(name) => {
            em.declare(name);
            em.write(format!("auto {} = {};", target_text, value_text));
        }
        _ => em.write(format!("{} = {};", target_text, value_text)),
    }
}

/// `a, b = [..]` and `a, b = map(int, input().split())`: evaluate once into
/// a temporary, then index it with a zero default per name.
fn unpack(items: &[Expr], value: &Expr, em: &mut Emitter) {
    let names: Option<Vec<&str>> = items.iter().map(Expr::as_name).collect();
    let names = match names {
        Some(names) => names,
        None => {
            em.unsupported("complex unpack");
            em.write(COMPLEX_UNPACK_MARKER);
            return;
        }
    };

    let source = if is_int_split_map(value) {
        "read_int_list()".to_string()
    } else if matches!(value, Expr::List(_)) {
        translate_expr(value, em)
    } else {
        em.unsupported("tuple unpacking");
        em.write(UNPACK_PATTERN_MARKER);
        return;
    };

    let temp = em.fresh_temp("unpack");
    em.write(format!("auto {} = {};", temp, source));
    for (i, name) in names.into_iter().enumerate() {
        let decl = if em.is_declared(name) {
            ""
        } else {
            em.declare(name);
            "auto "
        };
        em.write(format!(
            "{}{} = {}.size()>{} ? {}[{}] : 0;",
            decl, name, temp, i, temp, i
        ));
    }
}

fn expression_statement(expr: &Expr, em: &mut Emitter) {
    if let Expr::Call { args, .. } = expr {
        if expr.is_call_to("print") {
            if args.is_empty() {
                em.write("cout << '\\n';");
            } else {
                let parts: Vec<String> = args.iter().map(|a| translate_expr(a, em)).collect();
                em.write(format!("_print({}); cout << '\\n';", parts.join(", ")));
            }
            return;
        }
    }
    let text = translate_expr(expr, em);
    em.write(format!("{};", text));
}

/// `if`/`elif`/`else`; an else branch holding exactly one `if` continues
/// the chain as `else if`.
fn conditional(test: &Expr, body: &[Stmt], orelse: &[Stmt], em: &mut Emitter) {
    let test = translate_expr(test, em);
    em.write(format!("if ({}) {{", test));
    translate_scoped_block(body, em);

    let mut chain = orelse;
    while let [Stmt {
        line,
        kind:
            StmtKind::If {
                test,
                body,
                orelse,
            },
    }] = chain
    {
        em.set_source_line(*line);
        let test = translate_expr(test, em);
        em.write(format!("}} else if ({}) {{", test));
        translate_scoped_block(body, em);
        chain = orelse.as_slice();
    }

    if !chain.is_empty() {
        em.write("} else {");
        translate_scoped_block(chain, em);
    }
    em.write("}");
}

fn range_loop(target: &Expr, iter: &Expr, body: &[Stmt], em: &mut Emitter) {
    let (args, has_keywords) = match iter {
        Expr::Call { args, keywords, .. } => (args.as_slice(), !keywords.is_empty()),
        _ => (&[][..], false),
    };
    let var = match target.as_name() {
        Some(name) if !has_keywords && (1..=3).contains(&args.len()) => name,
        Some(_) => return fallback(em, "range() call shape"),
        None => return fallback(em, "range loop target"),
    };

    em.scoped(|em| {
        let bounds: Vec<String> = args.iter().map(|a| translate_expr(a, em)).collect();
        let decl = if em.is_declared(var) {
            ""
        } else {
            em.declare(var);
            "auto "
        };

        let header = match bounds.as_slice() {
            [stop] => format!("for ({decl}{var} = 0; {var} < {stop}; ++{var}) {{"),
            [start, stop] => format!("for ({decl}{var} = {start}; {var} < {stop}; ++{var}) {{"),
            [start, stop, step] => {
                let cmp = if args[2].is_syntactically_negative() {
                    ">"
                } else {
                    "<"
                };
                format!("for ({decl}{var} = {start}; {var} {cmp} {stop}; {var} += {step}) {{")
            }
            _ => unreachable!("range arity checked above"),
        };
        em.write(header);
        translate_scoped_block(body, em);
        em.write("}");
    });
}

fn each_loop(target: &Expr, iter: &Expr, body: &[Stmt], em: &mut Emitter) {
    let names: Vec<&str> = match target {
        Expr::Name(name) => vec![name.as_str()],
        Expr::Tuple(items) | Expr::List(items) if !items.is_empty() => {
            match items.iter().map(Expr::as_name).collect::<Option<Vec<_>>>() {
                Some(names) => names,
                None => return fallback(em, "loop target"),
            }
        }
        _ => return fallback(em, "loop target"),
    };

    em.scoped(|em| {
        let iterable = translate_expr(iter, em);
        for name in &names {
            em.declare(name);
        }
        let binding = match names.as_slice() {
            [single] => single.to_string(),
            many => format!("[{}]", many.join(", ")),
        };
        em.write(format!("for (auto &{} : {}) {{", binding, iterable));
        translate_scoped_block(body, em);
        em.write("}");
    });
}

fn loop_else(orelse: &[Stmt], em: &mut Emitter) {
    if !orelse.is_empty() {
        em.unsupported("loop else clause");
        em.write(LOOP_ELSE_MARKER);
    }
}

/// `auto` when the body returns anything, `void` otherwise
pub fn return_type(body: &[Stmt]) -> &'static str {
    if body.iter().any(Stmt::contains_return) {
        "auto"
    } else {
        "void"
    }
}

/// Top-level `def`: parameters become `auto` and the body gets its own scope.
pub fn translate_function(
    line: usize,
    name: &str,
    params: &[String],
    body: &[Stmt],
    em: &mut Emitter,
) {
    em.set_source_line(line);
    let signature: Vec<String> = params.iter().map(|p| format!("auto {}", p)).collect();
    em.write(format!(
        "{} {}({}) {{",
        return_type(body),
        name,
        signature.join(", ")
    ));
    em.indent();
    em.scoped(|em| {
        for param in params {
            em.declare(param);
        }
        translate_block(body, em);
    });
    em.dedent();
    em.write("}");
    em.write("");
}
