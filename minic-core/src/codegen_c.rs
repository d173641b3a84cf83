//! C backend.
//!
//! Every compound expression is emitted inside its own parentheses, so the
//! generated text means the same thing regardless of C's precedence rules.

use std::fmt::Write;

use crate::ast::{Block, Expr, Program, Stmt};

const PROLOGUE: &str = "#include <stdio.h>\n#include <stdlib.h>\n\nint main() {\n";
const EPILOGUE: &str = "    return 0;\n}\n";
const INDENT: &str = "    ";

/// Generate a complete C translation unit for `program`.
pub fn generate_c(program: &Program) -> String {
    let mut out = String::from(PROLOGUE);
    emit_block(&mut out, &program.body, 1);
    out.push_str(EPILOGUE);
    out
}

/// Emit a single expression.
pub fn expr_to_c(expr: &Expr) -> String {
    let mut out = String::new();
    emit_expr(&mut out, expr);
    out
}

fn emit_block(out: &mut String, block: &Block, depth: usize) {
    for stmt in &block.statements {
        emit_stmt(out, stmt, depth);
    }
}

fn emit_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match stmt {
        Stmt::Declaration { name, init } => {
            let _ = write!(out, "int {name}");
            if let Some(init) = init {
                out.push_str(" = ");
                emit_expr(out, init);
            }
            out.push_str(";\n");
        }
        Stmt::Assignment { target, value } => {
            let _ = write!(out, "{target} = ");
            emit_expr(out, value);
            out.push_str(";\n");
        }
        Stmt::Print { value } => {
            out.push_str("printf(\"%d\\n\", ");
            emit_expr(out, value);
            out.push_str(");\n");
        }
        Stmt::PrintString { literal } => {
            let _ = writeln!(out, "printf(\"%s\\n\", {literal});");
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push_str("if (");
            emit_expr(out, cond);
            out.push_str(") {\n");
            emit_block(out, then_branch, depth + 1);
            indent(out, depth);
            out.push('}');
            if let Some(else_branch) = else_branch {
                out.push_str(" else {\n");
                emit_block(out, else_branch, depth + 1);
                indent(out, depth);
                out.push('}');
            }
            out.push('\n');
        }
    }
}

fn emit_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Number(value) => {
            let _ = write!(out, "{value}");
        }
        Expr::Identifier(name) => out.push_str(name),
        Expr::Binary { op, left, right } => {
            out.push('(');
            emit_expr(out, left);
            let _ = write!(out, " {op} ");
            emit_expr(out, right);
            out.push(')');
        }
        Expr::Negate { operand } => {
            out.push_str("(-");
            emit_expr(out, operand);
            out.push(')');
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
