//! Syntax tree produced by the AST builder.
//!
//! Statements and expressions are separate sum types; every node owns its
//! children outright, so a finished [`Program`] is a strict tree.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Symbol used for unary negation wherever operators are printed.
pub const NEGATE_SYMBOL: &str = "neg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(i32),
    Identifier(String),
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Negate {
        operand: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Declaration {
        name: String,
        init: Option<Expr>,
    },
    Assignment {
        target: String,
        value: Expr,
    },
    Print {
        value: Expr,
    },
    /// `literal` keeps the surrounding quotes exactly as written.
    PrintString {
        literal: String,
    },
    If {
        cond: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
}

/// Ordered statement list; the only node that grows after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new() -> Self {
        Block::default()
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.statements.push(stmt);
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub body: Block,
}
