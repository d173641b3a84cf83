//! Reduction interface between the parser and the semantic actions.
//!
//! Each method corresponds to one grammar rule and receives the attributes
//! of the rule's right-hand side, already built. The parser calls them
//! bottom-up: children are always reduced before their parent. Any parser
//! that recognizes the grammar can drive an implementation of this trait.
//!
//! ```text
//! program   : stmt_list
//! stmt_list : <empty> | stmt_list statement
//! statement : INT ID ';' | INT ID '=' expr ';' | ID '=' expr ';'
//!           | PRINT '(' expr ')' ';' | PRINT '(' STRING ')' ';'
//!           | IF '(' expr ')' block | IF '(' expr ')' block ELSE block
//! block     : '{' stmt_list '}'
//! expr      : expr OP expr | '-' expr | '(' expr ')' | NUMBER | ID
//! ```

use crate::ast::{BinaryOperator, Block, Expr, Program, Stmt};
use crate::error::CoreError;

pub trait Reductions {
    /// `program : stmt_list`
    fn program(&mut self, body: Block) -> Program;

    /// `stmt_list : <empty>`
    fn empty_list(&mut self) -> Block;

    /// `stmt_list : stmt_list statement`
    fn append_statement(&mut self, list: Block, stmt: Stmt) -> Block;

    /// `statement : INT ID ';'`
    fn declare(&mut self, name: String) -> Result<Stmt, CoreError>;

    /// `statement : INT ID '=' expr ';'`
    fn declare_with_init(&mut self, name: String, init: Expr) -> Result<Stmt, CoreError>;

    /// `statement : ID '=' expr ';'`
    fn assign(&mut self, target: String, value: Expr) -> Result<Stmt, CoreError>;

    /// `statement : PRINT '(' expr ')' ';'`
    fn print(&mut self, value: Expr) -> Stmt;

    /// `statement : PRINT '(' STRING ')' ';'`
    fn print_string(&mut self, literal: String) -> Stmt;

    /// `statement : IF '(' expr ')' block`
    fn if_then(&mut self, cond: Expr, then_branch: Block) -> Stmt;

    /// `statement : IF '(' expr ')' block ELSE block`
    fn if_then_else(&mut self, cond: Expr, then_branch: Block, else_branch: Block) -> Stmt;

    /// `block : '{' stmt_list '}'`
    fn block(&mut self, list: Block) -> Block;

    /// `expr : expr OP expr`
    fn binary(&mut self, op: BinaryOperator, left: Expr, right: Expr) -> Expr;

    /// `expr : '-' expr`
    fn negate(&mut self, operand: Expr) -> Expr;

    /// `expr : '(' expr ')'`
    fn group(&mut self, inner: Expr) -> Expr;

    /// `expr : NUMBER`
    fn number(&mut self, value: i32) -> Expr;

    /// `expr : ID`
    fn identifier(&mut self, name: String) -> Result<Expr, CoreError>;
}
