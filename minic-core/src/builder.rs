//! Semantic actions: turns reductions into AST nodes while enforcing
//! declare-before-use against a flat [`SymbolTable`].

use tracing::trace;

use crate::ast::{BinaryOperator, Block, Expr, Program, Stmt};
use crate::error::CoreError;
use crate::reduce::Reductions;
use crate::symbols::SymbolTable;

#[derive(Debug, Default)]
pub struct AstBuilder {
    symbols: SymbolTable,
}

impl AstBuilder {
    pub fn new(symbols: SymbolTable) -> Self {
        AstBuilder { symbols }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Hand the table back once construction is over.
    pub fn finish(self) -> SymbolTable {
        self.symbols
    }
}

impl Reductions for AstBuilder {
    fn program(&mut self, body: Block) -> Program {
        trace!(statements = body.len(), "reduced program");
        Program { body }
    }

    fn empty_list(&mut self) -> Block {
        Block::new()
    }

    fn append_statement(&mut self, mut list: Block, stmt: Stmt) -> Block {
        list.push(stmt);
        list
    }

    fn declare(&mut self, name: String) -> Result<Stmt, CoreError> {
        self.symbols.declare(&name)?;
        trace!(%name, "declared");
        Ok(Stmt::Declaration { name, init: None })
    }

    fn declare_with_init(&mut self, name: String, init: Expr) -> Result<Stmt, CoreError> {
        self.symbols.declare(&name)?;
        trace!(%name, "declared with initializer");
        Ok(Stmt::Declaration {
            name,
            init: Some(init),
        })
    }

    fn assign(&mut self, target: String, value: Expr) -> Result<Stmt, CoreError> {
        self.symbols.lookup(&target)?;
        Ok(Stmt::Assignment { target, value })
    }

    fn print(&mut self, value: Expr) -> Stmt {
        Stmt::Print { value }
    }

    fn print_string(&mut self, literal: String) -> Stmt {
        Stmt::PrintString { literal }
    }

    fn if_then(&mut self, cond: Expr, then_branch: Block) -> Stmt {
        Stmt::If {
            cond,
            then_branch,
            else_branch: None,
        }
    }

    fn if_then_else(&mut self, cond: Expr, then_branch: Block, else_branch: Block) -> Stmt {
        Stmt::If {
            cond,
            then_branch,
            else_branch: Some(else_branch),
        }
    }

    fn block(&mut self, list: Block) -> Block {
        list
    }

    fn binary(&mut self, op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn negate(&mut self, operand: Expr) -> Expr {
        Expr::Negate {
            operand: Box::new(operand),
        }
    }

    fn group(&mut self, inner: Expr) -> Expr {
        inner
    }

    fn number(&mut self, value: i32) -> Expr {
        Expr::Number(value)
    }

    fn identifier(&mut self, name: String) -> Result<Expr, CoreError> {
        self.symbols.lookup(&name)?;
        Ok(Expr::Identifier(name))
    }
}
