//! Recursive-descent parser that drives a [`Reductions`] implementation.
//!
//! Binary operators are parsed by precedence climbing. Every operator is
//! left-associative; from loosest to tightest the levels are comparisons,
//! `+ -`, `* /`, and prefix `-`.

use crate::ast::{BinaryOperator, Block, Expr, Program, Stmt};
use crate::builder::AstBuilder;
use crate::error::{CoreError, line_column};
use crate::lexer::{Token, TokenKind, lex};
use crate::reduce::Reductions;

/// Deepest allowed nesting of parentheses, prefix `-`, blocks and
/// left-folded operator chains. Later stages recurse over the tree, so
/// this bounds their stack use as well as the parser's.
pub const MAX_NESTING: usize = 256;

/// Parse `source` with a fresh [`AstBuilder`].
pub fn parse(source: &str) -> Result<Program, CoreError> {
    let mut builder = AstBuilder::default();
    parse_with(source, &mut builder)
}

/// Parse `source`, reporting every recognized rule to `actions`.
pub fn parse_with<R: Reductions>(source: &str, actions: &mut R) -> Result<Program, CoreError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        source,
        tokens,
        position: 0,
        depth: 0,
        actions,
    };
    parser.program()
}

struct Parser<'src, 'act, R> {
    source: &'src str,
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    actions: &'act mut R,
}

impl<'src, 'act, R: Reductions> Parser<'src, 'act, R> {
    fn program(&mut self) -> Result<Program, CoreError> {
        let body = self.stmt_list(TokenKind::Eof)?;
        self.expect(TokenKind::Eof)?;
        Ok(self.actions.program(body))
    }

    fn stmt_list(&mut self, terminator: TokenKind) -> Result<Block, CoreError> {
        let mut list = self.actions.empty_list();
        while !matches!(self.peek().kind, TokenKind::Eof) && self.peek().kind != terminator {
            let stmt = self.statement()?;
            list = self.actions.append_statement(list, stmt);
        }
        Ok(list)
    }

    fn statement(&mut self) -> Result<Stmt, CoreError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Int => {
                self.advance();
                let name = self.expect_ident()?;
                if self.eat(TokenKind::Equal) {
                    let init = self.expr()?;
                    self.expect(TokenKind::Semi)?;
                    self.actions.declare_with_init(name, init)
                } else {
                    self.expect(TokenKind::Semi)?;
                    self.actions.declare(name)
                }
            }
            TokenKind::Ident => {
                let target = self.expect_ident()?;
                self.expect(TokenKind::Equal)?;
                let value = self.expr()?;
                self.expect(TokenKind::Semi)?;
                self.actions.assign(target, value)
            }
            TokenKind::Print => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let stmt = if self.peek().kind == TokenKind::StringLiteral {
                    let literal = self.advance().text(self.source).to_string();
                    self.expect(TokenKind::RParen)?;
                    self.actions.print_string(literal)
                } else {
                    let value = self.expr()?;
                    self.expect(TokenKind::RParen)?;
                    self.actions.print(value)
                };
                self.expect(TokenKind::Semi)?;
                Ok(stmt)
            }
            TokenKind::If => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let cond = self.expr()?;
                self.expect(TokenKind::RParen)?;
                let then_branch = self.block()?;
                if self.eat(TokenKind::Else) {
                    let else_branch = self.block()?;
                    Ok(self.actions.if_then_else(cond, then_branch, else_branch))
                } else {
                    Ok(self.actions.if_then(cond, then_branch))
                }
            }
            _ => Err(self.unexpected(token, "a statement")),
        }
    }

    fn block(&mut self) -> Result<Block, CoreError> {
        self.expect(TokenKind::LBrace)?;
        self.enter()?;
        let list = self.stmt_list(TokenKind::RBrace)?;
        self.expect(TokenKind::RBrace)?;
        self.depth -= 1;
        Ok(self.actions.block(list))
    }

    fn expr(&mut self) -> Result<Expr, CoreError> {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, min_precedence: u8) -> Result<Expr, CoreError> {
        let mut left = self.unary_expr()?;
        // Each fold pushes `left` one level deeper.
        let mut folds = 0;
        while let Some((op, precedence)) = binary_operator(self.peek().kind) {
            if precedence < min_precedence {
                break;
            }
            self.enter()?;
            folds += 1;
            self.advance();
            let right = self.binary_expr(precedence + 1)?;
            left = self.actions.binary(op, left, right);
        }
        self.depth -= folds;
        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<Expr, CoreError> {
        if self.peek().kind == TokenKind::Minus {
            self.enter()?;
            self.advance();
            let operand = self.unary_expr()?;
            self.depth -= 1;
            return Ok(self.actions.negate(operand));
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> Result<Expr, CoreError> {
        let token = self.peek();
        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let text = token.text(self.source);
                let value = text.parse::<i32>().map_err(|_| {
                    let (line, column) = line_column(self.source, token.text_start as usize);
                    CoreError::LexError {
                        line,
                        column,
                        message: format!(
                            "integer literal {text} is out of range (largest is {})",
                            i32::MAX
                        ),
                    }
                })?;
                Ok(self.actions.number(value))
            }
            TokenKind::Ident => {
                let name = self.expect_ident()?;
                self.actions.identifier(name)
            }
            TokenKind::LParen => {
                self.enter()?;
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                self.depth -= 1;
                Ok(self.actions.group(inner))
            }
            _ => Err(self.unexpected(token, "an expression")),
        }
    }

    /// Open one nesting level at the current token. Callers decrement
    /// `depth` once the nested construct is complete.
    fn enter(&mut self) -> Result<(), CoreError> {
        if self.depth >= MAX_NESTING {
            let (line, column) = line_column(self.source, self.peek().text_start as usize);
            return Err(CoreError::SyntaxError {
                line,
                column,
                message: format!("nesting too deep (limit {MAX_NESTING})"),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Token {
        // `lex` always terminates the stream with `Eof`, and the parser
        // never advances past it.
        self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CoreError> {
        let token = self.peek();
        if token.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(token, kind.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CoreError> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(token.text(self.source).to_string())
    }

    fn unexpected(&self, found: Token, expected: &str) -> CoreError {
        let (line, column) = line_column(self.source, found.text_start as usize);
        let found = match found.kind {
            TokenKind::Eof => found.kind.describe().to_string(),
            _ => format!("'{}'", found.text(self.source)),
        };
        CoreError::SyntaxError {
            line,
            column,
            message: format!("expected {expected}, found {found}"),
        }
    }
}

fn binary_operator(kind: TokenKind) -> Option<(BinaryOperator, u8)> {
    let entry = match kind {
        TokenKind::EqEq => (BinaryOperator::Eq, 1),
        TokenKind::NotEq => (BinaryOperator::Ne, 1),
        TokenKind::Less => (BinaryOperator::Lt, 1),
        TokenKind::Greater => (BinaryOperator::Gt, 1),
        TokenKind::LessEq => (BinaryOperator::Le, 1),
        TokenKind::GreaterEq => (BinaryOperator::Ge, 1),
        TokenKind::Plus => (BinaryOperator::Add, 2),
        TokenKind::Minus => (BinaryOperator::Sub, 2),
        TokenKind::Star => (BinaryOperator::Mul, 3),
        TokenKind::Slash => (BinaryOperator::Div, 3),
        _ => return None,
    };
    Some(entry)
}
