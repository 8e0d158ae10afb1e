//! Recursive-descent parser for the Go-like surface syntax
//!
//! Produces the untyped parse tree in [`crate::frontend::syntax`]. Any
//! syntax error aborts parsing; the semantic core only runs on a tree
//! that parsed cleanly.

use crate::frontend::syntax::*;
use crate::frontend::token::{Token, TokenKind};
use crate::types::Type;
use crate::utils::{Error, Result};

/// The parser state
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse a whole compilation unit
    pub fn parse_program(&mut self) -> Result<Program> {
        self.expect(TokenKind::Package, "'package'")?;
        self.expect(TokenKind::Main, "'main'")?;

        if self.check(&TokenKind::Import) {
            self.advance();
            match self.advance().kind {
                TokenKind::StrLit(_) => {}
                _ => {
                    return Err(self.error_at_prev("import path string"));
                }
            }
        }

        let mut funcs = Vec::new();
        while !self.check(&TokenKind::Eof) {
            funcs.push(self.parse_func_decl()?);
        }
        Ok(Program { funcs })
    }

    // ==================== Declarations ====================

    fn parse_func_decl(&mut self) -> Result<FuncDecl> {
        self.expect(TokenKind::Func, "'func'")?;

        let token = self.advance().clone();
        let (name, is_main) = match token.kind {
            TokenKind::Main => (
                Ident { text: "main".to_string(), line: token.line },
                true,
            ),
            TokenKind::Ident(text) => (Ident { text, line: token.line }, false),
            _ => return Err(self.error_at_prev("function name")),
        };

        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let name = self.expect_ident()?;
                let ty = self.expect_type()?;
                params.push(Param { name, ty });
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let ret = self.try_parse_type();
        let body = self.parse_block()?;

        Ok(FuncDecl { name, is_main, params, ret, body })
    }

    // ==================== Statements ====================

    fn parse_block(&mut self) -> Result<Block> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            if self.check(&TokenKind::Semi) {
                self.advance();
                continue;
            }
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Block { stmts })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        match &self.peek().kind {
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Input => self.parse_input(),
            TokenKind::Output => self.parse_output(),
            TokenKind::Ident(_) => self.parse_simple_statement(),
            _ => Err(self.error_here("statement")),
        }
    }

    /// `var IDENT (var_type | var_type? "=" expression)`
    fn parse_var_decl(&mut self) -> Result<Stmt> {
        self.advance(); // var
        let name = self.expect_ident()?;
        let ty = self.try_parse_type();

        let init = if self.check(&TokenKind::Assign) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        if ty.is_none() && init.is_none() {
            return Err(self.error_here("type or initializer in var declaration"));
        }
        Ok(Stmt::VarDecl { name, ty, init })
    }

    /// Statements opening with an identifier: `x := e`, `f(...)`,
    /// `x = e`, `x += e`, `x -= e`, `x++`, `x--`
    fn parse_simple_statement(&mut self) -> Result<Stmt> {
        if self.peek_next_is(&TokenKind::DeclAssign) {
            let name = self.expect_ident()?;
            self.advance(); // :=
            let value = self.parse_expression()?;
            return Ok(Stmt::DeclareAssign { name, value });
        }
        if self.peek_next_is(&TokenKind::LParen) {
            let call = self.parse_func_call()?;
            return Ok(Stmt::Call(call));
        }

        let target = self.parse_id()?;
        let token = self.advance().clone();
        match token.kind {
            TokenKind::Assign => {
                let value = self.parse_expression()?;
                Ok(Stmt::Assign { target, op: AssignOp::Set, value })
            }
            TokenKind::PlusAssign => {
                let value = self.parse_expression()?;
                Ok(Stmt::Assign { target, op: AssignOp::Add, value })
            }
            TokenKind::MinusAssign => {
                let value = self.parse_expression()?;
                Ok(Stmt::Assign { target, op: AssignOp::Sub, value })
            }
            TokenKind::PlusPlus => Ok(Stmt::IncDec { target, inc: true }),
            TokenKind::MinusMinus => Ok(Stmt::IncDec { target, inc: false }),
            _ => Err(self.error_at_prev("assignment operator")),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let line = self.advance().line; // if
        let cond = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let else_block = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If { line, cond, then_block, else_block })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let line = self.advance().line; // for
        let cond = if self.check(&TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let body = self.parse_block()?;
        Ok(Stmt::For { line, cond, body })
    }

    fn parse_switch(&mut self) -> Result<Stmt> {
        let line = self.advance().line; // switch
        let subject = if self.check(&TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_id()?)
        };
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut cases = Vec::new();
        while self.check(&TokenKind::Case) {
            let line = self.advance().line;
            let value = self.parse_expression()?;
            self.expect(TokenKind::Colon, "':'")?;
            let body = self.parse_clause_body()?;
            cases.push(CaseClause { line, value, body });
        }

        let default = if self.check(&TokenKind::Default) {
            self.advance();
            self.expect(TokenKind::Colon, "':'")?;
            Some(self.parse_clause_body()?)
        } else {
            None
        };

        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Stmt::Switch { line, subject, cases, default })
    }

    /// Statements of a case/default clause, up to the next clause or `}`
    fn parse_clause_body(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof => {
                    break
                }
                TokenKind::Semi => {
                    self.advance();
                }
                _ => stmts.push(self.parse_statement()?),
            }
        }
        Ok(stmts)
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let line = self.advance().line; // return
        let value = match self.peek().kind {
            TokenKind::RBrace | TokenKind::Semi | TokenKind::Eof => None,
            _ => Some(self.parse_expression()?),
        };
        Ok(Stmt::Return { line, value })
    }

    /// `fmt.Scanln "(" "&" id ")"`
    fn parse_input(&mut self) -> Result<Stmt> {
        self.advance(); // fmt.Scanln
        self.expect(TokenKind::LParen, "'('")?;
        self.expect(TokenKind::Amp, "'&'")?;
        let target = self.parse_id()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Stmt::Input { target })
    }

    /// `fmt.Println "(" expr_list? ")"`
    fn parse_output(&mut self) -> Result<Stmt> {
        let line = self.advance().line; // fmt.Println
        self.expect(TokenKind::LParen, "'('")?;
        let args = if self.check(&TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Stmt::Output { line, args })
    }

    // ==================== Expressions ====================

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expression()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// Precedence: `* / %` over `+ -` over the relational operators
    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_relational()
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                TokenKind::Less => BinOp::Lt,
                TokenKind::LessEq => BinOp::Le,
                TokenKind::Greater => BinOp::Gt,
                TokenKind::GreaterEq => BinOp::Ge,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary { op, line, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary { op, line, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_primary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_primary()?;
            lhs = Expr::Binary { op, line, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::IntLit(value) => {
                self.advance();
                Ok(Expr::IntLit { value, line: token.line })
            }
            TokenKind::FloatLit(value) => {
                self.advance();
                Ok(Expr::FloatLit { value, line: token.line })
            }
            TokenKind::StrLit(text) => {
                self.advance();
                Ok(Expr::StrLit { text, line: token.line })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLit { value: true, line: token.line })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLit { value: false, line: token.line })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Ident(_) => {
                if self.peek_next_is(&TokenKind::LParen) {
                    Ok(Expr::Call(self.parse_func_call()?))
                } else {
                    Ok(Expr::Id(self.parse_id()?))
                }
            }
            _ => Err(self.error_here("expression")),
        }
    }

    fn parse_func_call(&mut self) -> Result<CallExpr> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen, "'('")?;
        let args = if self.check(&TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(CallExpr { name, args })
    }

    /// `id: IDENT ("[" expression "]")?`
    fn parse_id(&mut self) -> Result<Id> {
        let name = self.expect_ident()?;
        let index = if self.check(&TokenKind::LBracket) {
            self.advance();
            let expr = self.parse_expression()?;
            self.expect(TokenKind::RBracket, "']'")?;
            Some(Box::new(expr))
        } else {
            None
        };
        Ok(Id { name, index })
    }

    // ==================== Token helpers ====================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next_is(&self, kind: &TokenKind) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map_or(false, |t| &t.kind == kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<()> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident> {
        let token = self.advance().clone();
        match token.kind {
            TokenKind::Ident(text) => Ok(Ident { text, line: token.line }),
            _ => Err(self.error_at_prev("identifier")),
        }
    }

    fn expect_type(&mut self) -> Result<Type> {
        self.try_parse_type()
            .ok_or_else(|| self.error_here("type name"))
    }

    fn try_parse_type(&mut self) -> Option<Type> {
        let ty = match self.peek().kind {
            TokenKind::IntType => Type::Int,
            TokenKind::Float32Type => Type::Float32,
            TokenKind::BoolType => Type::Bool,
            TokenKind::StringType => Type::Str,
            _ => return None,
        };
        self.advance();
        Some(ty)
    }

    fn error_here(&self, expected: &str) -> Error {
        let token = self.peek();
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got: token.kind.describe(),
            line: token.line,
        }
    }

    fn error_at_prev(&self, expected: &str) -> Error {
        let token = &self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)];
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got: token.kind.describe(),
            line: token.line,
        }
    }
}
