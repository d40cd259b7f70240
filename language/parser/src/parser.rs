use anyhow::{anyhow, Result};
use data::tokens::{Span, Token, TokenKind};
use syntax::ast::{AssignTarget, BinaryOp, Block, ConstDecl, Expr, FieldDecl, FunctionDecl, Param, Program, Stmt, StructDecl, UnaryOp};

use crate::lexer::Lexer;

/// Parses one source file into a `Program`. Files are merged by the caller
/// (see `language/runner`), keeping per-file parsing separate from the
/// multi-file merge.
pub fn parse(source: &str, file_id: u64) -> Result<Program> {
    let tokens = Lexer::new(source).tokenize();
    let mut parser = Parser { tokens, pos: 0, file_id };
    return parser.parse_program();
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file_id: u64,
}

impl Parser {
    fn parse_program(&mut self) -> Result<Program> {
        let mut program = Program::default();
        while !self.at_eof() {
            match self.peek_kind() {
                TokenKind::Fn => program.functions.push(self.parse_function()?),
                TokenKind::Struct => program.structs.push(self.parse_struct()?),
                TokenKind::Const => program.consts.push(self.parse_const()?),
                other => return Err(anyhow!("unexpected top-level token {:?} at token {}", other, self.pos)),
            }
        }
        return Ok(program);
    }

    // --- top-level items ---

    fn parse_function(&mut self) -> Result<FunctionDecl> {
        let start = self.pos;
        self.expect(TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::ParenOpen)?;
        let mut params = Vec::new();
        while self.peek_kind() != TokenKind::ParenClose {
            let param_start = self.pos;
            let param_name = self.expect_identifier()?;
            // An optional type annotation may appear on a parameter in
            // source text but carries no weight: spec.md requires types be
            // inferred from call sites, so it is parsed and discarded.
            if self.peek_kind() == TokenKind::Colon {
                self.advance();
                self.expect_identifier()?;
            }
            params.push(Param { name: param_name, span: self.span_from(param_start) });
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            }
        }
        self.expect(TokenKind::ParenClose)?;
        if self.peek_kind() == TokenKind::Arrow {
            self.advance();
            self.expect_identifier()?;
        }
        let body = self.parse_block()?;
        return Ok(FunctionDecl { name, params, body, span: self.span_from(start) });
    }

    fn parse_struct(&mut self) -> Result<StructDecl> {
        let start = self.pos;
        self.expect(TokenKind::Struct)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::BraceOpen)?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while self.peek_kind() != TokenKind::BraceClose {
            if self.peek_kind() == TokenKind::Fn {
                methods.push(self.parse_function()?);
            } else {
                fields.push(self.parse_field()?);
            }
        }
        self.expect(TokenKind::BraceClose)?;
        return Ok(StructDecl { name, fields, methods, span: self.span_from(start) });
    }

    fn parse_field(&mut self) -> Result<FieldDecl> {
        let start = self.pos;
        let is_const = if self.peek_kind() == TokenKind::Const {
            self.advance();
            true
        } else {
            false
        };
        let name = self.expect_identifier()?;
        let type_annotation = if self.peek_kind() == TokenKind::Colon {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };
        let default = if self.peek_kind() == TokenKind::Equals {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        return Ok(FieldDecl { name, type_annotation, default, is_const, span: self.span_from(start) });
    }

    fn parse_const(&mut self) -> Result<ConstDecl> {
        let start = self.pos;
        self.expect(TokenKind::Const)?;
        let name = self.expect_identifier()?;
        if self.peek_kind() == TokenKind::Colon {
            self.advance();
            self.expect_identifier()?;
        }
        self.expect(TokenKind::Equals)?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        return Ok(ConstDecl { name, value, span: self.span_from(start) });
    }

    // --- statements ---

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.pos;
        self.expect(TokenKind::BraceOpen)?;
        let mut statements = Vec::new();
        while self.peek_kind() != TokenKind::BraceClose {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::BraceClose)?;
        return Ok(Block { statements, span: self.span_from(start) });
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let start = self.pos;
        return match self.peek_kind() {
            TokenKind::Spawn => {
                self.advance();
                let callee = self.expect_identifier()?;
                self.expect(TokenKind::ParenOpen)?;
                let args = self.parse_args()?;
                self.expect(TokenKind::ParenClose)?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Spawn { callee, args, span: self.span_from(start) })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Loop => {
                self.advance();
                let body = self.parse_block()?;
                Ok(Stmt::Loop { body, span: self.span_from(start) })
            }
            TokenKind::Return => {
                self.advance();
                let value =
                    if self.peek_kind() == TokenKind::Semicolon { None } else { Some(self.parse_expression()?) };
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Return { value, span: self.span_from(start) })
            }
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break { span: self.span_from(start) })
            }
            TokenKind::Continue => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Continue { span: self.span_from(start) })
            }
            TokenKind::Identifier if self.peek_kind_at(1) == TokenKind::ChanSend => {
                let channel = self.expect_identifier()?;
                self.expect(TokenKind::ChanSend)?;
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::ChannelSend { channel, value, span: self.span_from(start) })
            }
            TokenKind::Identifier
                if self.peek_text() == "self"
                    && self.peek_kind_at(1) == TokenKind::Dot
                    && self.peek_kind_at(3) == TokenKind::Equals =>
            {
                self.advance();
                self.expect(TokenKind::Dot)?;
                let field = self.expect_identifier()?;
                self.expect(TokenKind::Equals)?;
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Assign { target: AssignTarget::SelfField(field), value, span: self.span_from(start) })
            }
            TokenKind::Identifier if self.peek_kind_at(1) == TokenKind::Equals => {
                let target = self.expect_identifier()?;
                self.expect(TokenKind::Equals)?;
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Assign { target: AssignTarget::Name(target), value, span: self.span_from(start) })
            }
            _ => {
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Expression { value, span: self.span_from(start) })
            }
        };
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.pos;
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let else_block = if self.peek_kind() == TokenKind::Else {
            self.advance();
            if self.peek_kind() == TokenKind::If {
                let nested = self.parse_if()?;
                Some(Block { span: nested.span(), statements: vec![nested] })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        return Ok(Stmt::If { condition, then_block, else_block, span: self.span_from(start) });
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let start = self.pos;
        self.expect(TokenKind::For)?;
        let binding = self.expect_identifier()?;
        self.expect(TokenKind::In)?;
        let range = self.parse_expression()?;
        let body = self.parse_block()?;
        return Ok(Stmt::ForRange { binding, range, body, span: self.span_from(start) });
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.pos;
        self.expect(TokenKind::While)?;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        return Ok(Stmt::While { condition, body, span: self.span_from(start) });
    }

    // --- expressions, precedence climbing from loosest to tightest ---

    fn parse_expression(&mut self) -> Result<Expr> {
        return self.parse_or();
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut left = self.parse_and()?;
        while self.peek_operator_text() == Some("||") {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary { op: BinaryOp::Or, left: Box::new(left), right: Box::new(right), span: self.span_from(start) };
        }
        return Ok(left);
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut left = self.parse_equality()?;
        while self.peek_operator_text() == Some("&&") {
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary { op: BinaryOp::And, left: Box::new(left), right: Box::new(right), span: self.span_from(start) };
        }
        return Ok(left);
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek_operator_text() {
                Some("==") => BinaryOp::Equals,
                Some("!=") => BinaryOp::NotEquals,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span: self.span_from(start) };
        }
        return Ok(left);
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut left = self.parse_range()?;
        loop {
            let op = match self.peek_operator_text() {
                Some("<") => BinaryOp::LessThan,
                Some("<=") => BinaryOp::LessThanEquals,
                Some(">") => BinaryOp::GreaterThan,
                Some(">=") => BinaryOp::GreaterThanEquals,
                _ => break,
            };
            self.advance();
            let right = self.parse_range()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span: self.span_from(start) };
        }
        return Ok(left);
    }

    fn parse_range(&mut self) -> Result<Expr> {
        let start = self.pos;
        let left = self.parse_additive()?;
        if self.peek_kind() == TokenKind::DotDot {
            self.advance();
            let right = self.parse_additive()?;
            return Ok(Expr::Range { start: Box::new(left), end: Box::new(right), span: self.span_from(start) });
        }
        return Ok(left);
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_operator_text() {
                Some("+") => BinaryOp::Add,
                Some("-") => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span: self.span_from(start) };
        }
        return Ok(left);
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_operator_text() {
                Some("*") => BinaryOp::Multiply,
                Some("/") => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span: self.span_from(start) };
        }
        return Ok(left);
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let start = self.pos;
        if self.peek_operator_text() == Some("-") {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Negate, operand: Box::new(operand), span: self.span_from(start) });
        }
        if self.peek_operator_text() == Some("!") {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand), span: self.span_from(start) });
        }
        if self.peek_kind() == TokenKind::ChanSend {
            self.advance();
            let channel = self.expect_identifier()?;
            return Ok(Expr::ChannelRecv { channel, span: self.span_from(start) });
        }
        return self.parse_postfix();
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    if self.peek_kind() == TokenKind::ParenOpen {
                        self.advance();
                        let args = self.parse_args()?;
                        self.expect(TokenKind::ParenClose)?;
                        expr = Expr::MethodCall { receiver: Box::new(expr), method: name, args, span: self.span_from(start) };
                    } else {
                        expr = Expr::FieldAccess { receiver: Box::new(expr), field: name, span: self.span_from(start) };
                    }
                }
                TokenKind::BracketOpen => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::BracketClose)?;
                    expr = Expr::Index { array: Box::new(expr), index: Box::new(index), span: self.span_from(start) };
                }
                _ => break,
            }
        }
        return Ok(expr);
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let start = self.pos;
        return match self.peek_kind() {
            TokenKind::IntegerLiteral => {
                let text = self.advance_text();
                let value = text.parse::<i64>().map_err(|e| anyhow!("bad integer literal {text:?}: {e}"))?;
                Ok(Expr::IntegerLiteral { value, span: self.span_from(start) })
            }
            TokenKind::FloatLiteral => {
                let text = self.advance_text();
                let value = text.parse::<f64>().map_err(|e| anyhow!("bad float literal {text:?}: {e}"))?;
                Ok(Expr::FloatLiteral { value, span: self.span_from(start) })
            }
            TokenKind::StringLiteral => {
                let text = self.advance_text();
                let unquoted = text[1..text.len().saturating_sub(1)].to_string();
                Ok(Expr::StringLiteral { text: unquoted, span: self.span_from(start) })
            }
            TokenKind::BooleanLiteral => {
                let text = self.advance_text();
                Ok(Expr::BooleanLiteral { value: text == "true", span: self.span_from(start) })
            }
            TokenKind::BracketOpen => {
                self.advance();
                let mut elements = Vec::new();
                while self.peek_kind() != TokenKind::BracketClose {
                    elements.push(self.parse_expression()?);
                    if self.peek_kind() == TokenKind::Comma {
                        self.advance();
                    }
                }
                self.expect(TokenKind::BracketClose)?;
                Ok(Expr::ArrayLiteral { elements, span: self.span_from(start) })
            }
            TokenKind::ParenOpen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::ParenClose)?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                let name = self.advance_text();
                if name == "self" {
                    return Ok(Expr::SelfExpr { span: self.span_from(start) });
                }
                if self.peek_kind() == TokenKind::ParenOpen {
                    self.advance();
                    let args = self.parse_args()?;
                    self.expect(TokenKind::ParenClose)?;
                    return Ok(Expr::Call { callee: name, args, span: self.span_from(start) });
                }
                if self.peek_kind() == TokenKind::BraceOpen && self.looks_like_struct_literal() {
                    return self.parse_struct_literal(name, start);
                }
                Ok(Expr::Identifier { name, span: self.span_from(start) })
            }
            other => Err(anyhow!("unexpected token {:?} in expression at token {}", other, self.pos)),
        };
    }

    fn parse_struct_literal(&mut self, name: String, start: usize) -> Result<Expr> {
        self.expect(TokenKind::BraceOpen)?;
        let mut fields = Vec::new();
        while self.peek_kind() != TokenKind::BraceClose {
            let field_name = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push((field_name, value));
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            }
        }
        self.expect(TokenKind::BraceClose)?;
        return Ok(Expr::StructLiteral { name, fields, span: self.span_from(start) });
    }

    /// A `{` right after an identifier starts a struct literal unless we're
    /// inside a statement/condition context where `{` is a block; callers
    /// that want struct literals (assignment RHS, call args, array
    /// elements) reach `parse_primary` directly, while `if`/`for`/`while`
    /// conditions never call it with a bare leading identifier followed by
    /// `{` intending a struct literal ambiguity, since control-flow bodies
    /// always open with their own `{`. We disambiguate conservatively: a
    /// `{` followed by an identifier and a `:` is treated as a literal.
    fn looks_like_struct_literal(&self) -> bool {
        return self.peek_kind_at(1) == TokenKind::Identifier && self.peek_kind_at(2) == TokenKind::Colon;
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while self.peek_kind() != TokenKind::ParenClose {
            args.push(self.parse_expression()?);
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            }
        }
        return Ok(args);
    }

    // --- token-stream plumbing ---

    fn at_eof(&self) -> bool {
        return self.peek_kind() == TokenKind::Eof;
    }

    fn peek_kind(&self) -> TokenKind {
        return self.tokens[self.pos].kind.clone();
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        return self.tokens.get(self.pos + offset).map(|t| t.kind.clone()).unwrap_or(TokenKind::Eof);
    }

    fn peek_text(&self) -> &str {
        return self.tokens[self.pos].text.as_str();
    }

    fn peek_operator_text(&self) -> Option<&str> {
        if self.peek_kind() == TokenKind::Operator {
            return Some(self.tokens[self.pos].text.as_str());
        }
        return None;
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        return token;
    }

    fn advance_text(&mut self) -> String {
        return self.advance().text.clone();
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token> {
        if self.peek_kind() != kind {
            return Err(anyhow!("expected {:?} but found {:?} at token {}", kind, self.peek_kind(), self.pos));
        }
        return Ok(self.advance());
    }

    fn expect_identifier(&mut self) -> Result<String> {
        if self.peek_kind() != TokenKind::Identifier {
            return Err(anyhow!("expected an identifier but found {:?} at token {}", self.peek_kind(), self.pos));
        }
        return Ok(self.advance_text());
    }

    fn span_from(&self, start: usize) -> Span {
        let end = if self.pos == 0 { 0 } else { self.pos - 1 };
        return Span::new(self.file_id, start, end.max(start));
    }
}
