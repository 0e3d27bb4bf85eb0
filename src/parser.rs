use std::fmt::{Display, Formatter};

use log::debug;

use crate::error::{ErrorReporter, LoxError};
use crate::expr::{Expr, Stmt};
use crate::scanner::{Literal, Token, TokenType};

enum CallableKind {
    Function,
    Method,
}

impl Display for CallableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Function => "function",
            Self::Method => "method",
        };
        write!(f, "{}", s)
    }
}

/// Recursive-descent parser with one-token lookahead. Errors are pushed
/// to the reporter and recovered at the next statement boundary, so one
/// pass can surface several of them; the caller must not execute the
/// returned program if the reporter is non-empty.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    next_id: &'a mut usize,
    reporter: &'a mut ErrorReporter,
}

impl<'a> Parser<'a> {
    pub fn new(
        mut tokens: Vec<Token>,
        repl: bool,
        next_id: &'a mut usize,
        reporter: &'a mut ErrorReporter,
    ) -> Self {
        // REPL nicety: a bare expression is wrapped in `print ... ;` so
        // typing `1 + 2` echoes the result.
        let len = tokens.len();
        if repl && len >= 2 {
            let last = &tokens[len - 2];
            if last.token_type != TokenType::Semicolon && last.token_type != TokenType::RightBrace
            {
                let line = tokens[len - 1].line;
                tokens.insert(
                    len - 1,
                    Token {
                        token_type: TokenType::Semicolon,
                        lexeme: ";".to_string(),
                        line,
                    },
                );
                tokens.insert(
                    0,
                    Token {
                        token_type: TokenType::Print,
                        lexeme: "print".to_string(),
                        line: tokens[0].line,
                    },
                );
            }
        }
        Self {
            tokens,
            current: 0,
            next_id,
            reporter,
        }
    }

    fn get_id(&mut self) -> usize {
        let id = *self.next_id;
        *self.next_id += 1;
        id
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = vec![];
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_(&[TokenType::Class]) {
            self.class_declaration()
        } else if self.match_(&[TokenType::Fun]) {
            self.function(CallableKind::Function)
        } else if self.match_(&[TokenType::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.reporter.report(error);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self
            .consume(&TokenType::Identifier, "Expect class name.")?
            .clone();
        let superclass = if self.match_(&[TokenType::Less]) {
            let superclass_name = self
                .consume(&TokenType::Identifier, "Expect superclass name.")?
                .clone();
            Some(Expr::Variable {
                name: superclass_name,
                id: self.get_id(),
            })
        } else {
            None
        };
        self.consume(&TokenType::LeftBrace, "Expect '{' before class body.")?;
        let mut methods = vec![];
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            methods.push(self.function(CallableKind::Method)?);
        }
        self.consume(&TokenType::RightBrace, "Expect '}' after class body.")?;
        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: CallableKind) -> Result<Stmt, LoxError> {
        let name = self
            .consume(&TokenType::Identifier, &format!("Expect {} name.", kind))?
            .clone();
        self.consume(
            &TokenType::LeftParen,
            &format!("Expect '(' after {} name.", kind),
        )?;
        let mut params = vec![];
        if !self.check(&TokenType::RightParen) {
            loop {
                if params.len() >= 255 {
                    let token = self.peek().clone();
                    self.reporter
                        .report(LoxError::parse(&token, "Can't have more than 255 parameters."));
                }
                params.push(
                    self.consume(&TokenType::Identifier, "Expect parameter name.")?
                        .clone(),
                );
                if !self.match_(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(&TokenType::RightParen, "Expect ')' after parameters.")?;
        self.consume(
            &TokenType::LeftBrace,
            &format!("Expect '{{' before {} body.", kind),
        )?;
        let body = self.block()?;
        Ok(Stmt::Function { name, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self
            .consume(&TokenType::Identifier, "Expect variable name.")?
            .clone();
        let initializer = if self.match_(&[TokenType::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt, LoxError> {
        if self.match_(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_(&[TokenType::LeftBrace]) {
            Ok(Stmt::Block {
                statements: self.block()?,
            })
        } else {
            self.expression_statement()
        }
    }

    /// `for` has no AST node of its own; it desugars to the equivalent
    /// `Block`/`While` form here.
    fn for_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LeftParen, "Expect '(' after 'for'.")?;
        let initializer = if self.match_(&[TokenType::Semicolon]) {
            None
        } else if self.match_(&[TokenType::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };
        let condition = if !self.check(&TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::Semicolon, "Expect ';' after loop condition.")?;
        let increment = if !self.check(&TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(increment) = increment {
            body = Stmt::Block {
                statements: vec![body, Stmt::Expression(increment)],
            };
        }
        let condition = condition.unwrap_or(Expr::Literal(Literal::Boolean(true)));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            body = Stmt::Block {
                statements: vec![initializer, body],
            };
        }
        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, LoxError> {
        let value = self.expression()?;
        self.consume(&TokenType::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt, LoxError> {
        let keyword = self.previous().clone();
        let value = if !self.check(&TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut statements = vec![];
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(&TokenType::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr = self.expression()?;
        self.consume(&TokenType::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> Result<Expr, LoxError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, LoxError> {
        let expr = self.or()?;
        if self.match_(&[TokenType::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;
            return Ok(match expr {
                Expr::Variable { name, id } => Expr::Assign {
                    name,
                    value: Box::new(value),
                    id,
                },
                Expr::Get { object, name } => Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                },
                other => {
                    // Reported but not fatal; parsing carries on with
                    // the left-hand side.
                    self.reporter
                        .report(LoxError::parse(&equals, "Invalid assignment target."));
                    other
                }
            });
        }
        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.and()?;
        while self.match_(&[TokenType::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.equality()?;
        while self.match_(&[TokenType::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.comparison()?;
        while self.match_(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.term()?;
        while self.match_(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.factor()?;
        while self.match_(&[TokenType::Minus, TokenType::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.unary()?;
        while self.match_(&[TokenType::Slash, TokenType::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, LoxError> {
        if self.match_(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.primary()?;
        loop {
            if self.match_(&[TokenType::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_(&[TokenType::Dot]) {
                let name = self
                    .consume(&TokenType::Identifier, "Expect property name after '.'.")?
                    .clone();
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, LoxError> {
        let mut args = vec![];
        if !self.check(&TokenType::RightParen) {
            loop {
                if args.len() >= 255 {
                    let token = self.peek().clone();
                    self.reporter
                        .report(LoxError::parse(&token, "Can't have more than 255 arguments."));
                }
                args.push(self.expression()?);
                if !self.match_(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        let paren = self
            .consume(&TokenType::RightParen, "Expect ')' after arguments.")?
            .clone();
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            args,
        })
    }

    fn primary(&mut self) -> Result<Expr, LoxError> {
        if self.match_(&[TokenType::False]) {
            return Ok(Expr::Literal(Literal::Boolean(false)));
        }
        if self.match_(&[TokenType::True]) {
            return Ok(Expr::Literal(Literal::Boolean(true)));
        }
        if self.match_(&[TokenType::Nil]) {
            return Ok(Expr::Literal(Literal::Nil));
        }
        match &self.peek().token_type {
            TokenType::Number(value) => {
                let value = *value;
                self.advance();
                return Ok(Expr::Literal(Literal::Number(value)));
            }
            TokenType::String(value) => {
                let value = value.clone();
                self.advance();
                return Ok(Expr::Literal(Literal::String(value)));
            }
            _ => {}
        }
        if self.match_(&[TokenType::Super]) {
            let keyword = self.previous().clone();
            self.consume(&TokenType::Dot, "Expect '.' after 'super'.")?;
            let method = self
                .consume(&TokenType::Identifier, "Expect superclass method name.")?
                .clone();
            return Ok(Expr::Super {
                keyword,
                method,
                id: self.get_id(),
            });
        }
        if self.match_(&[TokenType::This]) {
            return Ok(Expr::This {
                keyword: self.previous().clone(),
                id: self.get_id(),
            });
        }
        if self.match_(&[TokenType::Identifier]) {
            return Ok(Expr::Variable {
                name: self.previous().clone(),
                id: self.get_id(),
            });
        }
        if self.match_(&[TokenType::LeftParen]) {
            let expr = self.expression()?;
            self.consume(&TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }
        Err(LoxError::parse(self.peek(), "Expect expression."))
    }

    fn match_(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<&Token, LoxError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(LoxError::parse(self.peek(), message))
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().token_type == *token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until the next statement boundary so one syntax
    /// error does not cascade into a dozen spurious ones.
    fn synchronize(&mut self) {
        debug!("synchronizing parser at line {}", self.peek().line);
        self.advance();
        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }
            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }
            self.advance();
        }
    }
}
