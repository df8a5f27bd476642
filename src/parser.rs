use crate::{
    ast::{BinaryOp, Branch, Expr, LineNumber, Literal, Stmt, UnaryOp},
    error::{Error, Result, SyntaxError},
    tokenizer::{Lexer, Token},
};
use log::debug;
use std::mem;

type ParseResult<T> = std::result::Result<T, SyntaxError>;

const LOWEST: u8 = 0;
const PREFIX: u8 = 4;

/// Parses one statement body (a source line with its line number stripped).
///
/// The parser keeps the token under the cursor plus one token of lookahead.
/// A failed parse yields no statement; the reasons are kept in
/// [`Parser::errors`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    errors: Vec<SyntaxError>,
}

/// Parses `source` as exactly one statement.
pub fn parse(source: &str) -> Result<Stmt> {
    let mut parser = Parser::new(source);
    parser.parse_statement().ok_or_else(|| Error::Parser {
        line: None,
        errors: parser.errors,
    })
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let peek = lexer.next_token();

        Parser {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn parse_statement(&mut self) -> Option<Stmt> {
        let result = self.statement().and_then(|stmt| {
            if !ends_in_comment(&stmt) && self.current != Token::EOF {
                return Err(SyntaxError::TrailingInput(describe(&self.current)));
            }
            Ok(stmt)
        });

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                debug!("syntax error: {}", err);
                self.errors.push(err);
                None
            }
        }
    }

    /// Consumes the current token and returns it.
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let peek = mem::replace(&mut self.peek, next);
        mem::replace(&mut self.current, peek)
    }

    fn check(&self, token: &Token) -> bool {
        self.current == *token
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match &self.current {
            // the rest of the line is commentary
            Token::Rem => {
                self.advance();
                Ok(Stmt::Comment)
            }
            Token::Let => {
                self.advance();
                self.assignment("LET")
            }
            Token::Identifier(_) if self.peek == Token::Equal => self.assignment("assignment"),
            Token::Identifier(name) => Err(SyntaxError::UnexpectedIdentifier(name.clone())),
            Token::Print => self.print(),
            Token::Input => {
                self.advance();
                let name = self.identifier("INPUT")?;
                Ok(Stmt::Input { name })
            }
            Token::If => self.if_statement(),
            Token::Goto => {
                self.advance();
                Ok(Stmt::Goto(self.line_number("GOTO")?))
            }
            Token::End => {
                self.advance();
                Ok(Stmt::End)
            }
            _ => Err(unexpected(&self.current)),
        }
    }

    fn assignment(&mut self, context: &'static str) -> ParseResult<Stmt> {
        let name = self.identifier(context)?;

        if !self.check(&Token::Equal) {
            return Err(SyntaxError::ExpectedEqual);
        }
        self.advance();

        let value = self.expression(LOWEST)?;
        Ok(Stmt::Assignment { name, value })
    }

    fn print(&mut self) -> ParseResult<Stmt> {
        self.advance(); // Skip 'PRINT'

        let mut exprs = Vec::new();
        if self.check(&Token::EOF) {
            return Ok(Stmt::Print(exprs));
        }

        exprs.push(self.expression(LOWEST)?);
        while self.check(&Token::Comma) {
            self.advance();
            exprs.push(self.expression(LOWEST)?);
        }

        Ok(Stmt::Print(exprs))
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.advance(); // Skip 'IF'

        let condition = self.expression(LOWEST)?;

        if !self.check(&Token::Then) {
            return Err(SyntaxError::ExpectedThen);
        }
        self.advance();

        // A lone number after THEN is a jump target, anything else is a statement
        if let (Token::Number(digits), Token::EOF) = (&self.current, &self.peek) {
            let line = parse_line_number(digits)?;
            self.advance();
            return Ok(Stmt::If {
                condition,
                then_branch: Branch::Jump(line),
            });
        }

        let stmt = self.statement()?;
        Ok(Stmt::If {
            condition,
            then_branch: Branch::Statement(Box::new(stmt)),
        })
    }

    fn identifier(&mut self, context: &'static str) -> ParseResult<String> {
        match self.advance() {
            Token::Identifier(name) => Ok(name),
            _ => Err(SyntaxError::ExpectedIdentifier(context)),
        }
    }

    fn line_number(&mut self, context: &'static str) -> ParseResult<LineNumber> {
        match self.advance() {
            Token::Number(digits) => parse_line_number(&digits),
            _ => Err(SyntaxError::ExpectedLineNumber(context)),
        }
    }

    fn expression(&mut self, precedence: u8) -> ParseResult<Expr> {
        let mut left = self.prefix()?;

        loop {
            let op_precedence = get_precedence(&self.current);
            if precedence >= op_precedence {
                break;
            }
            left = self.infix(left, op_precedence)?;
        }

        Ok(left)
    }

    fn prefix(&mut self) -> ParseResult<Expr> {
        match self.current {
            Token::Number(_) | Token::String(_) | Token::Identifier(_) => {
                match self.advance() {
                    // f64 parsing saturates to infinity instead of failing
                    Token::Number(digits) => digits
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .map(|n| Expr::Literal(Literal::Number(n)))
                        .ok_or(SyntaxError::InvalidNumber(digits)),
                    Token::String(text) => Ok(Expr::Literal(Literal::String(text))),
                    Token::Identifier(name) => Ok(Expr::Variable(name)),
                    _ => unreachable!(),
                }
            }
            Token::Plus | Token::Minus => {
                let operator = match self.advance() {
                    Token::Plus => UnaryOp::Plus,
                    _ => UnaryOp::Negate,
                };

                let right = self.expression(PREFIX)?;
                Ok(Expr::Unary {
                    operator,
                    right: Box::new(right),
                })
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.expression(LOWEST)?;

                if !self.check(&Token::RightParen) {
                    return Err(SyntaxError::ExpectedRightParen);
                }
                self.advance();

                Ok(expr)
            }
            _ => Err(unexpected(&self.current)),
        }
    }

    fn infix(&mut self, left: Expr, precedence: u8) -> ParseResult<Expr> {
        let operator = match self.advance() {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Subtract,
            Token::Star => BinaryOp::Multiply,
            Token::Slash => BinaryOp::Divide,
            Token::Equal => BinaryOp::Equal,
            Token::NotEqual => BinaryOp::NotEqual,
            Token::Less => BinaryOp::Less,
            Token::LessEqual => BinaryOp::LessEqual,
            Token::Greater => BinaryOp::Greater,
            Token::GreaterEqual => BinaryOp::GreaterEqual,
            _ => unreachable!("infix called on a token without binding power"),
        };

        let right = self.expression(precedence)?;
        Ok(Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }
}

fn get_precedence(token: &Token) -> u8 {
    match token {
        Token::Star | Token::Slash => 3,
        Token::Plus | Token::Minus => 2,
        Token::Equal
        | Token::NotEqual
        | Token::Less
        | Token::LessEqual
        | Token::Greater
        | Token::GreaterEqual => 1,
        _ => LOWEST,
    }
}

fn parse_line_number(literal: &str) -> ParseResult<LineNumber> {
    match literal.parse::<LineNumber>() {
        Ok(line) if line > 0 => Ok(line),
        _ => Err(SyntaxError::InvalidLineNumber(literal.to_string())),
    }
}

fn ends_in_comment(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Comment => true,
        Stmt::If {
            then_branch: Branch::Statement(stmt),
            ..
        } => ends_in_comment(stmt),
        _ => false,
    }
}

fn unexpected(token: &Token) -> SyntaxError {
    match token {
        Token::Illegal(text) => SyntaxError::IllegalToken(text.clone()),
        _ => SyntaxError::UnexpectedToken(describe(token)),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::EOF => "end of line".to_string(),
        _ => format!("'{}'", token),
    }
}
