//! Parsing functionality for FlexScript.
//!
//! Parsing happens in two layers: a [`Lexer`] that turns characters into
//! [`Token`]s, and a recursive descent [`Parser`] that turns tokens into a
//! [`Program`]. Identifiers are resolved while parsing, so a successfully
//! parsed program only refers to its own locals, its inputs and builtins.

use core::marker::PhantomData;

use crate::{
    builtins::Builtin,
    encoding::{Decoder, Location, Utf8Decoder},
    prelude::*,
    Error, Number, ParseError, Value,
};

/// How deeply expressions may nest before parsing is aborted. This bounds
/// the recursion depth of both parsing and evaluation, and is kept low
/// enough for both to fit on a default 2 MiB thread stack.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(Number),
    String(String),
    Ident(String),
    Let,
    Const,
    Return,
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    QuestionDot,
    Colon,
    Semicolon,
    Question,
    QuestionQuestion,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number {}", n),
            Self::String(s) => format!("string {:?}", s),
            Self::Ident(name) => format!("identifier \"{}\"", name),
            Self::Eof => "end of script".to_string(),
            other => format!("{:?}", other),
        }
    }
}

pub type Utf8Lexer<'a> = Lexer<'a, Utf8Decoder<'a>>;

/// Splits a script into tokens, discarding whitespace and comments.
#[derive(Debug)]
pub struct Lexer<'a, D> {
    decoder: D,
    _src: PhantomData<&'a str>,
}

impl<'a> From<&'a str> for Utf8Lexer<'a> {
    fn from(s: &'a str) -> Self {
        Self {
            decoder: Utf8Decoder::from(s),
            _src: PhantomData,
        }
    }
}

impl<'a, D: Decoder> Lexer<'a, D> {
    /// Produces the next token along with the location at which it starts.
    pub fn next_token(&mut self) -> Result<(Token, Location), Error> {
        self.skip_whitespace_and_comments()?;
        let location = self.decoder.location();
        let ch = match self.decoder.next() {
            Some(ch) => ch,
            None => return Ok((Token::Eof, location)),
        };
        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            '.' => Token::Dot,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '?' => {
                if self.consume_if('.') {
                    Token::QuestionDot
                } else if self.consume_if('?') {
                    Token::QuestionQuestion
                } else {
                    Token::Question
                }
            }
            '!' => {
                if self.consume_if('=') {
                    // Strict and loose inequality mean the same thing here.
                    let _ = self.consume_if('=');
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            '=' => {
                if self.consume_if('=') {
                    let _ = self.consume_if('=');
                    Token::EqEq
                } else {
                    Token::Assign
                }
            }
            '<' => {
                if self.consume_if('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.consume_if('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' => {
                if self.consume_if('&') {
                    Token::AndAnd
                } else {
                    return Err(Error::parse(location, ParseError::UnexpectedChar(ch)));
                }
            }
            '|' => {
                if self.consume_if('|') {
                    Token::OrOr
                } else {
                    return Err(Error::parse(location, ParseError::UnexpectedChar(ch)));
                }
            }
            '"' | '\'' => self.parse_string(ch, location)?,
            '0'..='9' => self.parse_number(ch, location)?,
            ch if is_ident_start(ch) => self.parse_ident(ch),
            _ => return Err(Error::parse(location, ParseError::UnexpectedChar(ch))),
        };
        Ok((token, location))
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if self.decoder.peek() == Some(expected) {
            let _ = self.decoder.next();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), Error> {
        loop {
            match self.decoder.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    let _ = self.decoder.next();
                }
                Some('/') => {
                    // We need to look two characters ahead to tell a comment
                    // from a division.
                    match self.decoder.peek_second() {
                        Some('/') => self.skip_single_line_comment(),
                        Some('*') => self.skip_multiline_comment()?,
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_single_line_comment(&mut self) {
        for ch in self.decoder.by_ref() {
            if ch == '\n' {
                return;
            }
        }
    }

    fn skip_multiline_comment(&mut self) -> Result<(), Error> {
        let start = self.decoder.location();
        // Consume the opening delimiter.
        let _ = self.decoder.next();
        let _ = self.decoder.next();
        let mut lookahead = ['\0'; 2];
        for ch in self.decoder.by_ref() {
            lookahead[0] = lookahead[1];
            lookahead[1] = ch;
            if lookahead == ['*', '/'] {
                return Ok(());
            }
        }
        Err(Error::parse(start, ParseError::UnterminatedComment))
    }

    fn parse_string(&mut self, delim: char, start: Location) -> Result<Token, Error> {
        let mut value = String::new();
        while let Some(ch) = self.decoder.next() {
            match ch {
                '\\' => value.push(self.parse_escape_seq()?),
                '\n' => break,
                ch if ch == delim => return Ok(Token::String(value)),
                _ => value.push(ch),
            }
        }
        Err(Error::parse(start, ParseError::UnterminatedString))
    }

    fn parse_escape_seq(&mut self) -> Result<char, Error> {
        let location = self.decoder.location();
        let escape_type = self
            .decoder
            .next()
            .ok_or_else(|| Error::parse(location, ParseError::UnterminatedString))?;
        Ok(match escape_type {
            '"' => '"',
            '\'' => '\'',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '0' => '\0',
            _ => {
                return Err(Error::parse(
                    location,
                    ParseError::InvalidEscapeSequence(escape_type),
                ))
            }
        })
    }

    fn parse_number(&mut self, first_char: char, start: Location) -> Result<Token, Error> {
        let mut s = String::new();
        s.push(first_char);
        if first_char == '0' && self.consume_if('x') {
            s.push('x');
            self.push_while(&mut s, |ch| ch.is_ascii_hexdigit());
        } else {
            self.push_while(&mut s, |ch| ch.is_ascii_digit());
            if self.consume_if('.') {
                s.push('.');
                self.push_while(&mut s, |ch| ch.is_ascii_digit());
            }
        }
        // Catch things like `12abc` here rather than as a confusing sequence
        // of tokens.
        if let Some(ch) = self.decoder.peek() {
            if is_ident_continue(ch) {
                self.push_while(&mut s, is_ident_continue);
                return Err(Error::parse(start, ParseError::InvalidNumber(s)));
            }
        }
        s.parse::<Number>()
            .map(Token::Number)
            .map_err(|e| Error::parse(start, e))
    }

    fn parse_ident(&mut self, first_char: char) -> Token {
        let mut name = String::new();
        name.push(first_char);
        self.push_while(&mut name, is_ident_continue);
        match name.as_str() {
            "let" => Token::Let,
            "const" => Token::Const,
            "return" => Token::Return,
            "true" => Token::True,
            "false" => Token::False,
            "null" | "undefined" => Token::Null,
            _ => Token::Ident(name),
        }
    }

    fn push_while(&mut self, s: &mut String, pred: fn(char) -> bool) {
        while let Some(ch) = self.decoder.peek() {
            if !pred(ch) {
                return;
            }
            s.push(ch);
            let _ = self.decoder.next();
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// The inputs available to every script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Id,
    Value,
    Metadata,
    Tags,
}

impl Input {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "id" => Self::Id,
            "value" => Self::Value,
            "metadata" | "meta" => Self::Metadata,
            "tags" => Self::Tags,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Operators that may skip evaluating their right hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Input(Input),
    /// A `let`-bound local, by slot.
    Local(usize),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Member {
        target: Box<Expr>,
        name: String,
        optional: bool,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// A builtin call. Method-style calls pass their receiver as the first
    /// argument; `optional` is set for `receiver?.method()`.
    Call {
        builtin: Builtin,
        args: Vec<Expr>,
        optional: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// A member/index/call chain containing `?.`. The whole chain is `null`
    /// as soon as an optional link finds a `null` receiver.
    OptionalChain(Box<Expr>),
}

/// A parsed script: zero or more locals followed by an optional result
/// expression. Local `i` may only refer to locals `0..i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub locals: Vec<Expr>,
    pub result: Option<Expr>,
}

pub type Utf8Parser<'a> = Parser<'a, Utf8Decoder<'a>>;

#[derive(Debug)]
pub struct Parser<'a, D> {
    lexer: Lexer<'a, D>,
    token: Token,
    location: Location,
    locals: Vec<String>,
    depth: usize,
}

impl<'a> Utf8Parser<'a> {
    pub fn new(src: &'a str) -> Result<Self, Error> {
        let mut lexer = Utf8Lexer::from(src);
        let (token, location) = lexer.next_token()?;
        Ok(Self {
            lexer,
            token,
            location,
            locals: Vec::new(),
            depth: 0,
        })
    }
}

impl<'a, D: Decoder> Parser<'a, D> {
    /// Parses the whole script.
    pub fn parse_program(mut self) -> Result<Program, Error> {
        let mut program = Program::default();
        loop {
            match self.token {
                Token::Let | Token::Const => {
                    self.advance()?;
                    let expr = self.parse_let()?;
                    program.locals.push(expr);
                    let _ = self.eat(&Token::Semicolon)?;
                }
                Token::Eof => return Ok(program),
                Token::Return => {
                    self.advance()?;
                    program.result = Some(match self.token {
                        Token::Eof | Token::Semicolon => Expr::Literal(Value::Null),
                        _ => self.parse_expr()?,
                    });
                    break;
                }
                _ => {
                    program.result = Some(self.parse_expr()?);
                    break;
                }
            }
        }
        let _ = self.eat(&Token::Semicolon)?;
        self.expect(&Token::Eof, "end of script")?;
        Ok(program)
    }

    fn parse_let(&mut self) -> Result<Expr, Error> {
        let location = self.location;
        let name = match &self.token {
            Token::Ident(name) => name.clone(),
            other => return Err(self.unexpected("identifier", other.clone())),
        };
        if Input::lookup(&name).is_some() {
            return Err(Error::parse(location, ParseError::ReservedIdentifier(name)));
        }
        if self.locals.contains(&name) {
            return Err(Error::parse(location, ParseError::DuplicateLocal(name)));
        }
        self.advance()?;
        self.expect(&Token::Assign, "\"=\"")?;
        let expr = self.parse_expr()?;
        // The local only comes into scope after its own definition.
        self.locals.push(name);
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.enter()?;
        let result = self.parse_conditional();
        self.leave(1);
        result
    }

    fn parse_conditional(&mut self) -> Result<Expr, Error> {
        let cond = self.parse_infix(0)?;
        if !self.eat(&Token::Question)? {
            return Ok(cond);
        }
        let then = self.parse_expr()?;
        self.expect(&Token::Colon, "\":\"")?;
        let otherwise = self.parse_expr()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    // Precedence climbing over all left-associative infix operators. Only
    // operators binding tighter than the one to our left recurse, so a
    // parenthesized operand costs a handful of frames rather than one per
    // precedence level.
    fn parse_infix(&mut self, min_precedence: u8) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        let mut chained = 0;
        while let Some((precedence, op)) = infix_op(&self.token) {
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            self.enter()?;
            chained += 1;
            let right = self.parse_infix(precedence + 1)?;
            left = op.apply(left, right);
        }
        self.leave(chained);
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let op = match self.token {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance()?;
        self.enter()?;
        let operand = self.parse_unary();
        self.leave(1);
        let operand = operand?;
        // Fold negative literals so `-5` is a plain number.
        if let (UnaryOp::Neg, Expr::Literal(Value::Number(n))) = (op, &operand) {
            if let Ok(negated) = n.checked_neg() {
                return Ok(Expr::Literal(Value::Number(negated)));
            }
        }
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;
        let mut chained = 0;
        let mut short_circuits = false;
        loop {
            let optional = match self.token {
                Token::Dot => false,
                Token::QuestionDot => true,
                Token::LBracket => {
                    self.advance()?;
                    self.enter()?;
                    chained += 1;
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket, "\"]\"")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                    continue;
                }
                _ => break,
            };
            short_circuits |= optional;
            self.advance()?;
            self.enter()?;
            chained += 1;
            let location = self.location;
            let name = match &self.token {
                Token::Ident(name) => name.clone(),
                other => return Err(self.unexpected("property name", other.clone())),
            };
            self.advance()?;
            expr = if self.token == Token::LParen {
                let builtin = Builtin::lookup(&name)
                    .ok_or_else(|| Error::parse(location, ParseError::UnknownFunction(name)))?;
                let mut args = vec![expr];
                args.extend(self.parse_args()?);
                self.check_arity(builtin, args.len(), location)?;
                Expr::Call {
                    builtin,
                    args,
                    optional,
                }
            } else {
                Expr::Member {
                    target: Box::new(expr),
                    name,
                    optional,
                }
            };
        }
        self.leave(chained);
        if short_circuits {
            expr = Expr::OptionalChain(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let location = self.location;
        let token = core::mem::replace(&mut self.token, Token::Eof);
        self.advance()?;
        Ok(match token {
            Token::Number(n) => Expr::Literal(Value::Number(n)),
            Token::String(s) => Expr::Literal(Value::String(s)),
            Token::True => Expr::Literal(Value::Boolean(true)),
            Token::False => Expr::Literal(Value::Boolean(false)),
            Token::Null => Expr::Literal(Value::Null),
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen, "\")\"")?;
                expr
            }
            Token::LBracket => {
                let items = self.parse_list(&Token::RBracket, "\",\" or \"]\"")?;
                Expr::Array(items)
            }
            Token::LBrace => self.parse_object()?,
            Token::Ident(name) => {
                if self.token == Token::LParen {
                    let builtin = Builtin::lookup(&name)
                        .ok_or_else(|| Error::parse(location, ParseError::UnknownFunction(name)))?;
                    let args = self.parse_args()?;
                    self.check_arity(builtin, args.len(), location)?;
                    Expr::Call {
                        builtin,
                        args,
                        optional: false,
                    }
                } else if let Some(slot) = self.locals.iter().rposition(|local| *local == name) {
                    Expr::Local(slot)
                } else if let Some(input) = Input::lookup(&name) {
                    Expr::Input(input)
                } else {
                    return Err(Error::parse(location, ParseError::UnknownIdentifier(name)));
                }
            }
            Token::Eof => return Err(Error::parse(location, ParseError::UnexpectedEof)),
            other => return Err(Error::parse(location, unexpected_token("expression", &other))),
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, Error> {
        self.expect(&Token::LParen, "\"(\"")?;
        self.parse_list(&Token::RParen, "\",\" or \")\"")
    }

    // Parses comma-separated expressions up to and including the closing
    // token. A trailing comma is allowed.
    fn parse_list(&mut self, close: &Token, expected: &'static str) -> Result<Vec<Expr>, Error> {
        let mut items = Vec::new();
        loop {
            if self.eat(close)? {
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma)? {
                self.expect(close, expected)?;
                return Ok(items);
            }
        }
    }

    fn parse_object(&mut self) -> Result<Expr, Error> {
        let mut props: Vec<(String, Expr)> = Vec::new();
        loop {
            if self.eat(&Token::RBrace)? {
                break;
            }
            let key = match &self.token {
                Token::Ident(key) | Token::String(key) => key.clone(),
                other => return Err(self.unexpected("property name", other.clone())),
            };
            self.advance()?;
            self.expect(&Token::Colon, "\":\"")?;
            let value = self.parse_expr()?;
            // Later definitions win, as in JavaScript object literals.
            props.retain(|(k, _)| *k != key);
            props.push((key, value));
            if !self.eat(&Token::Comma)? {
                self.expect(&Token::RBrace, "\",\" or \"}\"")?;
                break;
            }
        }
        Ok(Expr::Object(props))
    }

    fn check_arity(&self, builtin: Builtin, got: usize, location: Location) -> Result<(), Error> {
        let (min, max) = builtin.arity();
        if got < min || got > max {
            return Err(Error::parse(
                location,
                ParseError::WrongArgumentCount {
                    function: builtin.name(),
                    min,
                    max,
                    got,
                },
            ));
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<(), Error> {
        let (token, location) = self.lexer.next_token()?;
        self.token = token;
        self.location = location;
        Ok(())
    }

    fn eat(&mut self, token: &Token) -> Result<bool, Error> {
        if self.token == *token {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), Error> {
        if self.eat(token)? {
            Ok(())
        } else {
            Err(self.unexpected(expected, self.token.clone()))
        }
    }

    fn unexpected(&self, expected: &'static str, found: Token) -> Error {
        Error::parse(self.location, unexpected_token(expected, &found))
    }

    fn enter(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::parse(
                self.location,
                ParseError::TooDeeplyNested {
                    max_depth: MAX_DEPTH,
                },
            ));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }
}

fn unexpected_token(expected: &'static str, found: &Token) -> ParseError {
    match found {
        Token::Eof => ParseError::UnexpectedEof,
        _ => ParseError::UnexpectedToken {
            expected,
            found: found.describe(),
        },
    }
}

#[derive(Debug, Clone, Copy)]
enum InfixOp {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

impl InfixOp {
    fn apply(self, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Self::Logical(op) => Expr::Logical { op, left, right },
            Self::Binary(op) => Expr::Binary { op, left, right },
        }
    }
}

// Precedence of each infix operator, loosest first.
fn infix_op(token: &Token) -> Option<(u8, InfixOp)> {
    use InfixOp::{Binary, Logical};
    Some(match token {
        Token::QuestionQuestion => (0, Logical(LogicalOp::Coalesce)),
        Token::OrOr => (1, Logical(LogicalOp::Or)),
        Token::AndAnd => (2, Logical(LogicalOp::And)),
        Token::EqEq => (3, Binary(BinaryOp::Eq)),
        Token::NotEq => (3, Binary(BinaryOp::NotEq)),
        Token::Lt => (4, Binary(BinaryOp::Lt)),
        Token::Le => (4, Binary(BinaryOp::Le)),
        Token::Gt => (4, Binary(BinaryOp::Gt)),
        Token::Ge => (4, Binary(BinaryOp::Ge)),
        Token::Plus => (5, Binary(BinaryOp::Add)),
        Token::Minus => (5, Binary(BinaryOp::Sub)),
        Token::Star => (6, Binary(BinaryOp::Mul)),
        Token::Slash => (6, Binary(BinaryOp::Div)),
        Token::Percent => (6, Binary(BinaryOp::Rem)),
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use fixed_macro::fixed;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref TOKENS: Vec<(&'static str, Vec<Token>)> = vec![
            (
                "return true",
                vec![Token::Return, Token::True, Token::Eof],
            ),
            (
                "a?.b ?? c?d:e",
                vec![
                    Token::Ident("a".to_string()),
                    Token::QuestionDot,
                    Token::Ident("b".to_string()),
                    Token::QuestionQuestion,
                    Token::Ident("c".to_string()),
                    Token::Question,
                    Token::Ident("d".to_string()),
                    Token::Colon,
                    Token::Ident("e".to_string()),
                    Token::Eof,
                ],
            ),
            (
                "x === 1 !== y != 2 == z",
                vec![
                    Token::Ident("x".to_string()),
                    Token::EqEq,
                    Token::Number(Number::Unsigned(1)),
                    Token::NotEq,
                    Token::Ident("y".to_string()),
                    Token::NotEq,
                    Token::Number(Number::Unsigned(2)),
                    Token::EqEq,
                    Token::Ident("z".to_string()),
                    Token::Eof,
                ],
            ),
            (
                "3.25 / 0xFF % 7",
                vec![
                    Token::Number(Number::Fixed(fixed!(3.25: I64F64))),
                    Token::Slash,
                    Token::Number(Number::Unsigned(255)),
                    Token::Percent,
                    Token::Number(Number::Unsigned(7)),
                    Token::Eof,
                ],
            ),
        ];
        static ref STRINGS: Vec<(&'static str, &'static str)> = vec![
            (r#""Test string""#, "Test string"),
            (r#"'single quoted'"#, "single quoted"),
            (r#""It's \"quoted\"""#, "It's \"quoted\""),
            (r#"'tab\there\nnewline'"#, "tab\there\nnewline"),
            (r#""back\\slash""#, "back\\slash"),
        ];
        static ref COMMENTS: Vec<(&'static str, Vec<Token>)> = vec![
            (
                r#"// Single-line comment
// across multiple lines.
/* Followed by a
 * multi-line
 * comment. */
true"#,
                vec![Token::True, Token::Eof],
            ),
            (
                "6 /* inline */ / 2 // trailing",
                vec![
                    Token::Number(Number::Unsigned(6)),
                    Token::Slash,
                    Token::Number(Number::Unsigned(2)),
                    Token::Eof,
                ],
            ),
        ];
    }

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Utf8Lexer::from(src);
        let mut result = Vec::new();
        loop {
            let (token, _) = lexer.next_token().unwrap();
            let done = token == Token::Eof;
            result.push(token);
            if done {
                return result;
            }
        }
    }

    fn parse(src: &str) -> Result<Program, Error> {
        Utf8Parser::new(src)?.parse_program()
    }

    fn parse_err(src: &str) -> (Location, ParseError) {
        match parse(src) {
            Err(Error::Parse { location, err }) => (location, err),
            other => panic!("expected a parse error for {:?}, got {:?}", src, other),
        }
    }

    #[test]
    fn token_streams() {
        for (i, (test_case, expected)) in TOKENS.iter().enumerate() {
            assert_eq!(tokens(test_case), *expected, "test case {}", i);
        }
    }

    #[test]
    fn strings() {
        for (i, (test_case, expected)) in STRINGS.iter().enumerate() {
            assert_eq!(
                tokens(test_case),
                vec![Token::String(expected.to_string()), Token::Eof],
                "test case {}",
                i
            );
        }
    }

    #[test]
    fn comments() {
        for (i, (test_case, expected)) in COMMENTS.iter().enumerate() {
            assert_eq!(tokens(test_case), *expected, "test case {}", i);
        }
    }

    #[test]
    fn lexer_errors() {
        let mut lexer = Utf8Lexer::from("\n  'open");
        match lexer.next_token() {
            Err(Error::Parse { location, err }) => {
                assert_eq!(location, Location { line: 2, column: 3 });
                assert_eq!(err, ParseError::UnterminatedString);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        let mut lexer = Utf8Lexer::from("12abc");
        assert!(matches!(
            lexer.next_token(),
            Err(Error::Parse {
                err: ParseError::InvalidNumber(_),
                ..
            })
        ));
        let mut lexer = Utf8Lexer::from("a # b");
        let _ = lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(Error::Parse {
                err: ParseError::UnexpectedChar('#'),
                ..
            })
        ));
    }

    #[test]
    fn precedence() {
        let program = parse("return 1 + 2 * 3 == 7 && !false").unwrap();
        let expected = Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Eq,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(Expr::Literal(Value::from(1_u64))),
                    right: Box::new(Expr::Binary {
                        op: BinaryOp::Mul,
                        left: Box::new(Expr::Literal(Value::from(2_u64))),
                        right: Box::new(Expr::Literal(Value::from(3_u64))),
                    }),
                }),
                right: Box::new(Expr::Literal(Value::from(7_u64))),
            }),
            right: Box::new(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Literal(Value::Boolean(false))),
            }),
        };
        assert_eq!(program.result, Some(expected));
    }

    #[test]
    fn operators_associate_left() {
        let lit = |n: u64| Box::new(Expr::Literal(Value::from(n)));
        let program = parse("8 - 4 - 2").unwrap();
        assert_eq!(
            program.result,
            Some(Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: lit(8),
                    right: lit(4),
                }),
                right: lit(2),
            })
        );

        let program = parse("id ?? value || tags").unwrap();
        assert_eq!(
            program.result,
            Some(Expr::Logical {
                op: LogicalOp::Coalesce,
                left: Box::new(Expr::Input(Input::Id)),
                right: Box::new(Expr::Logical {
                    op: LogicalOp::Or,
                    left: Box::new(Expr::Input(Input::Value)),
                    right: Box::new(Expr::Input(Input::Tags)),
                }),
            })
        );
    }

    #[test]
    fn locals_and_inputs_resolve() {
        let program = parse("let w = meta.width; const h = w * 2; return h > value").unwrap();
        assert_eq!(program.locals.len(), 2);
        assert_eq!(
            program.locals[0],
            Expr::Member {
                target: Box::new(Expr::Input(Input::Metadata)),
                name: "width".to_string(),
                optional: false,
            }
        );
        assert_eq!(
            program.result,
            Some(Expr::Binary {
                op: BinaryOp::Gt,
                left: Box::new(Expr::Local(1)),
                right: Box::new(Expr::Input(Input::Value)),
            })
        );
    }

    #[test]
    fn method_calls_desugar_to_builtins() {
        let program = parse("tags?.includes('cat')").unwrap();
        assert_eq!(
            program.result,
            Some(Expr::OptionalChain(Box::new(Expr::Call {
                builtin: Builtin::Includes,
                args: vec![
                    Expr::Input(Input::Tags),
                    Expr::Literal(Value::from("cat")),
                ],
                optional: true,
            })))
        );
    }

    #[test]
    fn empty_scripts() {
        assert_eq!(parse("").unwrap(), Program::default());
        assert_eq!(parse("  // nothing\n").unwrap(), Program::default());
        assert_eq!(
            parse("return;").unwrap().result,
            Some(Expr::Literal(Value::Null))
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        let (location, err) = parse_err("return window.location");
        assert_eq!(location, Location { line: 1, column: 8 });
        assert_eq!(err, ParseError::UnknownIdentifier("window".to_string()));

        let (_, err) = parse_err("eval('1 + 1')");
        assert_eq!(err, ParseError::UnknownFunction("eval".to_string()));

        let (_, err) = parse_err("id.constructor('x')");
        assert_eq!(err, ParseError::UnknownFunction("constructor".to_string()));

        // Locals are not in scope within their own definition.
        let (_, err) = parse_err("let x = x + 1; x");
        assert_eq!(err, ParseError::UnknownIdentifier("x".to_string()));
    }

    #[test]
    fn invalid_locals() {
        let (_, err) = parse_err("let tags = 1; tags");
        assert_eq!(err, ParseError::ReservedIdentifier("tags".to_string()));
        let (_, err) = parse_err("let a = 1; let a = 2; a");
        assert_eq!(err, ParseError::DuplicateLocal("a".to_string()));
    }

    #[test]
    fn arity_is_checked() {
        let (_, err) = parse_err("lower()");
        assert_eq!(
            err,
            ParseError::WrongArgumentCount {
                function: "lower",
                min: 1,
                max: 1,
                got: 0,
            }
        );
    }

    #[test]
    fn trailing_garbage() {
        let (_, err) = parse_err("return 1; return 2");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        let (_, err) = parse_err("(1 + 2");
        assert_eq!(err, ParseError::UnexpectedEof);
    }

    #[test]
    fn nesting_is_bounded() {
        let mut src = String::new();
        for _ in 0..(MAX_DEPTH + 1) {
            src.push('(');
        }
        src.push('1');
        for _ in 0..(MAX_DEPTH + 1) {
            src.push(')');
        }
        let (_, err) = parse_err(&src);
        assert_eq!(
            err,
            ParseError::TooDeeplyNested {
                max_depth: MAX_DEPTH
            }
        );

        let long_chain = vec!["1"; MAX_DEPTH * 2].join(" + ");
        let (_, err) = parse_err(&long_chain);
        assert!(matches!(err, ParseError::TooDeeplyNested { .. }));

        let shallow = vec!["1"; 16].join(" + ");
        assert!(parse(&shallow).is_ok());
    }
}
