//! Errors produced while compiling and evaluating FlexScript.

use core::fmt;

use crate::encoding::Location;
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The script could not be compiled.
    Parse { location: Location, err: ParseError },
    /// The script failed while being evaluated against a specific item.
    Eval(EvalError),
}

impl Error {
    pub fn parse(location: Location, err: ParseError) -> Self {
        Self::Parse { location, err }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { location, err } => write!(f, "syntax error at {}: {}", location, err),
            Self::Eval(e) => write!(f, "evaluation error: {}", e),
        }
    }
}

impl core::error::Error for Error {}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Self::Eval(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedEof,
    UnexpectedChar(char),
    UnexpectedToken { expected: &'static str, found: String },
    UnterminatedString,
    UnterminatedComment,
    InvalidEscapeSequence(char),
    InvalidNumber(String),
    UnknownIdentifier(String),
    UnknownFunction(String),
    ReservedIdentifier(String),
    DuplicateLocal(String),
    WrongArgumentCount {
        function: &'static str,
        min: usize,
        max: usize,
        got: usize,
    },
    TooDeeplyNested { max_depth: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of script"),
            Self::UnexpectedChar(ch) => write!(f, "unexpected character {:?}", ch),
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, but found {}", expected, found)
            }
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedComment => write!(f, "unterminated comment"),
            Self::InvalidEscapeSequence(ch) => write!(f, "invalid escape sequence \\{}", ch),
            Self::InvalidNumber(s) => write!(f, "invalid number \"{}\"", s),
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier \"{}\"", name),
            Self::UnknownFunction(name) => write!(f, "unknown function \"{}\"", name),
            Self::ReservedIdentifier(name) => {
                write!(f, "\"{}\" is reserved and cannot be redefined", name)
            }
            Self::DuplicateLocal(name) => write!(f, "\"{}\" is already defined", name),
            Self::WrongArgumentCount {
                function,
                min,
                max,
                got,
            } => {
                if min == max {
                    write!(f, "{}() takes {} argument(s), got {}", function, min, got)
                } else if *max == usize::MAX {
                    write!(
                        f,
                        "{}() takes at least {} argument(s), got {}",
                        function, min, got
                    )
                } else {
                    write!(
                        f,
                        "{}() takes {} to {} arguments, got {}",
                        function, min, max, got
                    )
                }
            }
            Self::TooDeeplyNested { max_depth } => {
                write!(f, "expression nested deeper than {} levels", max_depth)
            }
        }
    }
}

impl core::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    NullAccess(String),
    InvalidOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },
    InvalidIndex {
        target: &'static str,
        index: &'static str,
    },
    InvalidArgument {
        function: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    DivisionByZero,
    NumericOverflow,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullAccess(prop) => write!(f, "cannot read property \"{}\" of null", prop),
            Self::InvalidOperands { op, left, right } => {
                write!(f, "cannot apply {} to {} and {}", op, left, right)
            }
            Self::InvalidOperand { op, operand } => write!(f, "cannot apply {} to {}", op, operand),
            Self::InvalidIndex { target, index } => {
                write!(f, "cannot index {} with {}", target, index)
            }
            Self::InvalidArgument {
                function,
                expected,
                got,
            } => write!(f, "{}() expected {}, got {}", function, expected, got),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::NumericOverflow => write!(f, "numeric overflow"),
        }
    }
}

impl core::error::Error for EvalError {}
