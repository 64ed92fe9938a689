//! Error taxonomy shared by parsing, pointer navigation, and arithmetic.

use std::fmt;
use thiserror::Error;

/// Numeric category code, stable across the no-throw and throwing surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    Success = 0,
    ParseError = 1,
    TypeError = 2,
    OutOfRange = 3,
    DepthExceeded = 4,
    Utf8Error = 5,
    UnexpectedEnd = 6,
    UnexpectedCharacter = 7,
    UnknownError = 8,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Success => "success",
            ErrorCode::ParseError => "parse error",
            ErrorCode::TypeError => "type error",
            ErrorCode::OutOfRange => "out of range",
            ErrorCode::DepthExceeded => "nesting depth exceeded",
            ErrorCode::Utf8Error => "utf-8 error",
            ErrorCode::UnexpectedEnd => "unexpected end of input",
            ErrorCode::UnexpectedCharacter => "unexpected character",
            ErrorCode::UnknownError => "unknown error",
        };
        f.write_str(s)
    }
}

/// A (code, message) pair, optionally carrying a source location.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct JsonError {
    pub code: ErrorCode,
    pub message: String,
}

impl JsonError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn at(code: ErrorCode, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            code,
            message: format!("{} at line {line}, column {column}", message.into()),
        }
    }
}

pub type JsonResult<T> = Result<T, JsonError>;

/// Arithmetic-specific error, kept distinct from the parser/pointer taxonomy
/// since division by zero is never a parse or structural failure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NumberError {
    #[error("division by zero")]
    DivisionByZero,
}
