//! Errors raised while constructing a path; evaluation never throws.

use thiserror::Error;

/// Raised by [`crate::path_parser::JsonPath::parse`] on malformed syntax,
/// carrying the byte offset at which the parser gave up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at byte {position}")]
pub struct JsonPathException {
    pub message: String,
    pub position: usize,
}

impl JsonPathException {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

pub type JsonPathResult<T> = Result<T, JsonPathException>;
