use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::parser::ParseError;
use crate::runner::eval::rule_processor::NodeKind;

/// Native exception raised by a built-in operation. These are recoverable: they are reported
/// and the failing operation evaluates to unknown.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JErrorType {
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
}

impl JErrorType {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JErrorType::ReferenceError(_) => ErrorKind::ReferenceError,
            JErrorType::TypeError(_) => ErrorKind::TypeError,
            JErrorType::RangeError(_) => ErrorKind::RangeError,
            JErrorType::SyntaxError(_) => ErrorKind::SyntaxError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    ReferenceError,
    TypeError,
    RangeError,
    SyntaxError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors that abort a processing run. No approximation is possible once one of these occurs.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("a rule is already registered for {0}")]
    DuplicateRule(NodeKind),
    #[error("no rule registered for {0}")]
    MissingRule(NodeKind),
    #[error("malformed {kind} node at {line}:{column}")]
    MalformedNode {
        kind: NodeKind,
        line: usize,
        column: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}
