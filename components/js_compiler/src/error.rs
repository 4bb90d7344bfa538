//! Compiler error constructors

use core_types::{ErrorKind, JsError, SourcePosition};

/// Create a syntax error at a given position
pub fn syntax_error(message: impl Into<String>, position: Option<SourcePosition>) -> JsError {
    JsError {
        kind: ErrorKind::SyntaxError,
        message: message.into(),
        source_position: position,
    }
}

/// Create an internal error for a state the grammar should have ruled out
pub fn internal_error(message: impl Into<String>, position: Option<SourcePosition>) -> JsError {
    JsError {
        kind: ErrorKind::InternalError,
        message: message.into(),
        source_position: position,
    }
}

/// Create an unexpected token error
pub fn unexpected_token(expected: &str, got: &str, position: Option<SourcePosition>) -> JsError {
    syntax_error(format!("expecting {}, got {}", expected, got), position)
}
