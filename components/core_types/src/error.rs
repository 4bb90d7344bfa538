//! JavaScript error types.
//!
//! Every component reports failures as a [`JsError`]. The compiler only ever
//! produces [`ErrorKind::SyntaxError`] and [`ErrorKind::InternalError`]; the
//! remaining kinds exist for tools that execute compiled bytecode.

use std::fmt;

use thiserror::Error;

use crate::SourcePosition;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed source text
    SyntaxError,
    /// Operation applied to a value of the wrong type
    TypeError,
    /// Reference to an unbound or uninitialized variable
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Error in eval() function
    EvalError,
    /// Error in URI handling functions
    URIError,
    /// Broken compiler invariant
    InternalError,
}

impl ErrorKind {
    /// Constructor name as it appears in JavaScript.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::URIError => "URIError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JavaScript error with message and optional location.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind};
///
/// let error = JsError {
///     kind: ErrorKind::TypeError,
///     message: "cannot convert undefined to object".to_string(),
///     source_position: None,
/// };
///
/// assert_eq!(error.message, "cannot convert undefined to object");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
}

impl JsError {
    /// Creates an error without location information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsError {
            kind,
            message: message.into(),
            source_position: None,
        }
    }

    /// Attaches a source position, replacing any previous one.
    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.source_position = Some(position);
        self
    }

    /// Returns true for [`ErrorKind::SyntaxError`].
    pub fn is_syntax_error(&self) -> bool {
        self.kind == ErrorKind::SyntaxError
    }

    /// Formats the error as `kind: message` followed by `at line:column`
    /// when a position is known.
    pub fn describe(&self) -> String {
        match &self.source_position {
            Some(pos) => format!("{} (at {})", self, pos),
            None => self.to_string(),
        }
    }
}
