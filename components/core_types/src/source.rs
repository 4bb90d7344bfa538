//! Source position type.

use std::fmt;

use serde::Serialize;

/// Represents a position in source code.
///
/// Lines and columns are 1-indexed; `offset` counts characters from the
/// start of the source text.
///
/// # Examples
///
/// ```
/// use core_types::SourcePosition;
///
/// let pos = SourcePosition {
///     line: 10,
///     column: 5,
///     offset: 150,
/// };
///
/// assert_eq!(pos.line, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourcePosition {
    /// Line number, starting at 1
    pub line: u32,
    /// Column number, starting at 1
    pub column: u32,
    /// Character offset from the start of the source text
    pub offset: usize,
}

impl Default for SourcePosition {
    fn default() -> Self {
        SourcePosition {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
