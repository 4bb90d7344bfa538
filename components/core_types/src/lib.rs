//! Error and source-location types shared by every compiler component.
//!
//! # Overview
//!
//! - [`JsError`] - A compile-time or run-time JavaScript error
//! - [`ErrorKind`] - Which JavaScript error constructor the error maps to
//! - [`SourcePosition`] - Line/column/offset of a token in the source text
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, SourcePosition};
//!
//! let error = JsError::new(ErrorKind::SyntaxError, "variable name expected")
//!     .with_position(SourcePosition { line: 1, column: 5, offset: 4 });
//!
//! assert_eq!(error.to_string(), "SyntaxError: variable name expected");
//! assert_eq!(error.source_position.map(|p| p.line), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;

pub use error::{ErrorKind, JsError};
pub use source::SourcePosition;
