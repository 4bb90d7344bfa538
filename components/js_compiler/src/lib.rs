//! Single-pass JavaScript compiler for declarations and destructuring
//!
//! Source text is parsed and compiled to stack-machine bytecode in one pass,
//! without building a syntax tree. Destructuring patterns, which may turn
//! out to be assignment targets or carry an initializer only known after
//! they are parsed, are resolved with a bounded lookahead scan and with
//! tentative code regions that are erased when not needed.
//!
//! # Overview
//!
//! - [`Compiler`] - Parser and code generator over one source text
//! - [`scan_balanced`] - Lookahead over a bracketed group with stream restore
//! - [`PatternRequest`] - Options of one destructuring pattern compilation
//! - [`emit_spread`] - Rest element accumulation loop
//! - [`check_duplicate_parameter`] - Duplicate parameter detection
//!
//! # Example
//!
//! ```
//! use js_compiler::{compile_script, CompilerOptions};
//!
//! let code = compile_script("let {a, ...rest} = {a: 1, b: 2};", &CompilerOptions::default()).unwrap();
//! assert_eq!(code.scopes[0].bindings.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
mod expr;
mod function;
pub mod lexer;
pub mod lvalue;
pub mod options;
pub mod params;
pub mod pattern;
pub mod scanner;
pub mod scope;
pub mod spread;
mod stmt;
pub mod token_stream;
pub mod unit;
mod var_decl;

pub use compiler::Compiler;
pub use lexer::{Keyword, Lexer, Punctuator, Token};
pub use lvalue::{Lvalue, PutMode, StoreKind, TargetContext};
pub use options::CompilerOptions;
pub use params::check_duplicate_parameter;
pub use pattern::{ExcludeList, ExcludedKey, Initializer, PatternRequest};
pub use scanner::{scan_balanced, Follow, ScanHints, ScanOutcome};
pub use scope::ScopeTable;
pub use spread::emit_spread;
pub use token_stream::{is_reserved_ident, TokenStream};
pub use unit::CompilationUnit;

use bytecode_system::Bytecode;
use core_types::JsError;

/// Compiles `source` as a script.
pub fn compile_script(source: &str, options: &CompilerOptions) -> Result<Bytecode, JsError> {
    Compiler::new(source, options)?.compile_script()
}
