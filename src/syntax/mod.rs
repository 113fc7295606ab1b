//! Java source syntax: tokens, tree and traversal.
//!
//! ```text
//! text ──tokenize──▶ [Token] ──parse──▶ CompilationUnit ──Visitor──▶ ...
//! ```

pub mod ast;
pub mod lexer;
mod parser;
pub mod visit;

pub use ast::CompilationUnit;
pub use parser::{ParseError, parse};
pub use visit::Visitor;
