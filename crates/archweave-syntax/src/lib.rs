//! Syntax layer for archweave architecture descriptions.
//!
//! Turns the text of one source file into a [`SyntaxTree`]. Each file is
//! parsed independently of every other file, which is what allows
//! [`load::parse_sources`] to parse a whole source set in parallel.
//!
//! - [`lexer`] — logos tokenizer
//! - [`parser`] — recursive descent over the token stream
//! - [`ast`] — the per-file syntax tree
//! - [`load`] — source discovery and parallel parsing

pub mod ast;
pub mod lexer;
pub mod load;
pub mod parser;

mod error;
mod source;
mod stream;

pub use ast::SyntaxTree;
pub use error::{LoadError, Result};
pub use load::{discover_sources, load_sources, parse_sources, SourceFile};
pub use parser::{parse, parse_file, Parsed};
