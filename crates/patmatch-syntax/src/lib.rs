//! Lexer and parser for case labels and `instanceof` patterns.
//!
//! The analyzer never sees raw text: it consumes the [`ast`] produced here.
//! Structural problems (trailing commas, misplaced `final`, diamonds, `_` as
//! a type, a second `default`) are reported as [`ParseError`]s and the parse
//! continues with the next label.

pub mod ast;
pub mod error;
pub mod lexer;
mod parser;
pub mod token;

pub use error::ParseError;
pub use lexer::Lexer;

use ast::{CaseLabel, Pattern, TypeRef};
use parser::Parser;

/// The result of a parse: the recovered tree plus every error found.
#[derive(Debug, Clone)]
pub struct Parse<T> {
    pub value: T,
    pub errors: Vec<ParseError>,
}

impl<T> Parse<T> {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a sequence of `case ... ->` / `default:` labels.
pub fn parse_labels(source: &str) -> Parse<Vec<CaseLabel>> {
    let mut parser = Parser::new(Lexer::tokenize(source), source);
    let value = parser.parse_labels();
    Parse {
        value,
        errors: parser.into_errors(),
    }
}

/// Parse a single type reference, as used in type declarations.
pub fn parse_type(source: &str) -> Parse<Option<TypeRef>> {
    let mut parser = Parser::new(Lexer::tokenize(source), source);
    let value = parser.parse_standalone_type();
    Parse {
        value,
        errors: parser.into_errors(),
    }
}

/// Parse the pattern on the right-hand side of an `instanceof`.
pub fn parse_pattern(source: &str) -> Parse<Option<Pattern>> {
    let mut parser = Parser::new(Lexer::tokenize(source), source);
    let value = parser.parse_instanceof_pattern();
    Parse {
        value,
        errors: parser.into_errors(),
    }
}
