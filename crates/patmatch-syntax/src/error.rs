//! Parse error types for the pattern parser.

use std::fmt;

use patmatch_common::Span;

/// A structural error in pattern or label syntax.
///
/// Carries the primary span where the problem was detected and an optional
/// related span for context (e.g. "record pattern starts here").
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub related: Option<(String, Span)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            related: None,
        }
    }

    pub fn with_related(
        message: impl Into<String>,
        span: Span,
        related_message: impl Into<String>,
        related_span: Span,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            related: Some((related_message.into(), related_span)),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_related_keeps_both_spans() {
        let err = ParseError::with_related(
            "expected `)`",
            Span::new(20, 21),
            "record pattern starts here",
            Span::new(5, 6),
        );
        assert_eq!(err.to_string(), "expected `)`");
        let (msg, span) = err.related.unwrap();
        assert_eq!(msg, "record pattern starts here");
        assert_eq!(span, Span::new(5, 6));
    }
}
