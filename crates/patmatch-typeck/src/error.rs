//! Pattern analysis errors and warnings.
//!
//! Every error carries the span it is anchored at. Type names are rendered
//! when the error is created, so an error can be displayed without the
//! type table that produced it.

use std::fmt;

use serde::Serialize;

use patmatch_common::Span;
use patmatch_syntax::ParseError;

#[derive(Clone, Debug, PartialEq)]
pub enum PatternError {
    /// A pattern type no value of the scrutinee type can have.
    InconvertibleTypes {
        found: String,
        expected: String,
        span: Span,
    },
    /// Record pattern with the wrong number of components.
    ArityMismatch {
        record: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    /// Explicit type arguments that disagree with the inferred ones, or
    /// violate a declared bound.
    GenericInconsistency {
        pattern: String,
        reason: String,
        span: Span,
    },
    DuplicateBinding {
        name: String,
        span: Span,
        previous: Span,
    },
    AssignmentToPatternVariable {
        name: String,
        span: Span,
        binding: Span,
    },
    /// A case that can never be selected.
    UnreachableCase {
        span: Span,
        dominating: Option<Span>,
    },
    NonExhaustiveSwitch {
        selector: String,
        span: Span,
    },
    /// Alternatives or fallthrough predecessors with different bindings.
    InconsistentBindingsAcrossFallthrough {
        span: Span,
        other: Span,
    },
    /// An `instanceof` pattern that always matches.
    IllegalTotalPattern {
        pattern: String,
        expr: String,
        span: Span,
    },
    ReturnOutsideExpressionContext {
        span: Span,
    },
    StructuralParseError {
        message: String,
        span: Span,
        related: Option<(String, Span)>,
    },
    UnknownType {
        name: String,
        span: Span,
    },
    /// A name label that is not a constant of the selector's enum.
    UnknownConstant {
        name: String,
        selector: String,
        span: Span,
    },
    NotARecord {
        name: String,
        span: Span,
    },
    GuardNotEffectivelyFinal {
        span: Span,
    },
    GuardAlwaysFalse {
        span: Span,
    },
    PreviewFeatureRequired {
        feature: String,
        span: Span,
    },
}

/// The kind of a [`PatternError`], without its payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InconvertibleTypes,
    ArityMismatch,
    GenericInconsistency,
    DuplicateBinding,
    AssignmentToPatternVariable,
    UnreachableCase,
    NonExhaustiveSwitch,
    InconsistentBindingsAcrossFallthrough,
    IllegalTotalPattern,
    ReturnOutsideExpressionContext,
    StructuralParseError,
    UnknownType,
    UnknownConstant,
    NotARecord,
    GuardNotEffectivelyFinal,
    GuardAlwaysFalse,
    PreviewFeatureRequired,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InconvertibleTypes => "INCONVERTIBLE_TYPES",
            ErrorKind::ArityMismatch => "ARITY_MISMATCH",
            ErrorKind::GenericInconsistency => "GENERIC_INCONSISTENCY",
            ErrorKind::DuplicateBinding => "DUPLICATE_BINDING",
            ErrorKind::AssignmentToPatternVariable => "ASSIGNMENT_TO_PATTERN_VARIABLE",
            ErrorKind::UnreachableCase => "UNREACHABLE_CASE",
            ErrorKind::NonExhaustiveSwitch => "NON_EXHAUSTIVE_SWITCH",
            ErrorKind::InconsistentBindingsAcrossFallthrough => {
                "INCONSISTENT_BINDINGS_ACROSS_FALLTHROUGH"
            }
            ErrorKind::IllegalTotalPattern => "ILLEGAL_TOTAL_PATTERN",
            ErrorKind::ReturnOutsideExpressionContext => "RETURN_OUTSIDE_EXPRESSION_CONTEXT",
            ErrorKind::StructuralParseError => "STRUCTURAL_PARSE_ERROR",
            ErrorKind::UnknownType => "UNKNOWN_TYPE",
            ErrorKind::UnknownConstant => "UNKNOWN_CONSTANT",
            ErrorKind::NotARecord => "NOT_A_RECORD",
            ErrorKind::GuardNotEffectivelyFinal => "GUARD_NOT_EFFECTIVELY_FINAL",
            ErrorKind::GuardAlwaysFalse => "GUARD_ALWAYS_FALSE",
            ErrorKind::PreviewFeatureRequired => "PREVIEW_FEATURE_REQUIRED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl PatternError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatternError::InconvertibleTypes { .. } => ErrorKind::InconvertibleTypes,
            PatternError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            PatternError::GenericInconsistency { .. } => ErrorKind::GenericInconsistency,
            PatternError::DuplicateBinding { .. } => ErrorKind::DuplicateBinding,
            PatternError::AssignmentToPatternVariable { .. } => {
                ErrorKind::AssignmentToPatternVariable
            }
            PatternError::UnreachableCase { .. } => ErrorKind::UnreachableCase,
            PatternError::NonExhaustiveSwitch { .. } => ErrorKind::NonExhaustiveSwitch,
            PatternError::InconsistentBindingsAcrossFallthrough { .. } => {
                ErrorKind::InconsistentBindingsAcrossFallthrough
            }
            PatternError::IllegalTotalPattern { .. } => ErrorKind::IllegalTotalPattern,
            PatternError::ReturnOutsideExpressionContext { .. } => {
                ErrorKind::ReturnOutsideExpressionContext
            }
            PatternError::StructuralParseError { .. } => ErrorKind::StructuralParseError,
            PatternError::UnknownType { .. } => ErrorKind::UnknownType,
            PatternError::UnknownConstant { .. } => ErrorKind::UnknownConstant,
            PatternError::NotARecord { .. } => ErrorKind::NotARecord,
            PatternError::GuardNotEffectivelyFinal { .. } => ErrorKind::GuardNotEffectivelyFinal,
            PatternError::GuardAlwaysFalse { .. } => ErrorKind::GuardAlwaysFalse,
            PatternError::PreviewFeatureRequired { .. } => ErrorKind::PreviewFeatureRequired,
        }
    }

    /// The primary source anchor.
    pub fn span(&self) -> Span {
        match self {
            PatternError::InconvertibleTypes { span, .. }
            | PatternError::ArityMismatch { span, .. }
            | PatternError::GenericInconsistency { span, .. }
            | PatternError::DuplicateBinding { span, .. }
            | PatternError::AssignmentToPatternVariable { span, .. }
            | PatternError::UnreachableCase { span, .. }
            | PatternError::NonExhaustiveSwitch { span, .. }
            | PatternError::InconsistentBindingsAcrossFallthrough { span, .. }
            | PatternError::IllegalTotalPattern { span, .. }
            | PatternError::ReturnOutsideExpressionContext { span }
            | PatternError::StructuralParseError { span, .. }
            | PatternError::UnknownType { span, .. }
            | PatternError::UnknownConstant { span, .. }
            | PatternError::NotARecord { span, .. }
            | PatternError::GuardNotEffectivelyFinal { span }
            | PatternError::GuardAlwaysFalse { span }
            | PatternError::PreviewFeatureRequired { span, .. } => *span,
        }
    }
}

impl From<ParseError> for PatternError {
    fn from(err: ParseError) -> Self {
        PatternError::StructuralParseError {
            message: err.message,
            span: err.span,
            related: err.related,
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::InconvertibleTypes {
                found, expected, ..
            } => {
                write!(f, "incompatible types: `{}` cannot be converted to `{}`", expected, found)
            }
            PatternError::ArityMismatch {
                record,
                expected,
                found,
                ..
            } => {
                write!(
                    f,
                    "incorrect number of nested patterns for `{}`: expected {}, found {}",
                    record, expected, found
                )
            }
            PatternError::GenericInconsistency { pattern, reason, .. } => {
                write!(f, "inconsistent type arguments in `{}`: {}", pattern, reason)
            }
            PatternError::DuplicateBinding { name, .. } => {
                write!(f, "variable `{}` is already defined", name)
            }
            PatternError::AssignmentToPatternVariable { name, .. } => {
                write!(f, "cannot assign to pattern variable `{}`", name)
            }
            PatternError::UnreachableCase { .. } => {
                write!(f, "this case label is dominated by a preceding case label")
            }
            PatternError::NonExhaustiveSwitch { selector, .. } => {
                write!(f, "the switch does not cover all possible values of `{}`", selector)
            }
            PatternError::InconsistentBindingsAcrossFallthrough { .. } => {
                write!(f, "illegal fall-through to a pattern with different bindings")
            }
            PatternError::IllegalTotalPattern { pattern, expr, .. } => {
                write!(
                    f,
                    "pattern `{}` is always true for an expression of type `{}`",
                    pattern, expr
                )
            }
            PatternError::ReturnOutsideExpressionContext { .. } => {
                write!(f, "attempt to return out of a switch expression")
            }
            PatternError::StructuralParseError { message, .. } => write!(f, "{}", message),
            PatternError::UnknownType { name, .. } => {
                write!(f, "cannot find type `{}`", name)
            }
            PatternError::UnknownConstant { name, selector, .. } => {
                write!(f, "`{}` is not a constant of `{}`", name, selector)
            }
            PatternError::NotARecord { name, .. } => {
                write!(f, "`{}` is not a record type", name)
            }
            PatternError::GuardNotEffectivelyFinal { .. } => {
                write!(f, "guard refers to a variable that is not effectively final")
            }
            PatternError::GuardAlwaysFalse { .. } => {
                write!(f, "this case label has a guard that is a constant expression with value `false`")
            }
            PatternError::PreviewFeatureRequired { feature, .. } => {
                write!(f, "{} is not enabled", feature)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Non-fatal findings.
#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    /// The exhaustiveness reduction ran out of budget; the switch was
    /// reported non-exhaustive without a proof.
    ExhaustivenessGaveUp { budget: usize, span: Span },
}

impl Warning {
    pub fn code(&self) -> &'static str {
        match self {
            Warning::ExhaustivenessGaveUp { .. } => "EXHAUSTIVENESS_GAVE_UP",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Warning::ExhaustivenessGaveUp { span, .. } => *span,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ExhaustivenessGaveUp { budget, .. } => {
                write!(f, "exhaustiveness check gave up after {} steps", budget)
            }
        }
    }
}
