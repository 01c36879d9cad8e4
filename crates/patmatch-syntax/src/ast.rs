//! Syntax tree for case labels and patterns.
//!
//! Nothing here is resolved: type names are plain (possibly qualified)
//! strings, and a bare name in a case label is a constant whose meaning is
//! decided by the binder against the selector type.

use patmatch_common::Span;
use serde::Serialize;

/// A reference to a type as written: `Box<? extends Number>[]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    /// Dotted name, e.g. `java.lang.Integer` or `int`.
    pub name: String,
    /// Explicit type arguments, `None` when the reference is written bare.
    pub args: Option<Vec<TypeArg>>,
    /// Number of `[]` suffixes.
    pub dims: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeArg {
    Type(TypeRef),
    Wildcard {
        bound: Option<(WildcardBound, TypeRef)>,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WildcardBound {
    Extends,
    Super,
}

/// The name introduced by a type or `var` pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BindingName {
    Named { name: String, span: Span },
    /// `_`: matches without introducing a name.
    Unnamed { span: Span },
}

impl BindingName {
    pub fn name(&self) -> Option<&str> {
        match self {
            BindingName::Named { name, .. } => Some(name),
            BindingName::Unnamed { .. } => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            BindingName::Named { span, .. } | BindingName::Unnamed { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    /// `[final] Type name` or `[final] Type _`.
    Type {
        ty: TypeRef,
        binding: BindingName,
        is_final: bool,
        span: Span,
    },
    /// `[final] var name`.
    Var {
        binding: BindingName,
        is_final: bool,
        span: Span,
    },
    /// `Type(p1, ..., pn)`.
    Record {
        ty: TypeRef,
        components: Vec<Pattern>,
        span: Span,
    },
    /// A bare `_`.
    Unnamed { span: Span },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Type { span, .. }
            | Pattern::Var { span, .. }
            | Pattern::Record { span, .. }
            | Pattern::Unnamed { span } => *span,
        }
    }
}

/// A literal or named constant in a case label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    /// Integral literal; `long` is set for an `L` suffix.
    Int { value: i64, long: bool },
    /// Floating literal; `single` is set for an `f` suffix.
    Float { value: f64, single: bool },
    Char(char),
    Str(String),
    Bool(bool),
    Null,
    /// A simple or qualified name, e.g. `RED` or `Color.RED`.
    Name(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LabelItem {
    Pattern(Pattern),
    Constant { value: Constant, span: Span },
    /// `default`, either alone or in `case null, default`.
    Default { span: Span },
}

impl LabelItem {
    pub fn span(&self) -> Span {
        match self {
            LabelItem::Pattern(p) => p.span(),
            LabelItem::Constant { span, .. } | LabelItem::Default { span } => *span,
        }
    }
}

/// The expression after `when`. Its text is opaque to the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guard {
    pub text: String,
    /// `Some(b)` when the guard is literally `true` or `false`.
    pub constant: Option<bool>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelStyle {
    /// `case ... ->`
    Arrow,
    /// `case ... :` (old-style, may fall through)
    Colon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseLabel {
    pub items: Vec<LabelItem>,
    pub guard: Option<Guard>,
    pub style: LabelStyle,
    pub span: Span,
}

impl CaseLabel {
    pub fn is_default(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, LabelItem::Default { .. }))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.items.iter().filter_map(|item| match item {
            LabelItem::Pattern(p) => Some(p),
            _ => None,
        })
    }
}
