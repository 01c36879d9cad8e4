//! The switch construct as handed to the analyzer.
//!
//! Labels come from the parser. Everything the analyzer needs to know
//! about case bodies (names read and written, `return`s, nested switches,
//! whether control reaches the end) is supplied by the flow collaborator
//! as a [`CaseBody`] summary.

use patmatch_common::Span;
use patmatch_syntax::ast::CaseLabel;

use crate::convert::ConstValue;
use crate::guard::GuardFacts;
use crate::ty::Ty;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchKind {
    Statement,
    Expression,
}

/// The switch selector: its static type and, for a constant selector
/// expression, its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub ty: Ty,
    pub constant: Option<ConstValue>,
    pub span: Span,
}

impl Selector {
    pub fn new(ty: Ty, span: Span) -> Self {
        Selector {
            ty,
            constant: None,
            span,
        }
    }

    pub fn with_constant(mut self, value: ConstValue) -> Self {
        self.constant = Some(value);
        self
    }
}

/// Flow summary of the statements after one case label.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseBody {
    /// False for a label immediately followed by another label.
    pub has_statements: bool,
    pub reads: Vec<String>,
    pub assigns: Vec<(String, Span)>,
    /// `return` statements outside the nested switches in `switches`.
    pub returns: Vec<Span>,
    pub switches: Vec<SwitchInput>,
    /// Control can reach the end of the body and fall into the next case.
    pub completes_normally: bool,
}

impl Default for CaseBody {
    fn default() -> Self {
        CaseBody {
            has_statements: true,
            reads: Vec::new(),
            assigns: Vec::new(),
            returns: Vec::new(),
            switches: Vec::new(),
            completes_normally: false,
        }
    }
}

impl CaseBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// A label with no statements of its own (`case A: case B: ...`).
    pub fn empty() -> Self {
        CaseBody {
            has_statements: false,
            completes_normally: true,
            ..Self::default()
        }
    }

    pub fn reads<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.reads.extend(names.into_iter().map(str::to_string));
        self
    }

    pub fn assigns(mut self, name: &str, span: Span) -> Self {
        self.assigns.push((name.to_string(), span));
        self
    }

    pub fn returns(mut self, span: Span) -> Self {
        self.returns.push(span);
        self
    }

    pub fn switch(mut self, nested: SwitchInput) -> Self {
        self.switches.push(nested);
        self
    }

    pub fn completes_normally(mut self) -> Self {
        self.completes_normally = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub label: CaseLabel,
    pub guard: GuardFacts,
    pub body: CaseBody,
}

impl Case {
    /// A case whose guard facts are inferred from the guard text.
    pub fn new(label: CaseLabel) -> Self {
        let guard = label
            .guard
            .as_ref()
            .map(GuardFacts::inferred)
            .unwrap_or_default();
        Case {
            label,
            guard,
            body: CaseBody::default(),
        }
    }

    pub fn with_body(mut self, body: CaseBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_guard_facts(mut self, facts: GuardFacts) -> Self {
        self.guard = facts;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchInput {
    pub kind: SwitchKind,
    pub selector: Selector,
    pub cases: Vec<Case>,
}

impl SwitchInput {
    pub fn new(kind: SwitchKind, selector: Selector, cases: Vec<Case>) -> Self {
        SwitchInput {
            kind,
            selector,
            cases,
        }
    }

    /// Parse `labels` and pair each label with a default body. Parse
    /// errors are returned alongside.
    pub fn parse(
        kind: SwitchKind,
        selector: Selector,
        labels: &str,
    ) -> (SwitchInput, Vec<patmatch_syntax::ParseError>) {
        let parse = patmatch_syntax::parse_labels(labels);
        let cases = parse.value.into_iter().map(Case::new).collect();
        (SwitchInput::new(kind, selector, cases), parse.errors)
    }

    /// Replace the body of case `index`.
    pub fn with_body(mut self, index: usize, body: CaseBody) -> Self {
        if let Some(case) = self.cases.get_mut(index) {
            case.body = body;
        }
        self
    }
}
