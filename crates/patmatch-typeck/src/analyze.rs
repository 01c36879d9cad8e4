//! Switch and `instanceof` analysis.
//!
//! [`check_switch`] binds every label of a switch, then runs the checks
//! that need the whole case list: binding consistency across
//! alternatives and fallthrough, dominance, the constant/pattern mixing
//! gate, body checks and exhaustiveness. Errors never stop the analysis:
//! a label that fails to bind becomes [`Alternative::Invalid`], matches
//! nothing and the remaining labels are still checked.

use tracing::{debug, instrument, trace};

use patmatch_common::{AnalysisConfig, Span};
use patmatch_syntax::ast::{Constant, LabelItem, LabelStyle, Pattern};

use crate::binder::Binder;
use crate::convert::{constant_assignable, ConstValue};
use crate::error::{ErrorKind, PatternError, Warning};
use crate::exhaustiveness::{check_exhaustive, CoverageLabel, Outcome};
use crate::guard::GuardKind;
use crate::matchset::{covers, MatchSet};
use crate::pattern::{BindingSet, BoundPattern};
use crate::scope::{LocalKind, ScopeEnv};
use crate::switch::{CaseBody, Selector, SwitchInput, SwitchKind};
use crate::table::{DeclKind, TypeTable};
use crate::ty::{PrimitiveKind, Ty, TypeId};

// ── Results ─────────────────────────────────────────────────────────────

/// One comma-separated item of a case label, after binding.
#[derive(Clone, Debug, PartialEq)]
pub enum Alternative {
    Pattern(BoundPattern),
    Constant { value: ConstValue, span: Span },
    Null { span: Span },
    Default { span: Span },
    /// An item that failed to bind or resolve. Matches nothing.
    Invalid { span: Span },
}

impl Alternative {
    pub fn span(&self) -> Span {
        match self {
            Alternative::Pattern(bound) => bound.pattern.span,
            Alternative::Constant { span, .. }
            | Alternative::Null { span }
            | Alternative::Default { span }
            | Alternative::Invalid { span } => *span,
        }
    }

    fn match_set(&self) -> MatchSet {
        match self {
            Alternative::Pattern(bound) => MatchSet::of_pattern(&bound.pattern),
            Alternative::Constant { value, .. } => MatchSet::of_constant(value),
            Alternative::Null { .. } => MatchSet::Null,
            Alternative::Default { .. } | Alternative::Invalid { .. } => MatchSet::Empty,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaseAnalysis {
    pub index: usize,
    pub span: Span,
    pub style: LabelStyle,
    pub alternatives: Vec<Alternative>,
    pub guard: GuardKind,
    pub guard_text: Option<String>,
    /// The bindings every pattern alternative of this label introduces.
    pub bindings: BindingSet,
    /// Index of the case whose body runs when this label matches.
    pub target: usize,
    /// Some alternative of this label is unreachable.
    pub dominated: bool,
    pub guard_reads: Vec<String>,
    pub body_reads: Vec<String>,
    pub nested: Vec<SwitchAnalysis>,
}

impl CaseAnalysis {
    pub fn is_default(&self) -> bool {
        self.alternatives
            .iter()
            .any(|alt| matches!(alt, Alternative::Default { .. }))
    }

    pub fn has_null(&self) -> bool {
        self.alternatives
            .iter()
            .any(|alt| matches!(alt, Alternative::Null { .. }))
    }

    /// Is `name` read by the guard or the body?
    pub fn uses(&self, name: &str) -> bool {
        self.guard_reads.iter().chain(&self.body_reads).any(|n| n == name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchAnalysis {
    pub kind: SwitchKind,
    pub selector: Ty,
    pub selector_constant: Option<ConstValue>,
    pub cases: Vec<CaseAnalysis>,
    pub exhaustive: bool,
    pub exhaustiveness_required: bool,
    /// Every error of this switch and of the switches nested in its bodies,
    /// ordered by position.
    pub errors: Vec<PatternError>,
    pub warnings: Vec<Warning>,
}

impl SwitchAnalysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(PatternError::kind).collect()
    }

    pub fn default_case(&self) -> Option<usize> {
        self.cases.iter().position(CaseAnalysis::is_default)
    }

    pub fn null_case(&self) -> Option<usize> {
        self.cases.iter().position(CaseAnalysis::has_null)
    }
}

/// The result of checking `expr instanceof pattern`.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceofAnalysis {
    pub pattern: Option<BoundPattern>,
    pub errors: Vec<PatternError>,
}

impl InstanceofAnalysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

// ── Entry points ────────────────────────────────────────────────────────

/// Analyze one switch and every switch nested in its case bodies.
#[instrument(level = "debug", skip_all, fields(kind = ?input.kind, cases = input.cases.len()))]
pub fn check_switch(
    table: &TypeTable,
    config: &AnalysisConfig,
    input: &SwitchInput,
    scope: &ScopeEnv,
) -> SwitchAnalysis {
    let mut analyzer = Analyzer {
        table,
        config,
        input,
        scope,
        errors: Vec::new(),
        warnings: Vec::new(),
    };
    analyzer.run()
}

/// Parse `labels` and analyze them as a switch with empty case bodies.
/// Parse errors are reported first, as `STRUCTURAL_PARSE_ERROR`.
pub fn check_switch_source(
    table: &TypeTable,
    config: &AnalysisConfig,
    kind: SwitchKind,
    selector: Selector,
    labels: &str,
    scope: &ScopeEnv,
) -> SwitchAnalysis {
    let (input, parse_errors) = SwitchInput::parse(kind, selector, labels);
    let mut analysis = check_switch(table, config, &input, scope);
    let mut errors: Vec<PatternError> = parse_errors.into_iter().map(PatternError::from).collect();
    errors.append(&mut analysis.errors);
    analysis.errors = errors;
    analysis
}

/// Analyze `expr instanceof pattern` where `expr` has static type `expr_ty`.
#[instrument(level = "debug", skip_all, fields(span = ?pattern.span()))]
pub fn check_instanceof(
    table: &TypeTable,
    config: &AnalysisConfig,
    expr_ty: &Ty,
    pattern: &Pattern,
    scope: &ScopeEnv,
) -> InstanceofAnalysis {
    match Binder::new(table, scope).bind(pattern, expr_ty) {
        Ok(bound) => {
            let mut errors = Vec::new();
            if bound.pattern.is_unconditional() && !config.unconditional_instanceof {
                errors.push(PatternError::IllegalTotalPattern {
                    pattern: bound.pattern.describe(table),
                    expr: table.show(expr_ty),
                    span: bound.pattern.span,
                });
            }
            InstanceofAnalysis {
                pattern: Some(bound),
                errors,
            }
        }
        Err(errors) => InstanceofAnalysis {
            pattern: None,
            errors,
        },
    }
}

/// Parse and analyze the right-hand side of an `instanceof`. Only a
/// pattern that parses cleanly is bound.
pub fn check_instanceof_source(
    table: &TypeTable,
    config: &AnalysisConfig,
    expr_ty: &Ty,
    source: &str,
    scope: &ScopeEnv,
) -> InstanceofAnalysis {
    let parse = patmatch_syntax::parse_pattern(source);
    match parse.value {
        Some(pattern) if parse.errors.is_empty() => {
            check_instanceof(table, config, expr_ty, &pattern, scope)
        }
        // A malformed top-level pattern is not analyzed further.
        _ => InstanceofAnalysis {
            pattern: None,
            errors: parse.errors.into_iter().map(PatternError::from).collect(),
        },
    }
}

// ── Analyzer ────────────────────────────────────────────────────────────

struct Analyzer<'a> {
    table: &'a TypeTable,
    config: &'a AnalysisConfig,
    input: &'a SwitchInput,
    scope: &'a ScopeEnv,
    errors: Vec<PatternError>,
    warnings: Vec<Warning>,
}

impl<'a> Analyzer<'a> {
    fn run(&mut self) -> SwitchAnalysis {
        let mut cases = self.bind_cases();
        self.check_constant_mix(&cases);
        self.check_fallthrough(&mut cases);
        self.check_dominance(&mut cases);
        self.check_bodies(&mut cases);

        let exhaustiveness_required = self.exhaustiveness_required(&cases);
        let exhaustive = self.check_exhaustiveness(&cases, exhaustiveness_required);

        let mut errors = std::mem::take(&mut self.errors);
        errors.sort_by_key(|e| e.span().start);
        SwitchAnalysis {
            kind: self.input.kind,
            selector: self.input.selector.ty.clone(),
            selector_constant: self.input.selector.constant.clone(),
            cases,
            exhaustive,
            exhaustiveness_required,
            errors,
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ── Binding ──

    fn bind_cases(&mut self) -> Vec<CaseAnalysis> {
        let input = self.input;
        let selector = &input.selector;
        let mut binder =
            Binder::new(self.table, self.scope).with_selector_constant(selector.constant.as_ref());
        let mut cases = Vec::with_capacity(self.input.cases.len());

        for (index, case) in input.cases.iter().enumerate() {
            let label = &case.label;
            let guard = GuardKind::of(label.guard.as_ref());
            if let Some(g) = &label.guard {
                if !case.guard.effectively_final {
                    self.errors.push(PatternError::GuardNotEffectivelyFinal { span: g.span });
                }
                if guard == GuardKind::ConstantFalse {
                    self.errors.push(PatternError::GuardAlwaysFalse { span: g.span });
                }
            }

            let mut alternatives = Vec::with_capacity(label.items.len());
            for item in &label.items {
                let alt = match item {
                    LabelItem::Pattern(pattern) => match binder.bind(pattern, &selector.ty) {
                        Ok(bound) => Alternative::Pattern(bound),
                        Err(errors) => {
                            self.errors.extend(errors);
                            Alternative::Invalid {
                                span: pattern.span(),
                            }
                        }
                    },
                    LabelItem::Constant {
                        value: Constant::Null,
                        span,
                    } => {
                        if selector.ty.is_reference() {
                            Alternative::Null { span: *span }
                        } else {
                            self.errors.push(PatternError::InconvertibleTypes {
                                found: "null".to_string(),
                                expected: self.table.show(&selector.ty),
                                span: *span,
                            });
                            Alternative::Invalid { span: *span }
                        }
                    }
                    LabelItem::Constant { value, span } => {
                        match resolve_constant(self.table, value, &selector.ty, *span) {
                            Ok(value) => Alternative::Constant { value, span: *span },
                            Err(err) => {
                                self.errors.push(err);
                                Alternative::Invalid { span: *span }
                            }
                        }
                    }
                    LabelItem::Default { span } => Alternative::Default { span: *span },
                };
                alternatives.push(alt);
            }

            let bindings = self.check_alternative_bindings(&alternatives);
            cases.push(CaseAnalysis {
                index,
                span: label.span,
                style: label.style,
                alternatives,
                guard,
                guard_text: label.guard.as_ref().map(|g| g.text.clone()),
                bindings,
                target: index,
                dominated: false,
                guard_reads: case.guard.reads.clone(),
                body_reads: case.body.reads.clone(),
                nested: Vec::new(),
            });
        }
        cases
    }

    /// All pattern alternatives of one label must bind the same names with
    /// the same types. Returns the bindings of the first.
    fn check_alternative_bindings(&mut self, alternatives: &[Alternative]) -> BindingSet {
        let mut patterns = alternatives.iter().filter_map(|alt| match alt {
            Alternative::Pattern(bound) => Some(bound),
            _ => None,
        });
        let Some(first) = patterns.next() else {
            return BindingSet::new();
        };
        for other in patterns {
            if !other.bindings.same_shape(&first.bindings) {
                self.errors.push(PatternError::InconsistentBindingsAcrossFallthrough {
                    span: other.pattern.span,
                    other: first.pattern.span,
                });
            }
        }
        first.bindings.clone()
    }

    // ── Whole-switch label checks ──

    fn check_constant_mix(&mut self, cases: &[CaseAnalysis]) {
        if self.config.constant_pattern_mix {
            return;
        }
        let alternatives = || cases.iter().flat_map(|c| &c.alternatives);
        let has_pattern = alternatives().any(|a| matches!(a, Alternative::Pattern(_)));
        let first_constant = alternatives().find_map(|a| match a {
            Alternative::Constant { span, .. } => Some(*span),
            _ => None,
        });
        if let (true, Some(span)) = (has_pattern, first_constant) {
            self.errors.push(PatternError::PreviewFeatureRequired {
                feature: "mixing constant and pattern labels".to_string(),
                span,
            });
        }
    }

    /// Resolve the body each colon label runs, and require a label that is
    /// entered by fallthrough to bind what its predecessor binds.
    fn check_fallthrough(&mut self, cases: &mut [CaseAnalysis]) {
        let input = self.input;
        let bodies = &input.cases;
        for i in (0..cases.len()).rev() {
            let label_only = cases[i].style == LabelStyle::Colon && !bodies[i].body.has_statements;
            if label_only && i + 1 < cases.len() {
                cases[i].target = cases[i + 1].target;
            }
        }

        for j in 1..cases.len() {
            let i = j - 1;
            if cases[i].style != LabelStyle::Colon {
                continue;
            }
            let body = &bodies[i].body;
            let conflict = if !body.has_statements {
                !cases[i].bindings.same_shape(&cases[j].bindings)
            } else {
                body.completes_normally && !cases[j].bindings.is_empty()
            };
            if conflict {
                self.errors.push(PatternError::InconsistentBindingsAcrossFallthrough {
                    span: cases[j].span,
                    other: cases[i].span,
                });
            }
        }
    }

    fn check_dominance(&mut self, cases: &mut [CaseAnalysis]) {
        // Match sets of earlier labels that dominate, with their spans.
        let mut earlier: Vec<(MatchSet, Span)> = Vec::new();
        let mut default: Option<Span> = None;
        let mut null: Option<Span> = None;
        let mut unconditional: Option<Span> = None;

        for case in cases.iter_mut() {
            let mut own: Vec<(MatchSet, Span)> = Vec::new();
            for alt in &case.alternatives {
                let span = alt.span();
                let dominating = match alt {
                    Alternative::Pattern(_) | Alternative::Constant { .. } => {
                        let set = alt.match_set();
                        let by_default = match alt {
                            Alternative::Pattern(_) => default,
                            _ => None,
                        };
                        let dominating = by_default.or_else(|| {
                            earlier
                                .iter()
                                .chain(&own)
                                .find(|(prior, _)| covers(self.table, prior, &set))
                                .map(|(_, span)| *span)
                        });
                        own.push((set, span));
                        dominating
                    }
                    Alternative::Null { .. } => null.replace(span),
                    Alternative::Default { .. } => {
                        let dominating = unconditional;
                        default = default.or(Some(span));
                        dominating
                    }
                    Alternative::Invalid { .. } => None,
                };
                if let Some(dominating) = dominating {
                    debug!(case = case.index, ?span, ?dominating, "unreachable case");
                    case.dominated = true;
                    self.errors.push(PatternError::UnreachableCase {
                        span,
                        dominating: Some(dominating),
                    });
                }
            }

            if case.guard.is_unconditional() {
                for alt in &case.alternatives {
                    if let Alternative::Pattern(bound) = alt {
                        if bound.pattern.is_unconditional() {
                            unconditional = unconditional.or(Some(bound.pattern.span));
                        }
                    }
                }
                earlier.extend(own);
            }
            trace!(case = case.index, dominating = earlier.len(), "dominance step");
        }
    }

    // ── Bodies ──

    fn check_bodies(&mut self, cases: &mut [CaseAnalysis]) {
        let switch = self.input;
        for (case, input) in cases.iter_mut().zip(&switch.cases) {
            for (name, span) in input.guard.assigns.iter().chain(&input.body.assigns) {
                if let Some(binding) = case.bindings.get(name) {
                    self.errors.push(PatternError::AssignmentToPatternVariable {
                        name: name.clone(),
                        span: *span,
                        binding: binding.span,
                    });
                }
            }

            if switch.kind == SwitchKind::Expression {
                for span in escaping_returns(&input.body) {
                    self.errors
                        .push(PatternError::ReturnOutsideExpressionContext { span });
                }
            }

            if input.body.switches.is_empty() {
                continue;
            }
            let mut scope = self.scope.clone();
            scope.push_frame();
            for binding in case.bindings.iter() {
                scope.declare(binding.name.clone(), LocalKind::PatternBinding, binding.span);
            }
            for nested in &input.body.switches {
                let mut analysis = check_switch(self.table, self.config, nested, &scope);
                self.errors.append(&mut analysis.errors);
                self.warnings.append(&mut analysis.warnings);
                case.nested.push(analysis);
            }
        }
    }

    // ── Exhaustiveness ──

    fn exhaustiveness_required(&self, cases: &[CaseAnalysis]) -> bool {
        if self.input.kind == SwitchKind::Expression {
            return true;
        }
        let uses_patterns = cases.iter().flat_map(|c| &c.alternatives).any(|alt| {
            matches!(alt, Alternative::Pattern(_) | Alternative::Null { .. })
        });
        uses_patterns || !is_legacy_selector(self.table, &self.input.selector.ty)
    }

    fn check_exhaustiveness(&mut self, cases: &[CaseAnalysis], required: bool) -> bool {
        if cases.iter().any(CaseAnalysis::is_default) {
            return true;
        }
        let labels: Vec<CoverageLabel<'_>> = cases
            .iter()
            .filter(|c| c.guard.is_unconditional())
            .flat_map(|c| &c.alternatives)
            .filter_map(|alt| match alt {
                Alternative::Pattern(bound) => Some(CoverageLabel::Pattern(&bound.pattern)),
                Alternative::Constant { value, .. } => Some(CoverageLabel::Constant(value)),
                _ => None,
            })
            .collect();

        let selector = &self.input.selector;
        let budget = self.config.max_base_checks;
        let exhaustive = match check_exhaustive(self.table, &selector.ty, &labels, budget) {
            Outcome::Exhaustive => true,
            Outcome::NotExhaustive => false,
            Outcome::GaveUp => {
                self.warnings.push(Warning::ExhaustivenessGaveUp {
                    budget,
                    span: selector.span,
                });
                false
            }
        };

        let malformed = cases
            .iter()
            .flat_map(|c| &c.alternatives)
            .any(|alt| matches!(alt, Alternative::Invalid { .. }));
        if required && !exhaustive && !malformed {
            self.errors.push(PatternError::NonExhaustiveSwitch {
                selector: self.table.show(&selector.ty),
                span: selector.span,
            });
        }
        exhaustive
    }
}

/// `return`s of `body` that leave an enclosing switch expression: its own,
/// plus those of nested switch statements. Nested switch expressions
/// report their own.
fn escaping_returns(body: &CaseBody) -> Vec<Span> {
    let mut spans = body.returns.clone();
    for nested in &body.switches {
        if nested.kind == SwitchKind::Statement {
            for case in &nested.cases {
                spans.extend(escaping_returns(&case.body));
            }
        }
    }
    spans
}

/// Selector types a switch statement may use without being exhaustive.
fn is_legacy_selector(table: &TypeTable, ty: &Ty) -> bool {
    use PrimitiveKind::*;
    let prim = ty.as_prim().or_else(|| table.unboxed(ty));
    if matches!(prim, Some(Char | Byte | Short | Int)) {
        return true;
    }
    if *ty == table.string() {
        return true;
    }
    ty.class_id()
        .is_some_and(|id| table.decl(id).kind == DeclKind::Enum)
}

/// Turn a constant label into a value, checking it against the selector.
fn resolve_constant(
    table: &TypeTable,
    constant: &Constant,
    selector: &Ty,
    span: Span,
) -> Result<ConstValue, PatternError> {
    let value = match constant {
        Constant::Int { value, long } => ConstValue::Int {
            value: *value,
            kind: if *long {
                PrimitiveKind::Long
            } else {
                PrimitiveKind::Int
            },
        },
        Constant::Float { value, single } => ConstValue::Float {
            value: *value,
            kind: if *single {
                PrimitiveKind::Float
            } else {
                PrimitiveKind::Double
            },
        },
        Constant::Char(c) => ConstValue::Int {
            value: i64::from(u32::from(*c)),
            kind: PrimitiveKind::Char,
        },
        Constant::Str(s) => ConstValue::Str(s.clone()),
        Constant::Bool(b) => ConstValue::Bool(*b),
        Constant::Null => ConstValue::Null,
        Constant::Name(parts) => resolve_enum_constant(table, parts, selector, span)?,
    };
    if constant_assignable(table, &value, selector) {
        Ok(value)
    } else {
        Err(PatternError::InconvertibleTypes {
            found: table.show(&value.ty(table)),
            expected: table.show(selector),
            span,
        })
    }
}

/// `RED` names a constant of the selector's enum; `Color.RED` names a
/// constant of `Color`.
fn resolve_enum_constant(
    table: &TypeTable,
    parts: &[String],
    selector: &Ty,
    span: Span,
) -> Result<ConstValue, PatternError> {
    let unknown = || PatternError::UnknownConstant {
        name: parts.join("."),
        selector: table.show(selector),
        span,
    };
    let Some((name, qualifier)) = parts.split_last() else {
        return Err(unknown());
    };

    let enum_type: Option<TypeId> = if qualifier.is_empty() {
        selector.class_id()
    } else {
        let qualified = qualifier.join(".");
        let found = table
            .lookup(&qualified)
            .or_else(|| qualifier.last().and_then(|last| table.lookup(last)));
        match found {
            Some(id) => Some(id),
            None => {
                return Err(PatternError::UnknownType {
                    name: qualified,
                    span,
                })
            }
        }
    };

    let Some(id) = enum_type else {
        return Err(unknown());
    };
    match table.enum_constants(id) {
        Some(constants) if constants.iter().any(|c| c == name) => Ok(ConstValue::Enum {
            ty: id,
            name: name.clone(),
        }),
        _ => Err(unknown()),
    }
}
