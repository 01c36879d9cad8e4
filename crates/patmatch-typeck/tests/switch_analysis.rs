//! Integration tests for switch and `instanceof` analysis.
//!
//! Labels are written as source text and analyzed against a small type
//! table: a sealed `Number`, a sealed shape hierarchy, a generic record and
//! an enum.

use patmatch_common::{AnalysisConfig, Span};
use patmatch_typeck::analyze::Alternative;
use patmatch_typeck::convert::ConstValue;
use patmatch_typeck::guard::GuardFacts;
use patmatch_typeck::{
    check_instanceof_source, check_switch, check_switch_source, Case, CaseBody, Decl, ErrorKind,
    PatternError, PrimitiveKind, ScopeEnv, Selector, SwitchAnalysis, SwitchInput, SwitchKind, Ty,
    TypeTable, Warning,
};
use pretty_assertions::assert_eq;

// ── Helpers ────────────────────────────────────────────────────────────

fn table() -> TypeTable {
    let mut b = TypeTable::builder();
    b.seal("Number", ["Integer", "Double"])
        .declare(Decl::interface("Shape").sealed(["Circle", "Square", "Poly"]))
        .declare(Decl::record("Circle").implements("Shape").component("r", "double"))
        .declare(Decl::record("Square").implements("Shape").component("side", "int"))
        .declare(Decl::interface("Poly").extends("Shape").sealed(["Tri", "Quad"]))
        .declare(Decl::record("Tri").implements("Poly"))
        .declare(Decl::record("Quad").implements("Poly"))
        .declare(Decl::record("Box").param("T").component("value", "T"))
        .declare(Decl::record("R").component("i", "int"))
        .declare(Decl::enumeration("Color").constants(["RED", "GREEN", "BLUE"]));
    b.build().unwrap()
}

fn class(t: &TypeTable, name: &str) -> Ty {
    Ty::class(t.lookup(name).unwrap())
}

const SELECTOR: Span = Span { start: 0, end: 0 };

fn analyze_with(
    t: &TypeTable,
    config: &AnalysisConfig,
    kind: SwitchKind,
    selector: Ty,
    labels: &str,
) -> SwitchAnalysis {
    check_switch_source(
        t,
        config,
        kind,
        Selector::new(selector, SELECTOR),
        labels,
        &ScopeEnv::new(),
    )
}

fn analyze(t: &TypeTable, kind: SwitchKind, selector: Ty, labels: &str) -> SwitchAnalysis {
    analyze_with(t, &AnalysisConfig::default(), kind, selector, labels)
}

fn assert_no_errors(analysis: &SwitchAnalysis) {
    assert!(
        analysis.errors.is_empty(),
        "expected no errors, got: {:?}",
        analysis.errors
    );
}

/// The source text each error is anchored at.
fn anchors<'a>(analysis: &SwitchAnalysis, src: &'a str) -> Vec<(ErrorKind, &'a str)> {
    analysis
        .errors
        .iter()
        .map(|e| (e.kind(), e.span().text(src)))
        .collect()
}

// ── Sealed hierarchies ─────────────────────────────────────────────────

#[test]
fn sealed_number_covered_by_its_subtypes() {
    let t = table();
    let analysis = analyze(
        &t,
        SwitchKind::Expression,
        class(&t, "Number"),
        "case Integer i -> case Double d ->",
    );
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);
    assert!(analysis.exhaustiveness_required);
}

#[test]
fn missing_permitted_subtype_is_not_exhaustive() {
    let t = table();
    let analysis = analyze(
        &t,
        SwitchKind::Statement,
        class(&t, "Shape"),
        "case Circle c -> case Poly p ->",
    );
    assert!(!analysis.exhaustive);
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);
    assert_eq!(analysis.errors[0].span(), SELECTOR);
}

#[test]
fn nested_sealed_interfaces_are_expanded() {
    let t = table();
    let src = "case Circle c -> case Square s -> case Tri t -> case Quad q ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Shape"), src);
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);
}

#[test]
fn record_patterns_with_total_components_cover_the_record() {
    let t = table();
    let src = "case Circle(var r) -> case Square(int side) -> case Poly p ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Shape"), src);
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);

    let src = "case Circle(var r) -> case Square(byte side) -> case Poly p ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Shape"), src);
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);
}

#[test]
fn generic_record_arguments_are_inferred() {
    let t = table();
    let selector = Ty::generic(t.lookup("Box").unwrap(), vec![t.string()]);
    let analysis = analyze(&t, SwitchKind::Expression, selector, "case Box(String s) ->");
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);
    let Alternative::Pattern(bound) = &analysis.cases[0].alternatives[0] else {
        panic!("expected a bound pattern");
    };
    assert_eq!(bound.bindings.get("s").map(|b| b.ty.clone()), Some(t.string()));
}

#[test]
fn budget_exhaustion_is_a_warning() {
    let t = table();
    let config = AnalysisConfig::default().with_max_base_checks(1);
    let analysis = analyze_with(
        &t,
        &config,
        SwitchKind::Expression,
        class(&t, "Number"),
        "case Integer i -> case Double d ->",
    );
    assert!(!analysis.exhaustive);
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);
    assert_eq!(
        analysis.warnings,
        vec![Warning::ExhaustivenessGaveUp {
            budget: 1,
            span: SELECTOR
        }]
    );
}

// ── Enums, booleans and primitives ─────────────────────────────────────

#[test]
fn enum_constants_cover_the_enum() {
    let t = table();
    let color = class(&t, "Color");
    let analysis = analyze(
        &t,
        SwitchKind::Expression,
        color.clone(),
        "case RED -> case GREEN, Color.BLUE ->",
    );
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);

    let analysis = analyze(&t, SwitchKind::Expression, color.clone(), "case RED -> case GREEN ->");
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);

    // A statement switch over an enum need not be exhaustive.
    let analysis = analyze(&t, SwitchKind::Statement, color, "case RED -> case PINK ->");
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::UnknownConstant]);
}

#[test]
fn float_pattern_never_exhausts_an_int_selector() {
    let t = table();
    let src = "case float f ->";
    let selector = Selector::new(Ty::Prim(PrimitiveKind::Int), SELECTOR).with_constant(ConstValue::Int {
        value: 16_777_216,
        kind: PrimitiveKind::Int,
    });
    let analysis = check_switch_source(
        &t,
        &AnalysisConfig::default(),
        SwitchKind::Expression,
        selector,
        src,
        &ScopeEnv::new(),
    );
    assert!(!analysis.exhaustive);
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);
}

fn analyze_constant(t: &TypeTable, value: i64, labels: &str) -> SwitchAnalysis {
    let selector = Selector::new(Ty::Prim(PrimitiveKind::Int), SELECTOR).with_constant(ConstValue::Int {
        value,
        kind: PrimitiveKind::Int,
    });
    check_switch_source(
        t,
        &AnalysisConfig::default(),
        SwitchKind::Expression,
        selector,
        labels,
        &ScopeEnv::new(),
    )
}

#[test]
fn constant_selector_value_leaves_default_reachable() {
    let t = table();
    let analysis = analyze_constant(&t, 42, "case byte b -> default ->");
    assert_no_errors(&analysis);

    let analysis = analyze_constant(&t, 16_777_216, "case float f -> default ->");
    assert_no_errors(&analysis);

    let analysis = analyze_constant(&t, 42, "case byte b ->");
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);
}

#[test]
fn wider_primitive_patterns_exhaust() {
    let t = table();
    let int = Ty::Prim(PrimitiveKind::Int);
    let analysis = analyze(&t, SwitchKind::Expression, int.clone(), "case long l ->");
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);

    let analysis = analyze(&t, SwitchKind::Expression, int, "case byte b ->");
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);
}

#[test]
fn boolean_constants_cover_boolean() {
    let t = table();
    let analysis = analyze(
        &t,
        SwitchKind::Expression,
        Ty::Prim(PrimitiveKind::Boolean),
        "case true -> case false ->",
    );
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);
}

#[test]
fn default_always_exhausts() {
    let t = table();
    let analysis = analyze(
        &t,
        SwitchKind::Expression,
        class(&t, "Shape"),
        "default -> case Circle c ->",
    );
    // The pattern after `default` is unreachable, but the switch is exhaustive.
    assert!(analysis.exhaustive);
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::UnreachableCase]);
}

// ── Dominance ──────────────────────────────────────────────────────────

#[test]
fn subtype_after_supertype_is_unreachable() {
    let t = table();
    let src = "case Number n -> case Integer i ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Number"), src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::UnreachableCase, "Integer i")]);
    let PatternError::UnreachableCase { dominating, .. } = &analysis.errors[0] else {
        panic!("expected an unreachable case");
    };
    assert_eq!(dominating.map(|s| s.text(src)), Some("Number n"));
    assert!(analysis.cases[1].dominated);
    assert!(!analysis.cases[0].dominated);
}

#[test]
fn guarded_cases_never_dominate() {
    let t = table();
    let src = "case Number n when n.intValue() > 0 -> case Integer i -> case Double d ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Number"), src);
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);
    assert_eq!(analysis.cases[0].guard_reads, vec!["n".to_string()]);
}

#[test]
fn constant_true_guard_counts_as_unguarded() {
    let t = table();
    let src = "case Number n when true -> case Integer i ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Number"), src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::UnreachableCase, "Integer i")]);
}

#[test]
fn alternatives_are_checked_individually() {
    let t = table();
    let src = "case Circle _, Square _ -> case Tri _, Circle _ -> default ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Shape"), src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::UnreachableCase, "Circle _")]);
    assert_eq!(analysis.errors[0].span().start, src.rfind("Circle").unwrap() as u32);
}

#[test]
fn alternative_dominated_within_its_own_label() {
    let t = table();
    let src = "case Poly _, Tri _ -> default ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Shape"), src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::UnreachableCase, "Tri _")]);
}

#[test]
fn duplicate_null_and_constant_labels() {
    let t = table();
    let src = "case null -> case null -> default ->";
    let analysis = analyze(&t, SwitchKind::Expression, t.object(), src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::UnreachableCase, "null")]);
    assert_eq!(analysis.errors[0].span().start, 18);
    assert_eq!(analysis.null_case(), Some(0));

    let src = "case 1 -> case 2 -> case 1 -> default ->";
    let analysis = analyze(&t, SwitchKind::Expression, Ty::Prim(PrimitiveKind::Int), src);
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::UnreachableCase]);
    assert_eq!(analysis.errors[0].span().start, 25);
}

#[test]
fn null_label_is_not_dominated_by_a_total_pattern() {
    let t = table();
    let src = "case Object o -> case null ->";
    let analysis = analyze(&t, SwitchKind::Expression, t.object(), src);
    assert_no_errors(&analysis);
}

#[test]
fn default_after_unconditional_pattern_is_unreachable() {
    let t = table();
    let src = "case Object o -> default ->";
    let analysis = analyze(&t, SwitchKind::Expression, t.object(), src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::UnreachableCase, "default")]);
}

#[test]
fn null_label_on_primitive_selector_is_inconvertible() {
    let t = table();
    let src = "case null -> default ->";
    let analysis = analyze(&t, SwitchKind::Statement, Ty::Prim(PrimitiveKind::Int), src);
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::InconvertibleTypes]);
}

// ── Constant labels mixed with patterns ────────────────────────────────

#[test]
fn mixing_constants_and_patterns_is_gated() {
    let t = table();
    let integer = class(&t, "Integer");
    let src = "case 1 -> case Integer i ->";
    let analysis = analyze(&t, SwitchKind::Expression, integer.clone(), src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::PreviewFeatureRequired, "1")]);

    let config = AnalysisConfig::default().with_constant_pattern_mix(true);
    let analysis = analyze_with(&t, &config, SwitchKind::Expression, integer.clone(), src);
    assert_no_errors(&analysis);
    assert!(analysis.exhaustive);

    let src = "case Integer i -> case 1 ->";
    let analysis = analyze_with(&t, &config, SwitchKind::Expression, integer, src);
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::UnreachableCase, "1")]);
}

// ── Binding consistency ────────────────────────────────────────────────

#[test]
fn alternatives_with_different_bindings_are_rejected() {
    let t = table();
    let src = "case Integer i, String s -> default ->";
    let analysis = analyze(&t, SwitchKind::Expression, t.object(), src);
    assert_eq!(
        anchors(&analysis, src),
        vec![(ErrorKind::InconsistentBindingsAcrossFallthrough, "String s")]
    );
}

#[test]
fn fallthrough_into_a_label_with_other_bindings() {
    let t = table();
    let (input, errors) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(t.object(), SELECTOR),
        "case Integer i: case String s: default:",
    );
    assert!(errors.is_empty());
    let input = input.with_body(0, CaseBody::empty());
    let analysis = check_switch(&t, &AnalysisConfig::default(), &input, &ScopeEnv::new());
    assert_eq!(
        analysis.error_kinds(),
        vec![ErrorKind::InconsistentBindingsAcrossFallthrough]
    );
    assert_eq!(analysis.cases[0].target, 1);
    assert_eq!(analysis.cases[1].target, 1);
}

#[test]
fn body_falling_into_a_binding_label() {
    let t = table();
    let (input, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(t.object(), SELECTOR),
        "case String s: case Integer i: default:",
    );
    let input = input.with_body(0, CaseBody::new().reads(["s"]).completes_normally());
    let analysis = check_switch(&t, &AnalysisConfig::default(), &input, &ScopeEnv::new());
    assert_eq!(
        analysis.error_kinds(),
        vec![ErrorKind::InconsistentBindingsAcrossFallthrough]
    );

    // Labels without bindings share a body freely.
    let (input, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(Ty::Prim(PrimitiveKind::Int), SELECTOR),
        "case 1: case 2: default:",
    );
    let input = input.with_body(0, CaseBody::empty());
    let analysis = check_switch(&t, &AnalysisConfig::default(), &input, &ScopeEnv::new());
    assert_no_errors(&analysis);
}

#[test]
fn duplicate_names_against_enclosing_locals() {
    let t = table();
    let src = "case Circle(double r) -> case Square s -> case Poly p ->";
    let scope = ScopeEnv::new().with_local("r").with_field("s");
    let analysis = check_switch_source(
        &t,
        &AnalysisConfig::default(),
        SwitchKind::Expression,
        Selector::new(class(&t, "Shape"), SELECTOR),
        src,
        &scope,
    );
    assert_eq!(anchors(&analysis, src), vec![(ErrorKind::DuplicateBinding, "r")]);
}

// ── Bodies and guards ──────────────────────────────────────────────────

#[test]
fn assignment_to_pattern_variable() {
    let t = table();
    let (input, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(t.object(), SELECTOR),
        "case String s -> default ->",
    );
    let input = input.with_body(0, CaseBody::new().assigns("s", Span::new(40, 41)));
    let analysis = check_switch(&t, &AnalysisConfig::default(), &input, &ScopeEnv::new());
    assert_eq!(
        analysis.error_kinds(),
        vec![ErrorKind::AssignmentToPatternVariable]
    );
    assert_eq!(analysis.errors[0].span(), Span::new(40, 41));
}

#[test]
fn guard_writes_and_finality() {
    let t = table();
    let src = "case String s when (s = \"\") != null -> case Integer i when limit > i -> default ->";
    let (input, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(t.object(), SELECTOR),
        src,
    );
    let mut input = input;
    let facts = input.cases[1].guard.clone().with_effectively_final(false);
    input.cases[1] = input.cases[1].clone().with_guard_facts(facts);
    let analysis = check_switch(&t, &AnalysisConfig::default(), &input, &ScopeEnv::new());
    assert_eq!(
        anchors(&analysis, src),
        vec![
            (ErrorKind::AssignmentToPatternVariable, "s"),
            (ErrorKind::GuardNotEffectivelyFinal, "limit > i"),
        ]
    );
}

#[test]
fn subtracting_a_negative_is_not_a_write() {
    let t = table();
    let analysis = analyze(
        &t,
        SwitchKind::Expression,
        t.object(),
        "case Integer x when x - -1 > 0 -> default ->",
    );
    assert_no_errors(&analysis);

    let src = "case Integer x when x-- > 0 -> default ->";
    let analysis = analyze(&t, SwitchKind::Expression, t.object(), src);
    assert_eq!(
        anchors(&analysis, src),
        vec![(ErrorKind::AssignmentToPatternVariable, "x")]
    );
}

#[test]
fn constant_false_guard() {
    let t = table();
    let src = "case String s when false -> case Integer i ->";
    let analysis = analyze(&t, SwitchKind::Statement, t.object(), src);
    // The guarded case is never selected, so it contributes no coverage.
    assert_eq!(
        analysis.error_kinds(),
        vec![ErrorKind::NonExhaustiveSwitch, ErrorKind::GuardAlwaysFalse]
    );
}

#[test]
fn return_inside_switch_expression() {
    let t = table();
    let int = Ty::Prim(PrimitiveKind::Int);
    let (inner, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(int.clone(), Span::new(60, 61)),
        "default:",
    );
    let inner = inner.with_body(0, CaseBody::new().returns(Span::new(70, 76)));
    let (outer, _) = SwitchInput::parse(
        SwitchKind::Expression,
        Selector::new(int.clone(), SELECTOR),
        "default ->",
    );
    let outer = outer.with_body(0, CaseBody::new().returns(Span::new(30, 36)).switch(inner));
    let analysis = check_switch(&t, &AnalysisConfig::default(), &outer, &ScopeEnv::new());
    assert_eq!(
        analysis.error_kinds(),
        vec![
            ErrorKind::ReturnOutsideExpressionContext,
            ErrorKind::ReturnOutsideExpressionContext
        ]
    );
    assert_eq!(analysis.cases[0].nested.len(), 1);

    // A return in a switch statement is fine.
    let (stmt, _) = SwitchInput::parse(SwitchKind::Statement, Selector::new(int, SELECTOR), "default:");
    let stmt = stmt.with_body(0, CaseBody::new().returns(Span::new(30, 36)));
    assert!(check_switch(&t, &AnalysisConfig::default(), &stmt, &ScopeEnv::new()).is_ok());
}

#[test]
fn nested_switch_sees_outer_bindings() {
    let t = table();
    let (inner, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(t.object(), Span::new(50, 51)),
        "case String s -> default ->",
    );
    let (outer, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(t.object(), SELECTOR),
        "case String s -> default ->",
    );
    let outer = outer.with_body(0, CaseBody::new().switch(inner));
    let analysis = check_switch(&t, &AnalysisConfig::default(), &outer, &ScopeEnv::new());
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::DuplicateBinding]);
}

// ── Whole-analysis properties ──────────────────────────────────────────

#[test]
fn analysis_is_idempotent() {
    let t = table();
    let src = "case Number n -> case Integer i, Double _ -> case 3 ->";
    let first = analyze(&t, SwitchKind::Expression, class(&t, "Number"), src);
    let second = analyze(&t, SwitchKind::Expression, class(&t, "Number"), src);
    assert_eq!(first, second);
    assert!(!first.errors.is_empty());
}

#[test]
fn errors_are_collected_across_cases() {
    let t = table();
    let src = "case Circle(int r, int x) -> case Plain p -> case Square s -> case Poly p ->";
    let analysis = analyze(&t, SwitchKind::Expression, class(&t, "Shape"), src);
    assert_eq!(
        analysis.error_kinds(),
        vec![ErrorKind::ArityMismatch, ErrorKind::UnknownType]
    );
}

#[test]
fn parse_errors_come_first() {
    let t = table();
    let src = "case Circle(var r,) -> case Square s ->";
    let analysis = analyze(&t, SwitchKind::Statement, class(&t, "Shape"), src);
    assert_eq!(analysis.errors[0].kind(), ErrorKind::StructuralParseError);
}

// ── instanceof ─────────────────────────────────────────────────────────

#[test]
fn instanceof_rejects_total_patterns_unless_allowed() {
    let t = table();
    let scope = ScopeEnv::new();
    let config = AnalysisConfig::default();

    let ok = check_instanceof_source(&t, &config, &t.object(), "String s", &scope);
    assert!(ok.is_ok());
    assert!(ok.pattern.is_some());

    let total = check_instanceof_source(&t, &config, &t.string(), "Object o", &scope);
    assert_eq!(
        total.errors.iter().map(PatternError::kind).collect::<Vec<_>>(),
        vec![ErrorKind::IllegalTotalPattern]
    );

    let allowed = AnalysisConfig::default().with_unconditional_instanceof(true);
    assert!(check_instanceof_source(&t, &allowed, &t.string(), "Object o", &scope).is_ok());

    // Record patterns are never total.
    let record = check_instanceof_source(&t, &config, &class(&t, "R"), "R(int i)", &scope);
    assert!(record.is_ok());

    let unrelated = check_instanceof_source(&t, &config, &t.string(), "Integer i", &scope);
    assert_eq!(
        unrelated.errors.iter().map(PatternError::kind).collect::<Vec<_>>(),
        vec![ErrorKind::InconvertibleTypes]
    );
}

#[test]
fn instanceof_var_is_structural() {
    let t = table();
    let analysis = check_instanceof_source(
        &t,
        &AnalysisConfig::default(),
        &t.object(),
        "var x",
        &ScopeEnv::new(),
    );
    assert_eq!(analysis.errors[0].kind(), ErrorKind::StructuralParseError);
    assert!(analysis.pattern.is_none());
}

#[test]
fn case_builder_infers_guard_facts() {
    let label = patmatch_syntax::parse_labels("case String s when s.isEmpty() || count > 0 ->")
        .value
        .remove(0);
    let case = Case::new(label);
    assert_eq!(
        case.guard,
        GuardFacts {
            effectively_final: true,
            reads: vec!["s".to_string(), "count".to_string()],
            assigns: Vec::new(),
        }
    );
}
