//! Integration tests for lowering: labels are analyzed from source text,
//! lowered, then audited and executed on concrete values.

use patmatch_common::{AnalysisConfig, Span};
use patmatch_lower::{
    lower, run, DecisionSequence, Fallback, LowerError, MatchError, OnNull, SlotTraffic, Value,
};
use patmatch_typeck::convert::ConstValue;
use patmatch_typeck::{
    check_switch, check_switch_source, CaseBody, Decl, ErrorKind, PrimitiveKind, ScopeEnv, Selector, SwitchAnalysis,
    SwitchInput, SwitchKind, Ty, TypeTable,
};
use pretty_assertions::assert_eq;

// ── Helpers ────────────────────────────────────────────────────────────

fn table() -> TypeTable {
    let mut b = TypeTable::builder();
    b.declare(Decl::interface("Shape").sealed(["Circle", "Square", "Poly"]))
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

/// Analyze `labels`, giving case `i` a body that reads `reads[i]`.
fn analyze(
    t: &TypeTable,
    kind: SwitchKind,
    selector: Ty,
    labels: &str,
    reads: &[&[&str]],
) -> SwitchAnalysis {
    let (mut input, errors) =
        SwitchInput::parse(kind, Selector::new(selector, Span::new(0, 0)), labels);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);
    for (index, names) in reads.iter().enumerate() {
        input = input.with_body(index, CaseBody::new().reads(names.iter().copied()));
    }
    check_switch(t, &AnalysisConfig::default(), &input, &ScopeEnv::new())
}

fn lowered(
    t: &TypeTable,
    kind: SwitchKind,
    selector: Ty,
    labels: &str,
    reads: &[&[&str]],
) -> DecisionSequence {
    let analysis = analyze(t, kind, selector, labels, reads);
    assert!(analysis.is_ok(), "analysis errors: {:?}", analysis.errors);
    let sequence = lower(t, &analysis).unwrap();
    let traffic = SlotTraffic::of(&sequence);
    assert!(
        traffic.unused_stores().is_empty(),
        "unused stores {:?} in\n{}",
        traffic.unused_stores(),
        sequence
    );
    assert!(traffic.unset_loads(&sequence).is_empty());
    sequence
}

fn no_guard(_: usize, _: &[(String, Value)]) -> bool {
    panic!("no guard expected")
}

fn circle(t: &TypeTable, r: f64) -> Value {
    Value::record(
        t.lookup("Circle").unwrap(),
        vec![Value::Float {
            value: r,
            kind: PrimitiveKind::Double,
        }],
    )
}

// ── Storage ────────────────────────────────────────────────────────────

#[test]
fn unread_record_component_gets_no_slot() {
    let t = table();
    let seq = lowered(&t, SwitchKind::Expression, class(&t, "R"), "case R(int i) ->", &[&[]]);
    assert_eq!(seq.slots.len(), 1);
    assert_eq!(SlotTraffic::of(&seq).total_stores(), 0);
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: R
    case 0.0 -> body 0
      extract s0.i -> _
    null -> throw NullSelector
    else -> throw NoMatch
    "###);
}

#[test]
fn read_record_component_is_stored_and_bound() {
    let t = table();
    let seq = lowered(&t, SwitchKind::Expression, class(&t, "R"), "case R(int i) ->", &[&["i"]]);
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: R
      s1 i: int
    case 0.0 -> body 0
      extract s0.i -> s1
      bind i = s1
    null -> throw NullSelector
    else -> throw NoMatch
    "###);

    let r = Value::record(t.lookup("R").unwrap(), vec![Value::int(4)]);
    let selection = run(&t, &seq, r, no_guard).unwrap();
    assert_eq!(selection.target, Some(0));
    assert_eq!(selection.binding("i"), Some(&Value::int(4)));
}

// ── Sealed hierarchies and guards ──────────────────────────────────────

fn shape_switch(t: &TypeTable) -> DecisionSequence {
    lowered(
        t,
        SwitchKind::Expression,
        class(t, "Shape"),
        "case Circle(double r) when r > 1.0 -> case Circle c -> case Square s -> case Poly p ->",
        &[&[], &["c"], &[], &[]],
    )
}

fn big_circles(_: usize, bindings: &[(String, Value)]) -> bool {
    matches!(bindings, [(_, Value::Float { value, .. })] if *value > 1.0)
}

#[test]
fn guard_runs_after_bindings() {
    let t = table();
    insta::assert_snapshot!(shape_switch(&t).to_string(), @r###"
    slots
      s0 selector: Shape
      s1 r: double
    case 0.0 -> body 0
      null-check s0
      type-test s0 Circle
      extract s0.r -> s1
      bind r = s1
      guard `r > 1.0`
    case 1.0 -> body 1
      null-check s0
      type-test s0 Circle
      bind c = s0
    case 2.0 -> body 2
      null-check s0
      type-test s0 Square
    case 3.0 -> body 3
      null-check s0
      type-test s0 Poly
    null -> throw NullSelector
    else -> throw NoMatch
    "###);
}

#[test]
fn failed_guard_falls_through_to_next_candidate() {
    let t = table();
    let seq = shape_switch(&t);

    let big = run(&t, &seq, circle(&t, 2.0), big_circles).unwrap();
    assert_eq!(big.target, Some(0));

    let small = run(&t, &seq, circle(&t, 0.5), big_circles).unwrap();
    assert_eq!(small.target, Some(1));
    assert_eq!(small.binding("c"), Some(&circle(&t, 0.5)));

    let tri = Value::record(t.lookup("Tri").unwrap(), Vec::new());
    assert_eq!(run(&t, &seq, tri, big_circles).unwrap().target, Some(3));
}

#[test]
fn null_selector_never_matches_a_type_test() {
    let t = table();
    let seq = shape_switch(&t);
    assert_eq!(seq.on_null, Some(OnNull::Throw));
    assert_eq!(
        run(&t, &seq, Value::Null, big_circles),
        Err(MatchError::NullSelector)
    );

    let object = lowered(&t, SwitchKind::Expression, t.object(), "case Object o ->", &[&["o"]]);
    assert_eq!(
        run(&t, &object, Value::Null, no_guard),
        Err(MatchError::NullSelector)
    );
}

#[test]
fn top_level_var_binds_a_null_selector() {
    let t = table();
    let seq = lowered(
        &t,
        SwitchKind::Expression,
        t.object(),
        "case String s -> case var x ->",
        &[&[], &["x"]],
    );
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: Object
    case 0.0 -> body 0
      null-check s0
      type-test s0 String
    case 1.0 -> body 1
      bind x = s0
    null -> case 1.0
    else -> throw NoMatch
    "###);
    assert_eq!(seq.on_null, Some(OnNull::Candidate(1)));

    let null = run(&t, &seq, Value::Null, no_guard).unwrap();
    assert_eq!(null.target, Some(1));
    assert_eq!(null.binding("x"), Some(&Value::Null));
}

#[test]
fn case_null_wins_over_top_level_unnamed() {
    let t = table();
    let seq = lowered(
        &t,
        SwitchKind::Expression,
        t.object(),
        "case _ -> case null ->",
        &[],
    );
    assert_eq!(seq.on_null, Some(OnNull::Case(1)));

    let guarded = lowered(
        &t,
        SwitchKind::Expression,
        t.object(),
        "case var x when x.hashCode() > 0 -> case Object o ->",
        &[],
    );
    assert_eq!(guarded.on_null, Some(OnNull::Throw));
}

// ── Nested patterns ────────────────────────────────────────────────────

#[test]
fn nested_total_pattern_matches_null_component() {
    let t = table();
    let seq = lowered(
        &t,
        SwitchKind::Expression,
        t.object(),
        "case Box(String s) -> case Box(var v) -> default ->",
        &[&["s"], &["v"], &[]],
    );
    let boxed = |value: Value| Value::record(t.lookup("Box").unwrap(), vec![value]);

    let text = run(&t, &seq, boxed(Value::Str("a".to_string())), no_guard).unwrap();
    assert_eq!(text.target, Some(0));
    assert_eq!(text.binding("s"), Some(&Value::Str("a".to_string())));

    let empty = run(&t, &seq, boxed(Value::Null), no_guard).unwrap();
    assert_eq!(empty.target, Some(1));
    assert_eq!(empty.binding("v"), Some(&Value::Null));

    let other = run(&t, &seq, Value::Str("b".to_string()), no_guard).unwrap();
    assert_eq!(other.target, Some(2));
    assert_eq!(seq.fallback, Fallback::Default(2));
}

#[test]
fn nested_record_rejects_null_component() {
    let t = table();
    let seq = lowered(
        &t,
        SwitchKind::Statement,
        class(&t, "Box"),
        "case Box(R(var i)) -> default ->",
        &[&["i"], &[]],
    );
    let b = t.lookup("Box").unwrap();
    let r = t.lookup("R").unwrap();

    let inner = Value::record(r, vec![Value::int(9)]);
    let hit = run(&t, &seq, Value::record(b, vec![inner]), no_guard).unwrap();
    assert_eq!(hit.target, Some(0));
    assert_eq!(hit.binding("i"), Some(&Value::int(9)));

    let miss = run(&t, &seq, Value::record(b, vec![Value::Null]), no_guard).unwrap();
    assert_eq!(miss.target, Some(1));
}

// ── Primitives ─────────────────────────────────────────────────────────

#[test]
fn primitive_patterns_test_exactness() {
    let t = table();
    let seq = lowered(
        &t,
        SwitchKind::Expression,
        Ty::Prim(PrimitiveKind::Int),
        "case byte b -> case int i ->",
        &[&["b"], &["i"]],
    );
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: int
    case 0.0 -> body 0
      exact-test s0 byte
      bind b = s0 as byte
    case 1.0 -> body 1
      bind i = s0
    else -> throw NoMatch
    "###);

    let small = run(&t, &seq, Value::int(5), no_guard).unwrap();
    assert_eq!(small.target, Some(0));
    assert_eq!(
        small.binding("b"),
        Some(&Value::Int {
            value: 5,
            kind: PrimitiveKind::Byte
        })
    );
    assert_eq!(run(&t, &seq, Value::int(300), no_guard).unwrap().target, Some(1));
}

#[test]
fn constant_selector_drops_the_exactness_test() {
    let t = table();
    let selector = Selector::new(Ty::Prim(PrimitiveKind::Int), Span::new(0, 0))
        .with_constant(ConstValue::Int {
            value: 42,
            kind: PrimitiveKind::Int,
        });
    let analysis = check_switch_source(
        &t,
        &AnalysisConfig::default(),
        SwitchKind::Expression,
        selector,
        "case byte b -> default ->",
        &ScopeEnv::new(),
    );
    assert!(analysis.is_ok(), "analysis errors: {:?}", analysis.errors);
    let seq = lower(&t, &analysis).unwrap();
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: int
    case 0.0 -> body 0
    else -> body 1
    "###);
    assert_eq!(run(&t, &seq, Value::int(42), no_guard).unwrap().target, Some(0));
}

#[test]
fn wrapper_selector_is_unboxed() {
    let t = table();
    let integer = Ty::class(t.box_of(PrimitiveKind::Int));
    let seq = lowered(
        &t,
        SwitchKind::Expression,
        integer,
        "case int i when i > 0 -> case int i ->",
        &[&[], &["i"]],
    );
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: Integer
      s1 i: int
      s2 i: int
    case 0.0 -> body 0
      unbox s0 -> s1 int
      bind i = s1
      guard `i > 0`
    case 1.0 -> body 1
      unbox s0 -> s2 int
      bind i = s2
    null -> throw NullSelector
    else -> throw NoMatch
    "###);

    let positive = |_: usize, b: &[(String, Value)]| {
        matches!(b, [(_, Value::Int { value, .. })] if *value > 0)
    };
    let neg = run(&t, &seq, Value::boxed(Value::int(-3)), positive).unwrap();
    assert_eq!(neg.target, Some(1));
    assert_eq!(neg.binding("i"), Some(&Value::int(-3)));
}

// ── Constants, null and default ────────────────────────────────────────

#[test]
fn enum_statement_without_default_skips() {
    let t = table();
    let seq = lowered(
        &t,
        SwitchKind::Statement,
        class(&t, "Color"),
        "case RED -> case GREEN ->",
        &[],
    );
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: Color
    case 0.0 -> body 0
      const-test s0 == Color.RED
    case 1.0 -> body 1
      const-test s0 == Color.GREEN
    null -> throw NullSelector
    else -> skip
    "###);

    let color = t.lookup("Color").unwrap();
    let blue = Value::Enum {
        ty: color,
        name: "BLUE".to_string(),
    };
    assert_eq!(run(&t, &seq, blue, no_guard).unwrap().target, None);
    let green = Value::Enum {
        ty: color,
        name: "GREEN".to_string(),
    };
    assert_eq!(run(&t, &seq, green, no_guard).unwrap().target, Some(1));
}

#[test]
fn case_null_and_default_are_dispatched_outside_candidates() {
    let t = table();
    let seq = lowered(
        &t,
        SwitchKind::Expression,
        t.string(),
        "case null -> case \"a\" -> default ->",
        &[],
    );
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: String
    case 1.0 -> body 1
      const-test s0 == "a"
    null -> body 0
    else -> body 2
    "###);
    assert_eq!(run(&t, &seq, Value::Null, no_guard).unwrap().target, Some(0));
    let a = run(&t, &seq, Value::Str("a".to_string()), no_guard).unwrap();
    assert_eq!(a.target, Some(1));
}

// ── Fallthrough ────────────────────────────────────────────────────────

#[test]
fn label_only_case_targets_next_body() {
    let t = table();
    let (input, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(Ty::Prim(PrimitiveKind::Int), Span::new(0, 0)),
        "case 1: case 2: default:",
    );
    let input = input.with_body(0, CaseBody::empty());
    let analysis = check_switch(&t, &AnalysisConfig::default(), &input, &ScopeEnv::new());
    let seq = lower(&t, &analysis).unwrap();
    insta::assert_snapshot!(seq.to_string(), @r###"
    slots
      s0 selector: int
    case 0.0 -> body 1
      const-test s0 == 1
    case 1.0 -> body 1
      const-test s0 == 2
    else -> body 2
    "###);
    assert_eq!(run(&t, &seq, Value::int(1), no_guard).unwrap().target, Some(1));
}

#[test]
fn fallthrough_group_with_different_bindings_is_rejected() {
    let t = table();
    let (input, _) = SwitchInput::parse(
        SwitchKind::Statement,
        Selector::new(t.object(), Span::new(0, 0)),
        "case Integer i: case String s: default:",
    );
    let input = input
        .with_body(0, CaseBody::empty())
        .with_body(1, CaseBody::new().reads(["s"]));
    let analysis = check_switch(&t, &AnalysisConfig::default(), &input, &ScopeEnv::new());
    let err = lower(&t, &analysis).unwrap_err();
    assert_eq!(
        err.kind(),
        Some(ErrorKind::InconsistentBindingsAcrossFallthrough)
    );
}

#[test]
fn switch_with_errors_is_not_lowered() {
    let t = table();
    let analysis = analyze(
        &t,
        SwitchKind::Expression,
        class(&t, "Shape"),
        "case Circle c ->",
        &[],
    );
    assert_eq!(analysis.error_kinds(), vec![ErrorKind::NonExhaustiveSwitch]);
    let err = lower(&t, &analysis).unwrap_err();
    assert!(matches!(err, LowerError::Unverified(1)));
    assert_eq!(err.kind(), None);
    assert_eq!(err.to_string(), "cannot lower a switch with 1 unresolved error(s)");
}

// ── Audit ──────────────────────────────────────────────────────────────

#[test]
fn no_sequence_stores_without_loading() {
    let t = table();
    let shape = class(&t, "Shape");
    let sources: [(&str, &[&[&str]]); 4] = [
        ("case Circle(var r) -> case Square(int side) -> case Poly p ->", &[&[], &["side"], &[]]),
        ("case Circle(double r) -> case Square(long side) -> case Poly p ->", &[&["r"], &[], &["p"]]),
        ("case Circle(double _) -> case Square _ -> case Tri t -> case Quad q ->", &[]),
        ("case Circle c when c.r() > 0 -> case Circle c -> case Square(byte b) -> default ->", &[&["c"], &[], &["b"], &[]]),
    ];
    for (labels, reads) in sources {
        let seq = lowered(&t, SwitchKind::Expression, shape.clone(), labels, reads);
        assert!(!seq.candidates.is_empty(), "{labels}");
    }
}
