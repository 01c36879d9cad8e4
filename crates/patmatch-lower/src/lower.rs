//! Lowering of a verified switch into a [`DecisionSequence`].
//!
//! Every label alternative becomes one candidate. Within a candidate the
//! steps follow the pattern tree top-down: null check and type test, then
//! component extraction and the nested tests, then the bindings the body
//! reads, then the guard. Storage is only allocated for values something
//! reads afterwards. A component matched by a trivial pattern whose
//! variable is never read is extracted into no slot at all.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, trace};

use patmatch_typeck::convert::{is_unconditionally_exact, Coverage};
use patmatch_typeck::guard::GuardKind;
use patmatch_typeck::pattern::{TypedPattern, TypedPatternKind};
use patmatch_typeck::{
    Alternative, CaseAnalysis, PatternError, PrimitiveKind, SwitchAnalysis, SwitchKind, Ty,
    TypeTable,
};

use crate::error::LowerError;
use crate::sequence::{
    Candidate, DecisionSequence, Fallback, MatchError, OnNull, Slot, SlotId, SlotKind, Step,
};

/// Lower an analyzed switch.
///
/// Fails if a fallthrough group does not share one binding environment, or
/// if the analysis reported any error.
#[instrument(level = "debug", skip_all, fields(cases = analysis.cases.len()))]
pub fn lower(table: &TypeTable, analysis: &SwitchAnalysis) -> Result<DecisionSequence, LowerError> {
    check_fallthrough_groups(&analysis.cases)?;
    if !analysis.is_ok() {
        return Err(LowerError::Unverified(analysis.errors.len()));
    }

    let mut lowerer = Lowerer::new(table, &analysis.selector);
    let mut candidates = Vec::new();
    let mut null_candidate = None;
    for case in &analysis.cases {
        let used = used_names(analysis, case);
        for (alternative, alt) in case.alternatives.iter().enumerate() {
            let mut cx = Cx {
                target: case.target,
                used: &used,
                steps: Vec::new(),
            };
            match alt {
                Alternative::Pattern(bound) => {
                    let any = matches!(bound.pattern.kind, TypedPatternKind::Any { .. });
                    if any && case.guard.is_unconditional() && null_candidate.is_none() {
                        null_candidate = Some(candidates.len());
                    }
                    lowerer.pattern(&bound.pattern, SlotId::SELECTOR, false, &mut cx);
                }
                Alternative::Constant { value, .. } => cx.steps.push(Step::ConstTest {
                    slot: SlotId::SELECTOR,
                    value: value.clone(),
                    text: value.describe(table),
                }),
                // Dispatched before any candidate runs.
                Alternative::Null { .. } | Alternative::Default { .. } => continue,
                Alternative::Invalid { .. } => continue,
            }
            if case.guard == GuardKind::Opaque {
                cx.steps.push(Step::Guard {
                    case: case.index,
                    text: case.guard_text.clone().unwrap_or_default(),
                });
            }
            trace!(case = case.index, alternative, steps = cx.steps.len(), "candidate");
            candidates.push(Candidate {
                case_index: case.index,
                alternative,
                target: case.target,
                steps: cx.steps,
            });
        }
    }

    let on_null = if analysis.selector.is_primitive() {
        None
    } else {
        Some(match analysis.null_case() {
            Some(index) => OnNull::Case(analysis.cases[index].target),
            None => null_candidate.map_or(OnNull::Throw, OnNull::Candidate),
        })
    };
    let fallback = match analysis.default_case() {
        Some(index) => Fallback::Default(analysis.cases[index].target),
        None if analysis.exhaustive || analysis.kind == SwitchKind::Expression => {
            Fallback::Throw(MatchError::NoMatch)
        }
        None => Fallback::Skip,
    };

    debug!(
        slots = lowerer.slots.len(),
        candidates = candidates.len(),
        "lowered switch"
    );
    Ok(DecisionSequence {
        slots: lowerer.slots,
        candidates,
        on_null,
        fallback,
    })
}

/// Every label of a fallthrough group must bind what the body's own label
/// binds.
fn check_fallthrough_groups(cases: &[CaseAnalysis]) -> Result<(), PatternError> {
    for case in cases {
        let Some(owner) = cases.get(case.target) else {
            continue;
        };
        if owner.index != case.index && !case.bindings.same_shape(&owner.bindings) {
            return Err(PatternError::InconsistentBindingsAcrossFallthrough {
                span: owner.span,
                other: case.span,
            });
        }
    }
    Ok(())
}

/// Names read once `case` has matched: its own guard, the body it runs,
/// and the labels and bodies of switches nested in that body.
fn used_names(analysis: &SwitchAnalysis, case: &CaseAnalysis) -> FxHashSet<String> {
    let mut used: FxHashSet<String> = case.guard_reads.iter().cloned().collect();
    if let Some(owner) = analysis.cases.get(case.target) {
        used.extend(owner.body_reads.iter().cloned());
        for nested in &owner.nested {
            collect_reads(nested, &mut used);
        }
    }
    used
}

fn collect_reads(analysis: &SwitchAnalysis, used: &mut FxHashSet<String>) {
    for case in &analysis.cases {
        used.extend(case.guard_reads.iter().cloned());
        used.extend(case.body_reads.iter().cloned());
        for nested in &case.nested {
            collect_reads(nested, used);
        }
    }
}

// ── Lowerer ────────────────────────────────────────────────────────────

/// Per-candidate state.
struct Cx<'u> {
    target: usize,
    used: &'u FxHashSet<String>,
    steps: Vec<Step>,
}

impl Cx<'_> {
    /// The binding, if the body or guard reads it.
    fn used<'p>(&self, binding: Option<&'p str>) -> Option<&'p str> {
        binding.filter(|name| self.used.contains(*name))
    }
}

struct Lowerer<'a> {
    table: &'a TypeTable,
    slots: Vec<Slot>,
    /// Binding slots are shared by every alternative reaching a body that
    /// stores a value of the same type.
    bindings: FxHashMap<(usize, String, Ty), SlotId>,
}

impl<'a> Lowerer<'a> {
    fn new(table: &'a TypeTable, selector: &Ty) -> Self {
        let mut lowerer = Lowerer {
            table,
            slots: Vec::new(),
            bindings: FxHashMap::default(),
        };
        lowerer.slot(SlotKind::Selector, selector);
        lowerer
    }

    fn slot(&mut self, kind: SlotKind, ty: &Ty) -> SlotId {
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(Slot {
            id,
            kind,
            ty: ty.clone(),
            ty_name: self.table.show(ty),
        });
        id
    }

    fn temp(&mut self, ty: &Ty) -> SlotId {
        self.slot(SlotKind::Temp, ty)
    }

    fn binding_slot(&mut self, target: usize, name: &str, ty: &Ty) -> SlotId {
        let key = (target, name.to_string(), ty.clone());
        if let Some(id) = self.bindings.get(&key) {
            return *id;
        }
        let id = self.slot(
            SlotKind::Binding {
                target,
                name: name.to_string(),
            },
            ty,
        );
        self.bindings.insert(key, id);
        id
    }

    /// Emit the steps matching `node` against the value in `slot`. The
    /// selector only reaches a candidate as null through
    /// [`OnNull::Candidate`]; a nested value may be null anywhere.
    fn pattern(&mut self, node: &TypedPattern, slot: SlotId, nested: bool, cx: &mut Cx<'_>) {
        match &node.kind {
            TypedPatternKind::Any { binding } => {
                if let Some(name) = cx.used(binding.as_deref()) {
                    cx.steps.push(bind(name, slot, None));
                }
            }
            TypedPatternKind::Type { ty, binding } => {
                let name = cx.used(binding.as_deref());
                match (ty.as_prim(), node.scrutinee.as_prim()) {
                    (Some(to), Some(from)) => {
                        // A constant selector may make the test redundant.
                        if node.runtime == Coverage::Partial {
                            cx.steps.push(Step::ExactTest { slot, to });
                        }
                        if let Some(name) = name {
                            cx.steps.push(bind(name, slot, (to != from).then_some(to)));
                        }
                    }
                    (Some(to), None) => self.unbox(node, to, name, slot, nested, cx),
                    (None, _) => {
                        if node.coverage == Coverage::Partial {
                            self.type_test(slot, ty, cx);
                        }
                        if let Some(name) = name {
                            cx.steps.push(bind(name, slot, None));
                        }
                    }
                }
            }
            TypedPatternKind::Record { ty, fields, .. } => {
                if node.coverage == Coverage::Partial {
                    self.type_test(slot, ty, cx);
                } else if nested {
                    cx.steps.push(Step::NullCheck { slot });
                }
                for (index, field) in fields.iter().enumerate() {
                    let child = &field.pattern;
                    let component = field.name.clone();
                    if child.is_trivial() {
                        match cx.used(child.binding()) {
                            None => cx.steps.push(Step::Extract {
                                from: slot,
                                index,
                                component,
                                into: None,
                            }),
                            Some(name) => {
                                let into = self.binding_slot(cx.target, name, &field.ty);
                                cx.steps.push(Step::Extract {
                                    from: slot,
                                    index,
                                    component,
                                    into: Some(into),
                                });
                                cx.steps.push(bind(name, into, widening(child)));
                            }
                        }
                    } else {
                        let into = self.temp(&field.ty);
                        cx.steps.push(Step::Extract {
                            from: slot,
                            index,
                            component,
                            into: Some(into),
                        });
                        self.pattern(child, into, true, cx);
                    }
                }
            }
        }
    }

    /// A primitive pattern against a reference. A wrapper of the right kind
    /// only needs a null check; anything else is first tested against the
    /// pattern's wrapper class.
    fn unbox(
        &mut self,
        node: &TypedPattern,
        to: PrimitiveKind,
        name: Option<&str>,
        slot: SlotId,
        nested: bool,
        cx: &mut Cx<'_>,
    ) {
        match self.table.unboxed(&node.scrutinee) {
            Some(from) => {
                if nested {
                    cx.steps.push(Step::NullCheck { slot });
                }
                let exact = is_unconditionally_exact(from, to);
                if name.is_none() && exact {
                    return;
                }
                let into = match name {
                    Some(name) if from == to => self.binding_slot(cx.target, name, &Ty::Prim(to)),
                    _ => self.temp(&Ty::Prim(from)),
                };
                cx.steps.push(Step::Unbox {
                    from: slot,
                    into,
                    kind: from,
                });
                if !exact {
                    cx.steps.push(Step::ExactTest { slot: into, to });
                }
                if let Some(name) = name {
                    cx.steps.push(bind(name, into, (from != to).then_some(to)));
                }
            }
            None => {
                let boxed = Ty::class(self.table.box_of(to));
                self.type_test(slot, &boxed, cx);
                if let Some(name) = name {
                    let into = self.binding_slot(cx.target, name, &Ty::Prim(to));
                    cx.steps.push(Step::Unbox {
                        from: slot,
                        into,
                        kind: to,
                    });
                    cx.steps.push(bind(name, into, None));
                }
            }
        }
    }

    /// Every type test is guarded by an explicit null check.
    fn type_test(&self, slot: SlotId, ty: &Ty, cx: &mut Cx<'_>) {
        cx.steps.push(Step::NullCheck { slot });
        cx.steps.push(Step::TypeTest {
            slot,
            ty: ty.clone(),
            ty_name: self.table.show(ty),
        });
    }
}

/// The conversion a total primitive pattern applies, e.g. `long x` on an
/// `int` component.
fn widening(node: &TypedPattern) -> Option<PrimitiveKind> {
    let TypedPatternKind::Type { ty, .. } = &node.kind else {
        return None;
    };
    match (node.scrutinee.as_prim(), ty.as_prim()) {
        (Some(from), Some(to)) if from != to => Some(to),
        _ => None,
    }
}

fn bind(name: &str, slot: SlotId, to: Option<PrimitiveKind>) -> Step {
    Step::Bind {
        name: name.to_string(),
        slot,
        to,
    }
}
