//! Exhaustiveness of a set of unguarded case labels.
//!
//! Each pattern is abstracted to a [`Space`]: either a binding over an
//! erased type, or a record with one nested space per component. The set
//! of spaces is then rewritten until it either contains a binding that
//! covers the selector or stops changing:
//!
//! 1. bindings for every permitted subtype of a sealed abstract type are
//!    joined into a binding for that type;
//! 2. record spaces that differ in exactly one component are grouped and
//!    that column is reduced recursively;
//! 3. a record whose components are all covered becomes a binding for the
//!    record type;
//! 4. record spaces already covered by a binding for their type are
//!    dropped.
//!
//! Step 2 first groups candidates by the hash of the other columns, which
//! is fast but only joins exactly equal columns. When a round makes no
//! progress it is retried with grouping disabled, so that a binding in one
//! row may stand in for a binding of a subtype in another.
//!
//! Every comparison spends one unit of a fixed budget. Running out is not
//! an error: the caller reports the switch as non-exhaustive and warns.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use tracing::{debug, trace};

use crate::convert::{is_unconditionally_exact, ConstValue};
use crate::pattern::{TypedPattern, TypedPatternKind};
use crate::table::TypeTable;
use crate::ty::{PrimitiveKind, Ty, TypeId};
use crate::unify::instantiate_pattern_type;

/// Abstract description of the values a pattern matches.
#[derive(Clone, Debug)]
pub enum Space {
    /// Every value of an erased type.
    Binding(Ty),
    Record {
        record: TypeId,
        /// Full component types; not part of equality.
        component_types: Vec<Ty>,
        nested: Vec<Space>,
    },
}

impl PartialEq for Space {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Space::Binding(a), Space::Binding(b)) => a == b,
            (
                Space::Record {
                    record: r1,
                    nested: n1,
                    ..
                },
                Space::Record {
                    record: r2,
                    nested: n2,
                    ..
                },
            ) => r1 == r2 && n1 == n2,
            _ => false,
        }
    }
}

impl Eq for Space {}

impl Hash for Space {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Space::Binding(ty) => {
                0u8.hash(state);
                ty.hash(state);
            }
            Space::Record { record, nested, .. } => {
                1u8.hash(state);
                record.hash(state);
                nested.hash(state);
            }
        }
    }
}

impl Space {
    fn binding_id(&self) -> Option<TypeId> {
        match self {
            Space::Binding(ty) => ty.class_id(),
            Space::Record { .. } => None,
        }
    }

    /// Hash of every nested space except column `skip`.
    fn hash_without(&self, skip: usize) -> u64 {
        let mut hasher = FxHasher::default();
        if let Space::Record { record, nested, .. } = self {
            record.hash(&mut hasher);
            for (i, n) in nested.iter().enumerate() {
                if i != skip {
                    n.hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }
}

/// An unguarded label as seen by the exhaustiveness check.
#[derive(Clone, Copy, Debug)]
pub enum CoverageLabel<'p> {
    Pattern(&'p TypedPattern),
    Constant(&'p ConstValue),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Exhaustive,
    NotExhaustive,
    /// The work budget ran out before a decision.
    GaveUp,
}

struct OutOfBudget;

type Spaces = FxHashSet<Space>;
type Step<T> = Result<T, OutOfBudget>;

struct Checker<'a> {
    table: &'a TypeTable,
    budget: usize,
    spent: usize,
}

/// Decide whether `labels` cover every value of `selector`.
pub fn check_exhaustive(
    table: &TypeTable,
    selector: &Ty,
    labels: &[CoverageLabel<'_>],
    budget: usize,
) -> Outcome {
    let mut checker = Checker {
        table,
        budget,
        spent: 0,
    };
    match checker.exhausts(selector, labels) {
        Ok(true) => Outcome::Exhaustive,
        Ok(false) => Outcome::NotExhaustive,
        Err(OutOfBudget) => {
            debug!(budget, "exhaustiveness budget exhausted");
            Outcome::GaveUp
        }
    }
}

impl<'a> Checker<'a> {
    fn tick(&mut self) -> Step<()> {
        self.spent += 1;
        if self.spent > self.budget {
            Err(OutOfBudget)
        } else {
            Ok(())
        }
    }

    fn exhausts(&mut self, selector: &Ty, labels: &[CoverageLabel<'_>]) -> Step<bool> {
        let table = self.table;
        let component = selector.erased();
        let is_boolean = selector.as_prim().or_else(|| table.unboxed(selector))
            == Some(PrimitiveKind::Boolean);

        let mut spaces = Spaces::default();
        let mut booleans = [false; 2];
        let mut enums: Vec<(TypeId, Vec<String>)> = Vec::new();

        for label in labels {
            match label {
                CoverageLabel::Pattern(pattern) => {
                    spaces.insert(self.describe(&component, pattern));
                }
                CoverageLabel::Constant(ConstValue::Bool(b)) if is_boolean => {
                    booleans[usize::from(*b)] = true;
                }
                CoverageLabel::Constant(ConstValue::Enum { ty, name }) => {
                    match enums.iter_mut().find(|(id, _)| id == ty) {
                        Some((_, seen)) => seen.push(name.clone()),
                        None => enums.push((*ty, vec![name.clone()])),
                    }
                }
                CoverageLabel::Constant(_) => {}
            }
        }

        if is_boolean && booleans == [true, true] {
            return Ok(true);
        }
        for (id, seen) in &enums {
            let all = table
                .enum_constants(*id)
                .is_some_and(|constants| constants.iter().all(|c| seen.contains(c)));
            if all {
                spaces.insert(Space::Binding(Ty::class(*id)));
            }
        }

        let mut use_hashes = true;
        let mut repeat = true;
        let mut round = 0;
        while repeat {
            round += 1;
            let mut updated = self.reduce_binding_patterns(selector, &spaces)?;
            updated = self.reduce_nested_patterns(&updated, use_hashes)?;
            updated = self.reduce_record_patterns(&updated)?;
            updated = remove_covered_record_patterns(&updated);
            repeat = updated != spaces;
            trace!(round, use_hashes, changed = repeat, size = updated.len(), "reduction round");
            if self.check_covered(selector, spaces.iter())? {
                return Ok(true);
            }
            if repeat {
                use_hashes = true;
            } else {
                // A stalled round is retried once with subtype-aware joins.
                repeat = use_hashes;
                use_hashes = false;
            }
            spaces = updated;
        }
        self.check_covered(selector, spaces.iter())
    }

    fn describe(&self, selector: &Ty, pattern: &TypedPattern) -> Space {
        match &pattern.kind {
            TypedPatternKind::Type { ty, .. } => {
                let ty = if !selector.is_primitive() && self.table.is_subtype(selector, ty) {
                    selector
                } else {
                    ty
                };
                Space::Binding(ty.erased())
            }
            TypedPatternKind::Any { .. } => Space::Binding(selector.erased()),
            TypedPatternKind::Record { record, fields, .. } => Space::Record {
                record: *record,
                component_types: fields.iter().map(|f| f.ty.clone()).collect(),
                nested: fields
                    .iter()
                    .map(|f| self.describe(&f.ty.erased(), &f.pattern))
                    .collect(),
            },
        }
    }

    fn check_covered<'s>(
        &mut self,
        selector: &Ty,
        spaces: impl Iterator<Item = &'s Space>,
    ) -> Step<bool> {
        for space in spaces {
            if is_bp_covered(self.table, selector, space) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Join bindings that together cover a sealed abstract supertype.
    fn reduce_binding_patterns(&mut self, selector: &Ty, spaces: &Spaces) -> Step<Spaces> {
        let table = self.table;
        let selector_erased = selector.erased();
        let existing: FxHashSet<TypeId> = spaces.iter().filter_map(Space::binding_id).collect();

        for one in spaces {
            let Space::Binding(one_ty) = one else {
                continue;
            };
            let mut to_add = Vec::new();

            for sup in table.direct_supertypes(one_ty) {
                let Some(clazz) = sup.class_id() else {
                    continue;
                };
                let decl = table.decl(clazz);
                if !decl.is_sealed() || !decl.is_abstract || existing.contains(&clazz) {
                    continue;
                }
                self.tick()?;
                // Never reduce to a type unrelated to the selector.
                if !table.is_subtype(&Ty::class(clazz), &selector_erased) {
                    continue;
                }

                let mut permitted = all_permitted_subtypes(table, clazz, &mut |csym| {
                    let instantiated = if table.decl(csym).params.is_empty() {
                        Some(Ty::class(csym))
                    } else {
                        instantiate_pattern_type(table, csym, selector)
                    };
                    instantiated.is_some_and(|inst| table.is_castable(selector, &inst))
                });

                for other in spaces {
                    let Space::Binding(other_ty) = other else {
                        continue;
                    };
                    self.tick()?;
                    let current = match other_ty.class_id() {
                        Some(id) => all_permitted_subtypes(table, id, &mut |_| true),
                        None => Vec::new(),
                    };
                    let mut kept = Vec::with_capacity(permitted.len());
                    for perm in permitted {
                        let perm_ty = Ty::class(perm);
                        let covered = current
                            .iter()
                            .any(|c| table.is_subtype(&Ty::class(*c), &perm_ty))
                            || table.is_subtype(&perm_ty, other_ty);
                        if !covered {
                            kept.push(perm);
                        }
                    }
                    permitted = kept;
                }

                if permitted.is_empty() {
                    trace!(sealed = %decl.name, "permitted subtypes covered");
                    to_add.push(Space::Binding(Ty::class(clazz)));
                }
            }

            if !to_add.is_empty() {
                let mut out = spaces.clone();
                out.extend(to_add);
                return Ok(out);
            }
        }
        Ok(spaces.clone())
    }

    /// Find record spaces that differ in a single column and reduce that
    /// column.
    fn reduce_nested_patterns(&mut self, spaces: &Spaces, use_hashes: bool) -> Step<Spaces> {
        let mut groups: Vec<(TypeId, Vec<Space>)> = Vec::new();
        for space in spaces {
            if let Space::Record { record, .. } = space {
                match groups.iter_mut().find(|(id, _)| id == record) {
                    Some((_, group)) => group.push(space.clone()),
                    None => groups.push((*record, vec![space.clone()])),
                }
            }
        }
        groups.sort_by_key(|(id, _)| *id);

        for (record, group) in groups {
            let arity = self.table.decl(record).components.len();
            let original: Spaces = group.iter().cloned().collect();
            let mut current = original.clone();

            for column in 0..arity {
                let mut buckets: FxHashMap<u64, Vec<Space>> = FxHashMap::default();
                let mut order = Vec::new();
                for space in &current {
                    let Space::Record { nested, .. } = space else {
                        continue;
                    };
                    if nested.len() != arity {
                        continue;
                    }
                    let key = if use_hashes { space.hash_without(column) } else { 0 };
                    let bucket = buckets.entry(key).or_default();
                    if bucket.is_empty() {
                        order.push(key);
                    }
                    bucket.push(space.clone());
                }

                for key in order {
                    let candidates = buckets.remove(&key).unwrap_or_default();
                    for (first, one) in candidates.iter().enumerate() {
                        let Space::Record {
                            record: one_record,
                            component_types,
                            nested: one_nested,
                        } = one
                        else {
                            continue;
                        };
                        let mut join = vec![one];

                        'next: for (next, other) in candidates.iter().enumerate() {
                            if next == first {
                                continue;
                            }
                            let Space::Record {
                                record: other_record,
                                nested: other_nested,
                                ..
                            } = other
                            else {
                                continue;
                            };
                            if one_record != other_record {
                                continue;
                            }
                            self.tick()?;
                            for i in 0..arity {
                                if i == column {
                                    continue;
                                }
                                if one_nested[i] != other_nested[i] {
                                    let subsumed = !use_hashes
                                        && matches!(
                                            (&one_nested[i], &other_nested[i]),
                                            (Space::Binding(a), Space::Binding(b))
                                                if self.table.is_subtype(a, b)
                                        );
                                    if !subsumed {
                                        continue 'next;
                                    }
                                }
                            }
                            join.push(other);
                        }

                        let column_spaces: Spaces = join
                            .iter()
                            .filter_map(|rp| match rp {
                                Space::Record { nested, .. } => nested.get(column).cloned(),
                                Space::Binding(_) => None,
                            })
                            .collect();
                        let mut updated = self.reduce_nested_patterns(&column_spaces, use_hashes)?;
                        updated = self.reduce_record_patterns(&updated)?;
                        updated = remove_covered_record_patterns(&updated);
                        updated = self.reduce_binding_patterns(&component_types[column], &updated)?;

                        if updated != column_spaces {
                            if use_hashes {
                                for joined in &join {
                                    current.remove(*joined);
                                }
                            }
                            for nested in updated {
                                let mut new_nested = one_nested.clone();
                                new_nested[column] = nested;
                                current.insert(Space::Record {
                                    record: *one_record,
                                    component_types: component_types.clone(),
                                    nested: new_nested,
                                });
                            }
                        }
                    }
                }
            }

            if current != original {
                let mut result: Spaces = spaces.difference(&original).cloned().collect();
                result.extend(current);
                return Ok(result);
            }
        }
        Ok(spaces.clone())
    }

    fn reduce_record_patterns(&mut self, spaces: &Spaces) -> Step<Spaces> {
        let mut out = Spaces::default();
        let mut modified = false;
        for space in spaces {
            let reduced = self.reduce_record_pattern(space)?;
            modified |= reduced.as_ref().is_some();
            out.insert(reduced.unwrap_or_else(|| space.clone()));
        }
        Ok(if modified { out } else { spaces.clone() })
    }

    /// `Some` when the space was rewritten.
    fn reduce_record_pattern(&mut self, space: &Space) -> Step<Option<Space>> {
        let Space::Record {
            record,
            component_types,
            nested,
        } = space
        else {
            return Ok(None);
        };
        if component_types.len() != nested.len() {
            return Ok(None);
        }
        let mut reduced: Option<Vec<Space>> = None;
        let mut covered = true;
        for (i, (ty, inner)) in component_types.iter().zip(nested).enumerate() {
            let new_inner = self.reduce_record_pattern(inner)?;
            if let Some(new_inner) = &new_inner {
                reduced.get_or_insert_with(|| nested.clone())[i] = new_inner.clone();
            }
            let candidate = new_inner.as_ref().unwrap_or(inner);
            covered &= self.check_covered(ty, std::iter::once(candidate))?;
        }
        if covered {
            return Ok(Some(Space::Binding(Ty::class(*record))));
        }
        Ok(reduced.map(|nested| Space::Record {
            record: *record,
            component_types: component_types.clone(),
            nested,
        }))
    }
}

/// Drop record spaces whose record type already has a binding.
fn remove_covered_record_patterns(spaces: &Spaces) -> Spaces {
    let bindings: FxHashSet<TypeId> = spaces.iter().filter_map(Space::binding_id).collect();
    spaces
        .iter()
        .filter(|space| match space {
            Space::Record { record, .. } => !bindings.contains(record),
            Space::Binding(_) => true,
        })
        .cloned()
        .collect()
}

/// Every accepted type reachable through `permits` from `root`, following
/// only sealed abstract types.
fn all_permitted_subtypes(
    table: &TypeTable,
    root: TypeId,
    accept: &mut dyn FnMut(TypeId) -> bool,
) -> Vec<TypeId> {
    let mut permitted = Vec::new();
    let mut work = vec![root];
    while let Some(current) = work.pop() {
        let decl = table.decl(current);
        if !(decl.is_sealed() && decl.is_abstract) {
            continue;
        }
        for &sub in table.permitted(current) {
            if accept(sub) && !permitted.contains(&sub) {
                work.push(sub);
                permitted.push(sub);
            }
        }
    }
    permitted
}

/// Does a binding space cover every value of `component`?
fn is_bp_covered(table: &TypeTable, component: &Ty, space: &Space) -> bool {
    let Space::Binding(bt) = space else {
        return false;
    };
    let selector = component.erased();
    match selector.as_prim() {
        Some(sel) => match bt.as_prim() {
            Some(target) => is_unconditionally_exact(sel, target),
            None => table.is_subtype(&Ty::class(table.box_of(sel)), bt),
        },
        None => {
            let unboxed_exact = bt.as_prim().is_some_and(|target| {
                table
                    .unboxed(&selector)
                    .is_some_and(|source| is_unconditionally_exact(source, target))
            });
            unboxed_exact || table.is_subtype(&selector, bt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Binder;
    use crate::pattern::BoundPattern;
    use crate::scope::ScopeEnv;
    use crate::table::Decl;

    fn shapes() -> TypeTable {
        let mut b = TypeTable::builder();
        b.declare(Decl::interface("Shape").sealed(["Circle", "Square", "Poly"]))
            .declare(Decl::record("Circle").implements("Shape").component("r", "double"))
            .declare(Decl::record("Square").implements("Shape").component("side", "int"))
            .declare(Decl::interface("Poly").extends("Shape").sealed(["Tri", "Quad"]))
            .declare(Decl::record("Tri").implements("Poly"))
            .declare(Decl::record("Quad").implements("Poly"))
            .declare(Decl::record("Pair").component("a", "Shape").component("b", "Shape"))
            .declare(Decl::enumeration("Color").constants(["RED", "GREEN"]));
        b.build().unwrap()
    }

    fn ty(table: &TypeTable, text: &str) -> Ty {
        table
            .resolve(&patmatch_syntax::parse_type(text).value.unwrap(), &[])
            .unwrap()
    }

    fn bind_all(table: &TypeTable, selector: &Ty, sources: &[&str]) -> Vec<BoundPattern> {
        let scope = ScopeEnv::new();
        let mut binder = Binder::new(table, &scope);
        sources
            .iter()
            .map(|src| {
                let pattern = patmatch_syntax::parse_pattern(src).value.unwrap();
                binder.bind(&pattern, selector).unwrap()
            })
            .collect()
    }

    fn outcome(table: &TypeTable, selector: &str, sources: &[&str]) -> Outcome {
        let selector = ty(table, selector);
        let bound = bind_all(table, &selector, sources);
        let labels: Vec<CoverageLabel<'_>> =
            bound.iter().map(|b| CoverageLabel::Pattern(&b.pattern)).collect();
        check_exhaustive(table, &selector, &labels, 1_000_000)
    }

    #[test]
    fn all_permitted_subtypes_exhaust() {
        let t = shapes();
        assert_eq!(
            outcome(&t, "Shape", &["Circle c", "Square s", "Tri t", "Quad q"]),
            Outcome::Exhaustive
        );
        assert_eq!(
            outcome(&t, "Shape", &["Circle c", "Square s", "Poly p"]),
            Outcome::Exhaustive
        );
    }

    #[test]
    fn missing_subtype_is_not_exhaustive() {
        let t = shapes();
        assert_eq!(
            outcome(&t, "Shape", &["Circle c", "Square s", "Tri t"]),
            Outcome::NotExhaustive
        );
    }

    #[test]
    fn record_columns_are_reduced() {
        let t = shapes();
        assert_eq!(
            outcome(
                &t,
                "Pair",
                &[
                    "Pair(Circle a, Shape b)",
                    "Pair(Square a, Shape b)",
                    "Pair(Poly a, Shape b)",
                ]
            ),
            Outcome::Exhaustive
        );
        assert_eq!(
            outcome(
                &t,
                "Pair",
                &["Pair(Circle a, Circle b)", "Pair(Square a, Shape b)", "Pair(Poly a, Shape b)"]
            ),
            Outcome::NotExhaustive
        );
    }

    #[test]
    fn rows_collapse_across_columns() {
        let t = shapes();
        // The Square rows collapse to Pair(Square, Shape) first, which then
        // joins the other rows on the first column.
        assert_eq!(
            outcome(
                &t,
                "Pair",
                &[
                    "Pair(Circle a, Shape b)",
                    "Pair(Square a, Circle b)",
                    "Pair(Square a, Square b)",
                    "Pair(Square a, Poly b)",
                    "Pair(Poly a, Shape b)",
                ]
            ),
            Outcome::Exhaustive
        );
    }

    #[test]
    fn nested_record_collapses_to_binding() {
        let t = shapes();
        assert_eq!(
            outcome(&t, "Shape", &["Circle(var r)", "Square(int s)", "Poly p"]),
            Outcome::Exhaustive
        );
        assert_eq!(
            outcome(&t, "Shape", &["Circle(var r)", "Square(byte s)", "Poly p"]),
            Outcome::NotExhaustive
        );
    }

    #[test]
    fn enum_constants_and_booleans() {
        let t = shapes();
        let color = t.lookup("Color").unwrap();
        let red = ConstValue::Enum {
            ty: color,
            name: "RED".into(),
        };
        let green = ConstValue::Enum {
            ty: color,
            name: "GREEN".into(),
        };
        let selector = Ty::class(color);
        let both = [CoverageLabel::Constant(&red), CoverageLabel::Constant(&green)];
        assert_eq!(check_exhaustive(&t, &selector, &both, 100), Outcome::Exhaustive);
        assert_eq!(
            check_exhaustive(&t, &selector, &both[..1], 100),
            Outcome::NotExhaustive
        );

        let boolean = Ty::Prim(PrimitiveKind::Boolean);
        let yes = ConstValue::Bool(true);
        let no = ConstValue::Bool(false);
        let labels = [CoverageLabel::Constant(&yes), CoverageLabel::Constant(&no)];
        assert_eq!(check_exhaustive(&t, &boolean, &labels, 100), Outcome::Exhaustive);
    }

    #[test]
    fn primitive_patterns_need_exact_coverage() {
        let t = shapes();
        assert_eq!(outcome(&t, "int", &["float f"]), Outcome::NotExhaustive);
        assert_eq!(outcome(&t, "int", &["double d"]), Outcome::Exhaustive);
        assert_eq!(outcome(&t, "Integer", &["int i"]), Outcome::Exhaustive);
        assert_eq!(outcome(&t, "int", &["Integer i"]), Outcome::Exhaustive);
    }

    #[test]
    fn tiny_budget_gives_up() {
        let t = shapes();
        let selector = ty(&t, "Shape");
        let bound = bind_all(&t, &selector, &["Circle c", "Square s", "Poly p"]);
        let labels: Vec<CoverageLabel<'_>> =
            bound.iter().map(|b| CoverageLabel::Pattern(&b.pattern)).collect();
        assert_eq!(check_exhaustive(&t, &selector, &labels, 1), Outcome::GaveUp);
    }
}
