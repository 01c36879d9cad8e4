//! Matchability of a pattern type against a scrutinee type.
//!
//! Reference tests reduce to subtyping and castability. Primitive tests
//! follow the exactness rules: a conversion is unconditionally exact when
//! no value of the source type can lose information in the target, and a
//! single value is exact when it survives the round trip unchanged. For
//! `float` and `double` that is IEEE-754 representability, so every integer
//! up to 2^24 (resp. 2^53) in magnitude is exact, and beyond that only those
//! whose low bits happen to be zero.

use serde::Serialize;

use crate::table::TypeTable;
use crate::ty::{PrimitiveKind, Ty, TypeId};

/// Outcome of matching a pattern type against a scrutinee type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Every non-null value of the scrutinee type matches.
    Total,
    /// A runtime test is needed.
    Partial,
    /// No value can ever match.
    Impossible,
}

impl Classification {
    pub fn coverage(self) -> Option<Coverage> {
        match self {
            Classification::Total => Some(Coverage::Total),
            Classification::Partial => Some(Coverage::Partial),
            Classification::Impossible => None,
        }
    }
}

/// The coverage of a well-typed pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Coverage {
    Total,
    Partial,
}

/// A compile-time constant: a case label or a constant selector.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ConstValue {
    /// Integral constant; `kind` is its own type (`int`, `long` or `char`).
    Int { value: i64, kind: PrimitiveKind },
    Float { value: f64, kind: PrimitiveKind },
    Bool(bool),
    Str(String),
    Enum { ty: TypeId, name: String },
    Null,
}

impl ConstValue {
    pub fn ty(&self, table: &TypeTable) -> Ty {
        match self {
            ConstValue::Int { kind, .. } | ConstValue::Float { kind, .. } => Ty::Prim(*kind),
            ConstValue::Bool(_) => Ty::Prim(PrimitiveKind::Boolean),
            ConstValue::Str(_) => table.string(),
            ConstValue::Enum { ty, .. } => Ty::class(*ty),
            ConstValue::Null => Ty::Null,
        }
    }

    /// Whether two labels denote the same selector value.
    pub fn same_value(&self, other: &ConstValue) -> bool {
        match (self, other) {
            (ConstValue::Int { value: a, .. }, ConstValue::Int { value: b, .. }) => a == b,
            (ConstValue::Float { value: a, .. }, ConstValue::Float { value: b, .. }) => {
                a.to_bits() == b.to_bits()
            }
            (a, b) => a == b,
        }
    }

    /// Short source-like rendering for messages and decision sequences.
    pub fn describe(&self, table: &TypeTable) -> String {
        match self {
            ConstValue::Int {
                value,
                kind: PrimitiveKind::Char,
            } => match u32::try_from(*value).ok().and_then(char::from_u32) {
                Some(c) => format!("{c:?}"),
                None => value.to_string(),
            },
            ConstValue::Int {
                value,
                kind: PrimitiveKind::Long,
            } => format!("{value}L"),
            ConstValue::Int { value, .. } => value.to_string(),
            ConstValue::Float {
                value,
                kind: PrimitiveKind::Float,
            } => format!("{value:?}f"),
            ConstValue::Float { value, .. } => format!("{value:?}"),
            ConstValue::Bool(b) => b.to_string(),
            ConstValue::Str(s) => format!("{s:?}"),
            ConstValue::Enum { ty, name } => format!("{}.{}", table.decl(*ty).name, name),
            ConstValue::Null => "null".to_string(),
        }
    }
}

/// Can every value of `from` be converted to `to` without loss?
pub fn is_unconditionally_exact(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::*;
    if from == to {
        return true;
    }
    match from {
        Byte => matches!(to, Short | Int | Long | Float | Double),
        Short | Char => matches!(to, Int | Long | Float | Double),
        Int => matches!(to, Long | Double),
        Float => to == Double,
        Long | Double | Boolean => false,
    }
}

/// Is a widening primitive conversion from `from` to `to` defined at all
/// (exact or not)?
pub fn is_widening(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::*;
    if from == to {
        return true;
    }
    match from {
        Byte => matches!(to, Short | Int | Long | Float | Double),
        Short | Char => matches!(to, Int | Long | Float | Double),
        Int => matches!(to, Long | Float | Double),
        Long => matches!(to, Float | Double),
        Float => to == Double,
        Double | Boolean => false,
    }
}

/// Does this particular value convert to `to` and back unchanged?
pub fn is_exact_value(value: &ConstValue, to: PrimitiveKind) -> bool {
    match value {
        ConstValue::Bool(_) => to == PrimitiveKind::Boolean,
        ConstValue::Int { value, .. } => integer_is_exact(*value, to),
        ConstValue::Float { value, .. } => float_is_exact(*value, to),
        _ => false,
    }
}

fn integer_is_exact(value: i64, to: PrimitiveKind) -> bool {
    match to {
        PrimitiveKind::Boolean => false,
        PrimitiveKind::Float => {
            let f = value as f32;
            f.is_finite() && f as i128 == i128::from(value)
        }
        PrimitiveKind::Double => {
            let d = value as f64;
            d.is_finite() && d as i128 == i128::from(value)
        }
        integral => integral
            .integral_range()
            .is_some_and(|(lo, hi)| (lo..=hi).contains(&value)),
    }
}

fn float_is_exact(value: f64, to: PrimitiveKind) -> bool {
    match to {
        PrimitiveKind::Boolean => false,
        PrimitiveKind::Double => true,
        PrimitiveKind::Float => value.is_nan() || f64::from(value as f32) == value,
        integral => {
            if !value.is_finite() || value.fract() != 0.0 {
                return false;
            }
            if value == 0.0 && value.is_sign_negative() {
                return false;
            }
            integral
                .integral_range()
                .is_some_and(|(lo, hi)| value >= lo as f64 && value <= hi as f64 && (value as i64) as f64 == value)
        }
    }
}

/// Classify a pattern of type `pattern` against a scrutinee of static type
/// `scrutinee`.
pub fn classify(table: &TypeTable, pattern: &Ty, scrutinee: &Ty) -> Classification {
    match (scrutinee, pattern) {
        (Ty::Prim(s), Ty::Prim(p)) => classify_primitive(*s, *p),
        (Ty::Prim(_), _) => {
            // Boxing, then reference widening.
            match table.boxed(scrutinee) {
                Some(boxed) if table.is_subtype(&boxed, pattern) => Classification::Total,
                _ => Classification::Impossible,
            }
        }
        (_, Ty::Prim(p)) => {
            if let Some(s) = table.unboxed(scrutinee) {
                return classify_primitive(s, *p);
            }
            match table.boxed(pattern) {
                Some(boxed) if table.is_subtype(&boxed, scrutinee) => Classification::Partial,
                _ => Classification::Impossible,
            }
        }
        _ => {
            if table.is_subtype(scrutinee, pattern) {
                Classification::Total
            } else if table.is_castable(scrutinee, pattern) {
                Classification::Partial
            } else {
                Classification::Impossible
            }
        }
    }
}

fn classify_primitive(scrutinee: PrimitiveKind, pattern: PrimitiveKind) -> Classification {
    if is_unconditionally_exact(scrutinee, pattern) {
        Classification::Total
    } else if scrutinee.is_numeric() && pattern.is_numeric() {
        Classification::Partial
    } else {
        Classification::Impossible
    }
}

/// Refine a classification with the known value of a constant selector.
pub fn classify_value(
    table: &TypeTable,
    pattern: &Ty,
    scrutinee: &Ty,
    value: &ConstValue,
) -> Classification {
    let by_type = classify(table, pattern, scrutinee);
    match (by_type, pattern) {
        (Classification::Partial, Ty::Prim(p)) if is_exact_value(value, *p) => Classification::Total,
        (Classification::Total, Ty::Prim(p)) if !is_exact_value(value, *p) => Classification::Partial,
        _ => by_type,
    }
}

/// Is every value that a test against `inner` accepts also accepted by a
/// test against `outer`? Decided on types alone; used for dominance.
pub fn type_covers(table: &TypeTable, outer: &Ty, inner: &Ty) -> bool {
    match (outer, inner) {
        (Ty::Prim(o), Ty::Prim(i)) => is_unconditionally_exact(*i, *o),
        (_, Ty::Prim(_)) => table
            .boxed(inner)
            .is_some_and(|boxed| table.is_subtype(&boxed, &outer.erased())),
        (Ty::Prim(o), _) => table
            .unboxed(inner)
            .is_some_and(|i| is_unconditionally_exact(i, *o)),
        _ => table.is_subtype(&inner.erased(), &outer.erased()),
    }
}

/// Can constant `value` label a case of a switch over `selector`?
pub fn constant_assignable(table: &TypeTable, value: &ConstValue, selector: &Ty) -> bool {
    match value {
        ConstValue::Null => selector.is_reference(),
        ConstValue::Str(_) => table.is_subtype(&table.string(), selector) && !table.is_object(selector),
        ConstValue::Enum { ty, .. } => table.is_subtype(&Ty::class(*ty), selector),
        _ => {
            let target = selector.as_prim().or_else(|| table.unboxed(selector));
            let Some(target) = target else {
                return false;
            };
            match value {
                ConstValue::Bool(_) => target == PrimitiveKind::Boolean,
                ConstValue::Int { kind, value } => {
                    let narrowing = *kind != PrimitiveKind::Long
                        && target.is_integral()
                        && target != PrimitiveKind::Long
                        && integer_is_exact(*value, target);
                    if selector.is_primitive() {
                        narrowing || is_widening(*kind, target)
                    } else {
                        // A boxed selector admits no widening.
                        *kind == target || narrowing
                    }
                }
                ConstValue::Float { kind, .. } => {
                    if selector.is_primitive() {
                        is_widening(*kind, target)
                    } else {
                        *kind == target
                    }
                }
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Decl;

    fn int(value: i64) -> ConstValue {
        ConstValue::Int {
            value,
            kind: PrimitiveKind::Int,
        }
    }

    fn table() -> TypeTable {
        let mut b = TypeTable::builder();
        b.declare(Decl::interface("Shape").sealed(["Circle"]))
            .declare(Decl::record("Circle").implements("Shape"));
        b.build().unwrap()
    }

    #[test]
    fn exact_widening_table() {
        use PrimitiveKind::*;
        assert!(is_unconditionally_exact(Byte, Int));
        assert!(is_unconditionally_exact(Char, Double));
        assert!(is_unconditionally_exact(Int, Double));
        assert!(!is_unconditionally_exact(Int, Float));
        assert!(!is_unconditionally_exact(Long, Float));
        assert!(!is_unconditionally_exact(Long, Double));
        assert!(!is_unconditionally_exact(Byte, Char));
    }

    #[test]
    fn float_cutoff_is_two_to_the_twenty_fourth() {
        assert!(is_exact_value(&int(16_777_216), PrimitiveKind::Float));
        assert!(!is_exact_value(&int(16_777_217), PrimitiveKind::Float));
        // Even numbers past the cutoff are still representable.
        assert!(is_exact_value(&int(16_777_218), PrimitiveKind::Float));
        assert!(is_exact_value(&int(16_777_217), PrimitiveKind::Double));
    }

    #[test]
    fn double_cutoff_is_two_to_the_fifty_third() {
        let long = |value| ConstValue::Int {
            value,
            kind: PrimitiveKind::Long,
        };
        assert!(is_exact_value(&long(1 << 53), PrimitiveKind::Double));
        assert!(!is_exact_value(&long((1 << 53) + 1), PrimitiveKind::Double));
        assert!(!is_exact_value(&long(i64::MAX), PrimitiveKind::Double));
    }

    #[test]
    fn integral_ranges() {
        assert!(is_exact_value(&int(127), PrimitiveKind::Byte));
        assert!(!is_exact_value(&int(128), PrimitiveKind::Byte));
        assert!(!is_exact_value(&int(-1), PrimitiveKind::Char));
        let half = ConstValue::Float {
            value: 2.5,
            kind: PrimitiveKind::Double,
        };
        assert!(!is_exact_value(&half, PrimitiveKind::Int));
    }

    #[test]
    fn classify_reference_pairs() {
        let t = table();
        let shape = Ty::class(t.lookup("Shape").unwrap());
        let circle = Ty::class(t.lookup("Circle").unwrap());
        assert_eq!(classify(&t, &shape, &shape), Classification::Total);
        assert_eq!(classify(&t, &circle, &shape), Classification::Partial);
        assert_eq!(classify(&t, &t.string(), &shape), Classification::Impossible);
    }

    #[test]
    fn classify_boxing_paths() {
        let t = table();
        let integer = Ty::class(t.lookup("Integer").unwrap());
        let double = Ty::class(t.lookup("Double").unwrap());
        let int = Ty::Prim(PrimitiveKind::Int);
        let long = Ty::Prim(PrimitiveKind::Long);
        let byte = Ty::Prim(PrimitiveKind::Byte);
        assert_eq!(classify(&t, &integer, &int), Classification::Total);
        assert_eq!(classify(&t, &double, &int), Classification::Impossible);
        assert_eq!(classify(&t, &long, &integer), Classification::Total);
        assert_eq!(classify(&t, &byte, &integer), Classification::Partial);
        assert_eq!(classify(&t, &int, &t.object()), Classification::Partial);
        assert_eq!(classify(&t, &int, &t.string()), Classification::Impossible);
        assert_eq!(
            classify(&t, &Ty::Prim(PrimitiveKind::Boolean), &int),
            Classification::Impossible
        );
    }

    #[test]
    fn constant_selector_refines_primitive_patterns() {
        let t = table();
        let selector = Ty::Prim(PrimitiveKind::Int);
        let float = Ty::Prim(PrimitiveKind::Float);
        let byte = Ty::Prim(PrimitiveKind::Byte);
        assert_eq!(
            classify_value(&t, &float, &selector, &int(16_777_216)),
            Classification::Total
        );
        assert_eq!(
            classify_value(&t, &float, &selector, &int(16_777_217)),
            Classification::Partial
        );
        assert_eq!(
            classify_value(&t, &byte, &selector, &int(42)),
            Classification::Total
        );
    }

    #[test]
    fn constants_must_fit_the_selector() {
        let t = table();
        let byte = Ty::Prim(PrimitiveKind::Byte);
        let integer = Ty::class(t.lookup("Integer").unwrap());
        assert!(constant_assignable(&t, &int(100), &byte));
        assert!(!constant_assignable(&t, &int(300), &byte));
        assert!(constant_assignable(&t, &int(1), &integer));
        assert!(!constant_assignable(&t, &ConstValue::Str("a".into()), &integer));
        assert!(!constant_assignable(&t, &ConstValue::Null, &byte));
    }

    #[test]
    fn dominance_by_type() {
        let t = table();
        let number = Ty::class(t.lookup("Number").unwrap());
        let integer = Ty::class(t.lookup("Integer").unwrap());
        assert!(type_covers(&t, &number, &integer));
        assert!(!type_covers(&t, &integer, &number));
        assert!(type_covers(&t, &number, &Ty::Prim(PrimitiveKind::Int)));
        assert!(type_covers(
            &t,
            &Ty::Prim(PrimitiveKind::Long),
            &Ty::Prim(PrimitiveKind::Int)
        ));
        assert!(!type_covers(
            &t,
            &Ty::Prim(PrimitiveKind::Float),
            &Ty::Prim(PrimitiveKind::Int)
        ));
    }
}
