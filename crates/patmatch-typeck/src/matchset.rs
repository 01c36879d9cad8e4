//! Abstract match sets for dominance.
//!
//! A [`MatchSet`] over-approximates nothing: `covers(a, b)` is true only
//! when every value `b` accepts is provably accepted by `a`. Dominance
//! asks exactly this question of each earlier unguarded label.

use crate::convert::{is_unconditionally_exact, ConstValue};
use crate::pattern::{TypedPattern, TypedPatternKind};
use crate::table::TypeTable;
use crate::ty::{PrimitiveKind, Ty, TypeId};

#[derive(Clone, Debug, PartialEq)]
pub enum MatchSet {
    /// Matches nothing; the set of a malformed label.
    Empty,
    /// Every value of the selector type.
    All,
    /// Every instance of an erased reference type.
    Type(Ty),
    /// Every value exactly representable in a primitive type.
    Numeric(PrimitiveKind),
    /// A record pattern, componentwise.
    Record {
        record: TypeId,
        components: Vec<MatchSet>,
    },
    EnumConstants {
        enum_type: TypeId,
        constants: Vec<String>,
    },
    Constants(Vec<ConstValue>),
    Null,
}

impl MatchSet {
    /// The set matched by a top-level pattern.
    pub fn of_pattern(pattern: &TypedPattern) -> MatchSet {
        if pattern.is_unconditional() {
            return MatchSet::All;
        }
        MatchSet::of_node(pattern)
    }

    fn of_node(pattern: &TypedPattern) -> MatchSet {
        match &pattern.kind {
            TypedPatternKind::Any { .. } => MatchSet::All,
            TypedPatternKind::Type { ty, .. } => match ty.as_prim() {
                Some(kind) => MatchSet::Numeric(kind),
                None => MatchSet::Type(ty.erased()),
            },
            TypedPatternKind::Record { record, fields, .. } => MatchSet::Record {
                record: *record,
                components: fields
                    .iter()
                    .map(|f| {
                        if f.pattern.is_unconditional() {
                            MatchSet::All
                        } else {
                            MatchSet::of_node(&f.pattern)
                        }
                    })
                    .collect(),
            },
        }
    }

    pub fn of_constant(value: &ConstValue) -> MatchSet {
        match value {
            ConstValue::Enum { ty, name } => MatchSet::EnumConstants {
                enum_type: *ty,
                constants: vec![name.clone()],
            },
            ConstValue::Null => MatchSet::Null,
            other => MatchSet::Constants(vec![other.clone()]),
        }
    }
}

/// Does `a` accept every value `b` accepts?
pub fn covers(table: &TypeTable, a: &MatchSet, b: &MatchSet) -> bool {
    match (a, b) {
        (_, MatchSet::Empty) | (MatchSet::Empty, _) => false,
        (MatchSet::All, _) => true,
        (MatchSet::Type(t), MatchSet::Type(u)) => table.is_subtype(u, t),
        (MatchSet::Type(t), MatchSet::Numeric(p)) => {
            table.is_subtype(&Ty::class(table.box_of(*p)), t)
        }
        (MatchSet::Type(t), MatchSet::Record { record, .. }) => {
            table.is_subtype(&Ty::class(*record), t)
        }
        (MatchSet::Type(t), MatchSet::EnumConstants { enum_type, .. }) => {
            table.is_subtype(&Ty::class(*enum_type), t)
        }
        (MatchSet::Type(t), MatchSet::Constants(values)) => values.iter().all(|v| {
            let ty = v.ty(table);
            let ty = table.boxed(&ty).unwrap_or(ty);
            table.is_subtype(&ty, t)
        }),
        (MatchSet::Numeric(p), MatchSet::Numeric(q)) => is_unconditionally_exact(*q, *p),
        (MatchSet::Numeric(p), MatchSet::Type(u)) => table
            .unboxed(u)
            .is_some_and(|q| is_unconditionally_exact(q, *p)),
        (MatchSet::Numeric(p), MatchSet::Constants(values)) => values.iter().all(|v| {
            v.ty(table)
                .as_prim()
                .is_some_and(|q| is_unconditionally_exact(q, *p))
        }),
        (
            MatchSet::Record {
                record: r1,
                components: c1,
            },
            MatchSet::Record {
                record: r2,
                components: c2,
            },
        ) => {
            table.is_subtype(&Ty::class(*r2), &Ty::class(*r1))
                && c1.len() == c2.len()
                && c1.iter().zip(c2).all(|(x, y)| covers(table, x, y))
        }
        (
            MatchSet::EnumConstants {
                enum_type: e1,
                constants: c1,
            },
            MatchSet::EnumConstants {
                enum_type: e2,
                constants: c2,
            },
        ) => e1 == e2 && c2.iter().all(|c| c1.contains(c)),
        (MatchSet::Constants(a), MatchSet::Constants(b)) => {
            b.iter().all(|y| a.iter().any(|x| x.same_value(y)))
        }
        (MatchSet::Null, MatchSet::Null) => true,
        _ => false,
    }
}
