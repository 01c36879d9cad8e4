//! Type-argument inference for generic pattern types.
//!
//! A record pattern such as `Box(var v)` leaves the arguments of `Box`
//! implicit. They are recovered by instantiating `Box` with fresh variables,
//! viewing that instantiation as the scrutinee's class, and unifying the two
//! with `ena`'s union-find table.

use ena::unify::InPlaceUnificationTable;
use tracing::trace;

use crate::table::TypeTable;
use crate::ty::{Ty, TyVar, TypeId};

/// Owns the unification table for one inference problem.
pub struct InferCtx {
    table: InPlaceUnificationTable<TyVar>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
        }
    }

    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.table.new_key(None))
    }

    /// Resolve a type by following union-find indirection.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Class { id, args } => Ty::Class {
                id,
                args: args.into_iter().map(|a| self.resolve(a)).collect(),
            },
            Ty::Array(elem) => Ty::Array(Box::new(self.resolve(*elem))),
            other => other,
        }
    }

    /// Unify two types. Wildcards unify with anything that is not a
    /// variable; they carry no information about the instantiation.
    pub fn unify(&mut self, a: &Ty, b: &Ty) -> Result<(), (Ty, Ty)> {
        let a = self.resolve(a.clone());
        let b = self.resolve(b.clone());

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),
            (Ty::Var(v1), Ty::Var(v2)) => self.table.unify_var_var(v1, v2),
            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => self.table.unify_var_value(v, Some(ty)),
            (Ty::Wildcard(_), _) | (_, Ty::Wildcard(_)) => Ok(()),
            (Ty::Class { id: i1, args: a1 }, Ty::Class { id: i2, args: a2 }) if i1 == i2 => {
                if a1.is_empty() || a2.is_empty() {
                    return Ok(());
                }
                if a1.len() != a2.len() {
                    return Err((Ty::Class { id: i1, args: a1 }, Ty::Class { id: i2, args: a2 }));
                }
                for (x, y) in a1.iter().zip(&a2) {
                    self.unify(x, y)?;
                }
                Ok(())
            }
            (Ty::Array(x), Ty::Array(y)) => self.unify(&x, &y),
            (x, y) if x == y => Ok(()),
            (x, y) => Err((x, y)),
        }
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer the type arguments of generic declaration `id` from a scrutinee.
///
/// Returns one entry per type parameter: `Some` when the scrutinee fixes
/// it (possibly to a wildcard), `None` when unconstrained. `Err` carries
/// the first pair of types that could not be unified.
pub fn infer_type_args(
    table: &TypeTable,
    id: TypeId,
    scrutinee: &Ty,
) -> Result<Vec<Option<Ty>>, (Ty, Ty)> {
    let decl = table.decl(id);
    if decl.params.is_empty() {
        return Ok(Vec::new());
    }

    let mut cx = InferCtx::new();
    let vars: Vec<Ty> = decl.params.iter().map(|_| cx.fresh_var()).collect();
    let candidate = Ty::generic(id, vars.clone());

    if let Ty::Class { id: scrutinee_id, args } = scrutinee {
        if !args.is_empty() {
            if let Some(view) = table.as_super(&candidate, *scrutinee_id) {
                cx.unify(&view, scrutinee)?;
            }
        }
    }

    let inferred: Vec<Option<Ty>> = vars
        .into_iter()
        .map(|v| {
            let resolved = cx.resolve(v);
            (!resolved.has_vars()).then_some(resolved)
        })
        .collect();
    trace!(decl = %decl.name, ?inferred, "inferred pattern type arguments");
    Ok(inferred)
}

/// Instantiate `id` against `scrutinee`, defaulting unconstrained
/// parameters to their bounds. `None` when the instantiation conflicts.
pub fn instantiate_pattern_type(table: &TypeTable, id: TypeId, scrutinee: &Ty) -> Option<Ty> {
    let inferred = infer_type_args(table, id, scrutinee).ok()?;
    if inferred.is_empty() {
        return Some(Ty::class(id));
    }
    let args = inferred
        .into_iter()
        .zip(&table.decl(id).params)
        .map(|(arg, param)| arg.unwrap_or_else(|| param.bound.erased()))
        .collect();
    Some(Ty::generic(id, args))
}
