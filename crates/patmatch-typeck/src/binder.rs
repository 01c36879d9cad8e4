//! The pattern binder.
//!
//! Walks a syntactic pattern against the static type of the value it
//! matches, resolving type names, inferring generic record arguments,
//! classifying every test and collecting bindings. All errors of one
//! pattern are reported together; a pattern with any error produces no
//! typed tree.

use tracing::{instrument, trace};

use patmatch_common::Span;
use patmatch_syntax::ast::{BindingName, Pattern, TypeRef};

use crate::convert::{classify, classify_value, ConstValue, Coverage};
use crate::error::PatternError;
use crate::pattern::{
    Binding, BindingSet, BoundPattern, NodeId, RecordField, TypedPattern, TypedPatternKind,
};
use crate::scope::ScopeEnv;
use crate::table::{DeclKind, ResolveError, TypeTable};
use crate::ty::{Ty, TypeId, Wildcard};
use crate::unify::infer_type_args;

/// Binds patterns for one analysis. Node ids keep increasing across calls
/// so that every node of every case in a switch has a distinct id.
pub struct Binder<'a> {
    table: &'a TypeTable,
    scope: &'a ScopeEnv,
    constant: Option<&'a ConstValue>,
    next_node: u32,
    errors: Vec<PatternError>,
    bindings: BindingSet,
}

impl<'a> Binder<'a> {
    pub fn new(table: &'a TypeTable, scope: &'a ScopeEnv) -> Self {
        Binder {
            table,
            scope,
            constant: None,
            next_node: 0,
            errors: Vec::new(),
            bindings: BindingSet::new(),
        }
    }

    /// The value of a constant selector, used to refine top-level
    /// primitive patterns.
    pub fn with_selector_constant(mut self, value: Option<&'a ConstValue>) -> Self {
        self.constant = value;
        self
    }

    #[instrument(level = "trace", skip_all, fields(span = ?pattern.span()))]
    pub fn bind(
        &mut self,
        pattern: &Pattern,
        scrutinee: &Ty,
    ) -> Result<BoundPattern, Vec<PatternError>> {
        let typed = self.bind_node(pattern, scrutinee, true);
        let bindings = std::mem::take(&mut self.bindings);
        let errors = std::mem::take(&mut self.errors);
        match typed {
            Some(pattern) if errors.is_empty() => Ok(BoundPattern { pattern, bindings }),
            _ => Err(errors),
        }
    }

    fn node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    fn bind_node(&mut self, pattern: &Pattern, scrutinee: &Ty, top: bool) -> Option<TypedPattern> {
        match pattern {
            Pattern::Unnamed { span } => Some(TypedPattern {
                id: self.node(),
                kind: TypedPatternKind::Any { binding: None },
                scrutinee: scrutinee.clone(),
                coverage: Coverage::Total,
                runtime: Coverage::Total,
                span: *span,
            }),
            Pattern::Var { binding, span, .. } => {
                let id = self.node();
                let binding = self.declare(binding, scrutinee, id);
                Some(TypedPattern {
                    id,
                    kind: TypedPatternKind::Any { binding },
                    scrutinee: scrutinee.clone(),
                    coverage: Coverage::Total,
                    runtime: Coverage::Total,
                    span: *span,
                })
            }
            Pattern::Type {
                ty: type_ref,
                binding,
                span,
                ..
            } => {
                let ty = self.resolve(type_ref)?;
                if let Ty::Class { id, args } = &ty {
                    if !args.is_empty() {
                        self.check_explicit_args(*id, args, scrutinee, type_ref)?;
                    }
                }
                let Some(coverage) = classify(self.table, &ty, scrutinee).coverage() else {
                    self.inconvertible(&ty, scrutinee, type_ref);
                    return None;
                };
                let runtime = match (top, self.constant) {
                    (true, Some(value)) => classify_value(self.table, &ty, scrutinee, value)
                        .coverage()
                        .unwrap_or(coverage),
                    _ => coverage,
                };
                let id = self.node();
                let binding = self.declare(binding, &ty, id);
                trace!(pattern = %self.table.show(&ty), ?coverage, ?runtime, "type pattern");
                Some(TypedPattern {
                    id,
                    kind: TypedPatternKind::Type { ty, binding },
                    scrutinee: scrutinee.clone(),
                    coverage,
                    runtime,
                    span: *span,
                })
            }
            Pattern::Record {
                ty: type_ref,
                components,
                span,
            } => self.bind_record(type_ref, components, scrutinee, *span),
        }
    }

    fn bind_record(
        &mut self,
        type_ref: &TypeRef,
        components: &[Pattern],
        scrutinee: &Ty,
        span: Span,
    ) -> Option<TypedPattern> {
        let resolved = self.resolve(type_ref)?;
        let record = match &resolved {
            Ty::Class { id, .. } if self.table.decl(*id).kind == DeclKind::Record => *id,
            _ => {
                self.errors.push(PatternError::NotARecord {
                    name: self.table.show(&resolved),
                    span: type_ref.span,
                });
                return None;
            }
        };

        let record_ty = match &resolved {
            Ty::Class { args, .. } if !args.is_empty() => {
                self.check_explicit_args(record, args, scrutinee, type_ref)?;
                resolved.clone()
            }
            _ => self.instantiate(record, scrutinee, type_ref)?,
        };

        let Some(coverage) = classify(self.table, &record_ty, scrutinee).coverage() else {
            self.inconvertible(&record_ty, scrutinee, type_ref);
            return None;
        };

        let declared = self.table.record_components(&record_ty)?;
        if declared.len() != components.len() {
            self.errors.push(PatternError::ArityMismatch {
                record: self.table.show(&record_ty),
                expected: declared.len(),
                found: components.len(),
                span,
            });
            return None;
        }

        let id = self.node();
        let mut fields = Vec::with_capacity(declared.len());
        let mut failed = false;
        for (component, nested) in declared.into_iter().zip(components) {
            // Keep going after a failure so every component reports.
            match self.bind_node(nested, &component.ty, false) {
                Some(pattern) => fields.push(RecordField {
                    name: component.name,
                    ty: component.ty,
                    pattern,
                }),
                None => failed = true,
            }
        }
        if failed {
            return None;
        }

        Some(TypedPattern {
            id,
            kind: TypedPatternKind::Record {
                ty: record_ty,
                record,
                fields,
            },
            scrutinee: scrutinee.clone(),
            coverage,
            runtime: coverage,
            span,
        })
    }

    /// Instantiate a record written without type arguments.
    fn instantiate(&mut self, record: TypeId, scrutinee: &Ty, type_ref: &TypeRef) -> Option<Ty> {
        let decl = self.table.decl(record);
        match infer_type_args(self.table, record, scrutinee) {
            Ok(inferred) if inferred.is_empty() => Some(Ty::class(record)),
            Ok(inferred) => Some(Ty::generic(
                record,
                inferred
                    .into_iter()
                    .zip(&decl.params)
                    .map(|(arg, param)| arg.unwrap_or_else(|| param.bound.erased()))
                    .collect(),
            )),
            Err(_) => {
                self.inconvertible(&Ty::class(record), scrutinee, type_ref);
                None
            }
        }
    }

    /// Explicit arguments must respect their bounds and agree with what
    /// the scrutinee implies. An argument the scrutinee does not determine
    /// cannot be tested at run time, so it must be `?`.
    fn check_explicit_args(
        &mut self,
        id: TypeId,
        explicit: &[Ty],
        scrutinee: &Ty,
        type_ref: &TypeRef,
    ) -> Option<()> {
        let table = self.table;
        let decl = table.decl(id);
        let pattern = table.show(&Ty::generic(id, explicit.to_vec()));
        let mut ok = true;

        for (arg, param) in explicit.iter().zip(&decl.params) {
            let bound = param.bound.erased();
            if matches!(arg, Ty::Wildcard(_)) || !matches!(bound, Ty::Class { .. } | Ty::Array(_)) {
                continue;
            }
            if !table.is_subtype(&arg.erased(), &bound) {
                self.errors.push(PatternError::GenericInconsistency {
                    pattern: pattern.clone(),
                    reason: format!(
                        "`{}` is not within the bound `{}` of `{}`",
                        table.show(arg),
                        table.show(&param.bound),
                        param.name
                    ),
                    span: type_ref.span,
                });
                ok = false;
            }
        }
        if !ok {
            return None;
        }

        let inferred = match infer_type_args(table, id, scrutinee) {
            Ok(inferred) => inferred,
            Err(_) => {
                self.inconvertible(&Ty::generic(id, explicit.to_vec()), scrutinee, type_ref);
                return None;
            }
        };

        for ((arg, inferred), param) in explicit.iter().zip(&inferred).zip(&decl.params) {
            let reason = match inferred {
                Some(inferred) if !table.contains(arg, inferred) => format!(
                    "`{}` was given for `{}` but `{}` implies `{}`",
                    table.show(arg),
                    param.name,
                    table.show(scrutinee),
                    table.show(inferred)
                ),
                None if *arg != Ty::Wildcard(Wildcard::Any) => format!(
                    "`{}` cannot be checked at run time against `{}`",
                    pattern,
                    table.show(scrutinee)
                ),
                _ => continue,
            };
            self.errors.push(PatternError::GenericInconsistency {
                pattern: pattern.clone(),
                reason,
                span: type_ref.span,
            });
            return None;
        }
        Some(())
    }

    fn resolve(&mut self, type_ref: &TypeRef) -> Option<Ty> {
        match self.table.resolve(type_ref, &[]) {
            Ok(ty) => Some(ty),
            Err(ResolveError::Unknown { name, span }) => {
                self.errors.push(PatternError::UnknownType { name, span });
                None
            }
            Err(ResolveError::ArgCount {
                name,
                expected,
                found,
                span,
            }) => {
                self.errors.push(PatternError::GenericInconsistency {
                    pattern: name,
                    reason: format!("expected {expected} type argument(s), found {found}"),
                    span,
                });
                None
            }
            Err(ResolveError::PrimitiveArgument { span }) => {
                self.errors.push(PatternError::GenericInconsistency {
                    pattern: type_ref.name.clone(),
                    reason: "type arguments must be reference types".to_string(),
                    span,
                });
                None
            }
        }
    }

    fn inconvertible(&mut self, pattern: &Ty, scrutinee: &Ty, type_ref: &TypeRef) {
        self.errors.push(PatternError::InconvertibleTypes {
            found: self.table.show(pattern),
            expected: self.table.show(scrutinee),
            span: type_ref.span,
        });
    }

    /// Record a binding, reporting clashes within the pattern and with the
    /// enclosing scope.
    fn declare(&mut self, binding: &BindingName, ty: &Ty, node: NodeId) -> Option<String> {
        let BindingName::Named { name, span } = binding else {
            return None;
        };
        let previous = self
            .bindings
            .get(name)
            .map(|b| b.span)
            .or_else(|| self.scope.conflict(name).map(|entry| entry.span));
        if let Some(previous) = previous {
            self.errors.push(PatternError::DuplicateBinding {
                name: name.clone(),
                span: *span,
                previous,
            });
        }
        self.bindings.push(Binding {
            name: name.clone(),
            ty: ty.clone(),
            span: *span,
            node,
            assignable: false,
        });
        Some(name.clone())
    }
}

/// Bind a single pattern with a fresh binder.
pub fn bind(
    table: &TypeTable,
    pattern: &Pattern,
    scrutinee: &Ty,
    scope: &ScopeEnv,
) -> Result<BoundPattern, Vec<PatternError>> {
    Binder::new(table, scope).bind(pattern, scrutinee)
}
