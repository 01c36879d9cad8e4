//! Typed patterns and the bindings they introduce.
//!
//! The binder turns a syntactic [`Pattern`](patmatch_syntax::ast::Pattern)
//! into a [`TypedPattern`] tree in which every node carries a [`NodeId`], the
//! static type it is matched against, and its coverage relative to that
//! type. Bindings are kept in a flat [`BindingSet`] keyed by node id rather
//! than threaded through the tree.

use std::fmt;

use patmatch_common::Span;

use crate::convert::Coverage;
use crate::table::TypeTable;
use crate::ty::{Ty, TypeId};

/// Identity of a pattern node, unique within one analysis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypedPatternKind {
    /// `T x`, `T _`, primitive patterns included.
    Type { ty: Ty, binding: Option<String> },
    /// `var x`, `var _` and `_`. Matches everything, null included when
    /// nested.
    Any { binding: Option<String> },
    /// `R(p1, ..., pn)`. `ty` is the instantiated record type.
    Record {
        ty: Ty,
        record: TypeId,
        fields: Vec<RecordField>,
    },
}

/// One deconstructed component of a record pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordField {
    /// Accessor name.
    pub name: String,
    /// Declared component type after substitution.
    pub ty: Ty,
    pub pattern: TypedPattern,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypedPattern {
    pub id: NodeId,
    pub kind: TypedPatternKind,
    /// The static type this node is matched against.
    pub scrutinee: Ty,
    /// Coverage of this node's own test against the static type. Nested
    /// nodes are not included.
    pub coverage: Coverage,
    /// Coverage of the run-time test. Differs from `coverage` only for a
    /// top-level primitive pattern over a constant selector, whose value is
    /// known. Dominance and exhaustiveness never look at it.
    pub runtime: Coverage,
    pub span: Span,
}

impl TypedPattern {
    /// The type a matching value is known to have.
    pub fn tested_type(&self) -> &Ty {
        match &self.kind {
            TypedPatternKind::Type { ty, .. } | TypedPatternKind::Record { ty, .. } => ty,
            TypedPatternKind::Any { .. } => &self.scrutinee,
        }
    }

    pub fn binding(&self) -> Option<&str> {
        match &self.kind {
            TypedPatternKind::Type { binding, .. } | TypedPatternKind::Any { binding } => {
                binding.as_deref()
            }
            TypedPatternKind::Record { .. } => None,
        }
    }

    /// Matches every non-null value of the scrutinee type. Record patterns
    /// never do: they always test their components.
    pub fn is_unconditional(&self) -> bool {
        match &self.kind {
            TypedPatternKind::Any { .. } => true,
            TypedPatternKind::Type { .. } => self.coverage == Coverage::Total,
            TypedPatternKind::Record { .. } => false,
        }
    }

    /// `var`, `_`, or a total type pattern that needs no unboxing: no test
    /// is emitted for it when nested.
    pub fn is_trivial(&self) -> bool {
        match &self.kind {
            TypedPatternKind::Any { .. } => true,
            TypedPatternKind::Type { ty, .. } => {
                self.coverage == Coverage::Total
                    && !(ty.is_primitive() && self.scrutinee.is_reference())
            }
            TypedPatternKind::Record { .. } => false,
        }
    }

    /// Pre-order walk over this node and all nested nodes.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TypedPattern)) {
        f(self);
        if let TypedPatternKind::Record { fields, .. } = &self.kind {
            for field in fields {
                field.pattern.walk(f);
            }
        }
    }

    /// Source-like rendering with resolved types, e.g. `Box<String>(var s)`.
    pub fn describe(&self, table: &TypeTable) -> String {
        match &self.kind {
            TypedPatternKind::Type { ty, binding } => {
                format!("{} {}", table.show(ty), binding.as_deref().unwrap_or("_"))
            }
            TypedPatternKind::Any { binding: Some(name) } => format!("var {name}"),
            TypedPatternKind::Any { binding: None } => "_".to_string(),
            TypedPatternKind::Record { ty, fields, .. } => {
                let inner: Vec<String> = fields.iter().map(|f| f.pattern.describe(table)).collect();
                format!("{}({})", table.show(ty), inner.join(", "))
            }
        }
    }
}

/// A variable introduced by a pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: String,
    pub ty: Ty,
    pub span: Span,
    pub node: NodeId,
    /// Always false: pattern variables are implicitly final.
    pub assignable: bool,
}

/// The bindings of one pattern, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingSet {
    bindings: Vec<Binding>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub fn by_node(&self, node: NodeId) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.node == node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Same names with the same types, regardless of order.
    pub fn same_shape(&self, other: &BindingSet) -> bool {
        self.len() == other.len()
            && self
                .bindings
                .iter()
                .all(|b| other.get(&b.name).is_some_and(|o| o.ty == b.ty))
    }

    pub fn extend(&mut self, other: &BindingSet) {
        self.bindings.extend(other.bindings.iter().cloned());
    }
}

/// A fully bound, well-typed pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundPattern {
    pub pattern: TypedPattern,
    pub bindings: BindingSet,
}
