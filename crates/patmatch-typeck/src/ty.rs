//! Type representation for pattern analysis.
//!
//! `Ty` is deliberately small: nominal class types with arguments, arrays,
//! the eight primitives, declaration-level type parameters and wildcards,
//! and inference variables for generic record patterns. Names live in the
//! [`TypeTable`](crate::table::TypeTable); a `Ty` only carries ids.

use std::fmt;

use serde::Serialize;

/// Index of a declaration in the type table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

/// A type variable, identified by a `u32` index into the unification table.
///
/// Only created while inferring the type arguments of a generic pattern
/// type; never survives into a bound pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyVar(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Simple name of the wrapper class.
    pub fn box_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }

    pub fn is_numeric(self) -> bool {
        self != PrimitiveKind::Boolean
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    /// Inclusive value range of an integral kind.
    pub fn integral_range(self) -> Option<(i64, i64)> {
        match self {
            PrimitiveKind::Byte => Some((i8::MIN.into(), i8::MAX.into())),
            PrimitiveKind::Short => Some((i16::MIN.into(), i16::MAX.into())),
            PrimitiveKind::Char => Some((0, u16::MAX.into())),
            PrimitiveKind::Int => Some((i32::MIN.into(), i32::MAX.into())),
            PrimitiveKind::Long => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A wildcard type argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// `?`
    Any,
    /// `? extends T`
    Extends(Box<Ty>),
    /// `? super T`
    Super(Box<Ty>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Prim(PrimitiveKind),
    /// A class, interface, record or enum type. Empty `args` on a generic
    /// declaration means the raw type.
    Class { id: TypeId, args: Vec<Ty> },
    Array(Box<Ty>),
    /// A type parameter of the enclosing declaration, by name.
    Param(String),
    /// Only legal as a type argument.
    Wildcard(Wildcard),
    /// Inference variable.
    Var(TyVar),
    /// The type of `null`.
    Null,
}

impl Ty {
    pub fn class(id: TypeId) -> Ty {
        Ty::Class { id, args: Vec::new() }
    }

    pub fn generic(id: TypeId, args: Vec<Ty>) -> Ty {
        Ty::Class { id, args }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Ty::Prim(_))
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive()
    }

    pub fn as_prim(&self) -> Option<PrimitiveKind> {
        match self {
            Ty::Prim(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn class_id(&self) -> Option<TypeId> {
        match self {
            Ty::Class { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Drop all type arguments, keeping array structure.
    pub fn erased(&self) -> Ty {
        match self {
            Ty::Class { id, .. } => Ty::class(*id),
            Ty::Array(elem) => Ty::Array(Box::new(elem.erased())),
            other => other.clone(),
        }
    }

    /// Replace declaration type parameters by the given arguments.
    pub fn substitute(&self, params: &[String], args: &[Ty]) -> Ty {
        match self {
            Ty::Param(name) => params
                .iter()
                .position(|p| p == name)
                .and_then(|i| args.get(i).cloned())
                .unwrap_or_else(|| self.clone()),
            Ty::Class { id, args: inner } => Ty::Class {
                id: *id,
                args: inner.iter().map(|a| a.substitute(params, args)).collect(),
            },
            Ty::Array(elem) => Ty::Array(Box::new(elem.substitute(params, args))),
            Ty::Wildcard(Wildcard::Extends(b)) => {
                Ty::Wildcard(Wildcard::Extends(Box::new(b.substitute(params, args))))
            }
            Ty::Wildcard(Wildcard::Super(b)) => {
                Ty::Wildcard(Wildcard::Super(Box::new(b.substitute(params, args))))
            }
            other => other.clone(),
        }
    }

    pub fn has_vars(&self) -> bool {
        match self {
            Ty::Var(_) => true,
            Ty::Class { args, .. } => args.iter().any(Ty::has_vars),
            Ty::Array(elem) => elem.has_vars(),
            Ty::Wildcard(Wildcard::Extends(b) | Wildcard::Super(b)) => b.has_vars(),
            _ => false,
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}
