//! The type table: declarations plus the subtype, sealing and conversion
//! queries the analyzer needs.
//!
//! Declarations are registered through [`TypeTableBuilder`] with type
//! expressions written as source text (`"Box<T>"`, `"List<? extends Shape>"`),
//! so every type in a declaration is resolved once, after all names are
//! known. Permitted subtypes may therefore be declared in any order.

use rustc_hash::FxHashMap;
use thiserror::Error;

use patmatch_common::Span;
use patmatch_syntax::ast::{TypeArg, TypeRef, WildcardBound};

use crate::ty::{PrimitiveKind, Ty, TypeId, Wildcard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Interface,
    Record,
    Enum,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub bound: Ty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordComponent {
    pub name: String,
    pub ty: Ty,
}

/// A resolved declaration.
#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: String,
    pub kind: DeclKind,
    pub params: Vec<TypeParam>,
    /// Direct supertypes, in terms of `params`. Empty means `Object`.
    pub supertypes: Vec<Ty>,
    /// `Some` for sealed types.
    pub permits: Option<Vec<TypeId>>,
    pub is_final: bool,
    pub is_abstract: bool,
    pub components: Vec<RecordComponent>,
    pub constants: Vec<String>,
}

impl TypeDecl {
    pub fn is_sealed(&self) -> bool {
        self.permits.is_some()
    }

    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }
}

// ── Declaration builder ────────────────────────────────────────────────

/// An unresolved declaration, written with source-text types.
#[derive(Clone, Debug)]
pub struct Decl {
    name: String,
    kind: DeclKind,
    params: Vec<(String, Option<String>)>,
    supertypes: Vec<String>,
    permits: Option<Vec<String>>,
    is_final: bool,
    is_abstract: bool,
    components: Vec<(String, String)>,
    constants: Vec<String>,
}

impl Decl {
    fn new(name: &str, kind: DeclKind) -> Self {
        Decl {
            name: name.to_string(),
            kind,
            params: Vec::new(),
            supertypes: Vec::new(),
            permits: None,
            is_final: matches!(kind, DeclKind::Record | DeclKind::Enum),
            is_abstract: kind == DeclKind::Interface,
            components: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn class(name: &str) -> Self {
        Decl::new(name, DeclKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Decl::new(name, DeclKind::Interface)
    }

    pub fn record(name: &str) -> Self {
        Decl::new(name, DeclKind::Record)
    }

    pub fn enumeration(name: &str) -> Self {
        Decl::new(name, DeclKind::Enum)
    }

    pub fn param(mut self, name: &str) -> Self {
        self.params.push((name.to_string(), None));
        self
    }

    pub fn bounded_param(mut self, name: &str, bound: &str) -> Self {
        self.params.push((name.to_string(), Some(bound.to_string())));
        self
    }

    /// Add a direct supertype (superclass or interface alike).
    pub fn extends(mut self, ty: &str) -> Self {
        self.supertypes.push(ty.to_string());
        self
    }

    pub fn implements(self, ty: &str) -> Self {
        self.extends(ty)
    }

    pub fn sealed<'a>(mut self, permits: impl IntoIterator<Item = &'a str>) -> Self {
        self.permits = Some(permits.into_iter().map(str::to_string).collect());
        self
    }

    pub fn mark_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn mark_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn component(mut self, name: &str, ty: &str) -> Self {
        self.components.push((name.to_string(), ty.to_string()));
        self
    }

    pub fn constants<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.constants.extend(names.into_iter().map(str::to_string));
        self
    }
}

/// Errors raised while building a [`TypeTable`].
#[derive(Debug, Error, PartialEq)]
pub enum DeclError {
    #[error("type `{0}` is declared twice")]
    Duplicate(String),
    #[error("unknown type `{name}` in declaration of `{decl}`")]
    UnknownType { name: String, decl: String },
    #[error("malformed type `{text}` in declaration of `{decl}`: {message}")]
    Malformed {
        text: String,
        decl: String,
        message: String,
    },
    #[error("`{sub}` is permitted by sealed `{sealed}` but does not extend it")]
    InvalidPermit { sealed: String, sub: String },
    #[error("type `{0}` is its own supertype")]
    Cycle(String),
}

/// Why a [`TypeRef`] could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    Unknown {
        name: String,
        span: Span,
    },
    ArgCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    PrimitiveArgument {
        span: Span,
    },
}

#[derive(Default)]
pub struct TypeTableBuilder {
    decls: Vec<Decl>,
    seals: Vec<(String, Vec<String>)>,
}

impl TypeTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, decl: Decl) -> &mut Self {
        self.decls.push(decl);
        self
    }

    /// Seal an already declared type, builtins included.
    pub fn seal<'a>(&mut self, name: &str, permits: impl IntoIterator<Item = &'a str>) -> &mut Self {
        self.seals.push((
            name.to_string(),
            permits.into_iter().map(str::to_string).collect(),
        ));
        self
    }

    pub fn build(self) -> Result<TypeTable, DeclError> {
        let mut table = TypeTable::with_builtins();

        let first_user = table.decls.len();
        for decl in &self.decls {
            if table.by_name.contains_key(&decl.name) {
                return Err(DeclError::Duplicate(decl.name.clone()));
            }
            let id = TypeId(table.decls.len() as u32);
            table.by_name.insert(decl.name.clone(), id);
            table.decls.push(TypeDecl {
                name: decl.name.clone(),
                kind: decl.kind,
                params: Vec::new(),
                supertypes: Vec::new(),
                permits: None,
                is_final: decl.is_final,
                is_abstract: decl.is_abstract,
                components: Vec::new(),
                constants: decl.constants.clone(),
            });
        }

        // Second pass: every name is known, resolve the type texts.
        for (offset, decl) in self.decls.iter().enumerate() {
            let names: Vec<String> = decl.params.iter().map(|(n, _)| n.clone()).collect();
            let mut params = Vec::new();
            for (name, bound) in &decl.params {
                let bound = match bound {
                    Some(text) => table.resolve_text(text, &names, &decl.name)?,
                    None => table.object(),
                };
                params.push(TypeParam {
                    name: name.clone(),
                    bound,
                });
            }
            let supertypes = decl
                .supertypes
                .iter()
                .map(|text| table.resolve_text(text, &names, &decl.name))
                .collect::<Result<Vec<_>, _>>()?;
            let components = decl
                .components
                .iter()
                .map(|(name, text)| {
                    Ok(RecordComponent {
                        name: name.clone(),
                        ty: table.resolve_text(text, &names, &decl.name)?,
                    })
                })
                .collect::<Result<Vec<_>, DeclError>>()?;

            let target = &mut table.decls[first_user + offset];
            target.params = params;
            target.supertypes = supertypes;
            target.components = components;
        }

        // Subtype queries walk supertype edges and must terminate.
        if let Some(id) = table.find_cycle() {
            return Err(DeclError::Cycle(table.decl(id).name.clone()));
        }

        let mut seals: Vec<(String, Vec<String>)> = self
            .decls
            .iter()
            .filter_map(|d| d.permits.clone().map(|p| (d.name.clone(), p)))
            .collect();
        seals.extend(self.seals);

        for (sealed, permits) in seals {
            let sealed_id = table.lookup(&sealed).ok_or_else(|| DeclError::UnknownType {
                name: sealed.clone(),
                decl: sealed.clone(),
            })?;
            let mut ids = Vec::new();
            for sub in permits {
                let sub_id = table.lookup(&sub).ok_or_else(|| DeclError::UnknownType {
                    name: sub.clone(),
                    decl: sealed.clone(),
                })?;
                let extends_sealed = table.decls[sub_id.0 as usize]
                    .supertypes
                    .iter()
                    .any(|s| s.class_id() == Some(sealed_id));
                if !extends_sealed {
                    return Err(DeclError::InvalidPermit {
                        sealed: sealed.clone(),
                        sub,
                    });
                }
                ids.push(sub_id);
            }
            table.decls[sealed_id.0 as usize].permits = Some(ids);
        }

        Ok(table)
    }
}

// ── The table ──────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Builtins {
    object: TypeId,
    string: TypeId,
    boxes: [TypeId; 8],
}

/// Resolved declarations and the queries over them.
#[derive(Clone, Debug)]
pub struct TypeTable {
    decls: Vec<TypeDecl>,
    by_name: FxHashMap<String, TypeId>,
    builtins: Builtins,
}

impl TypeTable {
    pub fn builder() -> TypeTableBuilder {
        TypeTableBuilder::new()
    }

    /// A table holding only `Object`, `String`, `CharSequence`, `Number`
    /// and the primitive wrappers.
    pub fn with_builtins() -> Self {
        let mut table = TypeTable {
            decls: Vec::new(),
            by_name: FxHashMap::default(),
            builtins: Builtins {
                object: TypeId(0),
                string: TypeId(0),
                boxes: [TypeId(0); 8],
            },
        };

        let object = table.push_builtin("Object", DeclKind::Class, vec![], false, false);
        let char_sequence =
            table.push_builtin("CharSequence", DeclKind::Interface, vec![], false, true);
        let string = table.push_builtin(
            "String",
            DeclKind::Class,
            vec![Ty::class(char_sequence)],
            true,
            false,
        );
        let number = table.push_builtin("Number", DeclKind::Class, vec![], false, true);
        table.builtins.object = object;
        table.builtins.string = string;

        for (i, kind) in PrimitiveKind::ALL.into_iter().enumerate() {
            let supertypes = if kind.is_numeric() && kind != PrimitiveKind::Char {
                vec![Ty::class(number)]
            } else {
                vec![]
            };
            table.builtins.boxes[i] =
                table.push_builtin(kind.box_name(), DeclKind::Class, supertypes, true, false);
        }
        table
    }

    fn push_builtin(
        &mut self,
        name: &str,
        kind: DeclKind,
        supertypes: Vec<Ty>,
        is_final: bool,
        is_abstract: bool,
    ) -> TypeId {
        let id = TypeId(self.decls.len() as u32);
        self.by_name.insert(name.to_string(), id);
        self.decls.push(TypeDecl {
            name: name.to_string(),
            kind,
            params: Vec::new(),
            supertypes,
            permits: None,
            is_final,
            is_abstract,
            components: Vec::new(),
            constants: Vec::new(),
        });
        id
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    pub fn decl(&self, id: TypeId) -> &TypeDecl {
        &self.decls[id.0 as usize]
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name
            .get(name)
            .or_else(|| {
                name.strip_prefix("java.lang.")
                    .and_then(|simple| self.by_name.get(simple))
            })
            .copied()
    }

    pub fn object(&self) -> Ty {
        Ty::class(self.builtins.object)
    }

    pub fn string(&self) -> Ty {
        Ty::class(self.builtins.string)
    }

    pub fn is_object(&self, ty: &Ty) -> bool {
        ty.class_id() == Some(self.builtins.object)
    }

    pub fn box_of(&self, kind: PrimitiveKind) -> TypeId {
        let index = PrimitiveKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default();
        self.builtins.boxes[index]
    }

    /// The wrapper class of a primitive type.
    pub fn boxed(&self, ty: &Ty) -> Option<Ty> {
        ty.as_prim().map(|kind| Ty::class(self.box_of(kind)))
    }

    /// The primitive a wrapper class unboxes to.
    pub fn unboxed(&self, ty: &Ty) -> Option<PrimitiveKind> {
        let id = ty.class_id()?;
        PrimitiveKind::ALL
            .into_iter()
            .zip(self.builtins.boxes)
            .find(|(_, b)| *b == id)
            .map(|(kind, _)| kind)
    }

    /// Human-readable form of a type.
    pub fn show(&self, ty: &Ty) -> String {
        match ty {
            Ty::Prim(kind) => kind.name().to_string(),
            Ty::Class { id, args } => {
                let name = &self.decl(*id).name;
                if args.is_empty() {
                    name.clone()
                } else {
                    let args: Vec<String> = args.iter().map(|a| self.show(a)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
            Ty::Array(elem) => format!("{}[]", self.show(elem)),
            Ty::Param(name) => name.clone(),
            Ty::Wildcard(Wildcard::Any) => "?".to_string(),
            Ty::Wildcard(Wildcard::Extends(b)) => format!("? extends {}", self.show(b)),
            Ty::Wildcard(Wildcard::Super(b)) => format!("? super {}", self.show(b)),
            Ty::Var(v) => format!("?{}", v.0),
            Ty::Null => "null".to_string(),
        }
    }

    // ── Resolution ──────────────────────────────────────────────────────

    fn resolve_text(&self, text: &str, params: &[String], decl: &str) -> Result<Ty, DeclError> {
        let parse = patmatch_syntax::parse_type(text);
        let malformed = |message: String| DeclError::Malformed {
            text: text.to_string(),
            decl: decl.to_string(),
            message,
        };
        if let Some(err) = parse.errors.first() {
            return Err(malformed(err.message.clone()));
        }
        let Some(type_ref) = parse.value else {
            return Err(malformed("expected a type".to_string()));
        };
        self.resolve(&type_ref, params).map_err(|err| match err {
            ResolveError::Unknown { name, .. } => DeclError::UnknownType {
                name,
                decl: decl.to_string(),
            },
            ResolveError::ArgCount {
                name,
                expected,
                found,
                ..
            } => malformed(format!(
                "`{name}` takes {expected} type argument(s), found {found}"
            )),
            ResolveError::PrimitiveArgument { .. } => {
                malformed("primitive types cannot be type arguments".to_string())
            }
        })
    }

    /// Resolve a syntactic type reference. `params` are the type parameter
    /// names in scope (empty for pattern types).
    pub fn resolve(&self, type_ref: &TypeRef, params: &[String]) -> Result<Ty, ResolveError> {
        let base = if let Some(kind) = PrimitiveKind::from_name(&type_ref.name) {
            if type_ref.args.is_some() {
                return Err(ResolveError::ArgCount {
                    name: type_ref.name.clone(),
                    expected: 0,
                    found: type_ref.args.as_ref().map_or(0, Vec::len),
                    span: type_ref.span,
                });
            }
            Ty::Prim(kind)
        } else if params.iter().any(|p| *p == type_ref.name) {
            Ty::Param(type_ref.name.clone())
        } else {
            let id = self
                .lookup(&type_ref.name)
                .ok_or_else(|| ResolveError::Unknown {
                    name: type_ref.name.clone(),
                    span: type_ref.span,
                })?;
            let expected = self.decl(id).params.len();
            let args = match &type_ref.args {
                None => Vec::new(),
                Some(args) => {
                    if args.len() != expected {
                        return Err(ResolveError::ArgCount {
                            name: type_ref.name.clone(),
                            expected,
                            found: args.len(),
                            span: type_ref.span,
                        });
                    }
                    args.iter()
                        .map(|arg| self.resolve_arg(arg, params))
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            Ty::Class { id, args }
        };

        Ok((0..type_ref.dims).fold(base, |ty, _| Ty::Array(Box::new(ty))))
    }

    fn resolve_arg(&self, arg: &TypeArg, params: &[String]) -> Result<Ty, ResolveError> {
        let reference = |ty: Ty, span: Span| {
            if ty.is_primitive() {
                Err(ResolveError::PrimitiveArgument { span })
            } else {
                Ok(ty)
            }
        };
        match arg {
            TypeArg::Type(t) => reference(self.resolve(t, params)?, t.span),
            TypeArg::Wildcard { bound: None, .. } => Ok(Ty::Wildcard(Wildcard::Any)),
            TypeArg::Wildcard {
                bound: Some((kind, t)),
                ..
            } => {
                let bound = Box::new(reference(self.resolve(t, params)?, t.span)?);
                Ok(Ty::Wildcard(match kind {
                    WildcardBound::Extends => Wildcard::Extends(bound),
                    WildcardBound::Super => Wildcard::Super(bound),
                }))
            }
        }
    }

    // ── Hierarchy ───────────────────────────────────────────────────────

    /// Direct supertypes of `ty`, instantiated with its arguments. Raw
    /// types have erased supertypes.
    pub fn direct_supertypes(&self, ty: &Ty) -> Vec<Ty> {
        match ty {
            Ty::Class { id, args } => {
                let decl = self.decl(*id);
                if *id == self.builtins.object {
                    return Vec::new();
                }
                if decl.supertypes.is_empty() {
                    return vec![self.object()];
                }
                if args.is_empty() && !decl.params.is_empty() {
                    decl.supertypes.iter().map(Ty::erased).collect()
                } else {
                    let names = decl.param_names();
                    decl.supertypes
                        .iter()
                        .map(|s| s.substitute(&names, args))
                        .collect()
                }
            }
            Ty::Array(_) => vec![self.object()],
            _ => Vec::new(),
        }
    }

    /// A declaration that reaches itself through supertype edges.
    fn find_cycle(&self) -> Option<TypeId> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }
        let mut marks = vec![Mark::New; self.decls.len()];
        for root in 0..self.decls.len() {
            if marks[root] != Mark::New {
                continue;
            }
            // (declaration, index of the next supertype to visit)
            let mut stack = vec![(root, 0usize)];
            marks[root] = Mark::Open;
            while let Some((at, next)) = stack.pop() {
                let Some(sup) = self.decls[at].supertypes.get(next) else {
                    marks[at] = Mark::Done;
                    continue;
                };
                stack.push((at, next + 1));
                let Some(sup) = sup.class_id().map(|id| id.0 as usize) else {
                    continue;
                };
                match marks.get(sup) {
                    Some(Mark::Open) => return Some(TypeId(sup as u32)),
                    Some(Mark::New) => {
                        marks[sup] = Mark::Open;
                        stack.push((sup, 0));
                    }
                    _ => {}
                }
            }
        }
        None
    }

    /// `ty` viewed as an instance of `target`, e.g. `Circle` as `Shape<String>`.
    pub fn as_super(&self, ty: &Ty, target: TypeId) -> Option<Ty> {
        if ty.class_id() == Some(target) {
            return Some(ty.clone());
        }
        self.direct_supertypes(ty)
            .iter()
            .find_map(|sup| self.as_super(sup, target))
    }

    pub fn is_subtype(&self, sub: &Ty, sup: &Ty) -> bool {
        if sub == sup {
            return true;
        }
        match (sub, sup) {
            (Ty::Null, s) => s.is_reference(),
            (Ty::Prim(_), _) | (_, Ty::Prim(_)) => false,
            (_, s) if self.is_object(s) => true,
            (Ty::Array(a), Ty::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    self.is_subtype(a, b)
                }
            }
            (Ty::Class { .. }, Ty::Class { id, args }) => match self.as_super(sub, *id) {
                Some(Ty::Class { args: found, .. }) => {
                    args.is_empty()
                        || found.is_empty()
                        || args.iter().zip(&found).all(|(a, f)| self.contains(a, f))
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Type argument containment: does `outer` contain `inner`?
    pub fn contains(&self, outer: &Ty, inner: &Ty) -> bool {
        match outer {
            Ty::Wildcard(Wildcard::Any) => true,
            Ty::Wildcard(Wildcard::Extends(bound)) => match inner {
                Ty::Wildcard(Wildcard::Extends(b)) => self.is_subtype(b, bound),
                Ty::Wildcard(_) => self.is_object(bound),
                t => self.is_subtype(t, bound),
            },
            Ty::Wildcard(Wildcard::Super(bound)) => match inner {
                Ty::Wildcard(Wildcard::Super(b)) => self.is_subtype(bound, b),
                Ty::Wildcard(_) => false,
                t => self.is_subtype(bound, t),
            },
            t => t == inner,
        }
    }

    pub fn permitted(&self, id: TypeId) -> &[TypeId] {
        self.decl(id).permits.as_deref().unwrap_or(&[])
    }

    /// Every type reachable through `permits` from `root`, intermediate
    /// sealed types included.
    pub fn permitted_closure(&self, root: TypeId) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut work = vec![root];
        while let Some(current) = work.pop() {
            for &sub in self.permitted(current) {
                if !out.contains(&sub) {
                    out.push(sub);
                    work.push(sub);
                }
            }
        }
        out
    }

    /// Record components of `ty`, with the record's type arguments
    /// substituted. Raw records get erased parameter bounds; a wildcard
    /// argument contributes its upper bound.
    pub fn record_components(&self, ty: &Ty) -> Option<Vec<RecordComponent>> {
        let Ty::Class { id, args } = ty else {
            return None;
        };
        let decl = self.decl(*id);
        if decl.kind != DeclKind::Record {
            return None;
        }
        let names = decl.param_names();
        let args: Vec<Ty> = if args.is_empty() {
            decl.params.iter().map(|p| p.bound.erased()).collect()
        } else {
            args.iter()
                .zip(&decl.params)
                .map(|(arg, param)| match arg {
                    Ty::Wildcard(Wildcard::Extends(bound)) => (**bound).clone(),
                    Ty::Wildcard(_) => param.bound.erased(),
                    other => other.clone(),
                })
                .collect()
        };
        Some(
            decl.components
                .iter()
                .map(|c| RecordComponent {
                    name: c.name.clone(),
                    ty: c.ty.substitute(&names, &args),
                })
                .collect(),
        )
    }

    pub fn enum_constants(&self, id: TypeId) -> Option<&[String]> {
        let decl = self.decl(id);
        (decl.kind == DeclKind::Enum).then_some(decl.constants.as_slice())
    }

    // ── Castability ─────────────────────────────────────────────────────

    /// Can a reference of type `from` be cast to `to` at all?
    pub fn is_castable(&self, from: &Ty, to: &Ty) -> bool {
        match (from, to) {
            (Ty::Prim(a), Ty::Prim(b)) => a == b || (a.is_numeric() && b.is_numeric()),
            (Ty::Prim(_), _) | (_, Ty::Prim(_)) => false,
            (Ty::Null, _) => true,
            (f, t) if self.is_object(f) || self.is_object(t) => true,
            (Ty::Array(a), Ty::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    self.is_castable(a, b)
                }
            }
            (Ty::Array(_), _) | (_, Ty::Array(_)) => false,
            (Ty::Class { id: f, .. }, Ty::Class { id: t, .. }) => {
                if self.are_disjoint(*f, *t) {
                    return false;
                }
                !self.provably_distinct_instantiations(from, to)
            }
            _ => true,
        }
    }

    /// Two class types no value can inhabit simultaneously.
    pub fn are_disjoint(&self, a: TypeId, b: TypeId) -> bool {
        let (ta, tb) = (Ty::class(a), Ty::class(b));
        if self.is_subtype(&ta, &tb) || self.is_subtype(&tb, &ta) {
            return false;
        }
        let (da, db) = (self.decl(a), self.decl(b));
        if da.kind != DeclKind::Interface && db.kind != DeclKind::Interface {
            return true;
        }
        self.closed_and_disjoint(a, b) || self.closed_and_disjoint(b, a)
    }

    fn closed_and_disjoint(&self, a: TypeId, b: TypeId) -> bool {
        let decl = self.decl(a);
        if decl.is_final {
            return true;
        }
        match &decl.permits {
            Some(permits) => permits.iter().all(|p| self.are_disjoint(*p, b)),
            None => false,
        }
    }

    fn provably_distinct_instantiations(&self, from: &Ty, to: &Ty) -> bool {
        let (Some(f), Some(t)) = (from.class_id(), to.class_id()) else {
            return false;
        };
        let pair = if let Some(up) = self.as_super(to, f) {
            Some((up, from.clone()))
        } else {
            self.as_super(from, t).map(|up| (up, to.clone()))
        };
        match pair {
            Some((Ty::Class { args: a, .. }, Ty::Class { args: b, .. })) => a
                .iter()
                .zip(&b)
                .any(|(x, y)| self.provably_distinct(x, y)),
            _ => false,
        }
    }

    fn provably_distinct(&self, a: &Ty, b: &Ty) -> bool {
        let concrete = |t: &Ty| !matches!(t, Ty::Wildcard(_) | Ty::Param(_) | Ty::Var(_)) && !t.has_vars();
        match (a, b) {
            (Ty::Wildcard(Wildcard::Extends(bound)), t) | (t, Ty::Wildcard(Wildcard::Extends(bound)))
                if concrete(t) =>
            {
                !self.is_subtype(t, bound)
            }
            (Ty::Wildcard(Wildcard::Super(bound)), t) | (t, Ty::Wildcard(Wildcard::Super(bound)))
                if concrete(t) =>
            {
                !self.is_subtype(bound, t)
            }
            (x, y) if concrete(x) && concrete(y) => x != y,
            _ => false,
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}
