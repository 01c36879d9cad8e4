//! Reference evaluator for decision sequences.
//!
//! Runs a [`DecisionSequence`] against a concrete [`Value`] the way the
//! generated code would: null dispatch first, then the candidates in order,
//! then the fallback. Guards are answered by a caller-supplied oracle that
//! sees the bindings made so far.

use patmatch_typeck::convert::{is_exact_value, ConstValue};
use patmatch_typeck::ty::TypeId;
use patmatch_typeck::{PrimitiveKind, Ty, TypeTable};

use crate::sequence::{Candidate, DecisionSequence, Fallback, MatchError, OnNull, SlotId, Step};

/// A run-time value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Any integral primitive; `kind` is its type.
    Int { value: i64, kind: PrimitiveKind },
    Float { value: f64, kind: PrimitiveKind },
    Str(String),
    /// A class instance. Record components are stored in declaration order.
    Object { class: TypeId, fields: Vec<Value> },
    /// A wrapper instance around a primitive.
    Boxed(Box<Value>),
    Enum { ty: TypeId, name: String },
}

impl Value {
    pub fn int(value: i64) -> Value {
        Value::Int {
            value,
            kind: PrimitiveKind::Int,
        }
    }

    pub fn boxed(value: Value) -> Value {
        Value::Boxed(Box::new(value))
    }

    pub fn record(class: TypeId, fields: Vec<Value>) -> Value {
        Value::Object { class, fields }
    }

    fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::Int { kind, .. } | Value::Float { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The run-time class, `None` for null and primitives.
    fn class(&self, table: &TypeTable) -> Option<Ty> {
        match self {
            Value::Str(_) => Some(table.string()),
            Value::Object { class, .. } => Some(Ty::class(*class)),
            Value::Enum { ty, .. } => Some(Ty::class(*ty)),
            Value::Boxed(inner) => inner
                .primitive_kind()
                .map(|kind| Ty::class(table.box_of(kind))),
            _ => None,
        }
    }

    fn as_const(&self) -> Option<ConstValue> {
        match self {
            Value::Bool(b) => Some(ConstValue::Bool(*b)),
            Value::Int { value, kind } => Some(ConstValue::Int {
                value: *value,
                kind: *kind,
            }),
            Value::Float { value, kind } => Some(ConstValue::Float {
                value: *value,
                kind: *kind,
            }),
            Value::Str(s) => Some(ConstValue::Str(s.clone())),
            Value::Enum { ty, name } => Some(ConstValue::Enum {
                ty: *ty,
                name: name.clone(),
            }),
            Value::Boxed(inner) => inner.as_const(),
            Value::Null | Value::Object { .. } => None,
        }
    }

    /// Primitive conversion, assumed already known to be exact.
    fn convert(&self, to: PrimitiveKind) -> Value {
        match (self, to) {
            (Value::Int { value, .. }, PrimitiveKind::Float | PrimitiveKind::Double) => {
                Value::Float {
                    value: *value as f64,
                    kind: to,
                }
            }
            (Value::Int { value, .. }, _) => Value::Int { value: *value, kind: to },
            (Value::Float { value, .. }, PrimitiveKind::Float | PrimitiveKind::Double) => {
                Value::Float { value: *value, kind: to }
            }
            (Value::Float { value, .. }, _) => Value::Int {
                value: *value as i64,
                kind: to,
            },
            (other, _) => other.clone(),
        }
    }
}

/// The outcome of a switch that did not throw.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    /// Index of the case whose body runs; `None` when a statement switch
    /// matched nothing.
    pub target: Option<usize>,
    pub bindings: Vec<(String, Value)>,
}

impl Selection {
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Run `sequence` on `selector`. `guard` is asked about case `index` with
/// the candidate's bindings whenever a guard step is reached.
pub fn run(
    table: &TypeTable,
    sequence: &DecisionSequence,
    selector: Value,
    mut guard: impl FnMut(usize, &[(String, Value)]) -> bool,
) -> Result<Selection, MatchError> {
    if selector == Value::Null {
        return match sequence.on_null {
            Some(OnNull::Case(target)) => Ok(Selection {
                target: Some(target),
                bindings: Vec::new(),
            }),
            Some(OnNull::Candidate(index)) => {
                let candidate = sequence
                    .candidates
                    .get(index)
                    .ok_or(MatchError::NullSelector)?;
                try_candidate(table, sequence, candidate, &selector, &mut guard)
                    .map(|bindings| Selection {
                        target: Some(candidate.target),
                        bindings,
                    })
                    .ok_or(MatchError::NullSelector)
            }
            Some(OnNull::Throw) | None => Err(MatchError::NullSelector),
        };
    }

    for candidate in &sequence.candidates {
        if let Some(bindings) = try_candidate(table, sequence, candidate, &selector, &mut guard) {
            return Ok(Selection {
                target: Some(candidate.target),
                bindings,
            });
        }
    }

    match sequence.fallback {
        Fallback::Default(target) => Ok(Selection {
            target: Some(target),
            bindings: Vec::new(),
        }),
        Fallback::Throw(err) => Err(err),
        Fallback::Skip => Ok(Selection {
            target: None,
            bindings: Vec::new(),
        }),
    }
}

/// The candidate's bindings if every step passes.
fn try_candidate(
    table: &TypeTable,
    sequence: &DecisionSequence,
    candidate: &Candidate,
    selector: &Value,
    guard: &mut impl FnMut(usize, &[(String, Value)]) -> bool,
) -> Option<Vec<(String, Value)>> {
    let mut slots: Vec<Option<Value>> = vec![None; sequence.slots.len()];
    *slots.first_mut()? = Some(selector.clone());
    let mut bindings = Vec::new();

    for step in &candidate.steps {
        match step {
            Step::NullCheck { slot } => {
                if load(&slots, *slot)? == &Value::Null {
                    return None;
                }
            }
            Step::TypeTest { slot, ty, .. } => {
                let class = load(&slots, *slot)?.class(table)?;
                if !table.is_subtype(&class, &ty.erased()) {
                    return None;
                }
            }
            Step::ExactTest { slot, to } => {
                let value = load(&slots, *slot)?.as_const()?;
                if !is_exact_value(&value, *to) {
                    return None;
                }
            }
            Step::Unbox { from, into, .. } => {
                let Value::Boxed(inner) = load(&slots, *from)? else {
                    return None;
                };
                let inner = (**inner).clone();
                store(&mut slots, *into, inner)?;
            }
            Step::ConstTest { slot, value, .. } => {
                let found = load(&slots, *slot)?.as_const()?;
                if !found.same_value(value) {
                    return None;
                }
            }
            Step::Extract {
                from, index, into, ..
            } => {
                let Value::Object { fields, .. } = load(&slots, *from)? else {
                    return None;
                };
                let component = fields.get(*index)?.clone();
                if let Some(into) = into {
                    store(&mut slots, *into, component)?;
                }
            }
            Step::Bind { name, slot, to } => {
                let value = load(&slots, *slot)?;
                let value = match to {
                    Some(kind) => value.convert(*kind),
                    None => value.clone(),
                };
                bindings.push((name.clone(), value));
            }
            Step::Guard { case, .. } => {
                if !guard(*case, &bindings) {
                    return None;
                }
            }
        }
    }
    Some(bindings)
}

fn load(slots: &[Option<Value>], slot: SlotId) -> Option<&Value> {
    slots.get(slot.0 as usize)?.as_ref()
}

fn store(slots: &mut [Option<Value>], slot: SlotId, value: Value) -> Option<()> {
    *slots.get_mut(slot.0 as usize)? = Some(value);
    Some(())
}
