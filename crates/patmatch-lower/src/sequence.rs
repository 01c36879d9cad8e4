//! Decision sequences.
//!
//! A [`DecisionSequence`] is the ordered list of candidates a switch tries
//! at run time. Each candidate is one label alternative: a straight line of
//! [`Step`]s, any of which may reject the selector value and move on to the
//! next candidate. Values live in numbered slots; `s0` holds the selector.

use std::fmt;

use patmatch_typeck::convert::ConstValue;
use patmatch_typeck::{PrimitiveKind, Ty};

// ── Slots ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl SlotId {
    pub const SELECTOR: SlotId = SlotId(0);
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlotKind {
    Selector,
    /// Storage of a pattern variable, shared by every alternative that
    /// reaches the same body.
    Binding { target: usize, name: String },
    /// An intermediate value: an extracted component or an unboxed value
    /// that is only tested.
    Temp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub id: SlotId,
    pub kind: SlotKind,
    pub ty: Ty,
    pub ty_name: String,
}

// ── Steps ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Reject a null value.
    NullCheck { slot: SlotId },
    /// Reject a value that is not an instance of `ty`.
    TypeTest { slot: SlotId, ty: Ty, ty_name: String },
    /// Reject a primitive value that does not convert exactly to `to`.
    ExactTest { slot: SlotId, to: PrimitiveKind },
    /// Unwrap the boxed value in `from`.
    Unbox {
        from: SlotId,
        into: SlotId,
        kind: PrimitiveKind,
    },
    /// Reject a value other than `value`.
    ConstTest {
        slot: SlotId,
        value: ConstValue,
        text: String,
    },
    /// Invoke the accessor of component `index`. The result is stored only
    /// when something reads it.
    Extract {
        from: SlotId,
        index: usize,
        component: String,
        into: Option<SlotId>,
    },
    /// Make pattern variable `name` refer to `slot`, converted to `to` when
    /// the variable's type differs from the slot's.
    Bind {
        name: String,
        slot: SlotId,
        to: Option<PrimitiveKind>,
    },
    /// Evaluate the guard of case `case`; reject when false.
    Guard { case: usize, text: String },
}

impl Step {
    /// Slots this step reads.
    pub fn loads(&self) -> Option<SlotId> {
        match self {
            Step::NullCheck { slot }
            | Step::TypeTest { slot, .. }
            | Step::ExactTest { slot, .. }
            | Step::ConstTest { slot, .. }
            | Step::Bind { slot, .. } => Some(*slot),
            Step::Unbox { from, .. } | Step::Extract { from, .. } => Some(*from),
            Step::Guard { .. } => None,
        }
    }

    /// The slot this step writes.
    pub fn stores(&self) -> Option<SlotId> {
        match self {
            Step::Unbox { into, .. } => Some(*into),
            Step::Extract { into, .. } => *into,
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::NullCheck { slot } => write!(f, "null-check {}", slot),
            Step::TypeTest { slot, ty_name, .. } => write!(f, "type-test {} {}", slot, ty_name),
            Step::ExactTest { slot, to } => write!(f, "exact-test {} {}", slot, to.name()),
            Step::Unbox { from, into, kind } => {
                write!(f, "unbox {} -> {} {}", from, into, kind.name())
            }
            Step::ConstTest { slot, text, .. } => write!(f, "const-test {} == {}", slot, text),
            Step::Extract {
                from,
                component,
                into,
                ..
            } => match into {
                Some(into) => write!(f, "extract {}.{} -> {}", from, component, into),
                None => write!(f, "extract {}.{} -> _", from, component),
            },
            Step::Bind { name, slot, to } => match to {
                Some(kind) => write!(f, "bind {} = {} as {}", name, slot, kind.name()),
                None => write!(f, "bind {} = {}", name, slot),
            },
            Step::Guard { text, .. } => write!(f, "guard `{}`", text),
        }
    }
}

// ── Candidates and fallback ────────────────────────────────────────────

/// One label alternative.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub case_index: usize,
    pub alternative: usize,
    /// The case whose body runs when every step passes.
    pub target: usize,
    pub steps: Vec<Step>,
}

/// Failures a switch raises at run time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchError {
    /// A null selector with no `case null`.
    NullSelector,
    /// No candidate matched and there is no `default`.
    NoMatch,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::NullSelector => f.write_str("NullSelector"),
            MatchError::NoMatch => f.write_str("NoMatch"),
        }
    }
}

impl std::error::Error for MatchError {}

/// What happens to a null selector. Decided before any candidate runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OnNull {
    /// `case null` runs this body.
    Case(usize),
    /// This candidate, an unguarded top-level `var` or `_`, runs with the
    /// null selector. Its only steps are bindings.
    Candidate(usize),
    Throw,
}

/// What happens when no candidate matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fallback {
    Default(usize),
    Throw(MatchError),
    /// Leave the switch; a non-exhaustive switch statement.
    Skip,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecisionSequence {
    pub slots: Vec<Slot>,
    pub candidates: Vec<Candidate>,
    /// `None` for a primitive selector.
    pub on_null: Option<OnNull>,
    pub fallback: Fallback,
}

impl DecisionSequence {
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.0 as usize)
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.candidates.iter().flat_map(|c| &c.steps)
    }
}

impl fmt::Display for DecisionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "slots")?;
        for slot in &self.slots {
            match &slot.kind {
                SlotKind::Selector => writeln!(f, "  {} selector: {}", slot.id, slot.ty_name)?,
                SlotKind::Binding { name, .. } => {
                    writeln!(f, "  {} {}: {}", slot.id, name, slot.ty_name)?
                }
                SlotKind::Temp => writeln!(f, "  {} temp: {}", slot.id, slot.ty_name)?,
            }
        }
        for candidate in &self.candidates {
            writeln!(
                f,
                "case {}.{} -> body {}",
                candidate.case_index, candidate.alternative, candidate.target
            )?;
            for step in &candidate.steps {
                writeln!(f, "  {}", step)?;
            }
        }
        match self.on_null {
            Some(OnNull::Case(target)) => writeln!(f, "null -> body {}", target)?,
            Some(OnNull::Candidate(index)) => match self.candidates.get(index) {
                Some(c) => writeln!(f, "null -> case {}.{}", c.case_index, c.alternative)?,
                None => writeln!(f, "null -> candidate {}", index)?,
            },
            Some(OnNull::Throw) => writeln!(f, "null -> throw {}", MatchError::NullSelector)?,
            None => {}
        }
        match self.fallback {
            Fallback::Default(target) => write!(f, "else -> body {}", target),
            Fallback::Throw(err) => write!(f, "else -> throw {}", err),
            Fallback::Skip => write!(f, "else -> skip"),
        }
    }
}
