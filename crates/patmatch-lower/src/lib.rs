//! Lowering of analyzed switches into decision sequences.
//!
//! [`lower`] takes the [`SwitchAnalysis`](patmatch_typeck::SwitchAnalysis)
//! of a switch with no errors and produces the ordered candidate list that
//! code generation turns into branches. [`SlotTraffic`] audits the storage
//! a sequence uses, and [`eval::run`] executes a sequence on concrete
//! values.

pub mod error;
pub mod eval;
pub mod lower;
pub mod sequence;
pub mod traffic;

pub use error::LowerError;
pub use eval::{run, Selection, Value};
pub use lower::lower;
pub use sequence::{
    Candidate, DecisionSequence, Fallback, MatchError, OnNull, Slot, SlotId, SlotKind, Step,
};
pub use traffic::{SlotTraffic, Traffic};
