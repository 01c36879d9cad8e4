//! Pattern checker: binding, conversion checking, dominance and
//! exhaustiveness for `switch` and `instanceof`.
//!
//! The crate takes case labels from `patmatch-syntax`, resolves them
//! against a [`TypeTable`], and reports every error of a switch in one
//! pass. The result of a clean analysis is what `patmatch-lower` turns
//! into a decision sequence.
//!
//! # Architecture
//!
//! - [`ty`], [`table`]: Type representation and the declaration table
//! - [`unify`]: Inference of omitted record type arguments
//! - [`convert`]: Primitive exactness, boxing and pattern classification
//! - [`scope`]: Names visible at the switch
//! - [`pattern`], [`binder`]: Typed pattern trees and the binder producing them
//! - [`guard`]: What the analyzer knows about guards
//! - [`matchset`]: Match sets and the dominance relation
//! - [`exhaustiveness`]: Sealed and record coverage reduction
//! - [`switch`], [`analyze`]: The switch input model and its analysis
//! - [`error`], [`diagnostics`]: Error taxonomy and rendering

pub mod analyze;
pub mod binder;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod exhaustiveness;
pub mod guard;
pub mod matchset;
pub mod pattern;
pub mod scope;
pub mod switch;
pub mod table;
pub mod ty;
pub mod unify;

pub use analyze::{
    check_instanceof, check_instanceof_source, check_switch, check_switch_source, Alternative,
    CaseAnalysis, InstanceofAnalysis, SwitchAnalysis,
};
pub use error::{ErrorKind, PatternError, Warning};
pub use scope::ScopeEnv;
pub use switch::{Case, CaseBody, Selector, SwitchInput, SwitchKind};
pub use table::{Decl, TypeTable};
pub use ty::{PrimitiveKind, Ty};
