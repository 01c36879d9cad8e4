//! Shared types for the pattern-matching front end.

pub mod config;
pub mod span;

pub use config::{AnalysisConfig, ConfigError};
pub use span::{LineIndex, Span};
