//! Lexical scope for pattern bindings.
//!
//! The flow collaborator seeds the environment with the locals and fields
//! visible at the switch; the binder pushes a frame per case. Lookups
//! search from the innermost frame outward.

use rustc_hash::FxHashMap;

use patmatch_common::Span;

/// What a name in scope refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalKind {
    Local,
    /// Fields may be shadowed by pattern variables.
    Field,
    PatternBinding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeEntry {
    pub kind: LocalKind,
    pub span: Span,
}

/// A stack of frames mapping names to what they declare.
#[derive(Clone, Debug)]
pub struct ScopeEnv {
    frames: Vec<FxHashMap<String, ScopeEntry>>,
}

impl ScopeEnv {
    /// Create an environment with one empty outermost frame.
    pub fn new() -> Self {
        ScopeEnv {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Pop the innermost frame. The outermost frame is never popped.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn declare(&mut self, name: impl Into<String>, kind: LocalKind, span: Span) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), ScopeEntry { kind, span });
        }
    }

    pub fn with_local(mut self, name: &str) -> Self {
        self.declare(name, LocalKind::Local, Span::dummy());
        self
    }

    pub fn with_field(mut self, name: &str) -> Self {
        self.declare(name, LocalKind::Field, Span::dummy());
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&ScopeEntry> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// The declaration a new pattern variable `name` would clash with.
    /// Fields never clash.
    pub fn conflict(&self, name: &str) -> Option<&ScopeEntry> {
        self.lookup(name)
            .filter(|entry| entry.kind != LocalKind::Field)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for ScopeEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_shadowable_locals_are_not() {
        let env = ScopeEnv::new().with_field("count").with_local("total");
        assert!(env.conflict("count").is_none());
        assert_eq!(env.conflict("total").map(|e| e.kind), Some(LocalKind::Local));
        assert!(env.conflict("other").is_none());
    }

    #[test]
    fn inner_frames_are_dropped_on_pop() {
        let mut env = ScopeEnv::new();
        env.push_frame();
        env.declare("s", LocalKind::PatternBinding, Span::new(3, 4));
        assert!(env.lookup("s").is_some());
        env.pop_frame();
        assert!(env.lookup("s").is_none());
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn outermost_frame_survives_extra_pops() {
        let mut env = ScopeEnv::new().with_local("x");
        env.pop_frame();
        assert!(env.lookup("x").is_some());
    }
}
