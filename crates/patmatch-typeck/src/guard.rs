//! Guards as opaque predicates.
//!
//! The analyzer never evaluates a guard. It needs three facts: whether the
//! guard is a constant, whether every local it reads is effectively final,
//! and which names it reads and writes. The flow collaborator supplies the
//! last two as [`GuardFacts`]; [`GuardFacts::inferred`] derives a
//! conservative approximation from the guard text for callers without one.

use patmatch_common::Span;
use patmatch_syntax::ast::Guard;
use patmatch_syntax::token::{Token, TokenKind};
use patmatch_syntax::Lexer;
use serde::Serialize;

/// What the analyzer knows about a case's guard.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum GuardKind {
    Unguarded,
    /// `when true`: behaves as unguarded.
    ConstantTrue,
    /// `when false`: the case can never be selected.
    ConstantFalse,
    Opaque,
}

impl GuardKind {
    pub fn of(guard: Option<&Guard>) -> GuardKind {
        match guard.map(|g| g.constant) {
            None => GuardKind::Unguarded,
            Some(Some(true)) => GuardKind::ConstantTrue,
            Some(Some(false)) => GuardKind::ConstantFalse,
            Some(None) => GuardKind::Opaque,
        }
    }

    /// Counts as unguarded for dominance and exhaustiveness.
    pub fn is_unconditional(self) -> bool {
        matches!(self, GuardKind::Unguarded | GuardKind::ConstantTrue)
    }

    /// Evaluated at run time.
    pub fn is_opaque(self) -> bool {
        self == GuardKind::Opaque
    }
}

/// Flow facts about one guard expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardFacts {
    /// Every local the guard reads is effectively final.
    pub effectively_final: bool,
    /// Names read by the guard.
    pub reads: Vec<String>,
    /// Names assigned by the guard, with the span of the assignment target.
    pub assigns: Vec<(String, Span)>,
}

impl Default for GuardFacts {
    fn default() -> Self {
        GuardFacts {
            effectively_final: true,
            reads: Vec::new(),
            assigns: Vec::new(),
        }
    }
}

impl GuardFacts {
    /// Approximate the facts from the guard text: every identifier that is
    /// not a member name or a method name is a read, and an identifier
    /// directly followed by an assignment operator is a write.
    pub fn inferred(guard: &Guard) -> GuardFacts {
        let tokens = Lexer::tokenize(&guard.text);
        let offset = guard.span.start;
        let mut facts = GuardFacts::default();

        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Ident {
                continue;
            }
            let prev = i.checked_sub(1).map(|p| tokens[p].kind);
            if prev == Some(TokenKind::Dot) {
                continue;
            }
            let next = tokens.get(i + 1);
            if next.is_some_and(|t| t.kind == TokenKind::LParen) {
                continue;
            }
            let name = token.span.text(&guard.text).to_string();
            let writes = is_write(&tokens, i, &guard.text);
            if writes {
                let span = Span::new(token.span.start + offset, token.span.end + offset);
                facts.assigns.push((name.clone(), span));
            }
            if !facts.reads.contains(&name) {
                facts.reads.push(name);
            }
        }
        facts
    }

    pub fn with_effectively_final(mut self, value: bool) -> Self {
        self.effectively_final = value;
        self
    }
}

/// Is the identifier at `i` the target of an assignment, increment or
/// decrement?
fn is_write(tokens: &[Token], i: usize, text: &str) -> bool {
    let at = |j: usize| tokens.get(j).filter(|t| t.kind != TokenKind::Eof);
    let is = |t: &Token, kind: TokenKind, op: &str| t.kind == kind && t.span.text(text) == op;
    // `--`, `-=` and `-->` lex as a minus followed by another token, and
    // only count when the two touch.
    let touching = |a: &Token, b: &Token| a.span.end == b.span.start;

    if let Some(next) = at(i + 1) {
        if next.kind == TokenKind::Other && is_assignment_op(next.span.text(text)) {
            return true;
        }
        if next.kind == TokenKind::Minus {
            let decrement = at(i + 2).is_some_and(|after| {
                touching(next, after)
                    && (after.kind == TokenKind::Minus
                        || after.kind == TokenKind::Arrow
                        || is(after, TokenKind::Other, "="))
            });
            if decrement {
                return true;
            }
        }
    }
    let Some(prev) = i.checked_sub(1).and_then(at) else {
        return false;
    };
    if is(prev, TokenKind::Other, "++") {
        return true;
    }
    prev.kind == TokenKind::Minus
        && i.checked_sub(2)
            .and_then(at)
            .is_some_and(|first| first.kind == TokenKind::Minus && touching(first, prev))
}

fn is_assignment_op(op: &str) -> bool {
    matches!(
        op,
        "=" | "+=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "++"
    )
}
