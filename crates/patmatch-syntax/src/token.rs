use patmatch_common::Span;
use serde::Serialize;

/// A token produced by the pattern lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in the pattern sub-language.
///
/// Guard expressions are not tokenized into anything meaningful: the parser
/// only needs enough structure to find where a guard ends, so operators it
/// does not understand come through as [`TokenKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    Case,
    Default,
    When,
    Var,
    Final,
    True,
    False,
    Null,

    // ── Delimiters and punctuation ─────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `?`
    Question,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `->`
    Arrow,
    /// `-`
    Minus,

    // ── Literals and names ─────────────────────────────────────────────
    Ident,
    /// The reserved `_` identifier.
    Underscore,
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,

    // ── Special ────────────────────────────────────────────────────────
    /// Any other operator character sequence (only legal inside guards).
    Other,
    /// An unterminated literal or an unknown character.
    Error,
    Eof,
}

impl TokenKind {
    /// Human-readable form used in parse error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Case => "`case`",
            TokenKind::Default => "`default`",
            TokenKind::When => "`when`",
            TokenKind::Var => "`var`",
            TokenKind::Final => "`final`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Null => "`null`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Question => "`?`",
            TokenKind::Dot => "`.`",
            TokenKind::Colon => "`:`",
            TokenKind::Arrow => "`->`",
            TokenKind::Minus => "`-`",
            TokenKind::Ident => "identifier",
            TokenKind::Underscore => "`_`",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "floating-point literal",
            TokenKind::CharLiteral => "character literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Other => "operator",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of input",
        }
    }
}

/// Map an identifier to its keyword kind, if it is one.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "case" => Some(TokenKind::Case),
        "default" => Some(TokenKind::Default),
        "when" => Some(TokenKind::When),
        "var" => Some(TokenKind::Var),
        "final" => Some(TokenKind::Final),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "_" => Some(TokenKind::Underscore),
        _ => None,
    }
}
