//! Recursive-descent parser for case labels and patterns.
//!
//! The grammar is small enough that the parser builds the AST directly.
//! Errors are collected rather than aborting: after a malformed label the
//! parser skips to the next `case`/`default` keyword and carries on, so one
//! pass reports every structural problem in a switch.

use patmatch_common::Span;

use crate::ast::{
    BindingName, CaseLabel, Constant, Guard, LabelItem, LabelStyle, Pattern, TypeArg, TypeRef,
    WildcardBound,
};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

/// Where a pattern is being parsed. Decides which bare forms are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Directly in a case label: bare names are constants.
    Label,
    /// The top-level pattern of an `instanceof`.
    Instanceof,
    /// A record component.
    Nested,
}

enum Parsed {
    Pattern(Pattern),
    Name(Vec<String>, Span),
}

pub(crate) struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            errors: Vec::new(),
        }
    }

    pub(crate) fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // ── Token access ───────────────────────────────────────────────────

    fn current(&self) -> TokenKind {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(Span::dummy(), |t| t.span)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// Consume the current token. `Eof` is never consumed.
    fn bump(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, 0, 0));
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn text(&self, span: Span) -> &'src str {
        span.text(self.source)
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(ParseError::new(message, span));
    }

    fn unexpected(&mut self, expected: &str) {
        let found = self.current().describe();
        let span = self.current_span();
        self.error(format!("expected {expected}, found {found}"), span);
    }

    /// Skip to the start of the next label.
    fn recover(&mut self) {
        while !matches!(
            self.current(),
            TokenKind::Case | TokenKind::Default | TokenKind::Eof
        ) {
            self.bump();
        }
    }

    // ── Labels ─────────────────────────────────────────────────────────

    pub(crate) fn parse_labels(&mut self) -> Vec<CaseLabel> {
        let mut labels = Vec::new();
        let mut first_default: Option<Span> = None;

        loop {
            match self.current() {
                TokenKind::Eof => break,
                TokenKind::Case | TokenKind::Default => {
                    let Some(label) = self.parse_label() else {
                        self.recover();
                        continue;
                    };
                    if label.is_default() {
                        match first_default {
                            Some(first) => self.errors.push(ParseError::with_related(
                                "duplicate default label",
                                label.span,
                                "first default label here",
                                first,
                            )),
                            None => first_default = Some(label.span),
                        }
                    }
                    labels.push(label);
                }
                _ => {
                    self.unexpected("`case` or `default`");
                    self.bump();
                    self.recover();
                }
            }
        }
        labels
    }

    fn parse_label(&mut self) -> Option<CaseLabel> {
        let start = self.current_span();
        let items = if self.eat(TokenKind::Default) {
            vec![LabelItem::Default { span: start }]
        } else {
            self.bump();
            self.parse_label_items()?
        };

        let guard = if self.at(TokenKind::When) {
            let guard = self.parse_guard()?;
            if items.iter().all(|i| !matches!(i, LabelItem::Pattern(_))) {
                self.error("only pattern labels can have a guard", guard.span);
            }
            Some(guard)
        } else {
            None
        };

        let style = match self.current() {
            TokenKind::Arrow => LabelStyle::Arrow,
            TokenKind::Colon => LabelStyle::Colon,
            _ => {
                self.unexpected("`->` or `:` after case label");
                return None;
            }
        };
        let end = self.bump().span;

        Some(CaseLabel {
            items,
            guard,
            style,
            span: start.merge(end),
        })
    }

    fn parse_label_items(&mut self) -> Option<Vec<LabelItem>> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_label_item()?);
            if !self.at(TokenKind::Comma) {
                break;
            }
            let comma = self.bump().span;
            if matches!(
                self.current(),
                TokenKind::Arrow | TokenKind::Colon | TokenKind::When | TokenKind::Eof
            ) {
                self.error("trailing comma in case label", comma);
                break;
            }
        }
        Some(items)
    }

    fn parse_label_item(&mut self) -> Option<LabelItem> {
        let span = self.current_span();
        match self.current() {
            TokenKind::Default => {
                self.bump();
                Some(LabelItem::Default { span })
            }
            TokenKind::Null => {
                self.bump();
                Some(LabelItem::Constant {
                    value: Constant::Null,
                    span,
                })
            }
            TokenKind::True | TokenKind::False => {
                let value = self.bump().kind == TokenKind::True;
                Some(LabelItem::Constant {
                    value: Constant::Bool(value),
                    span,
                })
            }
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::CharLiteral
            | TokenKind::StringLiteral => {
                let value = self.parse_literal(false)?;
                Some(LabelItem::Constant { value, span })
            }
            TokenKind::Minus
                if matches!(self.nth(1), TokenKind::IntLiteral | TokenKind::FloatLiteral) =>
            {
                self.bump();
                let end = self.current_span();
                let value = self.parse_literal(true)?;
                Some(LabelItem::Constant {
                    value,
                    span: span.merge(end),
                })
            }
            _ => match self.parse_pattern_or_name(Position::Label)? {
                Parsed::Pattern(p) => Some(LabelItem::Pattern(p)),
                Parsed::Name(path, span) => Some(LabelItem::Constant {
                    value: Constant::Name(path),
                    span,
                }),
            },
        }
    }

    fn parse_guard(&mut self) -> Option<Guard> {
        let when_span = self.bump().span;
        let mut depth = 0u32;
        let mut open_ternaries = 0u32;
        let mut range: Option<Span> = None;

        loop {
            match self.current() {
                TokenKind::Eof | TokenKind::Case | TokenKind::Default => break,
                TokenKind::Arrow if depth == 0 => break,
                TokenKind::Colon if depth == 0 && open_ternaries == 0 => break,
                TokenKind::Colon if depth == 0 => open_ternaries -= 1,
                TokenKind::Question if depth == 0 => open_ternaries += 1,
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            let span = self.bump().span;
            range = Some(range.map_or(span, |r| r.merge(span)));
        }

        let Some(span) = range else {
            self.error("expected guard expression after `when`", when_span);
            return None;
        };
        let text = self.text(span).to_string();
        let constant = match text.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        };
        Some(Guard {
            text,
            constant,
            span,
        })
    }

    // ── Literals ───────────────────────────────────────────────────────

    fn parse_literal(&mut self, negative: bool) -> Option<Constant> {
        let token = self.bump();
        let raw = self.text(token.span);
        match token.kind {
            TokenKind::IntLiteral => self.decode_int(raw, negative, token.span),
            TokenKind::FloatLiteral => {
                let single = raw.ends_with(['f', 'F']);
                let digits: String = raw
                    .trim_end_matches(['f', 'F', 'd', 'D'])
                    .chars()
                    .filter(|&c| c != '_')
                    .collect();
                let Ok(mut value) = digits.parse::<f64>() else {
                    self.error(format!("malformed floating-point literal `{raw}`"), token.span);
                    return None;
                };
                if single {
                    value = value as f32 as f64;
                }
                if negative {
                    value = -value;
                }
                Some(Constant::Float { value, single })
            }
            TokenKind::CharLiteral => {
                let inner = &raw[1..raw.len() - 1];
                let decoded = unescape(inner);
                let mut chars = decoded.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Constant::Char(c)),
                    _ => {
                        self.error("character literal must hold exactly one character", token.span);
                        None
                    }
                }
            }
            TokenKind::StringLiteral => Some(Constant::Str(unescape(&raw[1..raw.len() - 1]))),
            _ => {
                self.error("expected literal", token.span);
                None
            }
        }
    }

    fn decode_int(&mut self, raw: &str, negative: bool, span: Span) -> Option<Constant> {
        let long = raw.ends_with(['l', 'L']);
        let body: String = raw
            .trim_end_matches(['l', 'L'])
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let (digits, radix) = match body.get(..2) {
            Some("0x" | "0X") => (&body[2..], 16),
            Some("0b" | "0B") => (&body[2..], 2),
            _ => (body.as_str(), 10),
        };
        let Ok(magnitude) = u64::from_str_radix(digits, radix) else {
            self.error(format!("malformed integer literal `{raw}`"), span);
            return None;
        };

        let too_large = |this: &mut Self| {
            this.error(format!("integer number too large: {raw}"), span);
            None
        };
        let value = match (long, radix) {
            (false, 10) => {
                let limit = if negative { 1u64 << 31 } else { (1u64 << 31) - 1 };
                if magnitude > limit {
                    return too_large(self);
                }
                magnitude as i64
            }
            (false, _) => {
                if magnitude > u64::from(u32::MAX) {
                    return too_large(self);
                }
                i64::from(magnitude as u32 as i32)
            }
            (true, 10) => {
                let limit = if negative { 1u64 << 63 } else { (1u64 << 63) - 1 };
                if magnitude > limit {
                    return too_large(self);
                }
                magnitude as i64
            }
            (true, _) => magnitude as i64,
        };
        let value = if negative { value.wrapping_neg() } else { value };
        Some(Constant::Int { value, long })
    }

    // ── Patterns ───────────────────────────────────────────────────────

    /// Parse the single top-level pattern of an `instanceof`.
    pub(crate) fn parse_instanceof_pattern(&mut self) -> Option<Pattern> {
        let pattern = match self.parse_pattern_or_name(Position::Instanceof)? {
            Parsed::Pattern(p) => p,
            Parsed::Name(_, span) => {
                self.error("expected pattern, found a bare name", span);
                return None;
            }
        };
        if !self.at(TokenKind::Eof) {
            self.unexpected("end of pattern");
        }
        Some(pattern)
    }

    /// Parse a lone type reference such as `Box<? extends T>[]`.
    pub(crate) fn parse_standalone_type(&mut self) -> Option<TypeRef> {
        if !self.at(TokenKind::Ident) {
            self.unexpected("type name");
            return None;
        }
        let ty = self.parse_type_ref()?;
        if !self.at(TokenKind::Eof) {
            self.unexpected("end of type");
        }
        Some(ty)
    }

    fn parse_nested_pattern(&mut self) -> Option<Pattern> {
        match self.parse_pattern_or_name(Position::Nested)? {
            Parsed::Pattern(p) => Some(p),
            Parsed::Name(_, span) => {
                self.error("expected pattern, found a bare name", span);
                None
            }
        }
    }

    fn parse_pattern_or_name(&mut self, position: Position) -> Option<Parsed> {
        let start = self.current_span();
        let mut final_span: Option<Span> = None;
        while self.at(TokenKind::Final) {
            let span = self.bump().span;
            if final_span.is_some() {
                self.error("repeated modifier `final`", span);
            }
            final_span = Some(span);
        }
        let is_final = final_span.is_some();

        match self.current() {
            TokenKind::Underscore => {
                let us = self.bump().span;
                if matches!(self.current(), TokenKind::Ident | TokenKind::Underscore) {
                    self.error("`_` cannot be used as a type name", us);
                    let binding = self.parse_binding_name()?;
                    return Some(Parsed::Pattern(Pattern::Unnamed {
                        span: us.merge(binding.span()),
                    }));
                }
                if let Some(fs) = final_span {
                    self.error("modifier `final` requires a type or `var`", fs);
                }
                if position == Position::Instanceof {
                    self.error("`_` is not allowed as the top-level pattern of `instanceof`", us);
                }
                Some(Parsed::Pattern(Pattern::Unnamed { span: us }))
            }
            TokenKind::Var => {
                let var_span = self.bump().span;
                if self.at(TokenKind::LParen) {
                    self.error("`var` cannot be used as the type of a record pattern", var_span);
                    return None;
                }
                if position == Position::Instanceof {
                    self.error("`var` is not allowed as the top-level pattern of `instanceof`", var_span);
                }
                let binding = self.parse_binding_name()?;
                Some(Parsed::Pattern(Pattern::Var {
                    span: start.merge(binding.span()),
                    binding,
                    is_final,
                }))
            }
            TokenKind::Ident => {
                let ty = self.parse_type_ref()?;
                match self.current() {
                    TokenKind::LParen => {
                        if let Some(fs) = final_span {
                            self.errors.push(ParseError::with_related(
                                "modifiers are not allowed on record patterns",
                                fs,
                                "record pattern type here",
                                ty.span,
                            ));
                        }
                        self.parse_record_components(ty).map(Parsed::Pattern)
                    }
                    TokenKind::Ident | TokenKind::Underscore => {
                        let binding = self.parse_binding_name()?;
                        Some(Parsed::Pattern(Pattern::Type {
                            span: start.merge(binding.span()),
                            ty,
                            binding,
                            is_final,
                        }))
                    }
                    _ if position == Position::Label
                        && !is_final
                        && ty.args.is_none()
                        && ty.dims == 0 =>
                    {
                        let path = ty.name.split('.').map(str::to_string).collect();
                        Some(Parsed::Name(path, ty.span))
                    }
                    _ => {
                        let found = self.current().describe();
                        let span = self.current_span();
                        self.error(
                            format!("expected a binding name after type `{}`, found {found}", ty.name),
                            span,
                        );
                        None
                    }
                }
            }
            _ => {
                self.unexpected("pattern");
                None
            }
        }
    }

    fn parse_record_components(&mut self, ty: TypeRef) -> Option<Pattern> {
        let open = self.bump().span;
        let mut components = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                components.push(self.parse_nested_pattern()?);
                if !self.at(TokenKind::Comma) {
                    break;
                }
                let comma = self.bump().span;
                if self.at(TokenKind::RParen) {
                    self.error("trailing comma in record pattern", comma);
                    break;
                }
            }
        }
        if !self.at(TokenKind::RParen) {
            let found = self.current().describe();
            let span = self.current_span();
            self.errors.push(ParseError::with_related(
                format!("expected `)` to close record pattern, found {found}"),
                span,
                "record pattern starts here",
                open,
            ));
            return None;
        }
        let close = self.bump().span;
        Some(Pattern::Record {
            span: ty.span.merge(close),
            ty,
            components,
        })
    }

    fn parse_binding_name(&mut self) -> Option<BindingName> {
        let span = self.current_span();
        match self.current() {
            TokenKind::Ident => {
                self.bump();
                Some(BindingName::Named {
                    name: self.text(span).to_string(),
                    span,
                })
            }
            TokenKind::Underscore => {
                self.bump();
                Some(BindingName::Unnamed { span })
            }
            _ => {
                self.unexpected("binding name");
                None
            }
        }
    }

    // ── Types ──────────────────────────────────────────────────────────

    fn parse_type_ref(&mut self) -> Option<TypeRef> {
        let first = self.bump().span;
        let mut name = self.text(first).to_string();
        let mut span = first;

        while self.at(TokenKind::Dot) && self.nth(1) == TokenKind::Ident {
            self.bump();
            let part = self.bump().span;
            name.push('.');
            name.push_str(self.text(part));
            span = span.merge(part);
        }

        let mut args = None;
        if self.at(TokenKind::Lt) {
            let lt = self.bump().span;
            if self.at(TokenKind::Gt) {
                let gt = self.bump().span;
                self.error("diamond `<>` is not allowed in patterns", lt.merge(gt));
                span = span.merge(gt);
            } else {
                let mut list = Vec::new();
                loop {
                    list.push(self.parse_type_arg()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                if !self.at(TokenKind::Gt) {
                    self.unexpected("`>` to close type arguments");
                    return None;
                }
                span = span.merge(self.bump().span);
                args = Some(list);
            }
        }

        let mut dims = 0;
        while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
            self.bump();
            span = span.merge(self.bump().span);
            dims += 1;
        }

        Some(TypeRef {
            name,
            args,
            dims,
            span,
        })
    }

    fn parse_type_arg(&mut self) -> Option<TypeArg> {
        match self.current() {
            TokenKind::Question => {
                let q = self.bump().span;
                let bound = if self.at(TokenKind::Ident) {
                    let kind = match self.text(self.current_span()) {
                        "extends" => Some(WildcardBound::Extends),
                        "super" => Some(WildcardBound::Super),
                        _ => None,
                    };
                    match kind {
                        Some(kind) => {
                            self.bump();
                            if !self.at(TokenKind::Ident) {
                                self.unexpected("bound type");
                                return None;
                            }
                            Some((kind, self.parse_type_ref()?))
                        }
                        None => None,
                    }
                } else {
                    None
                };
                let span = bound.as_ref().map_or(q, |(_, t)| q.merge(t.span));
                Some(TypeArg::Wildcard { bound, span })
            }
            TokenKind::Ident => Some(TypeArg::Type(self.parse_type_ref()?)),
            TokenKind::Underscore => {
                let span = self.bump().span;
                self.error("`_` cannot be used as a type name", span);
                None
            }
            _ => {
                self.unexpected("type argument");
                None
            }
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
