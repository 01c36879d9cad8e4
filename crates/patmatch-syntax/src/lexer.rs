// Pattern lexer -- tokenizer for case labels and instanceof patterns.

use crate::token::{keyword_from_str, Token, TokenKind};

/// Converts label source text into a stream of tokens.
///
/// Implements `Iterator<Item = Token>`; the final item is always a single
/// `Eof` token. Unknown characters become `Other` tokens so guard text can
/// still be delimited.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            emitted_eof: false,
        }
    }

    /// Tokenize the entire source into a `Vec<Token>`, including `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(char::is_whitespace);
            if self.peek() == Some('/') && self.peek_nth(1) == Some('/') {
                self.eat_while(|c| c != '\n');
                continue;
            }
            if self.peek() == Some('/') && self.peek_nth(1) == Some('*') {
                self.pos += 2;
                while let Some(c) = self.advance() {
                    if c == '*' && self.peek() == Some('/') {
                        self.advance();
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, start as u32, self.pos as u32)
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;

        let Some(c) = self.advance() else {
            return self.token(TokenKind::Eof, start);
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '-' if self.peek() == Some('>') => {
                self.advance();
                TokenKind::Arrow
            }
            '-' => TokenKind::Minus,
            '\'' => self.lex_quoted('\'', TokenKind::CharLiteral),
            '"' => self.lex_quoted('"', TokenKind::StringLiteral),
            '0'..='9' => self.lex_number(c),
            c if is_ident_start(c) => {
                self.eat_while(is_ident_continue);
                keyword_from_str(&self.source[start..self.pos]).unwrap_or(TokenKind::Ident)
            }
            _ => {
                self.eat_while(is_operator_char);
                TokenKind::Other
            }
        };
        self.token(kind, start)
    }

    fn lex_quoted(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '\n' => return TokenKind::Error,
                c if c == quote => return kind,
                _ => {}
            }
        }
        TokenKind::Error
    }

    /// Lex a numeric literal. The value is decoded by the parser; here we only
    /// decide between integral and floating-point forms.
    fn lex_number(&mut self, first: char) -> TokenKind {
        if first == '0' && matches!(self.peek(), Some('x' | 'X' | 'b' | 'B')) {
            self.advance();
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            if matches!(self.peek(), Some('l' | 'L')) {
                self.advance();
            }
            return TokenKind::IntLiteral;
        }

        self.eat_while(|c| c.is_ascii_digit() || c == '_');
        let mut float = false;
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            float = true;
            self.advance();
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                float = true;
                self.advance();
                if sign {
                    self.advance();
                }
                self.eat_while(|c| c.is_ascii_digit());
            }
        }
        match self.peek() {
            Some('f' | 'F' | 'd' | 'D') => {
                self.advance();
                TokenKind::FloatLiteral
            }
            Some('l' | 'L') if !float => {
                self.advance();
                TokenKind::IntLiteral
            }
            _ if float => TokenKind::FloatLiteral,
            _ => TokenKind::IntLiteral,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '!' | '&' | '|' | '+' | '*' | '/' | '%' | '^' | '~' | '@' | ';' | '{' | '}')
}
