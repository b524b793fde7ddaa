//! The streaming lexer.
//!
//! Scans source text into the token stream described in [`crate::token`].
//! Errors are reported to the shared [`Handler`] and scanning continues
//! after a one-character resync.
//!
//! One policy lives here rather than in the parser: after a structural
//! opener (`{`, `[`, `,`, `:`, `=`, `+=`) the lexer discards whitespace
//! and comments up to and including the next newline, and after a closer
//! (`}`, `]`) it discards inline whitespace. This is what lets newlines
//! act as member separators while multi-line formatting stays legal.

use hocc_util::{ErrorKind, Handler, Span};

use crate::chars::{is_digit, is_forbidden, is_hex_digit, is_inline_whitespace};
use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// The lexer. Construct with [`Lexer::new`], consume with [`Lexer::run`].
///
/// # Example
///
/// ```
/// use hocc_lex::{Lexer, TokenKind};
/// use hocc_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = Lexer::new("a : true", &handler).run();
/// assert_eq!(tokens[2].kind, TokenKind::Colon);
/// assert_eq!(tokens[3].kind, TokenKind::True);
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    handler: &'a Handler,
    tokens: Vec<Token>,
    token_start: usize,
    token_span: Span,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source`, reporting problems to `handler`.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            tokens: Vec::new(),
            token_start: 0,
            token_span: Span::new(1, 1),
        }
    }

    /// Lexes the whole source, returning the token stream.
    ///
    /// The stream always ends with an [`TokenKind::Eof`] token.
    pub fn run(mut self) -> Vec<Token> {
        while !self.cursor.is_at_end() {
            self.token_start = self.cursor.position();
            self.token_span = Span::new(self.cursor.line(), self.cursor.column());

            let before = self.tokens.len();
            self.scan_token();

            // Pruning applies to the token just emitted, if any; comments
            // emit nothing and must not re-trigger it.
            if self.tokens.len() > before {
                match self.tokens.last().map(|t| t.kind.clone()) {
                    Some(
                        TokenKind::LBrace
                        | TokenKind::LBracket
                        | TokenKind::Comma
                        | TokenKind::Colon
                        | TokenKind::Equal
                        | TokenKind::PlusEqual,
                    ) => self.prune_through_newline(),
                    Some(TokenKind::RBrace | TokenKind::RBracket) => self.prune_inline(),
                    _ => {}
                }
            }
        }

        let eof_span = Span::new(self.cursor.line(), self.cursor.column());
        self.tokens.push(Token::new(TokenKind::Eof, "", eof_span));
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.cursor.bump();
        match c {
            '{' => self.push(TokenKind::LBrace),
            '}' => self.push(TokenKind::RBrace),
            '[' => self.push(TokenKind::LBracket),
            ']' => self.push(TokenKind::RBracket),
            '(' => self.push(TokenKind::LParen),
            ')' => self.push(TokenKind::RParen),
            ',' => self.push(TokenKind::Comma),
            ':' => self.push(TokenKind::Colon),
            '=' => self.push(TokenKind::Equal),
            '?' => self.push(TokenKind::Question),
            '+' => {
                if self.cursor.bump_if('=') {
                    self.push(TokenKind::PlusEqual);
                } else {
                    self.report(format!(
                        "expected '=' after '+', got {:?}",
                        self.cursor.current()
                    ));
                }
            }
            '\n' => self.push(TokenKind::Newline),
            '#' => self.comment(),
            '/' => {
                if self.cursor.current() == '/' {
                    self.cursor.advance();
                    self.comment();
                } else {
                    self.unquoted_string();
                }
            }
            '"' => {
                if self.cursor.current() == '"' && self.cursor.peek(1) == '"' {
                    self.cursor.advance();
                    self.cursor.advance();
                    self.triple_quoted_string();
                } else {
                    self.quoted_string();
                }
            }
            '$' => self.substitution(),
            '-' => {
                if is_digit(self.cursor.current()) {
                    self.number();
                } else {
                    self.unquoted_string();
                }
            }
            c if is_inline_whitespace(c) => self.whitespace(),
            c if is_digit(c) => self.number(),
            c if !is_forbidden(c) => self.unquoted_string(),
            c => {
                // One-character resync: the offender is already consumed.
                self.report(format!("unexpected character {:?}", c));
            }
        }
    }

    /// Emits a token whose lexeme is everything scanned since token start.
    fn push(&mut self, kind: TokenKind) {
        let lexeme = self.cursor.slice_from(self.token_start).to_string();
        self.tokens.push(Token::new(kind, lexeme, self.token_span));
    }

    fn report(&self, message: String) {
        self.handler.error(
            ErrorKind::Lexical,
            message,
            Span::new(self.cursor.line(), self.cursor.column()),
        );
    }

    /// Consumes a run of horizontal whitespace into one token.
    fn whitespace(&mut self) {
        while is_inline_whitespace(self.cursor.current()) {
            self.cursor.advance();
        }
        self.push(TokenKind::Whitespace);
    }

    /// Consumes a comment body. The terminating newline is left for the
    /// main loop so it still produces a separator token.
    fn comment(&mut self) {
        while self.cursor.current() != '\n' && !self.cursor.is_at_end() {
            self.cursor.advance();
        }
    }

    /// Lexes a quoted string with JSON escape rules.
    fn quoted_string(&mut self) {
        let mut content = String::new();
        loop {
            if self.cursor.is_at_end() {
                self.report("unterminated string".to_string());
                break;
            }
            let c = self.cursor.current();
            if c == '"' {
                self.cursor.advance();
                break;
            }
            if c == '\\' {
                self.cursor.advance();
                self.escape(&mut content);
            } else {
                content.push(c);
                self.cursor.advance();
            }
        }
        self.push(TokenKind::Quoted(content));
    }

    /// Decodes one escape sequence into `content`. On a bad escape the
    /// sequence is dropped and an error reported.
    fn escape(&mut self, content: &mut String) {
        if self.cursor.is_at_end() {
            self.report("unterminated escape sequence".to_string());
            return;
        }
        let c = self.cursor.bump();
        match c {
            '"' => content.push('"'),
            '\\' => content.push('\\'),
            '/' => content.push('/'),
            'b' => content.push('\u{0008}'),
            'f' => content.push('\u{000C}'),
            'n' => content.push('\n'),
            'r' => content.push('\r'),
            't' => content.push('\t'),
            'u' => {
                if let Some(c) = self.unicode_escape() {
                    content.push(c);
                }
            }
            other => self.report(format!("invalid escape '\\{}'", other)),
        }
    }

    /// Reads the `XXXX` of a `\uXXXX` escape, combining UTF-16 surrogate
    /// pairs when a high surrogate is followed by `\uXXXX` low surrogate.
    fn unicode_escape(&mut self) -> Option<char> {
        let hi = self.hex4()?;
        if (0xD800..=0xDBFF).contains(&hi) {
            if self.cursor.current() == '\\' && self.cursor.peek(1) == 'u' {
                self.cursor.advance();
                self.cursor.advance();
                let lo = self.hex4()?;
                if (0xDC00..=0xDFFF).contains(&lo) {
                    let combined = 0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00);
                    return char::from_u32(combined);
                }
                self.report("invalid low surrogate in unicode escape".to_string());
                return None;
            }
            self.report("unpaired surrogate in unicode escape".to_string());
            return None;
        }
        let decoded = char::from_u32(hi);
        if decoded.is_none() {
            self.report("invalid unicode escape".to_string());
        }
        decoded
    }

    fn hex4(&mut self) -> Option<u32> {
        let mut value: u32 = 0;
        for _ in 0..4 {
            let c = self.cursor.current();
            if !is_hex_digit(c) {
                self.report("expected four hex digits in unicode escape".to_string());
                return None;
            }
            value = value * 16 + c.to_digit(16).unwrap_or(0);
            self.cursor.advance();
        }
        Some(value)
    }

    /// Lexes a triple-quoted string: raw content until the next `"""`.
    fn triple_quoted_string(&mut self) {
        let mut content = String::new();
        loop {
            if self.cursor.is_at_end() {
                self.report("unterminated triple-quoted string".to_string());
                break;
            }
            if self.cursor.current() == '"'
                && self.cursor.peek(1) == '"'
                && self.cursor.peek(2) == '"'
            {
                self.cursor.advance();
                self.cursor.advance();
                self.cursor.advance();
                break;
            }
            content.push(self.cursor.bump());
        }
        self.push(TokenKind::TripleQuoted(content));
    }

    /// Lexes `${path}` or `${?path}`. The path body is kept raw; brace
    /// nesting inside the body is not supported.
    fn substitution(&mut self) {
        if !self.cursor.bump_if('{') {
            self.report("'$' must start a substitution '${...}'".to_string());
            return;
        }
        let optional = self.cursor.bump_if('?');
        let mut path = String::new();
        loop {
            if self.cursor.is_at_end() {
                self.report("unterminated substitution".to_string());
                break;
            }
            let c = self.cursor.current();
            if c == '}' {
                self.cursor.advance();
                break;
            }
            path.push(c);
            self.cursor.advance();
        }
        if optional {
            self.push(TokenKind::SubOptional(path));
        } else {
            self.push(TokenKind::Sub(path));
        }
    }

    /// Lexes a number, sign included: integer, fraction, exponent.
    fn number(&mut self) {
        while is_digit(self.cursor.current()) {
            self.cursor.advance();
        }
        let mut is_double = false;
        if self.cursor.current() == '.' && is_digit(self.cursor.peek(1)) {
            self.cursor.advance();
            while is_digit(self.cursor.current()) {
                self.cursor.advance();
            }
            is_double = true;
        }
        let c = self.cursor.current();
        if c == 'e' || c == 'E' {
            let next = self.cursor.peek(1);
            let signed = (next == '+' || next == '-') && is_digit(self.cursor.peek(2));
            if is_digit(next) || signed {
                self.cursor.advance();
                if signed {
                    self.cursor.advance();
                }
                while is_digit(self.cursor.current()) {
                    self.cursor.advance();
                }
                is_double = true;
            }
        }

        let text = self.cursor.slice_from(self.token_start);
        if is_double {
            self.push(TokenKind::Double(text.parse().unwrap_or(0.0)));
        } else {
            match text.parse::<i64>() {
                Ok(i) => self.push(TokenKind::Int(i)),
                // Out of i64 range; fall back to a double.
                Err(_) => self.push(TokenKind::Double(text.parse().unwrap_or(0.0))),
            }
        }
    }

    /// Lexes a run of non-forbidden characters, reclassifying the exact
    /// lexemes `true`, `false`, and `null`.
    fn unquoted_string(&mut self) {
        while !self.cursor.is_at_end() && !is_forbidden(self.cursor.current()) {
            self.cursor.advance();
        }
        let kind = match self.cursor.slice_from(self.token_start) {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Unquoted,
        };
        self.push(kind);
    }

    /// After an opener: discard whitespace and comments up to and
    /// including the next newline.
    fn prune_through_newline(&mut self) {
        loop {
            let c = self.cursor.current();
            if is_inline_whitespace(c) {
                self.cursor.advance();
            } else if c == '#' || (c == '/' && self.cursor.peek(1) == '/') {
                while self.cursor.current() != '\n' && !self.cursor.is_at_end() {
                    self.cursor.advance();
                }
            } else if c == '\n' {
                self.cursor.advance();
                break;
            } else {
                break;
            }
        }
    }

    /// After a closer: discard inline whitespace only.
    fn prune_inline(&mut self) {
        while is_inline_whitespace(self.cursor.current()) {
            self.cursor.advance();
        }
    }
}
