//! hocc-par - First-pass parser for the HOCON-style configuration
//! language.
//!
//! The parser consumes the token stream from `hocc-lex` and produces two
//! things:
//!
//! 1. A root value (object or array) whose leaves may still be
//!    unresolved [`Substitution`] placeholders.
//! 2. The assignment history [`Stack`]: an ordered log of every
//!    assignment performed, as `(absolute path, deep snapshot)` records.
//!
//! The stack is what gives duplicate keys, `+=`, and self-referential
//! substitutions their meaning; the resolver in `hocc-res` replays
//! lookups against it.
//!
//! Parsing is fail-soft. Syntax problems are reported to the shared
//! [`Handler`], the parser resynchronizes at the next member or element
//! boundary, and the output is marked invalid. Only a failed
//! `required(...)` include aborts with an error.
//!
//! # Example
//!
//! ```
//! use hocc_par::{parse_str, reader::NullReader, Value};
//! use hocc_util::Handler;
//!
//! let handler = Handler::new();
//! let output = parse_str("a = 1\nb = ${a}", &handler, &NullReader).unwrap();
//! assert!(matches!(output.root, Value::Object(_)));
//! assert_eq!(output.stack.len(), 2);
//! ```

pub mod path;
pub mod reader;
pub mod stack;
pub mod value;

mod edge_cases;

pub use stack::{Stack, StackEntry};
pub use value::{
    Object, PathRef, Piece, PieceValue, Scalar, ScalarLit, SubKind, Substitution, Value,
};

use hocc_lex::{Token, TokenKind};
use hocc_util::{ConfigError, ErrorKind, Handler, Span};

use crate::path::{split_path, PathError};
use crate::reader::{IncludeKind, SourceReader};

/// Maximum include nesting before a file is considered self-including.
const MAX_INCLUDE_DEPTH: u32 = 64;

/// Result of the first pass.
#[derive(Debug)]
pub struct ParseOutput {
    /// Root object or array; may contain substitution placeholders.
    pub root: Value,
    /// The assignment history.
    pub stack: Stack,
    /// False if any syntactic or structural problem was reported.
    pub valid: bool,
}

/// Runs the first pass over an already-lexed token stream.
pub fn parse(
    tokens: Vec<Token>,
    handler: &Handler,
    reader: &dyn SourceReader,
) -> Result<ParseOutput, ConfigError> {
    let mut parser = Parser::new(tokens, handler, reader);
    let root = parser.parse_root()?;
    Ok(ParseOutput {
        root,
        stack: parser.stack,
        valid: parser.valid,
    })
}

/// Lexes and parses a source string in one step.
pub fn parse_str(
    source: &str,
    handler: &Handler,
    reader: &dyn SourceReader,
) -> Result<ParseOutput, ConfigError> {
    let tokens = hocc_lex::tokenize(source, handler);
    parse(tokens, handler, reader)
}

/// Internal piece buffer used while grouping a value concatenation.
enum RawPiece {
    Val(Value),
    Ref(PathRef),
}

/// The first-pass parser.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    handler: &'a Handler,
    reader: &'a dyn SourceReader,
    stack: Stack,
    valid: bool,
    next_sub_id: u64,
    include_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, handler: &'a Handler, reader: &'a dyn SourceReader) -> Self {
        let mut tokens = tokens;
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, "", Span::DUMMY));
        }
        Self {
            tokens,
            pos: 0,
            handler,
            reader,
            stack: Stack::new(),
            valid: true,
            next_sub_id: 0,
            include_depth: 0,
        }
    }

    /// Parses the root: a bracketed array, a braced object, or an
    /// unbraced object body running to end of input.
    pub fn parse_root(&mut self) -> Result<Value, ConfigError> {
        self.ignore_all_whitespace();
        let root = if matches!(self.kind(), TokenKind::LBracket) {
            Value::Array(self.hocon_array(&[])?)
        } else if matches!(self.kind(), TokenKind::LBrace) {
            Value::Object(self.hocon_object(&[], true)?)
        } else {
            Value::Object(self.object_body(false, &[], true)?)
        };
        self.ignore_all_whitespace();
        if !self.at_end() {
            self.error(
                ErrorKind::Syntactic,
                format!("unexpected {} after root value", self.peek().describe()),
            );
        }
        Ok(root)
    }

    // ----- token access -------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn ignore_all_whitespace(&mut self) {
        while matches!(self.kind(), TokenKind::Whitespace | TokenKind::Newline) {
            self.advance();
        }
    }

    fn ignore_inline_whitespace(&mut self) {
        while matches!(self.kind(), TokenKind::Whitespace) {
            self.advance();
        }
    }

    fn error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let span = self.span();
        self.handler.error(kind, message, span);
        self.valid = false;
    }

    fn fresh_sub_id(&mut self) -> u64 {
        let id = self.next_sub_id;
        self.next_sub_id += 1;
        id
    }

    // ----- error recovery -----------------------------------------------

    /// Panic mode: discard tokens up to the next member boundary.
    fn recover_member(&mut self) {
        while !matches!(
            self.kind(),
            TokenKind::Comma
                | TokenKind::Newline
                | TokenKind::RBrace
                | TokenKind::RBracket
                | TokenKind::Eof
        ) {
            self.advance();
        }
    }

    /// Panic mode: discard tokens up to the next element boundary.
    fn recover_element(&mut self) {
        while !matches!(
            self.kind(),
            TokenKind::Comma | TokenKind::Newline | TokenKind::RBracket | TokenKind::Eof
        ) {
            self.advance();
        }
    }

    // ----- objects ------------------------------------------------------

    /// Parses `{ ... }`; the opening brace is the current token.
    fn hocon_object(&mut self, path: &[String], track: bool) -> Result<Object, ConfigError> {
        self.advance();
        self.object_body(true, path, track)
    }

    /// Parses an object body. `braced` bodies end at `}`, unbraced at
    /// end of input. `path` is the absolute path of this object; `track`
    /// is false inside arrays, where members are not recorded on the
    /// history stack.
    fn object_body(
        &mut self,
        braced: bool,
        path: &[String],
        track: bool,
    ) -> Result<Object, ConfigError> {
        let mut obj = Object::new();
        loop {
            self.ignore_all_whitespace();
            if braced {
                if self.eat(&TokenKind::RBrace) {
                    break;
                }
                if self.at_end() {
                    self.error(ErrorKind::Syntactic, "imbalanced braces: missing '}'");
                    break;
                }
            } else {
                if self.at_end() {
                    break;
                }
                if matches!(self.kind(), TokenKind::RBrace) {
                    self.error(ErrorKind::Syntactic, "unexpected '}' at root");
                    self.advance();
                    continue;
                }
            }
            self.member(&mut obj, path, track)?;
            self.member_separator();
        }
        Ok(obj)
    }

    /// Parses one `key sep value` member (or an include directive) into
    /// `obj`.
    fn member(&mut self, obj: &mut Object, path: &[String], track: bool) -> Result<(), ConfigError> {
        if self.at_include_directive() {
            return self.include_directive(obj, path, track);
        }

        if !self.kind().is_simple_value() {
            let desc = self.peek().describe();
            self.error(ErrorKind::Syntactic, format!("expected a key, got {}", desc));
            self.advance();
            self.recover_member();
            return Ok(());
        }

        // Key: a run of simple values and whitespace, interior whitespace
        // preserved, trailing whitespace trimmed.
        let mut key_tokens: Vec<Token> = Vec::new();
        while self.kind().is_simple_value() || matches!(self.kind(), TokenKind::Whitespace) {
            key_tokens.push(self.advance());
        }
        while matches!(key_tokens.last().map(|t| &t.kind), Some(TokenKind::Whitespace)) {
            key_tokens.pop();
        }
        // A newline after the key only works if '{', ':' or '=' follows.
        if matches!(self.kind(), TokenKind::Newline) {
            self.ignore_all_whitespace();
        }

        let rel = match split_key_tokens(&key_tokens) {
            Ok(p) => p,
            Err(e) => {
                self.error(ErrorKind::Syntactic, format!("invalid key: {}", e));
                self.recover_member();
                return Ok(());
            }
        };
        let full: Vec<String> = path.iter().cloned().chain(rel.iter().cloned()).collect();

        let plus_equal = if matches!(self.kind(), TokenKind::LBrace) {
            // Implied separator: `key { ... }`.
            false
        } else if self.eat(&TokenKind::Colon) || self.eat(&TokenKind::Equal) {
            false
        } else if self.eat(&TokenKind::PlusEqual) {
            true
        } else {
            let desc = self.peek().describe();
            self.error(
                ErrorKind::Syntactic,
                format!(
                    "expected ':', '=', '+=' or '{{' after key '{}', got {}",
                    rel.join("."),
                    desc
                ),
            );
            self.recover_member();
            return Ok(());
        };

        let Some(parsed) = self.value(&full, track)? else {
            self.recover_member();
            return Ok(());
        };
        let parsed = if plus_equal {
            self.rewrite_plus_equal(parsed, &full)
        } else {
            parsed
        };
        self.assign_value(obj, path, &rel, parsed, track);
        Ok(())
    }

    /// Consumes the separator after a member: a comma, or nothing if a
    /// newline, closer, or end of input follows.
    fn member_separator(&mut self) {
        self.ignore_inline_whitespace();
        match self.kind() {
            TokenKind::Comma => {
                self.advance();
            }
            TokenKind::Newline | TokenKind::RBrace | TokenKind::Eof => {}
            _ => {
                let desc = self.peek().describe();
                self.error(
                    ErrorKind::Syntactic,
                    format!("expected ',' or newline after member, got {}", desc),
                );
                self.recover_member();
            }
        }
    }

    // ----- arrays -------------------------------------------------------

    /// Parses `[ ... ]`; the opening bracket is the current token.
    /// Elements are not recorded on the history stack, but substitutions
    /// inside them keep `path` as their container for the self-reference
    /// test.
    fn hocon_array(&mut self, path: &[String]) -> Result<Vec<Value>, ConfigError> {
        self.advance();
        let mut items = Vec::new();
        loop {
            self.ignore_all_whitespace();
            if self.eat(&TokenKind::RBracket) {
                break;
            }
            if self.at_end() {
                self.error(ErrorKind::Syntactic, "imbalanced brackets: missing ']'");
                break;
            }
            match self.value(path, false)? {
                Some(v) => items.push(v),
                None => self.recover_element(),
            }
            self.ignore_inline_whitespace();
            if matches!(self.kind(), TokenKind::Comma) {
                self.advance();
            } else if !matches!(
                self.kind(),
                TokenKind::Newline | TokenKind::RBracket | TokenKind::Eof
            ) {
                let desc = self.peek().describe();
                self.error(
                    ErrorKind::Syntactic,
                    format!("expected ',' or newline between array elements, got {}", desc),
                );
                self.recover_element();
            }
        }
        Ok(items)
    }

    // ----- values -------------------------------------------------------

    /// Parses a full value position: a maximal run of adjacent objects,
    /// arrays, scalar tokens, and substitution references. Adjacent
    /// objects merge, adjacent arrays concatenate; any reference turns
    /// the run into a substitution.
    ///
    /// Returns `Ok(None)` after reporting an error when no value is
    /// present; the caller resynchronizes.
    fn value(&mut self, path: &[String], track: bool) -> Result<Option<Value>, ConfigError> {
        // Indentation on a continuation line survives lexer pruning.
        self.ignore_inline_whitespace();
        let mut pieces: Vec<RawPiece> = Vec::new();
        loop {
            match self.kind().clone() {
                TokenKind::LBrace => {
                    let obj = self.hocon_object(path, track)?;
                    self.push_piece(&mut pieces, Value::Object(obj));
                }
                TokenKind::LBracket => {
                    let arr = self.hocon_array(path)?;
                    self.push_piece(&mut pieces, Value::Array(arr));
                }
                TokenKind::Sub(raw) => {
                    self.ref_piece(&mut pieces, raw, false);
                }
                TokenKind::SubOptional(raw) => {
                    self.ref_piece(&mut pieces, raw, true);
                }
                k if k.is_simple_value() => {
                    self.scalar_run(&mut pieces);
                }
                _ => break,
            }
        }

        if pieces.is_empty() {
            let desc = self.peek().describe();
            self.error(ErrorKind::Syntactic, format!("expected a value, got {}", desc));
            return Ok(None);
        }

        let has_ref = pieces.iter().any(|p| matches!(p, RawPiece::Ref(_)));
        if !has_ref {
            // Adjacency merging left exactly one value (more only after
            // a reported kind clash; the first one wins then).
            for piece in pieces {
                if let RawPiece::Val(v) = piece {
                    return Ok(Some(v));
                }
            }
            return Ok(None);
        }

        let mut sub = Substitution::new(self.fresh_sub_id(), path.to_vec());
        for piece in pieces {
            match piece {
                RawPiece::Val(v) => {
                    let tag = match &v {
                        Value::Object(_) => SubKind::Object,
                        Value::Array(_) => SubKind::Array,
                        Value::Scalar(_) => SubKind::Scalar,
                        Value::Substitution(_) => continue,
                    };
                    self.fix_sub_kind(&mut sub, tag);
                    sub.pieces.push(Piece::inline(v));
                }
                RawPiece::Ref(r) => sub.pieces.push(Piece::reference(r)),
            }
        }
        Ok(Some(Value::Substitution(sub)))
    }

    /// Collects a scalar concatenation run. Interior whitespace tokens
    /// are kept; trailing whitespace is kept only when a substitution
    /// follows, so its spacing survives resolution.
    fn scalar_run(&mut self, pieces: &mut Vec<RawPiece>) {
        let mut toks = vec![self.advance()];
        loop {
            if self.kind().is_simple_value() {
                toks.push(self.advance());
            } else if matches!(self.kind(), TokenKind::Whitespace) {
                let next = &self.peek_nth(1).kind;
                if next.is_simple_value() {
                    toks.push(self.advance());
                } else if next.is_substitution() {
                    toks.push(self.advance());
                    break;
                } else {
                    self.advance();
                    break;
                }
            } else {
                break;
            }
        }
        if let Some(scalar) = Scalar::from_tokens(toks) {
            self.push_piece(pieces, Value::Scalar(scalar));
        }
    }

    /// Records a `${path}` / `${?path}` piece, capturing the whitespace
    /// between it and a following piece.
    fn ref_piece(&mut self, pieces: &mut Vec<RawPiece>, raw: String, optional: bool) {
        self.advance();
        let parsed = match split_path(&raw) {
            Ok(p) => p,
            Err(e) => {
                self.error(
                    ErrorKind::Syntactic,
                    format!("invalid substitution path '{}': {}", raw, e),
                );
                return;
            }
        };
        let mut path_ref = PathRef::new(parsed, optional);
        if matches!(self.kind(), TokenKind::Whitespace) {
            let next = &self.peek_nth(1).kind;
            let starts_piece = next.is_simple_value()
                || next.is_substitution()
                || matches!(next, TokenKind::LBrace | TokenKind::LBracket);
            let ws = self.advance();
            if starts_piece {
                path_ref.suffix_ws = ws.lexeme;
            }
        }
        pieces.push(RawPiece::Ref(path_ref));
    }

    /// Adjacency handling: merges or concatenates a new value piece with
    /// the previous one when their kinds agree.
    fn push_piece(&mut self, pieces: &mut Vec<RawPiece>, value: Value) {
        if let Some(RawPiece::Val(last)) = pieces.last_mut() {
            match (last, value) {
                (Value::Object(a), Value::Object(b)) => {
                    a.merge(b, true);
                    return;
                }
                (Value::Array(a), Value::Array(b)) => {
                    a.extend(b);
                    return;
                }
                (Value::Scalar(a), Value::Scalar(b)) => {
                    a.append(&b);
                    return;
                }
                (a, b) => {
                    let message =
                        format!("cannot concatenate {} with {}", a.kind_name(), b.kind_name());
                    self.error(ErrorKind::Structural, message);
                    return;
                }
            }
        }
        pieces.push(RawPiece::Val(value));
    }

    /// Fixes a substitution's kind from an inline piece, reporting a
    /// structural error on a clash.
    fn fix_sub_kind(&mut self, sub: &mut Substitution, tag: SubKind) {
        if sub.kind == SubKind::Unknown {
            sub.kind = tag;
        } else if sub.kind != tag {
            self.error(
                ErrorKind::Structural,
                format!("substitution mixes {} and {} pieces", sub.kind, tag),
            );
        }
    }

    /// Rewrites `key += value` into `key = ${?key} [value...]`.
    fn rewrite_plus_equal(&mut self, value: Value, full: &[String]) -> Value {
        let self_ref = Piece::reference(PathRef::new(full.to_vec(), true));
        let mut sub = Substitution::new(self.fresh_sub_id(), full.to_vec());
        match value {
            Value::Substitution(inner) => {
                sub.kind = inner.kind;
                sub.pieces.push(self_ref);
                sub.pieces.extend(inner.pieces);
            }
            Value::Array(items) => {
                sub.kind = SubKind::Array;
                sub.pieces.push(self_ref);
                sub.pieces.push(Piece::inline(Value::Array(items)));
            }
            other => {
                // A bare element appends as a one-element array.
                sub.kind = SubKind::Array;
                sub.pieces.push(self_ref);
                sub.pieces.push(Piece::inline(Value::Array(vec![other])));
            }
        }
        Value::Substitution(sub)
    }

    // ----- assignment ---------------------------------------------------

    /// Assigns `value` at `rel` below `obj`, creating intermediate
    /// objects for dotted keys and combining with an existing value per
    /// the duplicate-key rules. Every assignment is recorded on the
    /// history stack when `track` is set.
    fn assign_value(
        &mut self,
        obj: &mut Object,
        parent_path: &[String],
        rel: &[String],
        value: Value,
        track: bool,
    ) {
        let Some((last, intermediate)) = rel.split_last() else {
            return;
        };
        let mut walked: Vec<String> = parent_path.to_vec();
        let mut current = obj;
        for seg in intermediate {
            walked.push(seg.clone());
            let create = !matches!(current.get(seg), Some(Value::Object(_)));
            if create {
                // A non-object in the middle of a path is overwritten.
                current.insert(seg.clone(), Value::Object(Object::new()));
                if track {
                    self.stack.push(walked.clone(), Value::Object(Object::new()));
                }
            }
            let here = current;
            current = match here.get_mut(seg) {
                Some(Value::Object(next)) => next,
                _ => return,
            };
        }

        walked.push(last.clone());
        if current.contains_key(last) {
            let existing = match current.get(last) {
                Some(v) => v.clone(),
                None => return,
            };
            let combined = self.combine_duplicate(existing, value, &walked, track);
            current.insert(last.clone(), combined);
        } else {
            let mut value = value;
            self.push_assignment(&walked, &mut value, track);
            current.insert(last.clone(), value);
        }
    }

    /// The duplicate-key combination table.
    fn combine_duplicate(
        &mut self,
        existing: Value,
        incoming: Value,
        full: &[String],
        track: bool,
    ) -> Value {
        match (existing, incoming) {
            // object x object: deep merge, new side wins on leaves. The
            // stack records existing, incoming, and merged, in order.
            (Value::Object(mut eo), Value::Object(no)) => {
                let existing_snap = Value::Object(eo.clone());
                let incoming_snap = Value::Object(no.clone());
                eo.merge(no, true);
                let merged = Value::Object(eo);
                if track {
                    self.stack.push(full.to_vec(), existing_snap);
                    self.stack.push(full.to_vec(), incoming_snap);
                    self.stack.push(full.to_vec(), merged.clone());
                }
                merged
            }
            // object x substitution: the existing object becomes the
            // first piece; later pieces merge over it.
            (Value::Object(eo), Value::Substitution(mut sub)) => {
                self.fix_sub_kind(&mut sub, SubKind::Object);
                sub.pieces.insert(0, Piece::inline(Value::Object(eo)));
                self.finish_sub_assignment(sub, full, track)
            }
            // array/scalar x substitution: the existing value becomes
            // the first piece and the substitution's own first piece
            // interrupts, so an unconditional reference replaces the old
            // value while `+=`'s optional self-reference extends it.
            (existing @ (Value::Array(_) | Value::Scalar(_)), Value::Substitution(mut sub)) => {
                if sub.kind == SubKind::Unknown {
                    sub.kind = match &existing {
                        Value::Array(_) => SubKind::Array,
                        _ => SubKind::Scalar,
                    };
                }
                if let Some(first) = sub.pieces.first_mut() {
                    first.interrupt = true;
                }
                sub.pieces.insert(0, Piece::inline(existing));
                self.finish_sub_assignment(sub, full, track)
            }
            // substitution x anything: append as an interrupting piece
            // (piece lists splice for substitution x substitution).
            (Value::Substitution(mut es), incoming) => {
                match incoming {
                    Value::Substitution(ns) => {
                        if es.kind == SubKind::Unknown {
                            es.kind = ns.kind;
                        }
                        let mut incoming_pieces = ns.pieces;
                        if let Some(first) = incoming_pieces.first_mut() {
                            first.interrupt = true;
                        }
                        es.pieces.extend(incoming_pieces);
                    }
                    other => {
                        // The interrupting piece replaces whatever came
                        // before, so only an object fixes the kind.
                        if matches!(other, Value::Object(_)) {
                            es.kind = SubKind::Object;
                        }
                        es.pieces.push(Piece {
                            value: PieceValue::Inline(other),
                            interrupt: true,
                        });
                    }
                }
                self.finish_sub_assignment(es, full, track)
            }
            // Everything else: last write wins.
            (_, incoming) => {
                let mut value = incoming;
                self.push_assignment(full, &mut value, track);
                value
            }
        }
    }

    fn finish_sub_assignment(&mut self, sub: Substitution, full: &[String], track: bool) -> Value {
        let mut value = Value::Substitution(sub);
        self.push_assignment(full, &mut value, track);
        value
    }

    /// Records one assignment on the stack. A substitution being pushed
    /// has its unset reference counters fixed to the stack length first,
    /// so self-references see exactly the history that preceded them.
    fn push_assignment(&mut self, full: &[String], value: &mut Value, track: bool) {
        if !track {
            return;
        }
        if let Value::Substitution(sub) = value {
            let counter = self.stack.len();
            for piece in &mut sub.pieces {
                if let PieceValue::Ref(r) = &mut piece.value {
                    if r.counter.is_none() {
                        r.counter = Some(counter);
                    }
                }
            }
        }
        self.stack.push(full.to_vec(), value.clone());
    }

    // ----- includes -----------------------------------------------------

    /// True when the current token begins an include directive rather
    /// than an ordinary key named `include`.
    fn at_include_directive(&self) -> bool {
        if !matches!(self.kind(), TokenKind::Unquoted) || self.peek().lexeme != "include" {
            return false;
        }
        let mut i = self.pos + 1;
        while matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Whitespace)) {
            i += 1;
        }
        match self.tokens.get(i) {
            Some(t) => match (&t.kind, t.lexeme.as_str()) {
                (TokenKind::Quoted(_), _) => true,
                (TokenKind::Unquoted, "file" | "url" | "required") => matches!(
                    self.tokens.get(i + 1).map(|t| &t.kind),
                    Some(TokenKind::LParen)
                ),
                _ => false,
            },
            None => false,
        }
    }

    fn include_directive(
        &mut self,
        obj: &mut Object,
        path: &[String],
        track: bool,
    ) -> Result<(), ConfigError> {
        let span = self.span();
        self.advance(); // `include`
        self.ignore_inline_whitespace();
        let Some((link, kind, required)) = self.include_spec() else {
            self.recover_member();
            return Ok(());
        };
        self.process_include(obj, path, track, &link, kind, required, span)
    }

    /// Parses the include spec: `"link"`, `file("link")`, `url("link")`,
    /// or `required(file|url("link"))`.
    fn include_spec(&mut self) -> Option<(String, IncludeKind, bool)> {
        match self.kind().clone() {
            TokenKind::Quoted(link) => {
                self.advance();
                Some((link, IncludeKind::Heuristic, false))
            }
            TokenKind::Unquoted => match self.peek().lexeme.as_str() {
                "file" => self.wrapped_link().map(|l| (l, IncludeKind::File, false)),
                "url" => self.wrapped_link().map(|l| (l, IncludeKind::Url, false)),
                "required" => {
                    self.advance();
                    if !self.eat(&TokenKind::LParen) {
                        self.error(ErrorKind::Syntactic, "expected '(' after 'required'");
                        return None;
                    }
                    self.ignore_inline_whitespace();
                    let inner = match self.peek().lexeme.as_str() {
                        "file" => self.wrapped_link().map(|l| (l, IncludeKind::File)),
                        "url" => self.wrapped_link().map(|l| (l, IncludeKind::Url)),
                        _ => {
                            self.error(
                                ErrorKind::Syntactic,
                                "required(...) must wrap file(...) or url(...)",
                            );
                            None
                        }
                    }?;
                    self.ignore_inline_whitespace();
                    if !self.eat(&TokenKind::RParen) {
                        self.error(ErrorKind::Syntactic, "expected ')' to close required(...)");
                        return None;
                    }
                    Some((inner.0, inner.1, true))
                }
                _ => {
                    self.error(ErrorKind::Syntactic, "malformed include directive");
                    None
                }
            },
            _ => {
                self.error(ErrorKind::Syntactic, "malformed include directive");
                None
            }
        }
    }

    /// Parses `file("link")` / `url("link")`, current token being the
    /// wrapper word.
    fn wrapped_link(&mut self) -> Option<String> {
        self.advance();
        if !self.eat(&TokenKind::LParen) {
            self.error(ErrorKind::Syntactic, "expected '(' in include directive");
            return None;
        }
        self.ignore_inline_whitespace();
        let link = match self.kind().clone() {
            TokenKind::Quoted(s) => {
                self.advance();
                s
            }
            _ => {
                self.error(
                    ErrorKind::Syntactic,
                    "expected a quoted source in include directive",
                );
                return None;
            }
        };
        self.ignore_inline_whitespace();
        if !self.eat(&TokenKind::RParen) {
            self.error(ErrorKind::Syntactic, "expected ')' in include directive");
            return None;
        }
        Some(link)
    }

    /// Reads, parses, and splices an included source: members merge into
    /// the current object, the included history is re-pushed with this
    /// object's path as prefix, and included substitutions have their
    /// reference paths prefixed, counters shifted, and the prefix
    /// recorded for resolution-time fallback.
    #[allow(clippy::too_many_arguments)]
    fn process_include(
        &mut self,
        obj: &mut Object,
        path: &[String],
        track: bool,
        link: &str,
        kind: IncludeKind,
        required: bool,
        span: Span,
    ) -> Result<(), ConfigError> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            if required {
                return Err(ConfigError::IncludeDepth {
                    link: link.to_string(),
                });
            }
            self.error(
                ErrorKind::External,
                format!("include depth limit exceeded at `{}`", link),
            );
            return Ok(());
        }

        let text = match self.reader.read(link, kind) {
            Ok(t) => t,
            Err(e) => {
                if required {
                    return Err(ConfigError::RequiredInclude {
                        link: link.to_string(),
                        reason: e.to_string(),
                    });
                }
                self.handler.warning(
                    ErrorKind::External,
                    format!("include `{}` skipped: {}", link, e),
                    span,
                );
                return Ok(());
            }
        };

        let tokens = hocc_lex::tokenize(&text, self.handler);
        let mut inner = Parser::new(tokens, self.handler, self.reader);
        inner.next_sub_id = self.next_sub_id;
        inner.include_depth = self.include_depth + 1;
        let inner_root = inner.parse_root()?;
        self.next_sub_id = inner.next_sub_id;
        if !inner.valid {
            self.valid = false;
        }

        match inner_root {
            Value::Object(included) => {
                let base = self.stack.len();
                let mut included = Value::Object(included);
                included
                    .for_each_substitution_mut(&mut |sub| shift_included_sub(sub, path, base));
                let mut inner_stack = inner.stack;
                for entry in inner_stack.entries_mut() {
                    entry
                        .value
                        .for_each_substitution_mut(&mut |sub| shift_included_sub(sub, path, base));
                }
                self.stack.splice(path, inner_stack);
                if let Value::Object(included) = included {
                    for (key, value) in included.into_members() {
                        self.assign_value(obj, path, std::slice::from_ref(&key), value, false);
                    }
                }
            }
            _ => {
                self.error(
                    ErrorKind::Structural,
                    format!("include `{}` must contain an object, not an array", link),
                );
            }
        }
        Ok(())
    }
}

/// Rebases an included substitution onto the outer configuration:
/// reference paths and the container gain the splice prefix, counters
/// shift past the outer history, and the prefix is recorded so
/// resolution can retry without it.
fn shift_included_sub(sub: &mut Substitution, prefix: &[String], base: usize) {
    for piece in &mut sub.pieces {
        if let PieceValue::Ref(r) = &mut piece.value {
            let mut rebased = prefix.to_vec();
            rebased.append(&mut r.path);
            r.path = rebased;
            if let Some(c) = r.counter {
                r.counter = Some(c + base);
            }
        }
    }
    let mut container = prefix.to_vec();
    container.append(&mut sub.container_path);
    sub.container_path = container;
    let mut include_prefix = prefix.to_vec();
    include_prefix.extend(sub.include_prefix.take().unwrap_or_default());
    sub.include_prefix = Some(include_prefix);
}

/// Builds path segments from key tokens: quoted tokens are atomic,
/// everything else splits on dots, interior whitespace is preserved.
fn split_key_tokens(tokens: &[Token]) -> Result<Vec<String>, PathError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for token in tokens {
        match &token.kind {
            TokenKind::Quoted(s) | TokenKind::TripleQuoted(s) => current.push_str(s),
            _ => {
                for c in token.lexeme.chars() {
                    if c == '.' {
                        if current.is_empty() {
                            return Err(PathError::EmptySegment);
                        }
                        segments.push(std::mem::take(&mut current));
                    } else {
                        current.push(c);
                    }
                }
            }
        }
    }
    if current.is_empty() {
        return Err(PathError::EmptySegment);
    }
    segments.push(current);
    Ok(segments)
}
