//! The configuration value tree.
//!
//! Every value is one of four variants: [`Object`] (ordered key/value
//! members), array, [`Scalar`], or [`Substitution`]. Substitutions only
//! exist between the first parser pass and resolution; a resolved tree
//! contains none.
//!
//! Scalars keep the token sequence they were built from. That is what
//! makes value concatenation reversible: `a = 2 foo` holds the tokens
//! `2`, `' '`, `foo` and its surface string is `"2 foo"`.

use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;

use hocc_lex::{Token, TokenKind};
use hocc_util::Span;

/// A configuration value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Object(Object),
    Array(Vec<Value>),
    Scalar(Scalar),
    Substitution(Substitution),
}

impl Value {
    /// Variant name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Scalar(_) => "scalar",
            Value::Substitution(_) => "substitution",
        }
    }

    /// Walks the tree by object keys, returning the value at `path`.
    ///
    /// Only objects are traversed; indexing into arrays is not part of
    /// the path grammar.
    pub fn lookup(&self, path: &[String]) -> Option<&Value> {
        let mut current = self;
        for segment in path {
            match current {
                Value::Object(obj) => current = obj.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// True if any substitution remains anywhere in the tree.
    pub fn has_substitutions(&self) -> bool {
        match self {
            Value::Object(obj) => obj.values().any(Value::has_substitutions),
            Value::Array(items) => items.iter().any(Value::has_substitutions),
            Value::Scalar(_) => false,
            Value::Substitution(_) => true,
        }
    }

    /// Applies `f` to every substitution in the tree, including those
    /// nested inside the inline pieces of other substitutions.
    pub fn for_each_substitution_mut<F: FnMut(&mut Substitution)>(&mut self, f: &mut F) {
        match self {
            Value::Object(obj) => {
                for child in obj.values_mut() {
                    child.for_each_substitution_mut(f);
                }
            }
            Value::Array(items) => {
                for child in items {
                    child.for_each_substitution_mut(f);
                }
            }
            Value::Scalar(_) => {}
            Value::Substitution(sub) => {
                f(sub);
                for piece in &mut sub.pieces {
                    if let PieceValue::Inline(inner) = &mut piece.value {
                        inner.for_each_substitution_mut(f);
                    }
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(obj) => write!(f, "{}", obj),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Substitution(sub) => write!(f, "{}", sub),
        }
    }
}

/// An ordered object: keys enumerate in first-insertion order, and
/// re-assigning an existing key keeps its original position.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Object {
    members: IndexMap<String, Value>,
}

impl Object {
    pub fn new() -> Self {
        Self {
            members: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.members.get_mut(key)
    }

    /// Inserts or replaces. A replaced key keeps its insertion position.
    pub fn insert(&mut self, key: String, value: Value) {
        self.members.insert(key, value);
    }

    /// Removes a key, preserving the order of the remaining members.
    pub fn shift_remove(&mut self, key: &str) -> Option<Value> {
        self.members.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.members.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.members.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.members.values_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.members.iter()
    }

    /// Consumes the object, yielding members in order.
    pub fn into_members(self) -> impl Iterator<Item = (String, Value)> {
        self.members.into_iter()
    }

    /// Deep-merges `incoming` into `self`.
    ///
    /// Object-over-object recurses; for everything else `new_wins`
    /// decides whether the incoming side replaces the existing one.
    pub fn merge(&mut self, incoming: Object, new_wins: bool) {
        for (key, new_value) in incoming.members {
            match self.members.entry(key) {
                Entry::Occupied(mut occupied) => match (occupied.get_mut(), new_value) {
                    (Value::Object(existing), Value::Object(incoming)) => {
                        existing.merge(incoming, new_wins);
                    }
                    (slot, new_value) => {
                        if new_wins {
                            *slot = new_value;
                        }
                    }
                },
                Entry::Vacant(vacant) => {
                    vacant.insert(new_value);
                }
            }
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} : {}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// A scalar literal.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarLit {
    Int(i64),
    Double(f64),
    Bool(bool),
    Null,
    Quoted(String),
    Unquoted(String),
}

/// A scalar value plus the tokens it was assembled from.
///
/// Single-token scalars keep their typed literal; concatenations of
/// several tokens collapse to an unquoted string whose surface form
/// preserves interior whitespace.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalar {
    pub lit: ScalarLit,
    pub tokens: Vec<Token>,
}

impl Scalar {
    /// Builds a scalar from one simple-value token. Returns `None` for
    /// token kinds that cannot start a scalar.
    pub fn from_token(token: Token) -> Option<Self> {
        let lit = Self::lit_of(&token)?;
        Some(Self {
            lit,
            tokens: vec![token],
        })
    }

    /// Builds a scalar from a concatenation run. Trailing whitespace
    /// tokens are dropped; a single remaining token keeps its typed
    /// literal.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Option<Self> {
        while matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Whitespace)
        ) {
            tokens.pop();
        }
        match tokens.len() {
            0 => None,
            1 => {
                let lit = Self::lit_of(&tokens[0])?;
                Some(Self { lit, tokens })
            }
            _ => {
                let mut scalar = Self {
                    lit: ScalarLit::Null,
                    tokens,
                };
                scalar.recompute_lit();
                Some(scalar)
            }
        }
    }

    /// A scalar synthesized from an environment variable value.
    pub fn from_env_str(value: &str) -> Self {
        Self {
            lit: ScalarLit::Unquoted(value.to_string()),
            tokens: vec![Token::new(TokenKind::Unquoted, value, Span::DUMMY)],
        }
    }

    fn lit_of(token: &Token) -> Option<ScalarLit> {
        match &token.kind {
            TokenKind::Int(i) => Some(ScalarLit::Int(*i)),
            TokenKind::Double(d) => Some(ScalarLit::Double(*d)),
            TokenKind::True => Some(ScalarLit::Bool(true)),
            TokenKind::False => Some(ScalarLit::Bool(false)),
            TokenKind::Null => Some(ScalarLit::Null),
            TokenKind::Quoted(s) | TokenKind::TripleQuoted(s) => {
                Some(ScalarLit::Quoted(s.clone()))
            }
            TokenKind::Unquoted => Some(ScalarLit::Unquoted(token.lexeme.clone())),
            _ => None,
        }
    }

    /// The surface string: token texts joined, trailing whitespace
    /// trimmed. Quoted tokens contribute their decoded content.
    pub fn surface(&self) -> String {
        let joined: String = self.tokens.iter().map(|t| t.concat_text()).collect();
        joined
            .trim_end_matches(|c| hocc_lex::chars::is_whitespace(c))
            .to_string()
    }

    /// Appends another scalar's tokens, as value concatenation does.
    pub fn append(&mut self, other: &Scalar) {
        self.tokens.extend(other.tokens.iter().cloned());
        self.recompute_lit();
    }

    /// Appends a run of whitespace, used to re-insert the spacing
    /// captured on a substitution reference.
    pub fn append_whitespace(&mut self, ws: &str) {
        if ws.is_empty() {
            return;
        }
        self.tokens
            .push(Token::new(TokenKind::Whitespace, ws, Span::DUMMY));
        self.recompute_lit();
    }

    fn recompute_lit(&mut self) {
        if self.tokens.len() == 1 {
            if let Some(lit) = Self::lit_of(&self.tokens[0]) {
                self.lit = lit;
                return;
            }
        }
        self.lit = ScalarLit::Unquoted(self.surface());
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lit {
            ScalarLit::Int(i) => write!(f, "{}", i),
            ScalarLit::Double(d) => write!(f, "{}", d),
            ScalarLit::Bool(b) => write!(f, "{}", b),
            ScalarLit::Null => write!(f, "null"),
            ScalarLit::Quoted(s) => write!(f, "\"{}\"", s),
            ScalarLit::Unquoted(s) => write!(f, "{}", s),
        }
    }
}

/// What a substitution's pieces combine into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubKind {
    Object,
    Array,
    Scalar,
    /// Every piece is a path reference; the kind is fixed by the first
    /// successful resolution.
    Unknown,
}

impl fmt::Display for SubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubKind::Object => write!(f, "object"),
            SubKind::Array => write!(f, "array"),
            SubKind::Scalar => write!(f, "scalar"),
            SubKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A reference piece: `${path}` or `${?path}`.
#[derive(Clone, Debug, PartialEq)]
pub struct PathRef {
    /// Absolute path to look up.
    pub path: Vec<String>,
    /// True for `${?path}`.
    pub optional: bool,
    /// Index into the history stack captured when the owning
    /// substitution was first pushed. Bounds self-reference searches.
    pub counter: Option<usize>,
    /// Whitespace between this reference and the following piece,
    /// re-inserted when the reference resolves to a scalar.
    pub suffix_ws: String,
}

impl PathRef {
    pub fn new(path: Vec<String>, optional: bool) -> Self {
        Self {
            path,
            optional,
            counter: None,
            suffix_ws: String::new(),
        }
    }
}

/// One piece of a substitution: an inline value or a path reference.
#[derive(Clone, Debug, PartialEq)]
pub enum PieceValue {
    Inline(Value),
    Ref(PathRef),
}

/// A piece plus its interrupt flag. An interrupting piece replaces the
/// accumulator instead of merging or concatenating with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub value: PieceValue,
    pub interrupt: bool,
}

impl Piece {
    pub fn inline(value: Value) -> Self {
        Self {
            value: PieceValue::Inline(value),
            interrupt: false,
        }
    }

    pub fn reference(path_ref: PathRef) -> Self {
        Self {
            value: PieceValue::Ref(path_ref),
            interrupt: false,
        }
    }
}

/// An unresolved substitution: an ordered piece list plus the context
/// the resolver needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Substitution {
    /// Identity for cycle detection; survives deep copies so stack
    /// snapshots and the live tree agree on which substitution is which.
    pub id: u64,
    pub kind: SubKind,
    pub pieces: Vec<Piece>,
    /// Absolute path of the assignment this substitution appeared in
    /// (array indices excluded). Basis of the self-reference test.
    pub container_path: Vec<String>,
    /// Set when the substitution arrived via an include; references are
    /// retried with this prefix stripped before the environment is
    /// consulted.
    pub include_prefix: Option<Vec<String>>,
}

impl Substitution {
    pub fn new(id: u64, container_path: Vec<String>) -> Self {
        Self {
            id,
            kind: SubKind::Unknown,
            pieces: Vec::new(),
            container_path,
            include_prefix: None,
        }
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, piece) in self.pieces.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match &piece.value {
                PieceValue::Inline(v) => write!(f, "{}", v)?,
                PieceValue::Ref(r) => write!(
                    f,
                    "${{{}{}}}",
                    if r.optional { "?" } else { "" },
                    r.path.join(".")
                )?,
            }
        }
        Ok(())
    }
}
