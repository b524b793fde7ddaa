//! Diagnostic reporting infrastructure.
//!
//! Lexing, parsing, and resolution are all fail-soft: they report a
//! problem and keep going so a single run surfaces as many issues as
//! possible. The [`Handler`] is the shared accumulator they report into;
//! a configuration whose handler holds any error-level diagnostic is
//! marked invalid.
//!
//! # Examples
//!
//! ```
//! use hocc_util::{Handler, ErrorKind, Span};
//!
//! let handler = Handler::new();
//! handler.error(ErrorKind::Syntactic, "expected ':' or '='", Span::new(1, 4));
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::span::Span;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// A problem that marks the configuration invalid.
    Error,
    /// A problem worth surfacing that does not invalidate the result.
    Warning,
    /// Additional information attached to another diagnostic.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// The class of failure a diagnostic describes.
///
/// Each phase reports its own kinds: the lexer `Lexical`, the first-pass
/// parser `Syntactic` and `Structural`, the resolver `Resolution` and
/// `Structural`, include reading `External`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated string, bad escape, unexpected character.
    Lexical,
    /// Missing separator, imbalanced brackets, empty path segment.
    Syntactic,
    /// Kind mismatch in a concatenation, include yielding an array,
    /// `+=` applied to a non-array.
    Structural,
    /// Unresolved non-optional substitution, substitution cycle.
    Resolution,
    /// A referenced source could not be read.
    External,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical"),
            ErrorKind::Syntactic => write!(f, "syntax"),
            ErrorKind::Structural => write!(f, "structural"),
            ErrorKind::Resolution => write!(f, "resolution"),
            ErrorKind::External => write!(f, "external"),
        }
    }
}

/// A single reported problem.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity.
    pub level: Level,
    /// Failure class.
    pub kind: ErrorKind,
    /// Main message.
    pub message: String,
    /// Where the problem was observed.
    pub span: Span,
    /// Extra context lines.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(level: Level, kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            kind,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, kind, message, span)
    }

    /// Creates a warning diagnostic.
    pub fn warning(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, kind, message, span)
    }

    /// Attaches a note.
    ///
    /// ```
    /// use hocc_util::{Diagnostic, ErrorKind, Span};
    ///
    /// let diag = Diagnostic::error(ErrorKind::Resolution, "substitution cycle", Span::DUMMY)
    ///     .with_note("while resolving ${a}");
    /// assert_eq!(diag.notes.len(), 1);
    /// ```
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_dummy() {
            write!(f, "{} ({}): {}", self.level, self.kind, self.message)?;
        } else {
            write!(
                f,
                "[{}] {} ({}): {}",
                self.span, self.level, self.kind, self.message
            )?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}

/// Accumulator for diagnostics reported across all processing phases.
///
/// Uses interior mutability so the lexer, parser, and resolver can share
/// one handler by plain reference.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
    panic_on_error: bool,
}

impl Handler {
    /// Creates a new, empty handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: false,
        }
    }

    /// Creates a handler that panics on the first error.
    ///
    /// Only useful in tests that assert a construct parses cleanly.
    pub fn new_panicking() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: true,
        }
    }

    /// Reports an error.
    pub fn error(&self, kind: ErrorKind, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(kind, message, span));
    }

    /// Reports a warning.
    pub fn warning(&self, kind: ErrorKind, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(kind, message, span));
    }

    /// Records a pre-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        if self.panic_on_error && diagnostic.level == Level::Error {
            panic!("diagnostic error: {}", diagnostic);
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Returns true if any error-level diagnostic has been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Snapshot of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Drops all recorded diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
