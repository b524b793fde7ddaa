//! hocc-lex - Streaming lexer for the HOCON-style configuration language.
//!
//! The lexer turns source text into a finite token stream terminated by
//! [`TokenKind::Eof`]. Unlike a typical programming-language lexer it keeps
//! structural whitespace: horizontal whitespace and newlines are tokens,
//! because newlines terminate members and interior whitespace must survive
//! value concatenation (`a = 2 foo` is the string `"2 foo"`).
//!
//! Comments (`//` and `#`) are consumed and discarded. Substitution
//! references (`${path}`, `${?path}`) are single tokens carrying the raw
//! path text; the parser interprets them.
//!
//! The lexer is fail-soft: problems are reported to the shared
//! [`Handler`](hocc_util::Handler) and scanning resumes after a
//! one-character resync, so one bad escape does not hide later errors.
//!
//! # Example
//!
//! ```
//! use hocc_lex::{tokenize, TokenKind};
//! use hocc_util::Handler;
//!
//! let handler = Handler::new();
//! let tokens = tokenize("port = 8080", &handler);
//!
//! assert!(!handler.has_errors());
//! assert_eq!(tokens[0].kind, TokenKind::Unquoted);
//! assert_eq!(tokens[0].lexeme, "port");
//! assert!(matches!(tokens.last().unwrap().kind, TokenKind::Eof));
//! ```

pub mod chars;
pub mod cursor;
pub mod lexer;
pub mod token;

mod edge_cases;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};

use hocc_util::Handler;

/// Lexes an entire source string into a token stream.
///
/// The returned vector always ends with an [`TokenKind::Eof`] token, even
/// for empty input. Errors are reported through `handler`.
pub fn tokenize(source: &str, handler: &Handler) -> Vec<Token> {
    Lexer::new(source, handler).run()
}
