//! hocc-util - Shared foundation types for the hocc configuration processor.
//!
//! This crate provides the pieces every processing phase needs:
//!
//! - [`Span`] - source locations carried on tokens and diagnostics
//! - [`diagnostic`] - the accumulating diagnostic handler shared by the
//!   lexer, parser, and resolver, so a single run can surface every
//!   problem in a source file instead of stopping at the first
//! - [`ConfigError`] - the fatal errors that abort processing outright
//!   (unreadable primary source, failed `required(...)` include)
//!
//! Fast hash collections from `rustc-hash` are re-exported here so the
//! phase crates agree on hasher choice.

pub mod diagnostic;
pub mod error;
pub mod span;

pub use diagnostic::{Diagnostic, ErrorKind, Handler, Level};
pub use error::ConfigError;
pub use span::Span;

// Re-export commonly used collections
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
