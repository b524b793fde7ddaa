//! Fatal processing errors.
//!
//! Everything here aborts a run outright, in contrast to the accumulated
//! diagnostics in [`crate::diagnostic`]. A failed `required(...)` include
//! and an unreadable primary source are the two fatal cases the format
//! defines.

use thiserror::Error;

/// Errors that abort configuration processing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The primary source could not be read.
    #[error("failed to read source `{link}`: {reason}")]
    SourceRead { link: String, reason: String },

    /// A `required(...)` include could not be read.
    #[error("required include `{link}` failed: {reason}")]
    RequiredInclude { link: String, reason: String },

    /// Include nesting exceeded the recursion limit.
    #[error("include depth limit exceeded while reading `{link}`")]
    IncludeDepth { link: String },
}
