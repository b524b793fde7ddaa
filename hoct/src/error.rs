//! CLI error type and exit-code mapping.

use hocc_drv::ConfigError;
use thiserror::Error;

/// Everything that makes `hoct` exit non-zero.
#[derive(Debug, Error)]
pub enum HoctError {
    /// Fatal processing failure: unreadable source, failed required
    /// include.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The configuration parsed but contained errors.
    #[error("invalid configuration ({0} error(s))")]
    Invalid(usize),

    /// `--get` named a path that does not exist.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Logging setup failed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, HoctError>;
