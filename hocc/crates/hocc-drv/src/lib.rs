//! hocc-drv - Configuration driver.
//!
//! Orchestrates the processing pipeline and exposes the public
//! [`Config`] API:
//!
//! ```text
//! source text
//!      |
//!      v
//!  [hocc-lex]  -->  token stream
//!      |
//!      v
//!  [hocc-par]  -->  first-pass tree + assignment history
//!      |                (includes read through a SourceReader)
//!      v
//!  [hocc-res]  -->  resolved tree
//!      |                (environment read through an Environment)
//!      v
//!  [Config]    -->  typed accessors by dotted path
//! ```
//!
//! Diagnostics from all phases accumulate on one handler; the resulting
//! [`Config`] carries them along with a validity flag. Only an
//! unreadable primary source or a failed `required(...)` include aborts
//! with a [`ConfigError`].
//!
//! # Example
//!
//! ```
//! use hocc_drv::Config;
//!
//! let config = Config::parse_str("server { port = 8080, host = local }").unwrap();
//! assert!(config.is_valid());
//! assert_eq!(config.get_int("server.port").unwrap(), 8080);
//! assert!(config.exists("server.host"));
//! ```

pub mod readers;

pub use hocc_lex::{tokenize, Token, TokenKind};
pub use hocc_par::reader::{IncludeKind, MapReader, NullReader, SourceReader};
pub use hocc_par::{Object, Scalar, ScalarLit, Value};
pub use hocc_res::{Environment, MapEnv, ProcessEnv};
pub use hocc_util::{ConfigError, Diagnostic, ErrorKind, Handler, Level};
pub use readers::FsReader;

use std::path::Path;

use thiserror::Error;

use hocc_par::path::split_path;

/// Failures of the typed accessors.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("path not found: {0}")]
    NotFound(String),
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("wrong type at '{path}': expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: String,
    },
}

/// A fully processed configuration.
///
/// Holds the resolved tree, every diagnostic the pipeline reported, and
/// whether the configuration is valid (no error-level diagnostics).
#[derive(Clone, Debug)]
pub struct Config {
    root: Value,
    diagnostics: Vec<Diagnostic>,
    valid: bool,
}

impl Config {
    /// Processes a source string. Includes resolve relative to the
    /// working directory; the process environment backs `${...}`
    /// fallback.
    pub fn parse_str(source: &str) -> Result<Config, ConfigError> {
        process_source(source, &FsReader::current_dir(), &ProcessEnv)
    }

    /// Processes a source string with explicit collaborators.
    pub fn parse_str_with(
        source: &str,
        reader: &dyn SourceReader,
        env: &dyn Environment,
    ) -> Result<Config, ConfigError> {
        process_source(source, reader, env)
    }

    /// Loads and processes a file. Includes resolve relative to the
    /// file's directory.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::SourceRead {
            link: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        process_source(&text, &FsReader::new(base), &ProcessEnv)
    }

    /// The resolved root value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// False when any phase reported an error.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Everything the pipeline reported, warnings included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The debug string form of the resolved tree.
    pub fn render(&self) -> String {
        self.root.to_string()
    }

    /// Looks up a value by dotted path. Quoted segments keep literal
    /// dots: `a."b.c"` is two segments.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path).ok()?;
        self.root.lookup(&segments)
    }

    /// True if `path` names a value.
    pub fn exists(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// A new configuration rooted at `path`.
    pub fn get_subtree(&self, path: &str) -> Option<Config> {
        self.get(path).map(|value| Config {
            root: value.clone(),
            diagnostics: self.diagnostics.clone(),
            valid: self.valid,
        })
    }

    /// String accessor. Numbers, booleans, and null coerce to their
    /// surface form.
    pub fn get_string(&self, path: &str) -> Result<String, AccessError> {
        match self.get_checked(path)? {
            Value::Scalar(s) => Ok(scalar_string(s)),
            other => Err(self.wrong_type(path, "string", other)),
        }
    }

    /// Boolean accessor. Textual `true`/`yes`/`on` and
    /// `false`/`no`/`off` are accepted.
    pub fn get_bool(&self, path: &str) -> Result<bool, AccessError> {
        let value = self.get_checked(path)?;
        if let Value::Scalar(s) = value {
            match &s.lit {
                ScalarLit::Bool(b) => return Ok(*b),
                ScalarLit::Quoted(text) | ScalarLit::Unquoted(text) => {
                    match text.to_ascii_lowercase().as_str() {
                        "true" | "yes" | "on" => return Ok(true),
                        "false" | "no" | "off" => return Ok(false),
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Err(self.wrong_type(path, "boolean", value))
    }

    /// Integer accessor. Parses string surface forms; accepts doubles
    /// with no fractional part.
    pub fn get_int(&self, path: &str) -> Result<i64, AccessError> {
        let value = self.get_checked(path)?;
        if let Value::Scalar(s) = value {
            match &s.lit {
                ScalarLit::Int(i) => return Ok(*i),
                ScalarLit::Double(d) if d.fract() == 0.0 => return Ok(*d as i64),
                ScalarLit::Quoted(text) | ScalarLit::Unquoted(text) => {
                    if let Ok(i) = text.trim().parse::<i64>() {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        Err(self.wrong_type(path, "integer", value))
    }

    /// Double accessor. Parses string surface forms; integers widen.
    pub fn get_double(&self, path: &str) -> Result<f64, AccessError> {
        let value = self.get_checked(path)?;
        if let Value::Scalar(s) = value {
            match &s.lit {
                ScalarLit::Double(d) => return Ok(*d),
                ScalarLit::Int(i) => return Ok(*i as f64),
                ScalarLit::Quoted(text) | ScalarLit::Unquoted(text) => {
                    if let Ok(d) = text.trim().parse::<f64>() {
                        return Ok(d);
                    }
                }
                _ => {}
            }
        }
        Err(self.wrong_type(path, "double", value))
    }

    fn get_checked(&self, path: &str) -> Result<&Value, AccessError> {
        let segments = split_path(path).map_err(|e| AccessError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        self.root
            .lookup(&segments)
            .ok_or_else(|| AccessError::NotFound(path.to_string()))
    }

    fn wrong_type(&self, path: &str, expected: &'static str, found: &Value) -> AccessError {
        AccessError::WrongType {
            path: path.to_string(),
            expected,
            found: found.kind_name().to_string(),
        }
    }
}

fn scalar_string(scalar: &Scalar) -> String {
    match &scalar.lit {
        ScalarLit::Quoted(s) | ScalarLit::Unquoted(s) => s.clone(),
        ScalarLit::Int(i) => i.to_string(),
        ScalarLit::Double(d) => d.to_string(),
        ScalarLit::Bool(b) => b.to_string(),
        ScalarLit::Null => "null".to_string(),
    }
}

/// Runs the full pipeline over one source string.
pub fn process_source(
    source: &str,
    reader: &dyn SourceReader,
    env: &dyn Environment,
) -> Result<Config, ConfigError> {
    let handler = Handler::new();

    tracing::debug!(bytes = source.len(), "lexing source");
    let tokens = hocc_lex::tokenize(source, &handler);

    tracing::debug!(tokens = tokens.len(), "first pass");
    let output = hocc_par::parse(tokens, &handler, reader)?;

    tracing::debug!(assignments = output.stack.len(), "resolving substitutions");
    let mut root = output.root;
    hocc_res::resolve(&mut root, &output.stack, env, &handler);

    let valid = !handler.has_errors();
    if !valid {
        tracing::debug!(errors = handler.error_count(), "configuration invalid");
    }
    Ok(Config {
        root,
        diagnostics: handler.diagnostics(),
        valid,
    })
}
