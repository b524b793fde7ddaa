//! hoct - CLI front-end for the hocc configuration processor.
//!
//! Processes one configuration file through the full pipeline (lex,
//! parse with includes, resolve substitutions) and prints the resolved
//! tree in its debug string form, or a single value with `--get`.
//!
//! Exit codes: 0 on success, 1 on any parse, include, or resolution
//! failure, 2 on command-line usage errors (from clap).

mod error;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use error::{HoctError, Result};
use hocc_drv::{Config, Level};

/// Process a configuration file and print the resolved tree.
#[derive(Parser, Debug)]
#[command(name = "hoct")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve a configuration file", long_about = None)]
struct Cli {
    /// The configuration file to process
    file: PathBuf,

    /// Print only the value at this dotted path
    #[arg(short, long)]
    get: Option<String>,

    /// Dump the token stream instead of resolving
    #[arg(long)]
    tokens: bool,

    /// Validate only; print nothing on success
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long, env = "HOCT_VERBOSE")]
    verbose: bool,

    /// Disable color output
    #[arg(long, env = "HOCT_NO_COLOR")]
    no_color: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.no_color)?;

    if cli.tokens {
        return dump_tokens(&cli);
    }

    tracing::debug!(file = %cli.file.display(), "processing configuration");
    let config = Config::load_file(&cli.file)?;

    for diagnostic in config.diagnostics() {
        eprintln!("{}", diagnostic);
    }
    if !config.is_valid() {
        let errors = config
            .diagnostics()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count();
        return Err(HoctError::Invalid(errors));
    }

    if let Some(path) = &cli.get {
        match config.get(path) {
            Some(value) => println!("{}", value),
            None => return Err(HoctError::PathNotFound(path.clone())),
        }
    } else if !cli.quiet {
        println!("{}", config.render());
    }
    Ok(())
}

/// Lexes the file and prints one token per line.
fn dump_tokens(cli: &Cli) -> Result<()> {
    let text = std::fs::read_to_string(&cli.file).map_err(|e| {
        HoctError::Config(hocc_drv::ConfigError::SourceRead {
            link: cli.file.display().to_string(),
            reason: e.to_string(),
        })
    })?;

    let handler = hocc_drv::Handler::new();
    let tokens = hocc_drv::tokenize(&text, &handler);
    for token in &tokens {
        println!("{:>5}  {}", token.span.line, token.describe());
    }
    for diagnostic in handler.diagnostics() {
        eprintln!("{}", diagnostic);
    }
    if handler.has_errors() {
        return Err(HoctError::Invalid(handler.error_count()));
    }
    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let layer = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| HoctError::Logging(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_file() {
        let cli = Cli::parse_from(["hoct", "app.conf"]);
        assert_eq!(cli.file, PathBuf::from("app.conf"));
        assert!(cli.get.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_parse_get() {
        let cli = Cli::parse_from(["hoct", "app.conf", "--get", "server.port"]);
        assert_eq!(cli.get.as_deref(), Some("server.port"));
    }

    #[test]
    fn test_cli_parse_quiet() {
        let cli = Cli::parse_from(["hoct", "app.conf", "--quiet"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["hoct", "--verbose", "app.conf"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_requires_file() {
        assert!(Cli::try_parse_from(["hoct"]).is_err());
    }
}
