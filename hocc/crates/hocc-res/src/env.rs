//! Environment variable access.
//!
//! Substitution resolution falls back to the process environment when a
//! path is found neither on the history stack nor under an include
//! prefix. The trait keeps that dependency injectable; tests use
//! [`MapEnv`] instead of mutating real process state.

use rustc_hash::FxHashMap;

/// Read-only access to environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed in-memory environment for tests.
#[derive(Default)]
pub struct MapEnv {
    vars: FxHashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
