//! Embedded scripting
//!
//! Operators can inject Rhai scripts into a pipeline as filters or handlers.
//!
//! # Architecture
//!
//! - **Providers**: each language is a [`ScriptProvider`] registered under its
//!   mime-type in a [`ScriptRegistry`]
//! - **Runtime**: the [`RuntimeManager`] builds the interpreter and the script
//!   cache directory once per process, on first use
//! - **Scripts**: a [`Script`] is an immutable compiled handle, shared freely
//!   across threads; every [`Script::run`] gets a fresh scope
//!
//! Only `application/x-rhai` is implemented. `text/javascript` is reserved and
//! always reported as unsupported.

pub mod bindings;
pub mod compiled;
pub mod engine;
pub mod environment;
pub mod provider;
pub mod runtime;

pub use bindings::{Binding, Bindings, HandlerBinding};
pub use compiled::{RhaiProvider, RhaiScript};
pub use engine::RhaiRuntime;
pub use environment::{DefaultEnvironment, Environment};
pub use provider::{CompiledScript, ScriptProvider, ScriptRegistry};
pub use runtime::{CacheDir, RuntimeManager};

use crate::error::ScriptError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The mime-type for Rhai scripts
pub const RHAI_MIME_TYPE: &str = "application/x-rhai";

/// The mime-type for JavaScript scripts (not implemented)
pub const JS_MIME_TYPE: &str = "text/javascript";

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// A compiled script
#[derive(Clone)]
pub struct Script {
    mime_type: String,
    compiled: Arc<dyn CompiledScript>,
}

impl Script {
    pub(crate) fn new(mime_type: &str, compiled: Arc<dyn CompiledScript>) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            compiled,
        }
    }

    /// Load a script by file name through the process-wide registry
    pub fn from_file(
        env: &dyn Environment,
        mime_type: &str,
        file: &str,
    ) -> Result<Self, ScriptError> {
        ScriptRegistry::global().load_file(env, mime_type, file)
    }

    /// Load a script from source text through the process-wide registry
    pub fn from_source(
        env: &dyn Environment,
        mime_type: &str,
        source: &str,
    ) -> Result<Self, ScriptError> {
        ScriptRegistry::global().load_source(env, mime_type, source)
    }

    /// Load a script whose source is given line by line
    pub fn from_source_lines<S: AsRef<str>>(
        env: &dyn Environment,
        mime_type: &str,
        lines: &[S],
    ) -> Result<Self, ScriptError> {
        Self::from_source(env, mime_type, &join_source_lines(lines))
    }

    /// Run this script with the given variable bindings
    pub fn run(&self, bindings: Bindings) -> Result<Value, ScriptError> {
        self.compiled.run(bindings)
    }

    pub fn name(&self) -> &str {
        self.compiled.name()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("name", &self.name())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Join source lines with the platform line separator
pub fn join_source_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}
