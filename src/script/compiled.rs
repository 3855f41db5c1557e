//! Rhai script provider and compiled scripts

use super::bindings::{Binding, Bindings};
use super::engine::RhaiRuntime;
use super::environment::Environment;
use super::provider::{CompiledScript, ScriptProvider};
use super::runtime::RuntimeManager;
use super::RHAI_MIME_TYPE;
use crate::error::{ScriptError, ScriptPanic};
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Dynamic, Scope, AST};
use serde_json::Value;
use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tempfile::TempPath;
use tracing::debug;

/// Loads Rhai scripts through a [`RuntimeManager`]
pub struct RhaiProvider {
    manager: Arc<RuntimeManager>,
}

impl RhaiProvider {
    pub fn new(manager: Arc<RuntimeManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<RuntimeManager> {
        &self.manager
    }
}

impl ScriptProvider for RhaiProvider {
    fn mime_type(&self) -> &str {
        RHAI_MIME_TYPE
    }

    fn load_file(
        &self,
        env: &dyn Environment,
        name: &str,
    ) -> Result<Arc<dyn CompiledScript>, ScriptError> {
        let runtime = self.manager.runtime(env)?;
        let ast = runtime.compile(name)?;
        debug!(script = name, "Loaded script");

        Ok(Arc::new(RhaiScript {
            runtime,
            ast,
            name: name.to_string(),
            _source_file: None,
        }))
    }

    fn load_source(
        &self,
        env: &dyn Environment,
        source: &str,
    ) -> Result<Arc<dyn CompiledScript>, ScriptError> {
        let runtime = self.manager.runtime(env)?;
        let cache_dir = self.manager.cache_dir()?;

        // The engine loads by name only, so inline source goes through a file.
        let mut file = tempfile::Builder::new()
            .prefix("script-")
            .suffix(".rhai")
            .tempfile_in(cache_dir.path())?;
        file.write_all(source.as_bytes())?;
        file.flush()?;
        let path = file.into_temp_path();

        let name = path.display().to_string();
        let mut ast = runtime.compile(&name)?;
        // Imports resolve against the script directory, not the cache file.
        ast.clear_source();
        debug!(script = %name, "Loaded inline script");

        Ok(Arc::new(RhaiScript {
            runtime,
            ast,
            name,
            _source_file: Some(path),
        }))
    }
}

/// A compiled Rhai script.
///
/// Scripts compiled from inline source own their cache file, which is removed
/// when the script is dropped.
pub struct RhaiScript {
    runtime: Arc<RhaiRuntime>,
    ast: AST,
    name: String,
    _source_file: Option<TempPath>,
}

impl CompiledScript for RhaiScript {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, bindings: Bindings) -> Result<Value, ScriptError> {
        let mut scope = Scope::new();
        for (name, binding) in bindings {
            let value = match binding {
                Binding::Value(value) => {
                    to_dynamic(value).map_err(|e| ScriptError::execution(&self.name, e))?
                }
                Binding::Handler(handler) => Dynamic::from(handler),
            };
            scope.push_dynamic(name, value);
        }

        let engine = self.runtime.engine();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
        }));

        match outcome {
            Ok(Ok(result)) => {
                from_dynamic::<Value>(&result).map_err(|e| ScriptError::execution(&self.name, e))
            }
            Ok(Err(e)) => Err(ScriptError::execution(&self.name, e)),
            Err(payload) => Err(ScriptError::execution(
                &self.name,
                ScriptPanic(panic_message(payload.as_ref())),
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
