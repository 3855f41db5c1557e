//! Script providers and the mime-type registry
//!
//! Each scripting language is a [`ScriptProvider`] registered under its
//! mime-type. Adding a language means registering another provider.

use super::bindings::Bindings;
use super::environment::Environment;
use super::compiled::RhaiProvider;
use super::runtime::RuntimeManager;
use super::Script;
use crate::error::ScriptError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A compiled, reusable unit of script logic
pub trait CompiledScript: Send + Sync {
    /// Name the script was loaded under, used in diagnostics
    fn name(&self) -> &str;

    /// Execute against a fresh scope built only from `bindings`
    fn run(&self, bindings: Bindings) -> Result<Value, ScriptError>;
}

/// Compiles scripts of one language
pub trait ScriptProvider: Send + Sync {
    fn mime_type(&self) -> &str;

    /// Resolve `name` against the environment and compile it immediately
    fn load_file(
        &self,
        env: &dyn Environment,
        name: &str,
    ) -> Result<Arc<dyn CompiledScript>, ScriptError>;

    /// Compile inline source text
    fn load_source(
        &self,
        env: &dyn Environment,
        source: &str,
    ) -> Result<Arc<dyn CompiledScript>, ScriptError>;
}

/// Providers keyed by mime-type
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    providers: BTreeMap<String, Arc<dyn ScriptProvider>>,
}

impl ScriptRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Rhai provider bound to `manager`
    pub fn with_runtime(manager: Arc<RuntimeManager>) -> Self {
        Self::new().with_provider(Arc::new(RhaiProvider::new(manager)))
    }

    /// Process-wide registry used by [`Script::from_file`] and friends
    pub fn global() -> &'static ScriptRegistry {
        static GLOBAL: OnceLock<ScriptRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| ScriptRegistry::with_runtime(RuntimeManager::global()))
    }

    pub fn with_provider(mut self, provider: Arc<dyn ScriptProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn ScriptProvider>) {
        debug!(mime_type = provider.mime_type(), "Registered script provider");
        self.providers
            .insert(provider.mime_type().to_string(), provider);
    }

    pub fn supported_mime_types(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Look up the provider for `mime_type` without touching any runtime
    pub fn provider(&self, mime_type: &str) -> Result<&Arc<dyn ScriptProvider>, ScriptError> {
        self.providers
            .get(mime_type)
            .ok_or_else(|| ScriptError::UnsupportedType {
                requested: mime_type.to_string(),
                supported: self
                    .supported_mime_types()
                    .map(|m| format!("'{m}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn load_file(
        &self,
        env: &dyn Environment,
        mime_type: &str,
        name: &str,
    ) -> Result<Script, ScriptError> {
        let provider = self.provider(mime_type)?;
        let compiled = provider.load_file(env, name)?;
        Ok(Script::new(mime_type, compiled))
    }

    pub fn load_source(
        &self,
        env: &dyn Environment,
        mime_type: &str,
        source: &str,
    ) -> Result<Script, ScriptError> {
        let provider = self.provider(mime_type)?;
        let compiled = provider.load_source(env, source)?;
        Ok(Script::new(mime_type, compiled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{JS_MIME_TYPE, RHAI_MIME_TYPE};

    #[test]
    fn test_unsupported_type_names_supported_types() {
        let registry = ScriptRegistry::with_runtime(Arc::new(RuntimeManager::new()));

        let err = registry.provider(JS_MIME_TYPE).err().unwrap();
        match &err {
            ScriptError::UnsupportedType {
                requested,
                supported,
            } => {
                assert_eq!(requested, JS_MIME_TYPE);
                assert_eq!(supported, &format!("'{RHAI_MIME_TYPE}'"));
            }
            other => panic!("Expected UnsupportedType, got {other:?}"),
        }
        assert!(err.to_string().contains(RHAI_MIME_TYPE));
    }

    #[test]
    fn test_empty_registry_supports_nothing() {
        let registry = ScriptRegistry::new();
        assert_eq!(registry.supported_mime_types().count(), 0);
        assert!(registry.provider(RHAI_MIME_TYPE).is_err());
    }
}
