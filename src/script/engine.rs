//! Rhai runtime construction
//!
//! Builds the engine shared by every compiled Rhai script: the module search
//! path, default `http` bindings, the `next` handler type, log routing and the
//! bootstrap extensions.

use super::bindings::HandlerBinding;
use super::environment::Environment;
use crate::error::ScriptError;
use rhai::module_resolvers::FileModuleResolver;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Map, Module, Scope, AST, INT};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Language name used to locate the script directory
pub const RHAI_LANGUAGE: &str = "rhai";

const BOOTSTRAP_SCRIPT: &str = include_str!("../../scripts/rhai/bootstrap.rhai");

const STATUS_CONSTANTS: &[(&str, INT)] = &[
    ("OK", 200),
    ("CREATED", 201),
    ("NO_CONTENT", 204),
    ("MOVED_PERMANENTLY", 301),
    ("FOUND", 302),
    ("BAD_REQUEST", 400),
    ("UNAUTHORIZED", 401),
    ("FORBIDDEN", 403),
    ("NOT_FOUND", 404),
    ("TOO_MANY_REQUESTS", 429),
    ("INTERNAL_SERVER_ERROR", 500),
    ("BAD_GATEWAY", 502),
    ("SERVICE_UNAVAILABLE", 503),
];

/// A fully bootstrapped Rhai engine plus its script search path
pub struct RhaiRuntime {
    engine: Engine,
    script_dir: PathBuf,
}

impl RhaiRuntime {
    pub(crate) fn bootstrap(env: &dyn Environment) -> Result<Self, ScriptError> {
        let script_dir = env.script_directory(RHAI_LANGUAGE);

        let mut engine = Engine::new();
        engine.set_module_resolver(FileModuleResolver::new_with_path(&script_dir));
        engine.on_print(|text| info!(target: "gateway_pipeline::script", "{text}"));
        engine.on_debug(|text, source, position| {
            debug!(
                target: "gateway_pipeline::script",
                source = source.unwrap_or("<inline>"),
                position = %position,
                "{text}"
            )
        });

        engine
            .register_type_with_name::<HandlerBinding>("Handler")
            .register_fn(
                "handle",
                |handler: &mut HandlerBinding, request: Dynamic| call_handler(handler, &request),
            )
            .register_fn("handle", |handler: &mut HandlerBinding| {
                call_handler(handler, &Dynamic::UNIT)
            });
        engine.register_static_module("http", http_module().into());

        let bootstrap = engine
            .compile(BOOTSTRAP_SCRIPT)
            .map_err(|e| ScriptError::Bootstrap { source: e.into() })?;
        let extensions = Module::eval_ast_as_new(Scope::new(), &bootstrap, &engine)
            .map_err(|e| ScriptError::Bootstrap { source: e.into() })?;
        engine.register_global_module(extensions.into());

        Ok(Self { engine, script_dir })
    }

    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Relative names are looked up in the script directory
    pub(crate) fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.script_dir.join(path)
        }
    }

    /// Compile the named script now, so syntax errors surface at load time
    pub(crate) fn compile(&self, name: &str) -> Result<AST, ScriptError> {
        let path = self.resolve(name);
        debug!(script = name, path = %path.display(), "Compiling script");

        self.engine
            .compile_file(path)
            .map_err(|e| ScriptError::Load {
                name: name.to_string(),
                source: e.into(),
            })
    }
}

fn call_handler(handler: &HandlerBinding, argument: &Dynamic) -> Result<Dynamic, Box<EvalAltResult>> {
    let argument: Value = rhai::serde::from_dynamic(argument)?;
    let result = handler
        .call(argument)
        .map_err(|e| -> Box<EvalAltResult> { e.to_string().into() })?;
    rhai::serde::to_dynamic(result)
}

fn http_module() -> Module {
    let mut module = Module::new();
    for (name, status) in STATUS_CONSTANTS {
        module.set_var(*name, *status);
    }
    module.set_native_fn("response", status_response);
    module.set_native_fn("response", body_response);
    module
}

fn status_response(status: INT) -> Result<Map, Box<EvalAltResult>> {
    Ok(response_map(status, ""))
}

fn body_response(status: INT, body: ImmutableString) -> Result<Map, Box<EvalAltResult>> {
    Ok(response_map(status, body.as_str()))
}

fn response_map(status: INT, body: &str) -> Map {
    let mut map = Map::new();
    map.insert("status".into(), Dynamic::from(status));
    map.insert("headers".into(), Dynamic::from(Map::new()));
    map.insert("body".into(), Dynamic::from(body.to_string()));
    map
}
