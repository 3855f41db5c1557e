//! Integration tests for configured routes
//!
//! Tests verify that:
//! - A configuration file loads, validates and builds a working chain
//! - File scripts resolve against the configured base directory
//! - Script args reach the scripts that declare them
//! - Broken scripts surface as errors before any exchange runs

use gateway_pipeline::commands::{self, ExchangeSpec};
use gateway_pipeline::config::{self, GatewayConfig, RouteConfig, ScriptRef};
use gateway_pipeline::error::{GatewayError, ScriptError};
use gateway_pipeline::exchange::{Context, Request};
use gateway_pipeline::pipeline::Handler;
use gateway_pipeline::script::{RuntimeManager, ScriptRegistry, JS_MIME_TYPE};
use http::{Method, StatusCode};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

struct Workspace {
    base: TempDir,
    manager: Arc<RuntimeManager>,
    registry: ScriptRegistry,
}

impl Workspace {
    fn new() -> Self {
        let base = TempDir::new().unwrap();
        std::fs::create_dir_all(base.path().join("scripts").join("rhai")).unwrap();
        let manager = Arc::new(RuntimeManager::new());
        Self {
            base,
            registry: ScriptRegistry::with_runtime(manager.clone()),
            manager,
        }
    }

    fn write_script(&self, name: &str, source: &str) {
        let path = self.base.path().join("scripts").join("rhai").join(name);
        std::fs::write(path, source).unwrap();
    }

    fn write_config(&self, contents: &str) -> std::path::PathBuf {
        let path = self.base.path().join("gateway.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn config(&self, filters: Vec<ScriptRef>, handler: ScriptRef) -> GatewayConfig {
        GatewayConfig {
            base_dir: self.base.path().to_path_buf(),
            logging: Default::default(),
            route: RouteConfig { filters, handler },
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.manager.cleanup();
    }
}

#[test]
fn test_load_and_run_configured_route() {
    let workspace = Workspace::new();
    workspace.write_script(
        "auth.rhai",
        r#"
        if request.headers["authorization"] != `Bearer ${token}` {
            return http::response(http::UNAUTHORIZED, "denied");
        }
        next.handle()
        "#,
    );

    let path = workspace.write_config(&format!(
        r#"
base_dir = "{}"

[[route.filters]]
file = "auth.rhai"
args = {{ token = "${{CONFIG_ROUTE_TEST_TOKEN:-letmein}}" }}

[route.handler]
source = ["let who = request.uri;", "http::response(200, `hello ${{who}}`)"]
"#,
        workspace.base.path().display()
    ));

    let config = config::load_from_path(&path).unwrap();
    assert_eq!(config.route.filters[0].args["token"], json!("letmein"));

    let chain = config
        .route
        .build(&config.environment(), &workspace.registry)
        .unwrap();
    assert_eq!(chain.filter_count(), 1);

    let denied = chain
        .handle(&Context::new(), Request::new(Method::GET, "/world"))
        .unwrap();
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let allowed = chain
        .handle(
            &Context::new(),
            Request::new(Method::GET, "/world").with_header(
                http::header::AUTHORIZATION,
                http::HeaderValue::from_static("Bearer letmein"),
            ),
        )
        .unwrap();
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body, "hello /world");
}

#[test]
fn test_build_reports_broken_script() {
    let workspace = Workspace::new();
    let config = workspace.config(
        vec![ScriptRef::from_source("let = ;")],
        ScriptRef::from_source("http::response(200)"),
    );

    let err = config
        .route
        .build(&config.environment(), &workspace.registry)
        .unwrap_err();
    assert!(matches!(err, ScriptError::Load { .. }));
}

#[test]
fn test_build_reports_unsupported_type() {
    let workspace = Workspace::new();
    let mut handler = ScriptRef::from_source("1");
    handler.mime_type = JS_MIME_TYPE.to_string();
    let config = workspace.config(vec![], handler);

    let err = config
        .route
        .build(&config.environment(), &workspace.registry)
        .unwrap_err();
    assert!(matches!(err, ScriptError::UnsupportedType { .. }));
    assert!(!workspace.manager.is_runtime_initialized());
}

#[test]
fn test_check_command_compiles_every_script() {
    let workspace = Workspace::new();
    workspace.write_script("ok.rhai", "next.handle()");

    let good = workspace.config(
        vec![ScriptRef::from_file("ok.rhai")],
        ScriptRef::from_source("http::response(204)"),
    );
    let chain = commands::run_config_check(&good, &workspace.registry).unwrap();
    assert_eq!(chain.filter_count(), 1);

    let bad = workspace.config(
        vec![ScriptRef::from_file("missing.rhai")],
        ScriptRef::from_source("http::response(204)"),
    );
    let err = commands::run_config_check(&bad, &workspace.registry).unwrap_err();
    assert!(matches!(err, GatewayError::Config(_)));
}

#[test]
fn test_check_command_compiles_each_script_once() {
    let workspace = Workspace::new();
    let config = workspace.config(
        vec![
            ScriptRef::from_source("next.handle()"),
            ScriptRef::from_source("next.handle(request)"),
        ],
        ScriptRef::from_source("http::response(204)"),
    );

    let chain = commands::run_config_check(&config, &workspace.registry).unwrap();
    assert_eq!(chain.filter_count(), 2);

    let cache = workspace.manager.cache_dir().unwrap();
    let cached = std::fs::read_dir(cache.path()).unwrap().count();
    assert_eq!(cached, 3);

    let response = chain
        .handle(&Context::new(), Request::new(Method::GET, "/"))
        .unwrap();
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[test]
fn test_run_command_returns_short_circuit_response() {
    let workspace = Workspace::new();
    let config = workspace.config(
        vec![ScriptRef::from_source("next.handle(request)")],
        ScriptRef::from_source("throw `no handler for ${request.uri}`;"),
    );

    let spec = ExchangeSpec {
        method: "delete".to_string(),
        uri: "/items/1".to_string(),
        headers: vec!["x-request-id: 7".to_string()],
        body: None,
    };
    let response = commands::run_exchange(&config, &workspace.registry, &spec).unwrap();
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_run_command_passes_args() {
    let workspace = Workspace::new();
    let config = workspace.config(
        vec![],
        ScriptRef::from_source("http::response(200, `${request.method} ${greeting}`)")
            .with_arg("greeting", json!("hi")),
    );

    let spec = ExchangeSpec {
        method: "post".to_string(),
        uri: "/".to_string(),
        headers: vec![],
        body: Some("payload".to_string()),
    };
    let response = commands::run_exchange(&config, &workspace.registry, &spec).unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "POST hi");
}
