//! Gateway configuration
//!
//! A configuration file names the base directory for scripts, the logging
//! setup and one route: filter scripts in order, then a handler script.
//!
//! ```toml
//! base_dir = "/srv/gateway"
//!
//! [[route.filters]]
//! file = "auth.rhai"
//! args = { realm = "${REALM:-internal}" }
//!
//! [route.handler]
//! source = "http::response(200, `hello`)"
//! ```

pub mod loader;
pub mod route;
pub mod schema;

pub use loader::{load_from_path, validate, ENV_PREFIX};
pub use schema::{GatewayConfig, LoggingConfig, RouteConfig, ScriptRef, ScriptSource};
