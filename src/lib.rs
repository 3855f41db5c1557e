pub mod commands;
pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod pipeline;
pub mod script;

pub use error::{GatewayError, Result, ScriptError};
pub use exchange::{Context, HandlerResult, Request, Response, ResponseException};
pub use pipeline::{Chain, Filter, Handler, Next};
pub use script::{Script, RHAI_MIME_TYPE};
