use std::io;
use thiserror::Error;

/// Boxed cause carried by script and pipeline failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Environment variable error: {0}")]
    EnvVar(String),
}

/// Failures surfaced by the script API.
///
/// Load-time and run-time failures are kept apart, but every interpreter
/// fault during a run collapses into [`ScriptError::Execution`].
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Invalid script mime-type '{requested}': only {supported} is supported")]
    UnsupportedType { requested: String, supported: String },

    #[error("Failed to load script '{name}': {source}")]
    Load {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Script cache I/O error: {0}")]
    Cache(#[from] io::Error),

    #[error("Failed to bootstrap script runtime: {source}")]
    Bootstrap {
        #[source]
        source: BoxError,
    },

    #[error("Script '{script}' failed: {source}")]
    Execution {
        script: String,
        #[source]
        source: BoxError,
    },

    #[error("Script '{script}' returned an invalid result: {reason}")]
    InvalidResult { script: String, reason: String },
}

impl ScriptError {
    pub(crate) fn execution(script: &str, source: impl Into<BoxError>) -> Self {
        ScriptError::Execution {
            script: script.to_string(),
            source: source.into(),
        }
    }
}

/// Raised when a request or response cannot be rebuilt from its JSON form.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Expected an object describing the message")]
    NotAnObject,

    #[error("Missing or invalid status code")]
    InvalidStatus,

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header '{0}'")]
    InvalidHeader(String),
}

/// Errors a script sees when it calls back into the pipeline.
#[derive(Error, Debug)]
pub enum BindingError {
    #[error("next handler has already been invoked")]
    AlreadyInvoked,

    #[error("downstream short-circuited with status {status}")]
    ShortCircuited { status: u16 },

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] MessageError),
}

/// A panic caught while a script was running.
#[derive(Error, Debug)]
#[error("script panicked: {0}")]
pub struct ScriptPanic(pub String);

pub type Result<T> = std::result::Result<T, GatewayError>;
