use crate::script::environment::default_base_dir;
use crate::script::{join_source_lines, RHAI_MIME_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Root of the per-language script directories
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub route: RouteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// An ordered list of filter scripts in front of a handler script
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    #[serde(default)]
    pub filters: Vec<ScriptRef>,
    pub handler: ScriptRef,
}

/// Where a script comes from, plus the extra bindings it runs with.
///
/// Exactly one of `file` and `source` must be set. Files are resolved against
/// the script directory of the script's language.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptRef {
    #[serde(rename = "type", default = "default_mime_type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ScriptSource>,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ScriptRef {
    pub fn from_file(file: impl Into<String>) -> Self {
        Self {
            mime_type: default_mime_type(),
            file: Some(file.into()),
            source: None,
            args: Map::new(),
        }
    }

    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            mime_type: default_mime_type(),
            file: None,
            source: Some(ScriptSource::Text(source.into())),
            args: Map::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    /// Short label for log lines and validation messages
    pub fn describe(&self) -> String {
        match (&self.file, &self.source) {
            (Some(file), _) => format!("file '{file}'"),
            (None, Some(_)) => "inline source".to_string(),
            (None, None) => "empty script reference".to_string(),
        }
    }
}

/// Inline source, either as one string or as a list of lines
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScriptSource {
    Text(String),
    Lines(Vec<String>),
}

impl ScriptSource {
    pub fn to_source(&self) -> String {
        match self {
            ScriptSource::Text(text) => text.clone(),
            ScriptSource::Lines(lines) => join_source_lines(lines),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mime_type() -> String {
    RHAI_MIME_TYPE.to_string()
}
