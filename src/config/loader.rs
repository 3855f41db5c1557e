use super::schema::{GatewayConfig, ScriptRef};
use crate::error::{ConfigError, Result};
use crate::pipeline::scriptable::RESERVED_BINDINGS;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use figment::Figment;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for environment overrides, e.g. `GATEWAY_LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "GATEWAY_";

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<GatewayConfig> {
    let path = path.as_ref();

    let figment = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Figment::new().merge(Toml::file(path)),
        Some("json") => Figment::new().merge(Json::file(path)),
        Some("yaml") | Some("yml") => Figment::new().merge(Yaml::file(path)),
        _ => {
            return Err(ConfigError::Parse(
                "Unsupported config file format. Use .toml, .json, .yaml, or .yml".into(),
            )
            .into())
        }
    };

    let config: GatewayConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    debug!(path = %path.display(), "Loaded configuration");

    validate(&config)?;
    apply_env_substitutions(config)
}

pub fn validate(config: &GatewayConfig) -> Result<()> {
    for (index, filter) in config.route.filters.iter().enumerate() {
        validate_script(&format!("Filter #{}", index + 1), filter)?;
    }
    validate_script("Handler", &config.route.handler)?;

    if config.base_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("Base directory must not be empty".into()).into());
    }

    Ok(())
}

fn validate_script(label: &str, script: &ScriptRef) -> Result<()> {
    match (&script.file, &script.source) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::Validation(format!(
                "{label} sets both 'file' and 'source'"
            ))
            .into())
        }
        (None, None) => {
            return Err(ConfigError::Validation(format!(
                "{label} must set either 'file' or 'source'"
            ))
            .into())
        }
        _ => {}
    }

    if script.mime_type.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{label} has an empty script type")).into());
    }

    if let Some(name) = RESERVED_BINDINGS
        .iter()
        .find(|name| script.args.contains_key(**name))
    {
        return Err(ConfigError::Validation(format!(
            "{label} uses reserved argument name '{name}'"
        ))
        .into());
    }

    Ok(())
}

fn apply_env_substitutions(mut config: GatewayConfig) -> Result<GatewayConfig> {
    if let Some(base_dir) = config.base_dir.to_str() {
        config.base_dir = PathBuf::from(substitute_env_vars(base_dir)?);
    }

    let route = &mut config.route;
    for script in route.filters.iter_mut().chain(std::iter::once(&mut route.handler)) {
        if let Some(file) = &mut script.file {
            *file = substitute_env_vars(file)?;
        }
        for value in script.args.values_mut() {
            substitute_in_value(value)?;
        }
    }

    Ok(config)
}

fn substitute_in_value(value: &mut Value) -> Result<()> {
    match value {
        Value::String(text) => *text = substitute_env_vars(text)?,
        Value::Array(items) => {
            for item in items {
                substitute_in_value(item)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute_in_value(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Expand `${VAR}` and `${VAR:-default}` references
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for cap in re.captures_iter(input) {
        let Some(whole) = cap.get(0) else { continue };
        let expr = &cap[1];
        let (name, default) = match expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };

        let value = match (std::env::var(name), default) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.to_string(),
            (Err(_), None) => {
                return Err(ConfigError::EnvVar(format!(
                    "Environment variable '{name}' not found"
                ))
                .into())
            }
        };

        result.push_str(&input[last..whole.start()]);
        result.push_str(&value);
        last = whole.end();
    }
    result.push_str(&input[last..]);

    Ok(result)
}
