use crate::config::GatewayConfig;
use crate::error::{GatewayError, MessageError, Result};
use crate::exchange::{Context, Request, Response};
use crate::pipeline::{Chain, Handler};
use crate::script::ScriptRegistry;
use http::header::{HeaderName, HeaderValue};
use http::Method;
use tracing::{error, info};

/// One request described on the command line
#[derive(Debug, Clone)]
pub struct ExchangeSpec {
    pub method: String,
    pub uri: String,
    /// `name: value` pairs
    pub headers: Vec<String>,
    pub body: Option<String>,
}

impl ExchangeSpec {
    pub fn to_request(&self) -> Result<Request> {
        let method = Method::from_bytes(self.method.to_uppercase().as_bytes())
            .map_err(|_| MessageError::InvalidMethod(self.method.clone()))?;

        let mut request = Request::new(method, &self.uri);
        for header in &self.headers {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| MessageError::InvalidHeader(header.clone()))?;
            let name = HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|_| MessageError::InvalidHeader(name.to_string()))?;
            let value = HeaderValue::from_str(value.trim())
                .map_err(|_| MessageError::InvalidHeader(name.to_string()))?;
            request = request.with_header(name, value);
        }
        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }
        Ok(request)
    }
}

/// Compile every script the configuration references, once each
pub fn run_config_check(config: &GatewayConfig, registry: &ScriptRegistry) -> Result<Chain> {
    info!("Checking configuration...");
    crate::config::validate(config)?;
    info!("Configuration is valid");

    let env = config.environment();
    let mut all_ok = true;
    let mut filters = Vec::with_capacity(config.route.filters.len());
    for (index, filter) in config.route.filters.iter().enumerate() {
        match filter.load(&env, registry) {
            Ok(script) => {
                info!("  Filter #{}: {} compiled", index + 1, script.name());
                filters.push(script);
            }
            Err(e) => {
                error!("  Filter #{} ({}): {}", index + 1, filter.describe(), e);
                all_ok = false;
            }
        }
    }
    let handler = match config.route.handler.load(&env, registry) {
        Ok(script) => {
            info!("  Handler: {} compiled", script.name());
            Some(script)
        }
        Err(e) => {
            error!("  Handler ({}): {}", config.route.handler.describe(), e);
            None
        }
    };

    let (true, Some(handler)) = (all_ok, handler) else {
        return Err(GatewayError::Config(crate::error::ConfigError::Validation(
            "One or more scripts failed to compile".to_string(),
        )));
    };

    let chain = config.route.compose(filters, handler);
    info!("All checks passed ({} filters)", chain.filter_count());
    Ok(chain)
}

/// Push one request through the configured route.
///
/// A short-circuit is not a failure here: its response is what the caller
/// would have received.
pub fn run_exchange(
    config: &GatewayConfig,
    registry: &ScriptRegistry,
    spec: &ExchangeSpec,
) -> Result<Response> {
    let env = config.environment();
    let chain = config.route.build(&env, registry)?;
    let request = spec.to_request()?;
    let context = Context::new();

    info!(context = %context.id(), method = %request.method, uri = %request.uri, "Running exchange");
    let response = match chain.handle(&context, request) {
        Ok(response) => response,
        Err(exception) => {
            info!(status = %exception.status(), "Exchange short-circuited");
            exception.into_response()
        }
    };
    Ok(response)
}

/// Render a response the way an HTTP/1.1 status line and headers read
pub fn format_response(response: &Response) -> String {
    let mut out = format!(
        "{} {}\n",
        response.status.as_u16(),
        response.status.canonical_reason().unwrap_or("")
    );
    for (name, value) in &response.headers {
        out.push_str(&format!(
            "{}: {}\n",
            name,
            value.to_str().unwrap_or("<binary>")
        ));
    }
    out.push('\n');
    out.push_str(&response.body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn spec(method: &str, headers: &[&str]) -> ExchangeSpec {
        ExchangeSpec {
            method: method.to_string(),
            uri: "/orders/7".to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            body: Some("{}".to_string()),
        }
    }

    #[test]
    fn test_to_request() {
        let request = spec("post", &["x-user: alice", "accept:text/plain"])
            .to_request()
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.uri, "/orders/7");
        assert_eq!(request.header("x-user"), Some("alice"));
        assert_eq!(request.header("accept"), Some("text/plain"));
        assert_eq!(request.body, "{}");
    }

    #[test]
    fn test_header_without_colon_is_rejected() {
        let err = spec("GET", &["broken"]).to_request().unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Message(MessageError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_format_response() {
        let response = Response::new(StatusCode::NOT_FOUND)
            .with_header(
                HeaderName::from_static("content-type"),
                HeaderValue::from_static("text/plain"),
            )
            .with_body("gone");

        assert_eq!(
            format_response(&response),
            "404 Not Found\ncontent-type: text/plain\n\ngone"
        );
    }
}
