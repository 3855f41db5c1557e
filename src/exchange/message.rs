//! Request and response messages
//!
//! Both messages can be rendered to and rebuilt from a JSON object of the form
//! `{ method?, uri?, status?, headers, body }`, which is how they are handed to
//! scripts. A header with one value maps to a string, a repeated header to an
//! array of its values in order. Values that are not UTF-8 map to
//! `{ "bytes": [..] }`, so the conversion is lossless.

use crate::error::MessageError;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use serde_json::{Map, Value};

/// An inbound HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// The response produced for exactly one request
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header, if it is valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "method".to_string(),
            Value::String(self.method.as_str().to_string()),
        );
        object.insert("uri".to_string(), Value::String(self.uri.clone()));
        object.insert("headers".to_string(), headers_to_json(&self.headers));
        object.insert("body".to_string(), Value::String(self.body.clone()));
        Value::Object(object)
    }

    /// Overwrite the fields present in `value`, leaving the others untouched
    pub fn apply_json(&mut self, value: &Value) -> Result<(), MessageError> {
        let object = value.as_object().ok_or(MessageError::NotAnObject)?;

        if let Some(method) = object.get("method") {
            let method = method
                .as_str()
                .ok_or_else(|| MessageError::InvalidMethod(method.to_string()))?;
            self.method = Method::from_bytes(method.as_bytes())
                .map_err(|_| MessageError::InvalidMethod(method.to_string()))?;
        }
        if let Some(uri) = object.get("uri").and_then(Value::as_str) {
            self.uri = uri.to_string();
        }
        if let Some(headers) = object.get("headers") {
            self.headers = headers_from_json(headers)?;
        }
        if let Some(body) = object.get("body") {
            self.body = body_from_json(body);
        }
        Ok(())
    }
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "status".to_string(),
            Value::from(self.status.as_u16()),
        );
        object.insert("headers".to_string(), headers_to_json(&self.headers));
        object.insert("body".to_string(), Value::String(self.body.clone()));
        Value::Object(object)
    }

    /// Build a response from `{ status, headers?, body? }`
    pub fn from_json(value: &Value) -> Result<Self, MessageError> {
        let object = value.as_object().ok_or(MessageError::NotAnObject)?;

        let status = object
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .and_then(|s| StatusCode::from_u16(s).ok())
            .ok_or(MessageError::InvalidStatus)?;

        let headers = match object.get("headers") {
            Some(headers) => headers_from_json(headers)?,
            None => HeaderMap::new(),
        };
        let body = object.get("body").map(body_from_json).unwrap_or_default();

        Ok(Self {
            status,
            headers,
            body,
        })
    }
}

/// Single values become strings, repeated values become arrays in order
fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut object = Map::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers.get_all(name).iter().map(header_to_json).collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        object.insert(name.as_str().to_string(), value);
    }
    Value::Object(object)
}

/// Values that are not UTF-8 are carried as `{ "bytes": [..] }`
fn header_to_json(value: &HeaderValue) -> Value {
    match std::str::from_utf8(value.as_bytes()) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => {
            let mut object = Map::new();
            object.insert(
                "bytes".to_string(),
                value.as_bytes().iter().map(|b| Value::from(*b)).collect(),
            );
            Value::Object(object)
        }
    }
}

fn headers_from_json(value: &Value) -> Result<HeaderMap, MessageError> {
    let mut headers = HeaderMap::new();
    let object = match value {
        Value::Null => return Ok(headers),
        Value::Object(object) => object,
        _ => return Err(MessageError::InvalidHeader(value.to_string())),
    };

    for (name, value) in object {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| MessageError::InvalidHeader(name.clone()))?;
        let values = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for value in values {
            let header_value = header_from_json(value)
                .ok_or_else(|| MessageError::InvalidHeader(name.clone()))?;
            headers.append(header_name.clone(), header_value);
        }
    }
    Ok(headers)
}

fn header_from_json(value: &Value) -> Option<HeaderValue> {
    match value {
        Value::String(text) => HeaderValue::from_str(text).ok(),
        Value::Object(object) => {
            let bytes = object
                .get("bytes")?
                .as_array()?
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()?;
            HeaderValue::from_bytes(&bytes).ok()
        }
        other => HeaderValue::from_str(&other.to_string()).ok(),
    }
}

fn body_from_json(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
