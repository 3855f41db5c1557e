//! Per-run variable bindings
//!
//! A [`Bindings`] set is built fresh for every script run and consumed by it.
//! Nothing in it outlives the run.

use crate::error::BoxError;
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::sync::Arc;

type HandlerCallback = dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync;

/// A native callable a script may invoke, e.g. the remainder of a filter chain
#[derive(Clone)]
pub struct HandlerBinding {
    callback: Arc<HandlerCallback>,
}

impl HandlerBinding {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn call(&self, argument: Value) -> Result<Value, BoxError> {
        (self.callback)(argument)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerBinding")
    }
}

/// A single bound variable
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Handler(HandlerBinding),
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Binding::Value(value)
    }
}

impl From<HandlerBinding> for Binding {
    fn from(handler: HandlerBinding) -> Self {
        Binding::Handler(handler)
    }
}

/// Variable name to value mapping supplied to [`Script::run`](super::Script::run)
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: BTreeMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding of the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Binding>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Bindings {
    type Item = (String, Binding);
    type IntoIter = btree_map::IntoIter<String, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_replaces() {
        let bindings = Bindings::new().with("x", json!(1)).with("x", json!(2));

        assert_eq!(bindings.len(), 1);
        assert!(matches!(bindings.get("x"), Some(Binding::Value(v)) if *v == json!(2)));
    }

    #[test]
    fn test_handler_binding_call() {
        let double = HandlerBinding::new(|value| {
            let n = value.as_i64().ok_or("expected an integer")?;
            Ok(json!(n * 2))
        });

        assert_eq!(double.call(json!(21)).unwrap(), json!(42));
        assert!(double.call(json!("x")).is_err());
    }

    #[test]
    fn test_from_iterator() {
        let bindings: Bindings = vec![("a", json!(1)), ("b", json!(2))].into_iter().collect();
        assert!(bindings.contains("a"));
        assert!(bindings.contains("b"));
    }
}
