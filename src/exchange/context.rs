use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Request-scoped correlation state.
///
/// Cloning is cheap. Filters that need to hand a different context downstream
/// derive a [`Context::child`] instead of mutating the one they were given.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Debug, Clone)]
struct Inner {
    id: String,
    parent: Option<Context>,
    attributes: BTreeMap<String, Value>,
}

impl Context {
    /// Create a root context with a fresh identifier
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Create a root context with the given identifier
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: id.into(),
                parent: None,
                attributes: BTreeMap::new(),
            }),
        }
    }

    /// Derive a context whose parent is `self`
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4().to_string(),
                parent: Some(self.clone()),
                attributes: BTreeMap::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// Set an attribute on this context (not on its parents)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.inner)
            .attributes
            .insert(name.into(), value.into());
        self
    }

    /// Look up an attribute, walking up through parent contexts
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        let mut current = Some(self);
        while let Some(context) = current {
            if let Some(value) = context.inner.attributes.get(name) {
                return Some(value);
            }
            current = context.parent();
        }
        None
    }

    /// All visible attributes, with children shadowing their parents
    pub fn attributes(&self) -> BTreeMap<String, Value> {
        let mut lineage = Vec::new();
        let mut current = Some(self);
        while let Some(context) = current {
            lineage.push(context);
            current = context.parent();
        }

        let mut merged = BTreeMap::new();
        for context in lineage.into_iter().rev() {
            for (name, value) in &context.inner.attributes {
                merged.insert(name.clone(), value.clone());
            }
        }
        merged
    }

    /// JSON view handed to scripts
    pub fn to_json(&self) -> Value {
        let attributes: Map<String, Value> = self.attributes().into_iter().collect();
        let mut object = Map::new();
        object.insert("id".to_string(), Value::String(self.id().to_string()));
        if let Some(parent) = self.parent() {
            object.insert(
                "parentId".to_string(),
                Value::String(parent.id().to_string()),
            );
        }
        object.insert("attributes".to_string(), Value::Object(attributes));
        Value::Object(object)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
