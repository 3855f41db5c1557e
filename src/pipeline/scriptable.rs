//! Script-backed filters and handlers
//!
//! Scripts see the exchange as plain data: `context` (`{ id, parentId?,
//! attributes }`), `request` (`{ method, uri, headers, body }`) and any
//! configured `args`. A response is a map `{ status, headers?, body? }`.
//!
//! Filter scripts additionally get `next`. Calling `next.handle(request)`
//! delegates to the rest of the chain and returns the downstream response;
//! returning `()` passes the exchange through.

use super::filter::{Filter, Next};
use super::handler::Handler;
use crate::error::{BindingError, ScriptError};
use crate::exchange::{Context, HandlerResult, Request, Response, ResponseException};
use crate::script::{Bindings, HandlerBinding, Script};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::error;

/// Binding names set by the adapters; configured args may not reuse them
pub const RESERVED_BINDINGS: &[&str] = &["context", "request", "next"];

fn exchange_bindings(args: &Map<String, Value>, context: &Context, request: &Request) -> Bindings {
    let mut bindings = Bindings::new();
    for (name, value) in args {
        bindings.insert(name.clone(), value.clone());
    }
    bindings.insert("context", context.to_json());
    bindings.insert("request", request.to_json());
    bindings
}

fn script_response(script: &Script, value: &Value) -> HandlerResult {
    Response::from_json(value).map_err(|e| {
        let err = ScriptError::InvalidResult {
            script: script.name().to_string(),
            reason: e.to_string(),
        };
        error!(error = %err, "Script did not produce a valid response");
        ResponseException::internal(err)
    })
}

fn script_failure(err: ScriptError) -> ResponseException {
    error!(error = %err, "Script execution failed");
    ResponseException::internal(err)
}

/// A [`Handler`] whose response is produced by a script
#[derive(Debug, Clone)]
pub struct ScriptableHandler {
    script: Script,
    args: Map<String, Value>,
}

impl ScriptableHandler {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            args: Map::new(),
        }
    }

    /// Extra bindings passed to every run
    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = args;
        self
    }
}

impl Handler for ScriptableHandler {
    fn handle(&self, context: &Context, request: Request) -> HandlerResult {
        let bindings = exchange_bindings(&self.args, context, &request);

        match self.script.run(bindings) {
            Ok(Value::Null) => Err(script_failure(ScriptError::InvalidResult {
                script: self.script.name().to_string(),
                reason: "handler scripts must return a response".to_string(),
            })),
            Ok(value) => script_response(&self.script, &value),
            Err(e) => Err(script_failure(e)),
        }
    }
}

/// Per-exchange state shared between a filter and its `next` binding
struct Downstream {
    next: Option<Next>,
    outcome: Option<HandlerResult>,
}

fn lock(state: &Mutex<Downstream>) -> MutexGuard<'_, Downstream> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`Filter`] implemented by a script
#[derive(Debug, Clone)]
pub struct ScriptableFilter {
    script: Script,
    args: Map<String, Value>,
}

impl ScriptableFilter {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            args: Map::new(),
        }
    }

    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = args;
        self
    }

    fn next_binding(
        state: &Arc<Mutex<Downstream>>,
        context: &Context,
        request: &Request,
    ) -> HandlerBinding {
        let state = Arc::clone(state);
        let context = context.clone();
        let original = request.clone();

        HandlerBinding::new(move |value| {
            let mut request = original.clone();
            if !value.is_null() {
                request
                    .apply_json(&value)
                    .map_err(BindingError::InvalidRequest)?;
            }

            let next = lock(&state).next.take().ok_or(BindingError::AlreadyInvoked)?;
            let result = next.handle(&context, request);

            let reply = match &result {
                Ok(response) => Ok(response.to_json()),
                Err(exception) => Err(BindingError::ShortCircuited {
                    status: exception.status().as_u16(),
                }
                .into()),
            };
            lock(&state).outcome = Some(result);
            reply
        })
    }
}

impl Filter for ScriptableFilter {
    fn filter(&self, context: &Context, request: Request, next: Next) -> HandlerResult {
        let state = Arc::new(Mutex::new(Downstream {
            next: Some(next),
            outcome: None,
        }));

        let mut bindings = exchange_bindings(&self.args, context, &request);
        bindings.insert("next", Self::next_binding(&state, context, &request));

        let result = self.script.run(bindings);
        let mut downstream = lock(&state);

        match result {
            // A short-circuit raised downstream wins over the script error it caused.
            Err(e) => match downstream.outcome.take() {
                Some(Err(exception)) => Err(exception),
                _ => Err(script_failure(e)),
            },
            Ok(Value::Null) => {
                if let Some(outcome) = downstream.outcome.take() {
                    return outcome;
                }
                match downstream.next.take() {
                    Some(next) => {
                        drop(downstream);
                        next.handle(context, request)
                    }
                    None => Err(script_failure(ScriptError::InvalidResult {
                        script: self.script.name().to_string(),
                        reason: "next was invoked but produced no outcome".to_string(),
                    })),
                }
            }
            Ok(value) => script_response(&self.script, &value),
        }
    }
}
