use crate::exchange::{Context, HandlerResult, Request};
use std::sync::Arc;

/// Terminal pipeline stage.
///
/// A handler that does not hand the exchange off elsewhere must itself return
/// either a response or a [`ResponseException`](crate::exchange::ResponseException).
#[cfg_attr(test, mockall::automock)]
pub trait Handler: Send + Sync {
    fn handle(&self, context: &Context, request: Request) -> HandlerResult;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle(&self, context: &Context, request: Request) -> HandlerResult {
        (**self).handle(context, request)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(&self, context: &Context, request: Request) -> HandlerResult {
        (**self).handle(context, request)
    }
}

/// Handler backed by a closure, see [`handler_fn`]
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Context, Request) -> HandlerResult + Send + Sync,
{
    fn handle(&self, context: &Context, request: Request) -> HandlerResult {
        (self.f)(context, request)
    }
}

/// Wrap a closure as a [`Handler`]
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Context, Request) -> HandlerResult + Send + Sync,
{
    HandlerFn { f }
}
