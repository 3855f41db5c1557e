use super::handler::Handler;
use crate::exchange::{Context, HandlerResult, Request};
use std::fmt;
use std::sync::Arc;

/// The remainder of a chain, as seen by a filter.
///
/// `Next` is neither `Clone` nor `Copy` and [`Next::handle`] consumes it, so a
/// filter can delegate at most once per exchange.
pub struct Next {
    handler: Arc<dyn Handler>,
}

impl Next {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    /// Invoke the rest of the chain
    pub fn handle(self, context: &Context, request: Request) -> HandlerResult {
        self.handler.handle(context, request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Compositional pipeline stage.
///
/// A filter may pass the request through, pass a modified context or request,
/// answer without calling `next`, or post-process what `next` returned.
pub trait Filter: Send + Sync {
    fn filter(&self, context: &Context, request: Request, next: Next) -> HandlerResult;
}

impl<F: Filter + ?Sized> Filter for Arc<F> {
    fn filter(&self, context: &Context, request: Request, next: Next) -> HandlerResult {
        (**self).filter(context, request, next)
    }
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn filter(&self, context: &Context, request: Request, next: Next) -> HandlerResult {
        (**self).filter(context, request, next)
    }
}

/// Filter backed by a closure, see [`filter_fn`]
#[derive(Clone)]
pub struct FilterFn<F> {
    f: F,
}

impl<F> Filter for FilterFn<F>
where
    F: Fn(&Context, Request, Next) -> HandlerResult + Send + Sync,
{
    fn filter(&self, context: &Context, request: Request, next: Next) -> HandlerResult {
        (self.f)(context, request, next)
    }
}

/// Wrap a closure as a [`Filter`]
pub fn filter_fn<F>(f: F) -> FilterFn<F>
where
    F: Fn(&Context, Request, Next) -> HandlerResult + Send + Sync,
{
    FilterFn { f }
}
