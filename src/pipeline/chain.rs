//! Chain composition
//!
//! Nests an ordered list of filters around a terminal handler and exposes the
//! result as a single [`Handler`].

use super::filter::{Filter, Next};
use super::handler::Handler;
use crate::exchange::{Context, HandlerResult, Request};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One filter bound to everything that follows it
struct FilterNode {
    filter: Arc<dyn Filter>,
    next: Arc<dyn Handler>,
}

impl Handler for FilterNode {
    fn handle(&self, context: &Context, request: Request) -> HandlerResult {
        self.filter
            .filter(context, request, Next::new(Arc::clone(&self.next)))
    }
}

/// Filters `[F1..Fn]` terminated by a handler `H`, composed once and reused
/// for every exchange on a route.
#[derive(Clone)]
pub struct Chain {
    head: Arc<dyn Handler>,
    filter_count: usize,
}

impl Chain {
    /// Compose `filters` around `handler`, preserving filter order
    pub fn new(filters: Vec<Arc<dyn Filter>>, handler: Arc<dyn Handler>) -> Self {
        let filter_count = filters.len();

        // Innermost first, so F1 ends up outermost.
        let head = filters.into_iter().rev().fold(handler, |next, filter| {
            Arc::new(FilterNode { filter, next }) as Arc<dyn Handler>
        });

        debug!(filters = filter_count, "Composed filter chain");

        Self { head, filter_count }
    }

    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    pub fn filter_count(&self) -> usize {
        self.filter_count
    }
}

impl Handler for Chain {
    fn handle(&self, context: &Context, request: Request) -> HandlerResult {
        let span = tracing::debug_span!(
            "exchange",
            context = %context.id(),
            method = %request.method,
            uri = %request.uri,
        );
        let _guard = span.enter();

        let result = self.head.handle(context, request);
        match &result {
            Ok(response) => debug!(status = %response.status, "Exchange handled"),
            Err(exception) => debug!(
                status = %exception.status(),
                "Exchange short-circuited"
            ),
        }
        result
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("filter_count", &self.filter_count)
            .finish_non_exhaustive()
    }
}

/// Incremental construction of a [`Chain`]
#[derive(Default)]
pub struct ChainBuilder {
    filters: Vec<Arc<dyn Filter>>,
}

impl ChainBuilder {
    /// Append a filter; filters run in the order they are added
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn filter_arc(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Terminate the chain with `handler`
    pub fn handler(self, handler: impl Handler + 'static) -> Chain {
        Chain::new(self.filters, Arc::new(handler))
    }

    pub fn handler_arc(self, handler: Arc<dyn Handler>) -> Chain {
        Chain::new(self.filters, handler)
    }
}
