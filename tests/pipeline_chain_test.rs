//! Integration tests for filter chains
//!
//! Tests verify that:
//! - Pass-through filters reach the handler exactly once, unmodified
//! - A short-circuit stops every later filter and the handler
//! - Filters can post-process, intercept and rewrite the exchange
//! - A composed chain is shared safely across threads

use gateway_pipeline::exchange::{Context, HandlerResult, Request, Response, ResponseException};
use gateway_pipeline::pipeline::{filter_fn, handler_fn, Chain, Filter, Handler, Next};
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use mockall::mock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mock! {
    pub Terminal {}

    impl Handler for Terminal {
        fn handle(&self, context: &Context, request: Request) -> HandlerResult;
    }
}

fn pass_through() -> impl Filter {
    filter_fn(|context: &Context, request: Request, next: Next| next.handle(context, request))
}

fn request() -> Request {
    Request::new(Method::GET, "/orders/42")
}

#[test]
fn test_pass_through_filters_call_handler_once() {
    let mut handler = MockTerminal::new();
    handler
        .expect_handle()
        .withf(|_, request| request.uri == "/orders/42" && request.method == Method::GET)
        .times(1)
        .returning(|_, _| Ok(Response::new(StatusCode::OK).with_body("order 42")));

    let chain = Chain::builder()
        .filter(pass_through())
        .filter(pass_through())
        .filter(pass_through())
        .handler(handler);
    assert_eq!(chain.filter_count(), 3);

    let response = chain.handle(&Context::new(), request()).unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "order 42");
    assert!(response.headers.is_empty());
}

#[test]
fn test_short_circuit_stops_later_filters() {
    let later_calls = Arc::new(AtomicUsize::new(0));
    let counter = later_calls.clone();

    let mut handler = MockTerminal::new();
    handler.expect_handle().times(0);

    let chain = Chain::builder()
        .filter(pass_through())
        .filter(filter_fn(|_: &Context, _: Request, _: Next| {
            Err(ResponseException::new(StatusCode::FORBIDDEN))
        }))
        .filter(filter_fn(move |context: &Context, request: Request, next: Next| {
            counter.fetch_add(1, Ordering::SeqCst);
            next.handle(context, request)
        }))
        .handler(handler);

    let exception = chain.handle(&Context::new(), request()).unwrap_err();
    assert_eq!(exception.status(), StatusCode::FORBIDDEN);
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_outer_filter_post_processes_short_circuit() {
    // F1 decorates whatever comes back, F2 answers on its own.
    let mut handler = MockTerminal::new();
    handler.expect_handle().times(0);

    let chain = Chain::builder()
        .filter(filter_fn(|context: &Context, request: Request, next: Next| {
            let tag = HeaderValue::from_static("f1");
            match next.handle(context, request) {
                Ok(response) => Ok(response.with_header(HeaderName::from_static("x-seen-by"), tag)),
                Err(exception) => {
                    let response = exception
                        .into_response()
                        .with_header(HeaderName::from_static("x-seen-by"), tag);
                    Err(ResponseException::from_response(response))
                }
            }
        }))
        .filter(filter_fn(|_: &Context, _: Request, _: Next| {
            Ok(Response::new(StatusCode::TOO_MANY_REQUESTS).with_body("slow down"))
        }))
        .handler(handler);

    let response = chain.handle(&Context::new(), request()).unwrap();
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("x-seen-by"), Some("f1"));
    assert_eq!(response.body, "slow down");
}

#[test]
fn test_filter_intercepts_downstream_exception() {
    let chain = Chain::builder()
        .filter(filter_fn(|context: &Context, request: Request, next: Next| {
            next.handle(context, request).or_else(|exception| {
                Ok(Response::new(StatusCode::OK)
                    .with_body(format!("recovered from {}", exception.status().as_u16())))
            })
        }))
        .handler(handler_fn(|_: &Context, _: Request| {
            Err(ResponseException::internal("database unavailable"))
        }));

    let response = chain.handle(&Context::new(), request()).unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "recovered from 500");
}

#[test]
fn test_filter_delegates_with_child_context_and_modified_request() {
    let mut handler = MockTerminal::new();
    handler
        .expect_handle()
        .withf(|context, request| {
            context.attribute("user") == Some(&serde_json::json!("alice"))
                && context.parent().is_some()
                && request.header("x-user") == Some("alice")
        })
        .times(1)
        .returning(|_, _| Ok(Response::new(StatusCode::NO_CONTENT)));

    let chain = Chain::builder()
        .filter(filter_fn(|context: &Context, request: Request, next: Next| {
            let child = context.child().with_attribute("user", "alice");
            let request = request.with_header(
                HeaderName::from_static("x-user"),
                HeaderValue::from_static("alice"),
            );
            next.handle(&child, request)
        }))
        .handler(handler);

    let context = Context::new();
    let response = chain.handle(&context, request()).unwrap();
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    // The caller's context is untouched.
    assert!(context.attribute("user").is_none());
}

#[test]
fn test_chain_is_shared_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let chain = Chain::builder()
        .filter(pass_through())
        .handler(handler_fn(move |context: &Context, _: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(StatusCode::OK).with_body(context.id().to_string()))
        }));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let chain = &chain;
            scope.spawn(move || {
                for _ in 0..25 {
                    let context = Context::new();
                    let response = chain.handle(&context, request()).unwrap();
                    assert_eq!(response.body, context.id());
                }
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 200);
}
