//! Exchange model
//!
//! The values that flow through a pipeline for one HTTP exchange: the
//! request-scoped [`Context`], the [`Request`] and [`Response`] messages, and
//! the [`ResponseException`] used to short-circuit a chain while still
//! yielding a response.

pub mod context;
pub mod exception;
pub mod message;

pub use context::Context;
pub use exception::{HandlerResult, ResponseException};
pub use message::{Request, Response};
