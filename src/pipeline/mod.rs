//! Request-processing pipeline
//!
//! A pipeline is an ordered list of [`Filter`]s terminated by a [`Handler`],
//! composed into one effective handler by [`Chain`].
//!
//! # Modules
//!
//! - `handler`: the terminal stage contract
//! - `filter`: the compositional stage contract and the [`Next`] capability
//! - `chain`: composition of filters around a handler
//! - `scriptable`: script-backed filters and handlers

pub mod chain;
pub mod filter;
pub mod handler;
pub mod scriptable;

pub use chain::{Chain, ChainBuilder};
pub use filter::{filter_fn, Filter, FilterFn, Next};
pub use handler::{handler_fn, Handler, HandlerFn};
pub use scriptable::{ScriptableFilter, ScriptableHandler};
