//! # Event handlers.
//!
//! This module provides the handler traits and built-in implementations invoked by the
//! [`Dispatcher`](crate::Dispatcher).
//!
//! ## Architecture
//! ```text
//! Dispatcher::dispatch(Event<P>)
//!     │
//!     ├──► typed handlers for P (registration order) ──► Handle<P>::handle(Event<P>)
//!     │
//!     └──► wildcard handlers (registration order) ─────► HandleAny::handle(Arc<dyn AnyEvent>)
//! ```
//!
//! ## Handler types
//! - **Trait handlers** - implement [`Handle`] or [`HandleAny`] on your own type
//! - **Closure handlers** - wrap an async closure with [`HandlerFn`] / [`AnyHandlerFn`]
//! - **Built-in** - [`LogWriter`] (feature `logging`)

mod erased;
mod handle;
mod handler_fn;
#[cfg(feature = "logging")]
mod log;

pub(crate) use erased::{Entry, HandlerKey};
pub use handle::{AnyHandlerRef, Handle, HandleAny, HandlerRef};
pub use handler_fn::{AnyHandlerFn, HandlerFn};
#[cfg(feature = "logging")]
pub use log::LogWriter;
