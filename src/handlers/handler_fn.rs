//! # Function-backed handlers (`HandlerFn`, `AnyHandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Event<P>) -> Fut`, producing a fresh future per
//! dispatch. [`AnyHandlerFn`] does the same for wildcard handlers.
//!
//! ## Concurrency semantics
//! - Every dispatch calls the closure again; the returned future owns its own state.
//! - No hidden mutation between calls; share state explicitly through `Arc<...>`
//!   captured by the closure.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use busify::{Event, Handle, HandlerError, HandlerFn, Payload};
//!
//! struct UserRegistered {
//!     email: String,
//! }
//!
//! impl Payload for UserRegistered {
//!     type Output = String;
//! }
//!
//! let h = HandlerFn::arc("welcome_email", |ev: Event<UserRegistered>| async move {
//!     ev.set_result(format!("Email sent to {}", ev.email))?;
//!     Ok::<_, HandlerError>(())
//! });
//!
//! assert_eq!(Handle::<UserRegistered>::name(h.as_ref()), "welcome_email");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::{AnyEvent, Event, Payload};
use crate::handlers::handle::{Handle, HandleAny};

/// Closure-backed typed handler.
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a shared reference.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared reference.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<P, F, Fut> Handle<P> for HandlerFn<F>
where
    P: Payload,
    F: Fn(Event<P>) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, event: Event<P>) -> Result<(), HandlerError> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Closure-backed wildcard handler.
pub struct AnyHandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> AnyHandlerFn<F> {
    /// Creates a new function-backed wildcard handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared reference.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for AnyHandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyHandlerFn")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> HandleAny for AnyHandlerFn<F>
where
    F: Fn(Arc<dyn AnyEvent>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, event: Arc<dyn AnyEvent>) -> Result<(), HandlerError> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping(u32);
    impl Payload for Ping {
        type Output = u32;
    }

    #[tokio::test]
    async fn test_handler_fn_runs_closure() {
        let h = HandlerFn::arc("double", |ev: Event<Ping>| async move {
            ev.set_result(ev.0 * 2)?;
            Ok::<_, HandlerError>(())
        });
        let ev = Event::new(Ping(21));
        h.handle(ev.clone()).await.unwrap();
        assert_eq!(ev.result().unwrap(), Some(42));
        assert_eq!(Handle::<Ping>::name(h.as_ref()), "double");
    }

    #[tokio::test]
    async fn test_any_handler_fn_sees_erased_event() {
        let h = AnyHandlerFn::arc("reject", |ev: Arc<dyn AnyEvent>| async move {
            if ev.is::<Ping>() {
                return Err(HandlerError::fail("pings are not allowed"));
            }
            Ok(())
        });
        let ev = Event::new(Ping(1));
        let err = h.handle(Arc::new(ev)).await.unwrap_err();
        assert_eq!(err.to_string(), "handler failed: pings are not allowed");
        assert_eq!(h.name(), "reject");
    }
}
