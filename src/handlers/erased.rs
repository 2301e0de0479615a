//! # Type-erased handler entries stored by the registry.
//!
//! Typed and wildcard handlers share one shape inside the registry: an [`Entry`]
//! holding an [`ErasedHandler`] that accepts `Arc<dyn AnyEvent>`. Typed handlers are
//! wrapped in a thin adapter that recovers `Event<P>` before calling the user handler.
//!
//! ```text
//! Arc<dyn AnyEvent> ──► Typed<P, H>::call ──► downcast ──► H::handle(Event<P>)
//! Arc<dyn AnyEvent> ──► Wildcard<H>::call ─────────────► H::handle(Arc<dyn AnyEvent>)
//! ```

use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;

use crate::error::HandlerError;
use crate::events::{AnyEvent, Payload};
use crate::handlers::handle::{Handle, HandleAny};

/// Uniform call surface for registered handlers.
pub(crate) trait ErasedHandler: Send + Sync + 'static {
    fn call(&self, event: Arc<dyn AnyEvent>) -> BoxFuture<'static, Result<(), HandlerError>>;

    fn name(&self) -> &str;
}

/// Identity of a registered handler: address of the user's shared allocation.
///
/// The entry keeps that allocation alive, so the address cannot be reused while the
/// handler is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HandlerKey(usize);

impl HandlerKey {
    pub(crate) fn of<H: ?Sized>(handler: &Arc<H>) -> Self {
        Self(Arc::as_ptr(handler).cast::<()>() as usize)
    }

    /// Same key as [`HandlerKey::of`] for the allocation `handler` points to.
    pub(crate) fn of_weak<H>(handler: &Weak<H>) -> Self {
        Self(Weak::as_ptr(handler).cast::<()>() as usize)
    }
}

/// One registration in a handler list.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) key: HandlerKey,
    pub(crate) handler: Arc<dyn ErasedHandler>,
}

impl Entry {
    pub(crate) fn typed<P, H>(handler: Arc<H>) -> Self
    where
        P: Payload,
        H: Handle<P> + ?Sized,
    {
        Self {
            key: HandlerKey::of(&handler),
            handler: Arc::new(Typed::<P, H> {
                inner: handler,
                _payload: PhantomData,
            }),
        }
    }

    pub(crate) fn wildcard<H>(handler: Arc<H>) -> Self
    where
        H: HandleAny + ?Sized,
    {
        Self {
            key: HandlerKey::of(&handler),
            handler: Arc::new(Wildcard { inner: handler }),
        }
    }

    #[inline]
    pub(crate) fn name(&self) -> &str {
        self.handler.name()
    }
}

struct Typed<P, H: ?Sized> {
    inner: Arc<H>,
    _payload: PhantomData<fn(P)>,
}

impl<P, H> ErasedHandler for Typed<P, H>
where
    P: Payload,
    H: Handle<P> + ?Sized,
{
    fn call(&self, event: Arc<dyn AnyEvent>) -> BoxFuture<'static, Result<(), HandlerError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let typed = event.downcast_ref::<P>().cloned();
            match typed {
                Some(ev) => inner.handle(ev).await,
                None => Err(HandlerError::fail(format!(
                    "{} routed to handler for {}",
                    event.event_type(),
                    P::name()
                ))),
            }
        })
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

struct Wildcard<H: ?Sized> {
    inner: Arc<H>,
}

impl<H> ErasedHandler for Wildcard<H>
where
    H: HandleAny + ?Sized,
{
    fn call(&self, event: Arc<dyn AnyEvent>) -> BoxFuture<'static, Result<(), HandlerError>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.handle(event).await })
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
