//! # Dispatcher: subscription registry and event fan-out.
//!
//! The [`Dispatcher`] keeps, per payload type, an ordered list of handlers plus a list of
//! wildcard handlers invoked for every event. [`Dispatcher::dispatch`] runs every
//! matching handler, waits for all of them and records the first failure on the event.
//!
//! ## Architecture
//! ```text
//! dispatch(Event<P>)
//!   │
//!   ├─► snapshot: typed handlers of P ++ wildcard handlers  (read lock, released)
//!   │
//!   ├─► run all handlers (HandlerMode::Concurrent | HandlerMode::Parallel)
//!   │      handler 1 ──► Ok
//!   │      handler 2 ──► Err(e2)            panics ──► HandlerError::Panicked
//!   │      handler 3 ──► Err(e3)
//!   │
//!   ├─► failures in registration order: log, event.set_exception(e)
//!   │      (first one sticks, only if nobody completed the event)
//!   │
//!   └─► return the event (possibly still pending)
//! ```
//!
//! ## Rules
//! - Registration order is kept; duplicates are allowed and run once per registration.
//! - The registry lock is never held across an `.await`.
//! - Handler failures never escape `dispatch`.
//! - In `Parallel` mode, dropping the `dispatch` future aborts the handler tasks it spawned.
//! - `dispatch` never completes the event with a value.
//!
//! ## Example
//! ```rust
//! use busify::{Dispatcher, Event, HandlerError, HandlerFn, Payload};
//!
//! struct OrderPlaced {
//!     order_id: String,
//!     amount: f64,
//! }
//!
//! impl Payload for OrderPlaced {
//!     type Output = String;
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = Dispatcher::new();
//!
//!     let payments = HandlerFn::arc("payments", |ev: Event<OrderPlaced>| async move {
//!         ev.set_result(format!("charged {:.2} for {}", ev.amount, ev.order_id))?;
//!         Ok::<_, HandlerError>(())
//!     });
//!     bus.subscribe::<OrderPlaced, _>(payments);
//!
//!     let ev = bus
//!         .dispatch(Event::new(OrderPlaced { order_id: "A-1".into(), amount: 9.5 }))
//!         .await;
//!     assert_eq!(ev.await.unwrap(), "charged 9.50 for A-1");
//! }
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use parking_lot::RwLock;
use tokio::task::JoinSet;

use super::builder::DispatcherBuilder;
use super::config::{DispatcherConfig, HandlerMode};
use super::registry::Registry;
use super::waiter::{Waiter, WaiterGuard};
use crate::error::{BusError, HandlerError};
use crate::events::{AnyEvent, Event, EventType, Payload};
use crate::handlers::{Entry, Handle, HandleAny, HandlerKey};

/// In-process typed publish/subscribe dispatcher.
///
/// Share it between tasks with `Arc<Dispatcher>`; every method takes `&self`.
pub struct Dispatcher {
    cfg: DispatcherConfig,
    registry: RwLock<Registry>,
}

impl Dispatcher {
    /// Creates a dispatcher with [`DispatcherConfig::default`] and no handlers.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Creates a dispatcher with the given configuration and no handlers.
    pub fn with_config(cfg: DispatcherConfig) -> Self {
        Self {
            cfg,
            registry: RwLock::new(Registry::new()),
        }
    }

    /// Returns a builder for a dispatcher with initial wildcard handlers.
    pub fn builder(cfg: DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(cfg)
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.cfg
    }

    /// Registers `handler` for events carrying payload `P`.
    ///
    /// Appends to the end of `P`'s list. Registering the same `Arc` twice makes it run
    /// twice per dispatch.
    pub fn subscribe<P, H>(&self, handler: Arc<H>)
    where
        P: Payload,
        H: Handle<P> + ?Sized,
    {
        let entry = Entry::typed::<P, H>(handler);
        tracing::debug!(event = P::name(), handler = entry.name(), "subscribed");
        self.registry.write().insert(EventType::of::<P>(), entry);
    }

    /// Removes the first registration of `handler` for `P`.
    ///
    /// Returns `false` if it was not registered. Wildcard handlers are untouched.
    pub fn unsubscribe<P, H>(&self, handler: &Arc<H>) -> bool
    where
        P: Payload,
        H: Handle<P> + ?Sized,
    {
        let removed = self
            .registry
            .write()
            .remove(EventType::of::<P>(), HandlerKey::of(handler));
        if removed {
            tracing::debug!(event = P::name(), handler = handler.name(), "unsubscribed");
        }
        removed
    }

    /// Removes handlers in bulk and returns how many registrations were dropped.
    ///
    /// - `Some(ty)` → every typed handler of `ty`; wildcard handlers are kept
    /// - `None` → every typed handler of every type, and every wildcard handler
    pub fn unsubscribe_all(&self, ty: Option<EventType>) -> usize {
        let removed = {
            let mut reg = self.registry.write();
            match ty {
                Some(ty) => reg.clear_type(ty),
                None => reg.clear(),
            }
        };
        match ty {
            Some(ty) => tracing::debug!(event = %ty, removed, "unsubscribed all handlers of type"),
            None => tracing::debug!(removed, "unsubscribed all handlers"),
        }
        removed
    }

    /// Removes every typed handler of `P`.
    pub fn unsubscribe_all_of<P: Payload>(&self) -> usize {
        self.unsubscribe_all(Some(EventType::of::<P>()))
    }

    /// Registers `handler` for every dispatched event.
    ///
    /// Wildcard handlers run after the typed handlers of the event.
    pub fn subscribe_any<H>(&self, handler: Arc<H>)
    where
        H: HandleAny + ?Sized,
    {
        let entry = Entry::wildcard(handler);
        tracing::debug!(handler = entry.name(), "subscribed wildcard");
        self.registry.write().insert_wildcard(entry);
    }

    /// Removes the first wildcard registration of `handler`.
    pub fn unsubscribe_any<H>(&self, handler: &Arc<H>) -> bool
    where
        H: HandleAny + ?Sized,
    {
        let removed = self
            .registry
            .write()
            .remove_wildcard(HandlerKey::of(handler));
        if removed {
            tracing::debug!(handler = handler.name(), "unsubscribed wildcard");
        }
        removed
    }

    /// Number of typed registrations for `P`.
    pub fn handler_count<P: Payload>(&self) -> usize {
        self.registry.read().len_of(EventType::of::<P>())
    }

    /// Number of wildcard registrations.
    pub fn wildcard_count(&self) -> usize {
        self.registry.read().wildcard_len()
    }

    /// Event types that currently have at least one typed handler, sorted by name.
    pub fn event_types(&self) -> Vec<EventType> {
        self.registry.read().types()
    }

    /// Delivers `event` to every matching handler and waits for all of them.
    ///
    /// Handlers registered for `P` run first (in order), then wildcard handlers. Each
    /// failure is logged; the first failure in that order is stored on the event unless
    /// a handler already completed it. The event is returned as is, possibly still
    /// pending if no handler completed it.
    ///
    /// Subscriptions changed while this call is in flight take effect on the next
    /// dispatch.
    pub async fn dispatch<P: Payload>(&self, event: Event<P>) -> Event<P> {
        let ty = event.event_type();
        let entries = self.registry.read().snapshot(ty);
        if entries.is_empty() {
            tracing::trace!(event = %ty, id = %event.id(), "no handlers registered");
            return event;
        }
        tracing::trace!(
            event = %ty,
            id = %event.id(),
            handlers = entries.len(),
            mode = ?self.cfg.handler_mode,
            "dispatching"
        );

        let shared: Arc<dyn AnyEvent> = Arc::new(event.clone());
        let outcomes = match self.cfg.handler_mode {
            HandlerMode::Concurrent => run_concurrent(&entries, &shared).await,
            HandlerMode::Parallel => run_parallel(&entries, &shared).await,
        };

        for (entry, outcome) in entries.iter().zip(outcomes) {
            if let Err(err) = outcome {
                if self.cfg.log_failures {
                    tracing::error!(
                        event = %ty,
                        id = %event.id(),
                        handler = entry.name(),
                        reason = err.as_label(),
                        "handler failed: {}",
                        err.as_message()
                    );
                }
                event.set_exception(err);
            }
        }
        event
    }

    /// Waits for the next dispatched event carrying payload `P`.
    ///
    /// Shorthand for [`wait_for_event_where`](Self::wait_for_event_where) with a
    /// predicate that accepts every event.
    pub async fn wait_for_event<P: Payload>(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Event<P>, BusError> {
        self.wait_for_event_where(timeout, |_: &Event<P>| true).await
    }

    /// Waits for the next dispatched event of `P` for which `predicate` returns `true`.
    ///
    /// A temporary handler is registered for the duration of the wait and removed on
    /// every exit path, including when the returned future is dropped. `timeout` of
    /// `None` or zero falls back to [`DispatcherConfig::wait_timeout`].
    ///
    /// # Errors
    /// - [`BusError::Timeout`] if no matching event arrives in time
    /// - [`BusError::Unsubscribed`] if the temporary handler was removed by someone
    ///   else (for example [`unsubscribe_all`](Self::unsubscribe_all)) first
    pub async fn wait_for_event_where<P, F>(
        &self,
        timeout: Option<Duration>,
        predicate: F,
    ) -> Result<Event<P>, BusError>
    where
        P: Payload,
        F: Fn(&Event<P>) -> bool + Send + Sync + 'static,
    {
        let (waiter, rx) = Waiter::new(predicate);
        let _guard = WaiterGuard::new(&self.registry, &waiter);
        self.registry
            .write()
            .insert(EventType::of::<P>(), Entry::typed::<P, _>(waiter));

        let deadline = self.cfg.resolve_wait_timeout(timeout);
        tracing::debug!(event = P::name(), timeout = ?deadline, "waiting for event");

        let received = match deadline {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_elapsed) => {
                    tracing::warn!(event = P::name(), timeout = ?limit, "wait for event timed out");
                    return Err(BusError::Timeout {
                        event: P::name(),
                        timeout: limit,
                    });
                }
            },
            None => rx.await,
        };

        match received {
            Ok(event) => {
                tracing::debug!(event = P::name(), id = %event.id(), "wait for event resolved");
                Ok(event)
            }
            Err(_closed) => Err(BusError::Unsubscribed { event: P::name() }),
        }
    }

    pub(crate) fn register_wildcards(&self, handlers: Vec<Entry>) {
        let mut reg = self.registry.write();
        for entry in handlers {
            reg.insert_wildcard(entry);
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reg = self.registry.read();
        f.debug_struct("Dispatcher")
            .field("config", &self.cfg)
            .field("event_types", &reg.types())
            .field("wildcard_handlers", &reg.wildcard_len())
            .finish()
    }
}

/// Runs one handler call, turning a panic into [`HandlerError::Panicked`].
async fn guarded(fut: BoxFuture<'static, Result<(), HandlerError>>) -> Result<(), HandlerError> {
    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic_err) => Err(HandlerError::Panicked {
            info: panic_info(&*panic_err),
        }),
    }
}

/// Polls every handler future on the current task; panics become failures.
async fn run_concurrent(
    entries: &[Entry],
    event: &Arc<dyn AnyEvent>,
) -> Vec<Result<(), HandlerError>> {
    let calls = entries
        .iter()
        .map(|entry| guarded(entry.handler.call(Arc::clone(event))));
    join_all(calls).await
}

/// Spawns one task per handler and collects outcomes in registration order.
///
/// Tasks live in a [`JoinSet`], so dropping the dispatch aborts every handler still
/// running instead of leaving it detached.
async fn run_parallel(
    entries: &[Entry],
    event: &Arc<dyn AnyEvent>,
) -> Vec<Result<(), HandlerError>> {
    let mut set = JoinSet::new();
    for (idx, entry) in entries.iter().enumerate() {
        let fut = entry.handler.call(Arc::clone(event));
        set.spawn(async move { (idx, guarded(fut).await) });
    }

    let mut outcomes: Vec<Option<Result<(), HandlerError>>> =
        entries.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
            Err(join_err) => {
                tracing::warn!(error = %join_err, "handler task ended without an outcome");
            }
        }
    }

    outcomes
        .into_iter()
        .map(|outcome| {
            outcome.unwrap_or_else(|| Err(HandlerError::fail("handler task was cancelled")))
        })
        .collect()
}

fn panic_info(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
