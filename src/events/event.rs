//! # Dispatched events with awaitable results.
//!
//! [`Event`] wraps a caller-defined [`Payload`] together with identity metadata and a
//! one-shot completion cell. The payload and metadata never change after construction;
//! only the completion cell moves, once, from pending to a value or a failure.
//!
//! `Event` is a handle: cloning it is cheap and every clone refers to the **same**
//! instance (same id, same completion cell). Handlers receive clones, the dispatcher
//! returns the dispatched handle to the caller, and any task may await it.
//!
//! ## Completion rules
//! - [`Event::set_result`] on a completed event fails with [`EventError::AlreadyCompleted`].
//! - [`Event::set_exception`] on a completed event is silently ignored, so the first
//!   failure (or an earlier value) always wins.
//!
//! ## Example
//! ```rust
//! use busify::{Event, Payload};
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
//! let ev = Event::new(OrderPlaced { order_id: "X".into(), amount: 10.0 });
//! assert_eq!(ev.order_id, "X");
//! assert!(!ev.is_completed());
//!
//! ev.set_result("ok".to_string()).unwrap();
//! assert_eq!(ev.result().unwrap().as_deref(), Some("ok"));
//! assert!(ev.set_result("again".to_string()).is_err());
//! ```

use std::any::Any;
use std::fmt;
use std::future::IntoFuture;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use futures::future::BoxFuture;

use super::completion::{Completion, State};
use super::payload::{EventId, EventType, Payload};
use crate::error::{EventError, HandlerError};

/// Global sequence counter for event creation order.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

struct Inner<P: Payload> {
    id: EventId,
    seq: u64,
    created_at: SystemTime,
    payload: P,
    completion: Completion<P::Output>,
}

/// A dispatched (or dispatchable) event.
///
/// - `id`: unique identifier
/// - `seq`: process-wide creation sequence number
/// - `created_at`: wall-clock creation time
/// - payload fields are reachable through `Deref`
pub struct Event<P: Payload> {
    inner: Arc<Inner<P>>,
}

impl<P: Payload> Event<P> {
    /// Creates a pending event around `payload`.
    pub fn new(payload: P) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: EventId::new(),
                seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
                created_at: SystemTime::now(),
                payload,
                completion: Completion::new(),
            }),
        }
    }

    /// Unique identifier of this instance.
    #[inline]
    pub fn id(&self) -> EventId {
        self.inner.id
    }

    /// Creation sequence number (monotonic across the process).
    #[inline]
    pub fn seq(&self) -> u64 {
        self.inner.seq
    }

    /// Wall-clock creation time.
    #[inline]
    pub fn created_at(&self) -> SystemTime {
        self.inner.created_at
    }

    /// Borrowed payload.
    #[inline]
    pub fn payload(&self) -> &P {
        &self.inner.payload
    }

    /// Routing key of this event.
    #[inline]
    pub fn event_type(&self) -> EventType {
        EventType::of::<P>()
    }

    /// Returns `true` if both handles refer to the same event instance.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Whether the event completed (with a value or a failure).
    pub fn is_completed(&self) -> bool {
        self.inner.completion.is_done()
    }

    /// Whether the event completed with a failure.
    pub fn has_error(&self) -> bool {
        self.inner.completion.has_failure()
    }

    /// Completes the event with `value`.
    ///
    /// # Errors
    /// [`EventError::AlreadyCompleted`] if a value or failure was stored before.
    pub fn set_result(&self, value: P::Output) -> Result<(), EventError> {
        if self.inner.completion.set_value(value) {
            Ok(())
        } else {
            Err(EventError::AlreadyCompleted { event: P::name() })
        }
    }

    /// Completes the event with a failure.
    ///
    /// Does nothing if the event is already completed.
    pub fn set_exception(&self, err: impl Into<HandlerError>) {
        self.inner.completion.set_failure(err.into());
    }

    /// Reads the stored outcome without waiting.
    ///
    /// - stored failure and `raise_if_exception` → `Err(EventError::Failed)`
    /// - still pending and `raise_if_none` → `Err(EventError::NotCompleted)`
    /// - otherwise the stored value, or `None` if there is none
    pub fn get_result(
        &self,
        raise_if_none: bool,
        raise_if_exception: bool,
    ) -> Result<Option<P::Output>, EventError> {
        match self.inner.completion.state() {
            State::Value(value) => Ok(Some(value)),
            State::Failure(err) if raise_if_exception => Err(EventError::Failed(err)),
            State::Failure(_) => Ok(None),
            State::Pending if raise_if_none => Err(EventError::NotCompleted { event: P::name() }),
            State::Pending => Ok(None),
        }
    }

    /// Shorthand for `get_result(false, true)`.
    pub fn result(&self) -> Result<Option<P::Output>, EventError> {
        self.get_result(false, true)
    }

    /// Stored failure, if any.
    pub fn error(&self) -> Option<HandlerError> {
        self.inner.completion.failure()
    }

    /// Waits until the event completes.
    ///
    /// Returns immediately if it already has. Every waiter observes the same outcome.
    ///
    /// # Errors
    /// [`EventError::Failed`] if the event completed with a failure.
    pub async fn wait(&self) -> Result<P::Output, EventError> {
        match self.inner.completion.wait().await {
            State::Value(value) => Ok(value),
            State::Failure(err) => Err(EventError::Failed(err)),
            State::Pending => Err(EventError::NotCompleted { event: P::name() }),
        }
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    ///
    /// # Errors
    /// [`EventError::Timeout`] if the event is still pending when `timeout` elapses.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<P::Output, EventError> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(res) => res,
            Err(_elapsed) => Err(EventError::Timeout {
                event: P::name(),
                timeout,
            }),
        }
    }
}

impl<P: Payload> Clone for Event<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Payload> Deref for Event<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.inner.payload
    }
}

impl<P: Payload + fmt::Debug> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(P::name())
            .field("id", &self.inner.id)
            .field("seq", &self.inner.seq)
            .field("created_at", &self.inner.created_at)
            .field("payload", &self.inner.payload)
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl<P: Payload> IntoFuture for Event<P> {
    type Output = Result<P::Output, EventError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

impl<'a, P: Payload> IntoFuture for &'a Event<P> {
    type Output = Result<P::Output, EventError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

/// Type-erased view of an event, handed to wildcard handlers.
///
/// Exposes identity and completion state without knowing the payload type.
/// Use `downcast_ref::<P>()` on `dyn AnyEvent` to recover the typed event.
pub trait AnyEvent: Send + Sync + 'static {
    /// Unique identifier of the instance.
    fn id(&self) -> EventId;
    /// Creation sequence number.
    fn seq(&self) -> u64;
    /// Wall-clock creation time.
    fn created_at(&self) -> SystemTime;
    /// Routing key.
    fn event_type(&self) -> EventType;
    /// Whether the event completed.
    fn is_completed(&self) -> bool;
    /// Whether the event completed with a failure.
    fn has_error(&self) -> bool;
    /// Stored failure, if any.
    fn error(&self) -> Option<HandlerError>;
    /// Completes the event with a failure; ignored if already completed.
    fn set_exception(&self, err: HandlerError);
    /// Upcast used for downcasting to the typed event.
    fn as_any(&self) -> &dyn Any;
}

impl dyn AnyEvent {
    /// Returns the typed event if its payload is `P`.
    pub fn downcast_ref<P: Payload>(&self) -> Option<&Event<P>> {
        self.as_any().downcast_ref::<Event<P>>()
    }

    /// Whether the payload type is exactly `P`.
    pub fn is<P: Payload>(&self) -> bool {
        self.as_any().is::<Event<P>>()
    }
}

impl fmt::Debug for dyn AnyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyEvent")
            .field("type", &self.event_type())
            .field("id", &self.id())
            .field("seq", &self.seq())
            .finish()
    }
}

impl<P: Payload> AnyEvent for Event<P> {
    fn id(&self) -> EventId {
        self.inner.id
    }

    fn seq(&self) -> u64 {
        self.inner.seq
    }

    fn created_at(&self) -> SystemTime {
        self.inner.created_at
    }

    fn event_type(&self) -> EventType {
        EventType::of::<P>()
    }

    fn is_completed(&self) -> bool {
        self.inner.completion.is_done()
    }

    fn has_error(&self) -> bool {
        self.inner.completion.has_failure()
    }

    fn error(&self) -> Option<HandlerError> {
        self.inner.completion.failure()
    }

    fn set_exception(&self, err: HandlerError) {
        self.inner.completion.set_failure(err);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
