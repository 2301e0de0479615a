//! # Temporary handlers behind `wait_for_event`.
//!
//! A [`Waiter`] is an ordinary typed handler holding the sending half of a oneshot
//! channel. The first event that passes its predicate takes the sender; later matches
//! find it gone and are ignored.
//!
//! [`WaiterGuard`] removes the waiter from the registry when dropped, so every exit
//! path of a wait (match, timeout, cancellation) cleans up after itself.
//!
//! ```text
//! wait_for_event ──► insert Waiter ──► await rx ──► drop WaiterGuard ──► remove Waiter
//!                                         ▲
//! dispatch(Event<P>) ──► Waiter::handle ──┘ (first match only)
//! ```

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use super::registry::Registry;
use crate::error::HandlerError;
use crate::events::{Event, EventType, Payload};
use crate::handlers::{Handle, HandlerKey};

type Predicate<P> = Box<dyn Fn(&Event<P>) -> bool + Send + Sync>;

/// One-shot handler resolving a single pending wait.
pub(crate) struct Waiter<P: Payload> {
    tx: Mutex<Option<oneshot::Sender<Event<P>>>>,
    predicate: Predicate<P>,
}

impl<P: Payload> Waiter<P> {
    pub(crate) fn new<F>(predicate: F) -> (Arc<Self>, oneshot::Receiver<Event<P>>)
    where
        F: Fn(&Event<P>) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let waiter = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            predicate: Box::new(predicate),
        });
        (waiter, rx)
    }
}

#[async_trait]
impl<P: Payload> Handle<P> for Waiter<P> {
    async fn handle(&self, event: Event<P>) -> Result<(), HandlerError> {
        if !(self.predicate)(&event) {
            return Ok(());
        }
        let tx = self.tx.lock().take();
        if let Some(tx) = tx {
            // receiver gone means the wait was already abandoned
            let _ = tx.send(event);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "wait_for_event"
    }
}

/// Removes a [`Waiter`] from the registry on drop.
///
/// Holds a weak reference so the waiter's allocation (and therefore its
/// [`HandlerKey`]) cannot be reused by another handler while the guard lives. Once the
/// registry drops its entry, the waiter itself is freed and its sender closes.
pub(crate) struct WaiterGuard<'a, P: Payload> {
    registry: &'a RwLock<Registry>,
    waiter: Weak<Waiter<P>>,
}

impl<'a, P: Payload> WaiterGuard<'a, P> {
    pub(crate) fn new(registry: &'a RwLock<Registry>, waiter: &Arc<Waiter<P>>) -> Self {
        Self {
            registry,
            waiter: Arc::downgrade(waiter),
        }
    }
}

impl<P: Payload> Drop for WaiterGuard<'_, P> {
    fn drop(&mut self) {
        let key = HandlerKey::of_weak(&self.waiter);
        if self.registry.write().remove(EventType::of::<P>(), key) {
            tracing::debug!(event = P::name(), "removed wait_for_event handler");
        }
    }
}
