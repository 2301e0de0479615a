//! # Handler traits
//!
//! [`Handle`] is the extension point for reacting to one payload type; [`HandleAny`]
//! receives every dispatched event regardless of its type (wildcard handlers).
//!
//! ## Contract
//! - A handler receives its own clone of the event handle; it may complete the event
//!   with [`Event::set_result`] or fail it with [`Event::set_exception`].
//! - Returning `Err` marks the handler as failed. The dispatcher records the failure on
//!   the event (first failure wins) and never propagates it to the dispatching caller.
//! - Panics are caught and treated as failures ([`HandlerError::Panicked`]).
//! - Handlers run concurrently with the other handlers of the same dispatch; they
//!   should not block the async runtime.
//!
//! ## Identity
//! Handlers are registered as shared references ([`HandlerRef`], [`AnyHandlerRef`] or any
//! `Arc<H>`). Unsubscribing compares pointer identity: pass a clone of the same `Arc`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use busify::{Event, Handle, HandlerError, Payload};
//!
//! struct OrderPlaced {
//!     order_id: String,
//! }
//!
//! impl Payload for OrderPlaced {
//!     type Output = String;
//! }
//!
//! struct Payments;
//!
//! #[async_trait]
//! impl Handle<OrderPlaced> for Payments {
//!     async fn handle(&self, event: Event<OrderPlaced>) -> Result<(), HandlerError> {
//!         event.set_result(format!("paid {}", event.order_id))?;
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "payments"
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::{AnyEvent, Event, Payload};

/// Shared reference to a typed handler.
pub type HandlerRef<P> = Arc<dyn Handle<P>>;

/// Shared reference to a wildcard handler.
pub type AnyHandlerRef = Arc<dyn HandleAny>;

/// Handler for events carrying payload `P`.
#[async_trait]
pub trait Handle<P: Payload>: Send + Sync + 'static {
    /// Handles a single dispatched event.
    async fn handle(&self, event: Event<P>) -> Result<(), HandlerError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handler invoked for every dispatched event.
#[async_trait]
pub trait HandleAny: Send + Sync + 'static {
    /// Handles a single dispatched event of any type.
    async fn handle(&self, event: Arc<dyn AnyEvent>) -> Result<(), HandlerError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
