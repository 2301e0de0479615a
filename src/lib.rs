//! # busify
//!
//! **Busify** is an in-process, typed publish/subscribe event dispatcher for async Rust.
//!
//! Every event carries a one-shot completion cell: handlers may answer an event with a
//! value or fail it, and any task may `.await` the event itself for that outcome. The
//! dispatcher runs all handlers of an event concurrently, waits for them, and records
//! the first failure on the event instead of propagating it to the dispatching caller.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  subscribe::<P>(h)      subscribe_any(h)       wait_for_event::<P>()
//!        │                      │                        │ (temporary handler)
//!        ▼                      ▼                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher                                                       │
//! │  - Registry: EventType → [handler, handler, ...]                  │
//! │              wildcard   → [handler, ...]                          │
//! │  - DispatcherConfig (handler mode, default wait timeout, logging) │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   │ dispatch(Event<P>)
//!                 ┌─────────────────┼─────────────────┐
//!                 ▼                 ▼                 ▼
//!             typed #1          typed #2          wildcard #1
//!                 │                 │                 │
//!                 └──── join all, first failure in order ──► Event<P>
//!                                                              │
//!                              event.await / wait_timeout ◄────┘
//! ```
//!
//! ### Event lifecycle
//! ```text
//! Event::new(payload) ──► Pending ──┬─ set_result(v)      ──► Value(v)      (second set_result: AlreadyCompleted)
//!                                   └─ set_exception(err) ──► Failure(err)  (later set_exception: ignored)
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                              |
//! |-------------------|----------------------------------------------------------------|-------------------------------------------------|
//! | **Events**        | Typed payloads with identity and an awaitable result.          | [`Event`], [`Payload`], [`AnyEvent`]            |
//! | **Handlers**      | Trait or closure handlers, typed or wildcard.                  | [`Handle`], [`HandleAny`], [`HandlerFn`]        |
//! | **Dispatch**      | Registry, concurrent fan-out, waiting for the next event.      | [`Dispatcher`], [`DispatcherBuilder`]           |
//! | **Errors**        | Typed errors for handlers, events and waits.                   | [`HandlerError`], [`EventError`], [`BusError`]  |
//! | **Configuration** | Handler execution mode, default wait timeout, failure logging. | [`DispatcherConfig`], [`HandlerMode`]           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] wildcard handler _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use busify::{Dispatcher, Event, HandlerError, HandlerFn, Payload};
//!
//! struct UserRegistered {
//!     email: String,
//! }
//!
//! impl Payload for UserRegistered {
//!     type Output = String;
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(Dispatcher::new());
//!
//!     let welcome = HandlerFn::arc("welcome", |ev: Event<UserRegistered>| async move {
//!         ev.set_result(format!("Email sent to {}", ev.email))?;
//!         Ok::<_, HandlerError>(())
//!     });
//!     bus.subscribe::<UserRegistered, _>(welcome);
//!
//!     // Someone else waits for the next registration.
//!     let watcher = {
//!         let bus = Arc::clone(&bus);
//!         tokio::spawn(async move {
//!             bus.wait_for_event::<UserRegistered>(Some(Duration::from_secs(1))).await
//!         })
//!     };
//!     while bus.handler_count::<UserRegistered>() < 2 {
//!         tokio::task::yield_now().await;
//!     }
//!
//!     let ev = bus
//!         .dispatch(Event::new(UserRegistered { email: "ann@example.com".into() }))
//!         .await;
//!     assert_eq!(ev.await?, "Email sent to ann@example.com");
//!
//!     let seen = watcher.await??;
//!     assert_eq!(seen.email, "ann@example.com");
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;

// ---- Public re-exports ----

pub use crate::core::{Dispatcher, DispatcherBuilder, DispatcherConfig, HandlerMode};
pub use error::{BusError, EventError, HandlerError};
pub use events::{AnyEvent, Event, EventId, EventType, Payload};
pub use handlers::{AnyHandlerFn, AnyHandlerRef, Handle, HandleAny, HandlerFn, HandlerRef};

// Optional: expose a simple built-in logging handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use handlers::LogWriter;
