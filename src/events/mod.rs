//! Events: payloads, routing keys and completion cells.
//!
//! This module groups the event **data model**: the caller-defined [`Payload`], the
//! [`Event`] handle that wraps it with identity metadata and a one-shot completion cell,
//! and [`AnyEvent`], the type-erased view handed to wildcard handlers.
//!
//! ## Contents
//! - [`Payload`], [`EventType`], [`EventId`] payload contract, routing key, identity
//! - [`Event`] typed, cloneable, awaitable event handle
//! - [`AnyEvent`] object-safe view used by wildcard handlers

mod completion;
mod event;
mod payload;

pub use event::{AnyEvent, Event};
pub use payload::{EventId, EventType, Payload};
