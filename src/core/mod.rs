//! Dispatch core: registry, fan-out and waiting.
//!
//! The public API of this module is [`Dispatcher`] (with its [`DispatcherBuilder`]) and
//! its configuration types.
//!
//! Internal modules:
//! - [`dispatcher`]: subscription management, dispatch fan-out, `wait_for_event`;
//! - [`registry`]: event-type → handler lists plus wildcard handlers;
//! - [`waiter`]: temporary one-shot handlers and their cleanup guard;
//! - [`builder`]: dispatcher construction with initial wildcard handlers;
//! - [`config`]: dispatcher settings.

mod builder;
mod config;
mod dispatcher;
mod registry;
mod waiter;

pub use builder::DispatcherBuilder;
pub use config::{DispatcherConfig, HandlerMode};
pub use dispatcher::Dispatcher;
