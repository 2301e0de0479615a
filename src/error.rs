//! Error types used by events, handlers and the dispatcher.
//!
//! This module defines three error enums:
//!
//! - [`HandlerError`] — failures raised by handlers; stored in an event's completion cell.
//! - [`EventError`] — misuse or observation errors of a single event's completion cell.
//! - [`BusError`] — errors raised by the dispatcher itself (waiting for events).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// # Failure produced by a handler.
///
/// Cheap to clone: the same failure is handed to every reader of an event.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum HandlerError {
    /// Handler returned an error.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked while processing an event.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Arbitrary error value supplied by the caller.
    #[error(transparent)]
    Custom(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl HandlerError {
    /// Builds a [`HandlerError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use busify::HandlerError;
    ///
    /// let err = HandlerError::fail("card declined");
    /// assert_eq!(err.to_string(), "handler failed: card declined");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        HandlerError::Fail {
            error: error.to_string(),
        }
    }

    /// Wraps an arbitrary error value, keeping it reachable through `source()`.
    pub fn custom<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HandlerError::Custom(Arc::new(error))
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::Custom(_) => "handler_custom",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::Custom(err) => format!("error: {err}"),
        }
    }
}

impl From<String> for HandlerError {
    fn from(error: String) -> Self {
        HandlerError::Fail { error }
    }
}

impl From<&str> for HandlerError {
    fn from(error: &str) -> Self {
        HandlerError::fail(error)
    }
}

impl From<EventError> for HandlerError {
    /// Lets handlers use `?` on event operations; a stored failure is passed through as is.
    fn from(err: EventError) -> Self {
        match err {
            EventError::Failed(inner) => inner,
            other => HandlerError::Fail {
                error: other.to_string(),
            },
        }
    }
}

/// # Errors produced by an event's completion cell.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum EventError {
    /// `set_result` was called on an event that is already completed.
    #[error("event {event} already completed")]
    AlreadyCompleted {
        /// Name of the event type.
        event: &'static str,
    },

    /// A result was requested from an event that has not completed yet.
    #[error("event {event} has not completed yet")]
    NotCompleted {
        /// Name of the event type.
        event: &'static str,
    },

    /// The event completed with a failure.
    #[error(transparent)]
    Failed(#[from] HandlerError),

    /// Awaiting the event exceeded the given deadline.
    #[error("event {event} not completed within {timeout:?}")]
    Timeout {
        /// Name of the event type.
        event: &'static str,
        /// The deadline that was exceeded.
        timeout: Duration,
    },
}

impl EventError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use busify::EventError;
    ///
    /// let err = EventError::NotCompleted { event: "OrderPlaced" };
    /// assert_eq!(err.as_label(), "event_not_completed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::AlreadyCompleted { .. } => "event_already_completed",
            EventError::NotCompleted { .. } => "event_not_completed",
            EventError::Failed(_) => "event_failed",
            EventError::Timeout { .. } => "event_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EventError::AlreadyCompleted { event } => format!("{event}: already completed"),
            EventError::NotCompleted { event } => format!("{event}: not completed"),
            EventError::Failed(err) => err.as_message(),
            EventError::Timeout { event, timeout } => format!("{event}: timeout {timeout:?}"),
        }
    }

    /// Returns the stored handler failure, if this error carries one.
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            EventError::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// # Errors produced by the dispatcher.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// No matching event was dispatched before the deadline.
    #[error("timed out waiting for {event} after {timeout:?}")]
    Timeout {
        /// Name of the awaited event type.
        event: &'static str,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The waiting handler was removed from the registry before a match arrived.
    #[error("stopped waiting for {event}: handler was unsubscribed")]
    Unsubscribed {
        /// Name of the awaited event type.
        event: &'static str,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use busify::BusError;
    /// use std::time::Duration;
    ///
    /// let err = BusError::Timeout { event: "UserRegistered", timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "bus_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Timeout { .. } => "bus_timeout",
            BusError::Unsubscribed { .. } => "bus_unsubscribed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::Timeout { event, timeout } => format!("{event}: timeout {timeout:?}"),
            BusError::Unsubscribed { event } => format!("{event}: unsubscribed"),
        }
    }

    /// Indicates whether the wait ended because its deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BusError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("gateway unavailable")]
    struct GatewayDown;

    #[test]
    fn test_custom_keeps_source_message() {
        let err = HandlerError::custom(GatewayDown);
        assert_eq!(err.to_string(), "gateway unavailable");
        assert_eq!(err.as_label(), "handler_custom");
    }

    #[test]
    fn test_string_conversions_build_fail() {
        let a: HandlerError = "boom".into();
        let b: HandlerError = String::from("boom").into();
        assert!(matches!(a, HandlerError::Fail { ref error } if error == "boom"));
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_failed_is_transparent() {
        let err = EventError::from(HandlerError::fail("nope"));
        assert_eq!(err.to_string(), "handler failed: nope");
        assert!(err.handler_error().is_some());
        assert_eq!(err.as_label(), "event_failed");
    }

    #[test]
    fn test_event_error_into_handler_error() {
        let stored = HandlerError::fail("inner");
        let back: HandlerError = EventError::Failed(stored).into();
        assert_eq!(back.to_string(), "handler failed: inner");

        let misuse: HandlerError = EventError::AlreadyCompleted { event: "X" }.into();
        assert_eq!(misuse.to_string(), "handler failed: event X already completed");
    }

    #[test]
    fn test_bus_timeout_flag() {
        let t = BusError::Timeout {
            event: "X",
            timeout: Duration::from_millis(5),
        };
        assert!(t.is_timeout());
        assert!(!BusError::Unsubscribed { event: "X" }.is_timeout());
    }
}
