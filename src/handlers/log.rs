//! # LogWriter — dispatched event logger
//!
//! A minimal wildcard handler that emits one `tracing` record per dispatched event.
//! Use it for tests or demos; register it with
//! [`Dispatcher::subscribe_any`](crate::Dispatcher::subscribe_any).
//!
//! ## Example output
//! ```text
//! INFO busify::log: [dispatched] event=OrderPlaced id=2f1c… seq=3
//! INFO busify::log: [dispatched] event=UserRegistered id=91ab… seq=4 state=completed
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::AnyEvent;
use crate::handlers::handle::HandleAny;

/// Event logging wildcard handler.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HandleAny for LogWriter {
    async fn handle(&self, e: Arc<dyn AnyEvent>) -> Result<(), HandlerError> {
        let state = if e.has_error() {
            "failed"
        } else if e.is_completed() {
            "completed"
        } else {
            "pending"
        };
        tracing::info!(
            target: "busify::log",
            "[dispatched] event={} id={} seq={} state={}",
            e.event_type(),
            e.id(),
            e.seq(),
            state
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}
