//! # Dispatcher configuration.
//!
//! Provides [`DispatcherConfig`] centralized settings for a [`Dispatcher`](crate::Dispatcher).
//!
//! ## Sentinel values
//! - `wait_timeout = 0s` → `wait_for_event` without an explicit timeout waits forever

use std::time::Duration;

/// How the handlers of one dispatch are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerMode {
    /// All handler futures are polled together on the dispatching task.
    ///
    /// Handlers interleave at their await points; no handler runs on another thread.
    #[default]
    Concurrent,

    /// Every handler is spawned as its own tokio task.
    ///
    /// Handlers may run in parallel on a multi-threaded runtime. Requires a tokio
    /// runtime context during `dispatch`. Dropping the `dispatch` future aborts the
    /// handler tasks it spawned.
    Parallel,
}

/// Configuration for the dispatcher.
///
/// ## Field semantics
/// - `handler_mode`: concurrent polling on the caller's task, or one spawned task per handler
/// - `wait_timeout`: default deadline for `wait_for_event` (`0s` = no deadline)
/// - `log_failures`: emit an `error` record for every failed handler
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors over checking
/// sentinel values (`0`) directly.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Execution strategy for the handlers of a single dispatch.
    ///
    /// Failure precedence does not depend on the mode: the stored failure is always the
    /// one of the first failing handler in registration order.
    pub handler_mode: HandlerMode,

    /// Default deadline used by `wait_for_event` when the caller passes none.
    ///
    /// - `Duration::ZERO` = wait indefinitely
    /// - `> 0` = fail with `BusError::Timeout` after this long
    pub wait_timeout: Duration,

    /// Whether handler failures are logged at `error` level.
    ///
    /// Failures are always recorded on the event regardless of this flag.
    pub log_failures: bool,
}

impl DispatcherConfig {
    /// Returns the default wait deadline as an `Option`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(d)` → deadline applied to each wait
    #[inline]
    pub fn default_wait_timeout(&self) -> Option<Duration> {
        if self.wait_timeout == Duration::ZERO {
            None
        } else {
            Some(self.wait_timeout)
        }
    }

    /// Resolves the effective deadline of one wait.
    ///
    /// An explicit non-zero `timeout` wins; `None` or zero falls back to the default.
    #[inline]
    pub fn resolve_wait_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        timeout
            .filter(|d| *d > Duration::ZERO)
            .or_else(|| self.default_wait_timeout())
    }
}

impl Default for DispatcherConfig {
    /// Default configuration:
    ///
    /// - `handler_mode = HandlerMode::Concurrent`
    /// - `wait_timeout = 0s` (wait indefinitely)
    /// - `log_failures = true`
    fn default() -> Self {
        Self {
            handler_mode: HandlerMode::default(),
            wait_timeout: Duration::ZERO,
            log_failures: true,
        }
    }
}
