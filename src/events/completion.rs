//! # One-shot completion cell.
//!
//! [`Completion`] is the only mutable part of an event. It moves from `Pending` to either
//! `Value` or `Failure` exactly once and can be observed by any number of readers.
//!
//! ## Transitions
//! ```text
//!            set_value ─────► Value(R)
//!          ╱
//! Pending ─
//!          ╲
//!            set_failure ───► Failure(err)
//!
//! Value/Failure ── set_value ──► rejected (caller gets `false`)
//! Value/Failure ── set_failure ► ignored
//! ```
//!
//! ## Rules
//! - Transitions are compare-and-set under the channel lock (`send_if_modified`).
//! - Waiters are woken by the [`watch`] channel, never by polling.
//! - A cell that is already terminal resolves waiters immediately.

use tokio::sync::watch;

use crate::error::HandlerError;

/// State of a completion cell.
#[derive(Debug, Clone)]
pub(crate) enum State<R> {
    Pending,
    Value(R),
    Failure(HandlerError),
}

impl<R> State<R> {
    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        !matches!(self, State::Pending)
    }
}

/// One-shot, multi-reader result slot.
pub(crate) struct Completion<R> {
    tx: watch::Sender<State<R>>,
}

impl<R: Clone> Completion<R> {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(State::Pending);
        Self { tx }
    }

    /// Stores `value` if the cell is pending. Returns `false` if it was already terminal.
    pub(crate) fn set_value(&self, value: R) -> bool {
        self.tx.send_if_modified(move |state| {
            if state.is_done() {
                return false;
            }
            *state = State::Value(value);
            true
        })
    }

    /// Stores `err` if the cell is pending. Returns `false` if it was already terminal.
    pub(crate) fn set_failure(&self, err: HandlerError) -> bool {
        self.tx.send_if_modified(move |state| {
            if state.is_done() {
                return false;
            }
            *state = State::Failure(err);
            true
        })
    }

    /// Current state (cloned).
    pub(crate) fn state(&self) -> State<R> {
        self.tx.borrow().clone()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.tx.borrow().is_done()
    }

    pub(crate) fn has_failure(&self) -> bool {
        matches!(*self.tx.borrow(), State::Failure(_))
    }

    pub(crate) fn failure(&self) -> Option<HandlerError> {
        match &*self.tx.borrow() {
            State::Failure(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Waits until the cell leaves `Pending` and returns the terminal state.
    pub(crate) async fn wait(&self) -> State<R> {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(State::is_done).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close while we wait.
            Err(_closed) => self.state(),
        }
    }
}
