//! # Handler registry.
//!
//! Maps each [`EventType`] to its ordered handler list and keeps a separate wildcard
//! list. The registry itself is plain data; the dispatcher guards it with a lock and
//! never holds that lock across an `.await`.
//!
//! ## Rules
//! - Insertion order is preserved; the same handler may appear several times.
//! - Removal drops the **first** matching entry only.
//! - [`Registry::snapshot`] copies the handler list of one dispatch, so later
//!   (un)subscriptions never affect a dispatch already in flight.

use std::collections::HashMap;

use crate::events::EventType;
use crate::handlers::{Entry, HandlerKey};

/// Event-type → handler lists, plus wildcard handlers.
#[derive(Default)]
pub(crate) struct Registry {
    typed: HashMap<EventType, Vec<Entry>>,
    wildcard: Vec<Entry>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a typed handler, creating the list if absent.
    pub(crate) fn insert(&mut self, ty: EventType, entry: Entry) {
        self.typed.entry(ty).or_default().push(entry);
    }

    /// Appends a wildcard handler.
    pub(crate) fn insert_wildcard(&mut self, entry: Entry) {
        self.wildcard.push(entry);
    }

    /// Removes the first entry of `ty` registered under `key`.
    pub(crate) fn remove(&mut self, ty: EventType, key: HandlerKey) -> bool {
        let Some(list) = self.typed.get_mut(&ty) else {
            return false;
        };
        let removed = remove_first(list, key);
        if list.is_empty() {
            self.typed.remove(&ty);
        }
        removed
    }

    /// Removes the first wildcard entry registered under `key`.
    pub(crate) fn remove_wildcard(&mut self, key: HandlerKey) -> bool {
        remove_first(&mut self.wildcard, key)
    }

    /// Drops every handler of `ty`; wildcard handlers are kept.
    pub(crate) fn clear_type(&mut self, ty: EventType) -> usize {
        self.typed.remove(&ty).map_or(0, |list| list.len())
    }

    /// Drops every typed and wildcard handler.
    pub(crate) fn clear(&mut self) -> usize {
        let n = self.typed.values().map(Vec::len).sum::<usize>() + self.wildcard.len();
        self.typed.clear();
        self.wildcard.clear();
        n
    }

    /// Handlers of one dispatch: typed handlers of `ty` first, then wildcard handlers.
    pub(crate) fn snapshot(&self, ty: EventType) -> Vec<Entry> {
        let typed = self.typed.get(&ty).map_or(&[][..], Vec::as_slice);
        let mut out = Vec::with_capacity(typed.len() + self.wildcard.len());
        out.extend_from_slice(typed);
        out.extend_from_slice(&self.wildcard);
        out
    }

    pub(crate) fn len_of(&self, ty: EventType) -> usize {
        self.typed.get(&ty).map_or(0, Vec::len)
    }

    pub(crate) fn wildcard_len(&self) -> usize {
        self.wildcard.len()
    }

    /// Registered event types, sorted by name.
    pub(crate) fn types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = self.typed.keys().copied().collect();
        types.sort_unstable_by_key(|t| t.name());
        types
    }
}

fn remove_first(list: &mut Vec<Entry>, key: HandlerKey) -> bool {
    match list.iter().position(|e| e.key == key) {
        Some(idx) => {
            list.remove(idx);
            true
        }
        None => false,
    }
}
