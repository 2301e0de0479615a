//! # Event payloads, identifiers and routing keys.
//!
//! A [`Payload`] is the caller-defined data of an event. Its concrete Rust type is the
//! routing key: [`EventType::of`] turns it into a hashable token the dispatcher keys
//! its registry with. There is no subtyping; two payload types never match each other.
//!
//! ## Example
//! ```rust
//! use busify::{EventType, Payload};
//!
//! struct OrderPlaced {
//!     order_id: String,
//!     amount: f64,
//! }
//!
//! impl Payload for OrderPlaced {
//!     type Output = String;
//! }
//!
//! let ty = EventType::of::<OrderPlaced>();
//! assert_eq!(ty.name(), "OrderPlaced");
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

/// Data carried by an event.
///
/// `Output` is the type of the value handlers may complete the event with. Use `()`
/// for events nobody is expected to answer.
pub trait Payload: Send + Sync + 'static {
    /// Result type stored in the event's completion cell.
    type Output: Clone + Send + Sync + 'static;

    /// Human-readable name (for logs and errors).
    ///
    /// Defaults to the unqualified type name.
    fn name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strips the module path (and generic arguments) from a fully qualified type name.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Routing key of an event: the identity of its payload type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for diagnostics.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the routing key of payload type `P`.
    #[inline]
    pub fn of<P: Payload>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            name: P::name(),
        }
    }

    /// Underlying type identifier.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Payload name as reported by [`Payload::name`].
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Unique identifier of an event instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID value.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
