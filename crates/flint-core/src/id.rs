//! Entity and component identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Global counter for component instance ids
static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// A random 128-bit entity identifier.
///
/// Every entity gets a fresh id when it is created, including entities
/// produced by cloning another entity. Ids never change after creation.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a new random EntityId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an EntityId from a raw value (for deserialization/testing)
    pub fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }

    /// Get the raw 128-bit value
    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one attached component instance.
///
/// Assigned when a component is attached to an entity. A clone of a
/// component attached to another entity always receives a new id.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocate the next unused ComponentId
    pub fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
