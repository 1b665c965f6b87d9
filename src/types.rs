//! Basic type definitions for the chat server
//!
//! Provides the `UserId` newtype wrapper for type safety: a UUID-based
//! identifier minted once per WebSocket connection.

use uuid::Uuid;

/// Unique user identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe user identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
