//! The path-store seam.
//!
//! Player paths live in an external store — typically a graph
//! database keyed by player. The engine only ever *reads* through this
//! trait; the coordinator also writes through it. Implementations are
//! expected to fail intermittently — every caller has a fallback.

use async_trait::async_trait;
use gatecrash_protocol::{PlayerId, PlayerPath};

/// A storage-layer failure, opaque to the caller beyond its message.
///
/// Deliberately a single struct rather than an enum: callers never
/// branch on store failures, they degrade and log.
#[derive(Debug, Clone, thiserror::Error)]
#[error("store operation failed: {0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Read/write access to per-player adaptive path state.
#[async_trait]
pub trait PathStore: Send + Sync {
    /// Fetches a player's path, `None` if they have none yet.
    async fn get(&self, player_id: PlayerId) -> Result<Option<PlayerPath>, StoreError>;

    /// Upserts a player's path.
    async fn update(&self, path: &PlayerPath) -> Result<(), StoreError>;
}
