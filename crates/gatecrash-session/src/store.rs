//! Persistence seams: the session and leaderboard stores.
//!
//! The actor's in-memory `Session` is the source of truth; these
//! traits are write-through persistence. Implementations are external
//! collaborators (document store, cache) and every write through them
//! is best-effort from the coordinator's point of view.

use async_trait::async_trait;
use gatecrash_progress::StoreError;
use gatecrash_protocol::{LeaderboardEntry, Session, SessionId};

/// Durable session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches a persisted session, `None` if unknown.
    async fn get(&self, session_id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Persists a newly-created session.
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    /// Persists the latest state of an existing session.
    async fn update(&self, session: &Session) -> Result<(), StoreError>;
}

/// The global leaderboard sink. One entry is written per player with
/// at least one response when their session completes.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    async fn add_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError>;
}
