//! In-memory collaborator implementations.
//!
//! Production deployments back the stores with real databases; these
//! map-backed versions are for development, demos, and tests. They are
//! deliberately boring — a `std::sync::Mutex` over a map, locked only
//! for the copy in or out.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gatecrash_progress::{PathStore, StoreError};
use gatecrash_protocol::{LeaderboardEntry, PlayerId, PlayerPath, Session, SessionId};
use gatecrash_session::{LeaderboardStore, SessionStore};

/// Session records in a map.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<SessionId, Session>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.lock().unwrap().get(&session_id).cloned())
    }

    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .insert(session.session_id, session.clone());
        Ok(())
    }
}

/// Player paths in a map.
#[derive(Default)]
pub struct MemoryPathStore {
    inner: Mutex<HashMap<PlayerId, PlayerPath>>,
}

#[async_trait]
impl PathStore for MemoryPathStore {
    async fn get(&self, player_id: PlayerId) -> Result<Option<PlayerPath>, StoreError> {
        Ok(self.inner.lock().unwrap().get(&player_id).cloned())
    }

    async fn update(&self, path: &PlayerPath) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .insert(path.player_id, path.clone());
        Ok(())
    }
}

/// Leaderboard rows in a vec, in insertion order.
#[derive(Default)]
pub struct MemoryLeaderboard {
    inner: Mutex<Vec<LeaderboardEntry>>,
}

impl MemoryLeaderboard {
    /// Everything recorded so far.
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        self.inner.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeaderboardStore for MemoryLeaderboard {
    async fn add_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        self.inner.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
