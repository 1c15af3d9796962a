//! The coordinator front-end: creates sessions, routes calls to their
//! actors, and tears them down.
//!
//! A [`SessionHandle`] is a cheap clonable wrapper around a session
//! actor's command channel. The [`SessionCoordinator`] keeps one per
//! live session, keyed by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gatecrash_progress::ProgressEngine;
use gatecrash_protocol::{GameMode, Player, PlayerId, Session, SessionId};
use gatecrash_registry::ConnectionRegistry;
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::actor::{SessionCommand, spawn_session};
use crate::{Collaborators, CoordinatorConfig, SessionError};

/// Counter for generating unique session ids.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for session actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Handle to a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// The session's unique id.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Adds a player to the session. Valid only while Waiting.
    pub async fn join(
        &self,
        player_id: PlayerId,
        username: impl Into<String>,
    ) -> Result<Session, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Join {
                player_id,
                username: username.into(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?
    }

    /// Starts the game and presents the first door.
    pub async fn start(&self) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Start { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?
    }

    /// Submits a player's response to the open door and returns the
    /// score awarded.
    pub async fn submit_response(
        &self,
        player_id: PlayerId,
        text: impl Into<String>,
    ) -> Result<u32, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Submit {
                player_id,
                text: text.into(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?
    }

    /// A snapshot of the session's current state.
    pub async fn snapshot(&self) -> Result<Session, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Tells the session actor to shut down.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }
}

/// Creates, tracks, and routes to session actors.
pub struct SessionCoordinator {
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
    config: CoordinatorConfig,
    deps: Arc<Collaborators>,
    registry: Arc<ConnectionRegistry>,
    progress: Arc<ProgressEngine>,
}

impl SessionCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        deps: Collaborators,
        registry: Arc<ConnectionRegistry>,
        progress: Arc<ProgressEngine>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
            deps: Arc::new(deps),
            registry,
            progress,
        }
    }

    /// Creates a new session with the creator as its first player and
    /// spawns its actor. The session starts in `Waiting`.
    pub async fn create_session(
        &self,
        mode: GameMode,
        creator_id: PlayerId,
        username: impl Into<String>,
        theme: Option<String>,
    ) -> SessionHandle {
        let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let session = Session::new(session_id, mode, theme, Player::new(creator_id, username));

        // Write-through create; the actor owns the truth from here.
        if let Err(err) = self.deps.sessions.create(&session).await {
            tracing::warn!(%session_id, %err, "session store create failed");
        }

        let sender = spawn_session(
            session,
            self.config.clone(),
            Arc::clone(&self.deps),
            Arc::clone(&self.registry),
            Arc::clone(&self.progress),
            DEFAULT_CHANNEL_SIZE,
        );
        let handle = SessionHandle { session_id, sender };

        self.sessions
            .lock()
            .await
            .insert(session_id, handle.clone());

        tracing::info!(%session_id, %mode, %creator_id, "session created");
        handle
    }

    /// Looks up the handle for a session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no such session exists.
    pub async fn handle(&self, session_id: SessionId) -> Result<SessionHandle, SessionError> {
        self.sessions
            .lock()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::NotFound(session_id))
    }

    /// Routes a join to the session's actor.
    pub async fn join(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        username: impl Into<String>,
    ) -> Result<Session, SessionError> {
        self.handle(session_id).await?.join(player_id, username).await
    }

    /// Routes a start to the session's actor.
    pub async fn start(&self, session_id: SessionId) -> Result<(), SessionError> {
        self.handle(session_id).await?.start().await
    }

    /// Routes a response submission to the session's actor.
    pub async fn submit_response(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        text: impl Into<String>,
    ) -> Result<u32, SessionError> {
        self.handle(session_id)
            .await?
            .submit_response(player_id, text)
            .await
    }

    /// A snapshot of a session's current state.
    pub async fn session_status(&self, session_id: SessionId) -> Result<Session, SessionError> {
        self.handle(session_id).await?.snapshot().await
    }

    /// Shuts a session down and forgets it.
    pub async fn destroy_session(&self, session_id: SessionId) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .lock()
            .await
            .remove(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;
        let _ = handle.shutdown().await;
        tracing::info!(%session_id, "session destroyed");
        Ok(())
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Ids of every live session.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.lock().await.keys().copied().collect()
    }
}
