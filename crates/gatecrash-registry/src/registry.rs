//! The connection registry: one live channel per player, best-effort
//! fan-out, and a reconnection grace window.
//!
//! # Locking discipline
//!
//! All map state sits behind a single `tokio::sync::Mutex`. Every
//! public operation takes the lock once, mutates or snapshots, and
//! releases it **before** touching any channel — the lock covers map
//! mutation only, never delivery. Because register, unregister,
//! restore, and cleanup all serialize on the same lock, a cleanup
//! sweep can never race a restore for the same connection.
//!
//! # Failure semantics
//!
//! Nothing in here aborts a caller's larger workflow. A recipient
//! whose channel is gone is marked inactive and reported; everyone
//! else still gets the event.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use gatecrash_protocol::{Event, EventKind, PlayerId, SessionId};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{BroadcastReport, Connection, ConnectionInfo, EventSender, RegistryConfig};
use crate::RegistryError;

/// The maps the mutex guards: connection records plus the per-session
/// roster used for fan-out.
#[derive(Default)]
struct RegistryState {
    /// All known connections, keyed by player. A player has at most
    /// one connection, in at most one session.
    connections: HashMap<PlayerId, Connection>,

    /// Which players belong to which session's broadcast roster.
    /// Kept in sync with `connections`.
    rosters: HashMap<SessionId, Vec<PlayerId>>,
}

impl RegistryState {
    fn roster(&self, session_id: SessionId) -> &[PlayerId] {
        self.rosters
            .get(&session_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn add_to_roster(&mut self, session_id: SessionId, player_id: PlayerId) {
        let roster = self.rosters.entry(session_id).or_default();
        if !roster.contains(&player_id) {
            roster.push(player_id);
        }
    }

    fn remove_from_roster(&mut self, session_id: SessionId, player_id: PlayerId) {
        if let Some(roster) = self.rosters.get_mut(&session_id) {
            roster.retain(|p| *p != player_id);
            if roster.is_empty() {
                self.rosters.remove(&session_id);
            }
        }
    }
}

/// Tracks every player's live channel and fans events out to session
/// rosters.
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
    config: RegistryConfig,
}

impl ConnectionRegistry {
    /// Creates an empty registry with the given config.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            config,
        }
    }

    /// Attaches a live channel for `player_id` in `session_id`.
    ///
    /// Replaces any existing channel for that player (re-registration
    /// mid-session is allowed and idempotent), adds the player to the
    /// session roster if absent, and notifies the rest of the roster
    /// with a `player-connected` event.
    pub async fn register(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        channel: EventSender,
    ) {
        {
            let mut state = self.state.lock().await;
            state.connections.insert(
                player_id,
                Connection {
                    session_id,
                    channel,
                    last_seen: Instant::now(),
                    active: true,
                },
            );
            state.add_to_roster(session_id, player_id);
        }

        tracing::info!(%player_id, %session_id, "connection registered");

        let event = Event::for_player(
            EventKind::PlayerConnected,
            session_id,
            player_id,
            json!({ "playerId": player_id, "message": "Player connected" }),
        );
        self.broadcast_excluding(session_id, Some(player_id), event)
            .await;
    }

    /// Marks a player's connection inactive (it is **not** deleted —
    /// the record stays restorable until the grace window closes) and
    /// notifies the rest of the roster.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if the player has no connection.
    pub async fn unregister(&self, player_id: PlayerId) -> Result<(), RegistryError> {
        let session_id = {
            let mut state = self.state.lock().await;
            let conn = state
                .connections
                .get_mut(&player_id)
                .ok_or(RegistryError::NotFound(player_id))?;
            conn.active = false;
            // Stamp the disconnect moment; the grace window counts
            // from here.
            conn.last_seen = Instant::now();
            conn.session_id
        };

        tracing::info!(%player_id, %session_id, "connection unregistered, grace window open");

        let event = Event::for_player(
            EventKind::PlayerDisconnected,
            session_id,
            player_id,
            json!({ "playerId": player_id, "message": "Player disconnected" }),
        );
        self.broadcast_excluding(session_id, Some(player_id), event)
            .await;
        Ok(())
    }

    /// Re-attaches a channel to an existing, inactive connection.
    ///
    /// Succeeds only within the grace window. Past the window the
    /// stale record and its roster entry are purged and the restore
    /// fails — the player must go through a full re-join.
    ///
    /// # Errors
    /// - [`RegistryError::NotFound`] — no record to restore.
    /// - [`RegistryError::GraceExpired`] — too late; record purged.
    pub async fn restore(
        &self,
        player_id: PlayerId,
        channel: EventSender,
    ) -> Result<SessionId, RegistryError> {
        let session_id = {
            let mut state = self.state.lock().await;
            let conn = state
                .connections
                .get(&player_id)
                .ok_or(RegistryError::NotFound(player_id))?;
            let session_id = conn.session_id;

            if conn.last_seen.elapsed() > self.config.grace {
                state.connections.remove(&player_id);
                state.remove_from_roster(session_id, player_id);
                tracing::info!(%player_id, %session_id, "restore past grace window, record purged");
                return Err(RegistryError::GraceExpired(player_id));
            }

            let conn = state
                .connections
                .get_mut(&player_id)
                .expect("checked above");
            conn.channel = channel;
            conn.active = true;
            conn.last_seen = Instant::now();
            session_id
        };

        tracing::info!(%player_id, %session_id, "connection restored");

        let event = Event::for_player(
            EventKind::PlayerReconnected,
            session_id,
            player_id,
            json!({ "playerId": player_id, "message": "Player reconnected" }),
        );
        self.broadcast_excluding(session_id, Some(player_id), event)
            .await;
        Ok(session_id)
    }

    /// Fans `event` out to every player on the session roster.
    ///
    /// Delivery to each recipient is attempted independently; a write
    /// failure marks only that recipient inactive and never stops the
    /// rest of the fan-out. The report aggregates what happened.
    pub async fn broadcast(&self, session_id: SessionId, event: Event) -> BroadcastReport {
        self.broadcast_excluding(session_id, None, event).await
    }

    /// Delivers an event to one player.
    ///
    /// # Errors
    /// - [`RegistryError::NotFound`] — player has no connection.
    /// - [`RegistryError::Inactive`] — connection exists but is down.
    /// - [`RegistryError::ChannelClosed`] — the receiving task is
    ///   gone; the connection is now marked inactive.
    pub async fn send(&self, player_id: PlayerId, event: Event) -> Result<(), RegistryError> {
        let channel = {
            let mut state = self.state.lock().await;
            let conn = state
                .connections
                .get_mut(&player_id)
                .ok_or(RegistryError::NotFound(player_id))?;
            if !conn.active {
                return Err(RegistryError::Inactive(player_id));
            }
            conn.last_seen = Instant::now();
            conn.channel.clone()
        };

        if channel.send(event).is_err() {
            let mut state = self.state.lock().await;
            if let Some(conn) = state.connections.get_mut(&player_id) {
                conn.active = false;
            }
            tracing::debug!(%player_id, "send failed, connection marked inactive");
            return Err(RegistryError::ChannelClosed(player_id));
        }
        Ok(())
    }

    /// The currently-active subset of a session's roster.
    ///
    /// This is what the progress engine uses to annotate "is this
    /// player currently connected".
    pub async fn active_connections(&self, session_id: SessionId) -> Vec<PlayerId> {
        let state = self.state.lock().await;
        state
            .roster(session_id)
            .iter()
            .filter(|p| state.connections.get(p).is_some_and(|c| c.active))
            .copied()
            .collect()
    }

    /// Snapshots of every connection on a session's roster.
    pub async fn connections(&self, session_id: SessionId) -> Vec<ConnectionInfo> {
        let state = self.state.lock().await;
        state
            .roster(session_id)
            .iter()
            .filter_map(|p| {
                state.connections.get(p).map(|c| ConnectionInfo {
                    player_id: *p,
                    session_id: c.session_id,
                    active: c.active,
                })
            })
            .collect()
    }

    /// Purges connections that have been inactive for longer than the
    /// grace window, removing them from their session roster. Returns
    /// the purged player ids.
    pub async fn cleanup(&self) -> Vec<PlayerId> {
        let mut state = self.state.lock().await;

        let expired: Vec<(PlayerId, SessionId)> = state
            .connections
            .iter()
            .filter(|(_, c)| !c.active && c.last_seen.elapsed() > self.config.grace)
            .map(|(p, c)| (*p, c.session_id))
            .collect();

        for (player_id, session_id) in &expired {
            state.connections.remove(player_id);
            state.remove_from_roster(*session_id, *player_id);
            tracing::info!(%player_id, %session_id, "stale connection purged");
        }

        expired.into_iter().map(|(p, _)| p).collect()
    }

    /// Starts the periodic cleanup sweep and returns its task handle
    /// so the owner can abort it on shutdown.
    pub fn spawn_cleanup(self: Arc<Self>) -> JoinHandle<()> {
        let registry = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(registry.config.cleanup_interval);
            // The first tick fires immediately; skip it so the sweep
            // runs on the configured cadence.
            interval.tick().await;
            loop {
                interval.tick().await;
                let purged = registry.cleanup().await;
                if !purged.is_empty() {
                    tracing::debug!(count = purged.len(), "cleanup sweep purged connections");
                }
            }
        })
    }

    /// Number of tracked connections (any state).
    pub async fn len(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// `true` if no connections are tracked.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.connections.is_empty()
    }

    /// Fan-out core: snapshot the roster's channels under the lock,
    /// deliver outside it, then mark failures in a second short
    /// critical section.
    async fn broadcast_excluding(
        &self,
        session_id: SessionId,
        exclude: Option<PlayerId>,
        event: Event,
    ) -> BroadcastReport {
        // Snapshot (player, channel-if-usable) under the lock.
        let targets: Vec<(PlayerId, Option<EventSender>)> = {
            let state = self.state.lock().await;
            let roster = state.roster(session_id);
            if roster.is_empty() {
                tracing::warn!(%session_id, kind = %event.kind, "broadcast to empty or unknown roster");
                return BroadcastReport::default();
            }
            roster
                .iter()
                .filter(|p| Some(**p) != exclude)
                .map(|p| {
                    let channel = state
                        .connections
                        .get(p)
                        .filter(|c| c.active)
                        .map(|c| c.channel.clone());
                    (*p, channel)
                })
                .collect()
        };

        // Deliver outside the lock.
        let mut report = BroadcastReport {
            attempted: targets.len(),
            ..BroadcastReport::default()
        };
        let mut delivered: Vec<PlayerId> = Vec::with_capacity(targets.len());
        for (player_id, channel) in targets {
            match channel {
                Some(ch) if ch.send(event.clone()).is_ok() => delivered.push(player_id),
                _ => {
                    tracing::debug!(%player_id, kind = %event.kind, "delivery failed");
                    report.failed.push(player_id);
                }
            }
        }
        report.delivered = delivered.len();

        // Second short critical section: refresh the healthy, demote
        // the dead.
        if !report.failed.is_empty() || !delivered.is_empty() {
            let mut state = self.state.lock().await;
            for player_id in &delivered {
                if let Some(conn) = state.connections.get_mut(player_id) {
                    conn.last_seen = Instant::now();
                }
            }
            for player_id in &report.failed {
                if let Some(conn) = state.connections.get_mut(player_id) {
                    conn.active = false;
                }
            }
        }

        if !report.is_complete() {
            tracing::warn!(
                %session_id,
                kind = %event.kind,
                delivered = report.delivered,
                failed = report.failed.len(),
                "partial broadcast delivery"
            );
        }

        report
    }

    /// Test hook: pretend a connection was last seen `by` ago.
    #[cfg(test)]
    async fn backdate(&self, player_id: PlayerId, by: std::time::Duration) {
        let mut state = self.state.lock().await;
        if let Some(conn) = state.connections.get_mut(&player_id) {
            conn.last_seen = Instant::now()
                .checked_sub(by)
                .expect("backdate within Instant range");
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
