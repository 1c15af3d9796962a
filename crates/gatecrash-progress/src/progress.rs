//! Live progress views: per-player progress, session-wide progress
//! with a leader, and the in-game leaderboard ordering.
//!
//! Everything here is computed from a session snapshot plus path
//! state — the engine holds no mutable state of its own and never
//! talks to the connection registry (callers pass liveness in).

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gatecrash_protocol::{DoorId, Player, PlayerId, PlayerPath, Session, SessionId, SessionStatus};
use serde::{Deserialize, Serialize};

use crate::{PathStore, ProgressError};

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// One player's current standing in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProgress {
    pub player_id: PlayerId,
    pub username: String,
    pub current_position: u32,
    pub total_doors: u32,
    pub total_score: u32,
    pub average_score: f64,
    pub doors_completed: usize,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_response_at: Option<DateTime<Utc>>,
}

impl PlayerProgress {
    /// Progress toward the finish line as a fraction in `[0, 1]`.
    pub fn progress_fraction(&self) -> f64 {
        if self.total_doors == 0 {
            return 0.0;
        }
        f64::from(self.current_position) / f64::from(self.total_doors)
    }

    /// Progress as a percentage.
    pub fn progress_percent(&self) -> f64 {
        self.progress_fraction() * 100.0
    }
}

/// The whole session's standings at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub session_id: SessionId,
    pub players: Vec<PlayerProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_door_id: Option<DoorId>,
    pub status: SessionStatus,
    /// The player with the highest progress fraction. Ties favor
    /// whoever was computed first (roster order).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<PlayerId>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Computes derived views over session and path state.
pub struct ProgressEngine {
    paths: Arc<dyn PathStore>,
}

impl ProgressEngine {
    pub fn new(paths: Arc<dyn PathStore>) -> Self {
        Self { paths }
    }

    /// A player's path, or a synthesized default when the store has
    /// nothing (or fails): position = responses so far, total = 10.
    pub(crate) async fn path_or_default(&self, player: &Player) -> PlayerPath {
        match self.paths.get(player.player_id).await {
            Ok(Some(path)) => path,
            Ok(None) => PlayerPath::synthesized(player.player_id, player.responses.len() as u32),
            Err(err) => {
                tracing::debug!(
                    player_id = %player.player_id,
                    %err,
                    "path lookup failed, synthesizing default"
                );
                PlayerPath::synthesized(player.player_id, player.responses.len() as u32)
            }
        }
    }

    /// Current progress for one player.
    ///
    /// # Errors
    /// [`ProgressError::PlayerNotFound`] if the player is not on the
    /// session roster.
    pub async fn player_progress(
        &self,
        session: &Session,
        player_id: PlayerId,
    ) -> Result<PlayerProgress, ProgressError> {
        let player = session
            .player(player_id)
            .ok_or(ProgressError::PlayerNotFound(player_id))?;
        Ok(self.progress_for(player).await)
    }

    async fn progress_for(&self, player: &Player) -> PlayerProgress {
        let path = self.path_or_default(player).await;
        PlayerProgress {
            player_id: player.player_id,
            username: player.username.clone(),
            current_position: path.current_position,
            total_doors: path.total_doors,
            total_score: player.total_score,
            average_score: player.average_score(),
            doors_completed: player.responses.len(),
            is_active: player.is_active,
            last_response_at: player.last_response().map(|r| r.submitted_at),
        }
    }

    /// Progress for every player plus the current leader.
    pub async fn session_progress(&self, session: &Session) -> SessionProgress {
        let mut players = Vec::with_capacity(session.players.len());
        let mut leader: Option<PlayerId> = None;
        let mut best_fraction = -1.0_f64;

        for player in &session.players {
            let progress = self.progress_for(player).await;
            // Strictly greater: the first player computed keeps the
            // lead on a tie.
            if progress.progress_fraction() > best_fraction {
                best_fraction = progress.progress_fraction();
                leader = Some(player.player_id);
            }
            players.push(progress);
        }

        SessionProgress {
            session_id: session.session_id,
            players,
            current_door_id: session.current_door.as_ref().map(|d| d.door_id),
            status: session.status,
            leader,
            updated_at: Utc::now(),
        }
    }

    /// All players ordered for the in-game leaderboard: progress
    /// fraction descending, then average score descending. The sort is
    /// stable, so equally-placed players keep roster order.
    pub async fn leaderboard(&self, session: &Session) -> Vec<PlayerProgress> {
        let mut players = self.session_progress(session).await.players;
        players.sort_by(|a, b| {
            b.progress_fraction()
                .partial_cmp(&a.progress_fraction())
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.average_score
                        .partial_cmp(&a.average_score)
                        .unwrap_or(Ordering::Equal)
                })
        });
        players
    }

    /// Session progress with connection liveness overlaid: a player is
    /// shown active only if the registry currently holds a live
    /// channel for them. The caller supplies the active-id list — the
    /// engine has no registry dependency.
    pub async fn realtime_status(
        &self,
        session: &Session,
        active_players: &[PlayerId],
    ) -> SessionProgress {
        let mut progress = self.session_progress(session).await;
        for player in &mut progress.players {
            player.is_active = active_players.contains(&player.player_id);
        }
        progress
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gatecrash_protocol::{
        GameMode, Player, PlayerPath, Response, ResponseId, ScoreBreakdown, Session,
    };

    use super::*;
    use crate::StoreError;

    // -- Test doubles -----------------------------------------------------

    /// A path store backed by a plain map.
    #[derive(Default)]
    struct MapPaths {
        inner: Mutex<HashMap<PlayerId, PlayerPath>>,
    }

    impl MapPaths {
        fn with(paths: impl IntoIterator<Item = PlayerPath>) -> Arc<Self> {
            let store = Self::default();
            {
                let mut inner = store.inner.lock().unwrap();
                for path in paths {
                    inner.insert(path.player_id, path);
                }
            }
            Arc::new(store)
        }
    }

    #[async_trait]
    impl PathStore for MapPaths {
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

    /// A path store that is always down.
    struct BrokenPaths;

    #[async_trait]
    impl PathStore for BrokenPaths {
        async fn get(&self, _player_id: PlayerId) -> Result<Option<PlayerPath>, StoreError> {
            Err(StoreError::new("connection refused"))
        }

        async fn update(&self, _path: &PlayerPath) -> Result<(), StoreError> {
            Err(StoreError::new("connection refused"))
        }
    }

    // -- Helpers ----------------------------------------------------------

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn response(player: u64, door: u64, score: u32) -> Response {
        Response {
            response_id: ResponseId(door * 100 + player),
            door_id: DoorId(door),
            player_id: pid(player),
            content: "answer".into(),
            score,
            metrics: ScoreBreakdown::NEUTRAL,
            submitted_at: Utc::now(),
        }
    }

    fn player_with_scores(id: u64, name: &str, scores: &[u32]) -> Player {
        let mut player = Player::new(pid(id), name);
        for (i, score) in scores.iter().enumerate() {
            let r = response(id, i as u64 + 1, *score);
            player.total_score += r.score;
            player.responses.push(r);
        }
        player
    }

    fn session_with(players: Vec<Player>) -> Session {
        let mut iter = players.into_iter();
        let first = iter.next().expect("at least one player");
        let mut session = Session::new(SessionId(1), GameMode::Multiplayer, None, first);
        session.players.extend(iter);
        session
    }

    fn path(player: u64, position: u32, total: u32) -> PlayerPath {
        PlayerPath {
            current_position: position,
            total_doors: total,
            ..PlayerPath::new(pid(player), "general")
        }
    }

    // =====================================================================
    // player_progress()
    // =====================================================================

    #[tokio::test]
    async fn test_player_progress_reads_path_state() {
        let session = session_with(vec![player_with_scores(1, "alice", &[90, 85, 95, 88, 92])]);
        let engine = ProgressEngine::new(MapPaths::with([path(1, 5, 5)]));

        let progress = engine.player_progress(&session, pid(1)).await.unwrap();

        assert_eq!(progress.current_position, 5);
        assert_eq!(progress.total_doors, 5);
        assert_eq!(progress.average_score, 90.0);
        assert_eq!(progress.doors_completed, 5);
        assert!(progress.last_response_at.is_some());
    }

    #[tokio::test]
    async fn test_player_progress_unknown_player_fails() {
        let session = session_with(vec![player_with_scores(1, "alice", &[])]);
        let engine = ProgressEngine::new(MapPaths::with([]));

        let result = engine.player_progress(&session, pid(9)).await;

        assert!(matches!(
            result,
            Err(ProgressError::PlayerNotFound(p)) if p == pid(9)
        ));
    }

    #[tokio::test]
    async fn test_player_progress_synthesizes_path_when_store_fails() {
        // Store down → position falls back to responses-so-far, total
        // to the default 10. The request still succeeds.
        let session = session_with(vec![player_with_scores(1, "alice", &[60, 70, 80])]);
        let engine = ProgressEngine::new(Arc::new(BrokenPaths));

        let progress = engine.player_progress(&session, pid(1)).await.unwrap();

        assert_eq!(progress.current_position, 3);
        assert_eq!(progress.total_doors, PlayerPath::DEFAULT_LENGTH);
    }

    #[tokio::test]
    async fn test_player_progress_synthesizes_path_when_missing() {
        let session = session_with(vec![player_with_scores(1, "alice", &[50])]);
        let engine = ProgressEngine::new(MapPaths::with([]));

        let progress = engine.player_progress(&session, pid(1)).await.unwrap();

        assert_eq!(progress.current_position, 1);
        assert_eq!(progress.total_doors, 10);
    }

    // =====================================================================
    // session_progress()
    // =====================================================================

    #[tokio::test]
    async fn test_session_progress_picks_highest_fraction_leader() {
        let session = session_with(vec![
            player_with_scores(1, "alice", &[50]),
            player_with_scores(2, "bob", &[50]),
        ]);
        // Alice 2/10 = 0.2, Bob 3/10 = 0.3.
        let engine = ProgressEngine::new(MapPaths::with([path(1, 2, 10), path(2, 3, 10)]));

        let progress = engine.session_progress(&session).await;

        assert_eq!(progress.leader, Some(pid(2)));
        assert_eq!(progress.players.len(), 2);
    }

    #[tokio::test]
    async fn test_session_progress_leader_tie_favors_first_computed() {
        let session = session_with(vec![
            player_with_scores(1, "alice", &[50]),
            player_with_scores(2, "bob", &[50]),
        ]);
        let engine = ProgressEngine::new(MapPaths::with([path(1, 3, 10), path(2, 3, 10)]));

        let progress = engine.session_progress(&session).await;

        assert_eq!(progress.leader, Some(pid(1)));
    }

    // =====================================================================
    // leaderboard()
    // =====================================================================

    #[tokio::test]
    async fn test_leaderboard_orders_by_fraction_then_average() {
        let session = session_with(vec![
            player_with_scores(1, "alice", &[40, 40]), // avg 40
            player_with_scores(2, "bob", &[80, 80]),   // avg 80
            player_with_scores(3, "carol", &[60, 60]), // avg 60
        ]);
        // Alice 5/10, Bob 2/10, Carol 2/10.
        let engine = ProgressEngine::new(MapPaths::with([
            path(1, 5, 10),
            path(2, 2, 10),
            path(3, 2, 10),
        ]));

        let board = engine.leaderboard(&session).await;

        let order: Vec<PlayerId> = board.iter().map(|p| p.player_id).collect();
        // Alice leads on fraction; Bob beats Carol on average score.
        assert_eq!(order, vec![pid(1), pid(2), pid(3)]);
    }

    #[tokio::test]
    async fn test_leaderboard_is_stable_on_full_tie() {
        let session = session_with(vec![
            player_with_scores(1, "alice", &[70]),
            player_with_scores(2, "bob", &[70]),
        ]);
        let engine = ProgressEngine::new(MapPaths::with([path(1, 1, 10), path(2, 1, 10)]));

        let board = engine.leaderboard(&session).await;

        // Identical fraction and average: roster order is preserved.
        assert_eq!(board[0].player_id, pid(1));
        assert_eq!(board[1].player_id, pid(2));
    }

    // =====================================================================
    // realtime_status()
    // =====================================================================

    #[tokio::test]
    async fn test_realtime_status_overlays_connection_liveness() {
        let session = session_with(vec![
            player_with_scores(1, "alice", &[50]),
            player_with_scores(2, "bob", &[50]),
        ]);
        let engine = ProgressEngine::new(MapPaths::with([]));

        // Only Bob has a live connection right now.
        let progress = engine.realtime_status(&session, &[pid(2)]).await;

        assert!(!progress.players[0].is_active);
        assert!(progress.players[1].is_active);
    }
}
