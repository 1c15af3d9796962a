//! Session actor: an isolated Tokio task that owns one game.
//!
//! Each session runs in its own task, communicating with the outside
//! world through an mpsc command channel. The mailbox is the
//! concurrency design: join, start, submit, timeout-fire, and
//! round-advance are all commands processed strictly one at a time, so
//! two players submitting "simultaneously" can never lose each other's
//! update — there is no shared mutable session state to race on.
//!
//! # Round lifecycle
//!
//! ```text
//!           present_door
//!                │ (arms 60s timer for this exact door id)
//!                ▼
//!           round open ──(all active players responded)──┐
//!                │                                        │
//!                │ (timer fires, door id still current)   │
//!                ▼                                        ▼
//!           close_round  ←──── both paths converge ───────┘
//!                │  (timer aborted; late fires no-op on the id guard)
//!                ├── a player finished their path → complete_session
//!                └── otherwise: pause, then Advance → present_door
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use gatecrash_progress::{PathStore, ProgressEngine};
use gatecrash_protocol::{
    Door, DoorId, Event, EventKind, GameMode, LeaderboardEntry, Player, PlayerId, PlayerPath,
    Response, ResponseId, ScoreBreakdown, Session, SessionStatus,
};
use gatecrash_registry::ConnectionRegistry;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::doors::{DoorSource, StockDoors};
use crate::oracle::ScoreOracle;
use crate::store::{LeaderboardStore, SessionStore};
use crate::{CoordinatorConfig, SessionError, adapt};

/// Counter for generating unique response ids.
static NEXT_RESPONSE_ID: AtomicU64 = AtomicU64::new(1);

fn next_response_id() -> ResponseId {
    ResponseId(NEXT_RESPONSE_ID.fetch_add(1, Ordering::Relaxed))
}

/// The external collaborators a session needs: scoring, door content,
/// and the three stores. All behind trait objects so deployments (and
/// tests) can swap them freely.
pub struct Collaborators {
    pub oracle: Arc<dyn ScoreOracle>,
    pub doors: Arc<dyn DoorSource>,
    pub paths: Arc<dyn PathStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub leaderboard: Arc<dyn LeaderboardStore>,
}

/// Commands sent to a session actor through its channel.
///
/// The `oneshot::Sender` in the request variants is the reply channel;
/// fire-and-forget variants come from the actor's own helper tasks.
pub(crate) enum SessionCommand {
    /// Add a player to the session (valid while Waiting).
    Join {
        player_id: PlayerId,
        username: String,
        reply: oneshot::Sender<Result<Session, SessionError>>,
    },

    /// Start the game and present the first door.
    Start {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Submit a player's response to the open door. Replies with the
    /// overall score awarded.
    Submit {
        player_id: PlayerId,
        text: String,
        reply: oneshot::Sender<Result<u32, SessionError>>,
    },

    /// Request a snapshot of the current session state.
    Snapshot { reply: oneshot::Sender<Session> },

    /// The response window for this exact door expired.
    RoundTimeout { door_id: DoorId },

    /// The inter-round pause elapsed; present the next door.
    Advance,

    /// Tear the actor down.
    Shutdown,
}

/// The open round: which door, and the timer racing it.
struct OpenRound {
    door_id: DoorId,
    timer: JoinHandle<()>,
}

/// The per-session actor state. Runs inside a Tokio task.
pub(crate) struct SessionActor {
    session: Session,
    config: CoordinatorConfig,
    deps: Arc<Collaborators>,
    registry: Arc<ConnectionRegistry>,
    progress: Arc<ProgressEngine>,
    round: Option<OpenRound>,
    receiver: mpsc::Receiver<SessionCommand>,
    /// Handed to timeout/advance tasks so they can call back in.
    self_sender: mpsc::Sender<SessionCommand>,
}

impl SessionActor {
    /// Runs the actor loop, processing commands until shutdown.
    pub(crate) async fn run(mut self) {
        tracing::info!(session_id = %self.session.session_id, "session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Join {
                    player_id,
                    username,
                    reply,
                } => {
                    let result = self.handle_join(player_id, username).await;
                    let _ = reply.send(result);
                }
                SessionCommand::Start { reply } => {
                    let result = self.handle_start().await;
                    let _ = reply.send(result);
                }
                SessionCommand::Submit {
                    player_id,
                    text,
                    reply,
                } => {
                    let result = self.handle_submit(player_id, text).await;
                    let _ = reply.send(result);
                    // "All responded" closes the round without waiting
                    // for the timer.
                    if let Some(door_id) = self.round.as_ref().map(|r| r.door_id) {
                        if self.session.all_active_responded(door_id) {
                            self.close_round(door_id).await;
                        }
                    }
                }
                SessionCommand::Snapshot { reply } => {
                    let _ = reply.send(self.session.clone());
                }
                SessionCommand::RoundTimeout { door_id } => {
                    self.handle_timeout(door_id).await;
                }
                SessionCommand::Advance => {
                    self.handle_advance().await;
                }
                SessionCommand::Shutdown => {
                    tracing::info!(session_id = %self.session.session_id, "session shutting down");
                    break;
                }
            }
        }

        if let Some(round) = self.round.take() {
            round.timer.abort();
        }
        tracing::info!(session_id = %self.session.session_id, "session actor stopped");
    }

    // -----------------------------------------------------------------
    // Join / start
    // -----------------------------------------------------------------

    async fn handle_join(
        &mut self,
        player_id: PlayerId,
        username: String,
    ) -> Result<Session, SessionError> {
        let session_id = self.session.session_id;
        self.require_status(SessionStatus::Waiting)?;
        if self.session.contains_player(player_id) {
            return Err(SessionError::AlreadyJoined(player_id, session_id));
        }
        match self.session.mode {
            GameMode::Multiplayer if self.session.players.len() >= self.config.max_players => {
                return Err(SessionError::SessionFull(session_id));
            }
            GameMode::SinglePlayer if !self.session.players.is_empty() => {
                return Err(SessionError::SinglePlayerOccupied(session_id));
            }
            _ => {}
        }

        self.session
            .players
            .push(Player::new(player_id, username.clone()));
        self.persist().await;

        tracing::info!(
            %session_id,
            %player_id,
            players = self.session.players.len(),
            "player joined"
        );

        self.broadcast(Event::for_player(
            EventKind::PlayerJoined,
            session_id,
            player_id,
            json!({
                "playerId": player_id,
                "username": username.clone(),
                "message": format!("{username} joined the game"),
            }),
        ))
        .await;

        Ok(self.session.clone())
    }

    async fn handle_start(&mut self) -> Result<(), SessionError> {
        let session_id = self.session.session_id;
        self.require_status(SessionStatus::Waiting)?;
        if self.session.mode == GameMode::Multiplayer
            && self.session.players.len() < self.config.min_multiplayer_players
        {
            return Err(SessionError::NotEnoughPlayers {
                session: session_id,
                have: self.session.players.len(),
                need: self.config.min_multiplayer_players,
            });
        }

        self.session.status = SessionStatus::Active;
        self.session.started_at = Some(Utc::now());
        self.persist().await;

        tracing::info!(%session_id, players = self.session.players.len(), "game started");

        self.broadcast(Event::new(
            EventKind::GameStarted,
            session_id,
            json!({
                "message": "Game has started!",
                "startedAt": self.session.started_at,
            }),
        ))
        .await;

        // Everyone begins behind the same easiest door.
        let theme = self.theme();
        let door = self.fetch_door(&theme, Door::MIN_DIFFICULTY).await;
        self.present_door(door).await;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Rounds
    // -----------------------------------------------------------------

    /// Sets the current door, announces it, and arms the timeout for
    /// this exact door id.
    async fn present_door(&mut self, door: Door) {
        let session_id = self.session.session_id;
        let door_id = door.door_id;
        let limit = self.config.response_time_limit;

        self.session.current_door = Some(door.clone());
        self.persist().await;

        self.broadcast(Event::new(
            EventKind::DoorPresented,
            session_id,
            json!({
                "door": door,
                "message": format!(
                    "New door presented! You have {} seconds to respond.",
                    limit.as_secs()
                ),
                "timeLimit": limit.as_secs(),
            }),
        ))
        .await;

        // The handle is held so an early close can cancel the timer; a
        // fire that slips through anyway is no-opped by the door-id
        // guard in handle_timeout.
        let sender = self.self_sender.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            let _ = sender.send(SessionCommand::RoundTimeout { door_id }).await;
        });
        self.round = Some(OpenRound { door_id, timer });

        tracing::info!(%session_id, %door_id, "round opened");
    }

    async fn handle_submit(
        &mut self,
        player_id: PlayerId,
        text: String,
    ) -> Result<u32, SessionError> {
        let session_id = self.session.session_id;
        self.require_status(SessionStatus::Active)?;

        let door = match (&self.round, &self.session.current_door) {
            (Some(round), Some(door)) if round.door_id == door.door_id => door.clone(),
            _ => return Err(SessionError::NoOpenRound(session_id)),
        };
        if !self.session.contains_player(player_id) {
            return Err(SessionError::NotAMember(player_id, session_id));
        }
        if self
            .session
            .player(player_id)
            .is_some_and(|p| p.has_responded(door.door_id))
        {
            return Err(SessionError::DuplicateResponse(player_id, door.door_id));
        }
        if text.is_empty() {
            return Err(SessionError::EmptyResponse);
        }
        let len = text.chars().count();
        if len > self.config.max_response_chars {
            return Err(SessionError::ResponseTooLong {
                len,
                limit: self.config.max_response_chars,
            });
        }

        // Validation passed — from here the submission succeeds,
        // degrading on collaborator failures instead of erroring.
        let metrics = match self.deps.oracle.score(&door, &text).await {
            Ok(metrics) => metrics,
            Err(err) => {
                tracing::warn!(%session_id, %player_id, %err, "oracle failed, substituting neutral score");
                ScoreBreakdown::NEUTRAL
            }
        };
        let score = metrics.total();

        let response = Response {
            response_id: next_response_id(),
            door_id: door.door_id,
            player_id,
            content: text,
            score,
            metrics,
            submitted_at: Utc::now(),
        };

        let (username, total_score) = {
            let player = self
                .session
                .player_mut(player_id)
                .expect("membership checked above");
            player.responses.push(response.clone());
            player.total_score += score;
            (player.username.clone(), player.total_score)
        };
        self.persist().await;
        self.update_path(player_id, door.door_id, score).await;

        tracing::info!(%session_id, %player_id, score, "response scored");

        self.broadcast(Event::for_player(
            EventKind::ResponseSubmitted,
            session_id,
            player_id,
            json!({
                "playerId": player_id,
                "responseId": response.response_id,
                "score": score,
                "submittedAt": response.submitted_at,
                "message": format!("Player {username} submitted their response"),
            }),
        ))
        .await;
        self.broadcast(Event::for_player(
            EventKind::RealTimeScoreUpdate,
            session_id,
            player_id,
            json!({
                "playerId": player_id,
                "username": username.clone(),
                "newScore": score,
                "totalScore": total_score,
                "message": format!("{username} scored {score} points!"),
            }),
        ))
        .await;
        if let Ok(progress) = self.progress.player_progress(&self.session, player_id).await {
            self.broadcast(Event::for_player(
                EventKind::PlayerProgressUpdate,
                session_id,
                player_id,
                json!({
                    "playerId": player_id,
                    "username": progress.username,
                    "currentPosition": progress.current_position,
                    "totalDoors": progress.total_doors,
                    "progressPercent": progress.progress_percent(),
                    "totalScore": progress.total_score,
                    "averageScore": progress.average_score,
                    "doorsCompleted": progress.doors_completed,
                    "newScore": score,
                }),
            ))
            .await;
        }

        Ok(score)
    }

    /// The armed timer fired. Only acts if this exact door's round is
    /// still open — a timeout racing a just-closed round is a no-op.
    async fn handle_timeout(&mut self, door_id: DoorId) {
        let still_open = self.session.status.is_active()
            && self.round.as_ref().is_some_and(|r| r.door_id == door_id)
            && self
                .session
                .current_door
                .as_ref()
                .is_some_and(|d| d.door_id == door_id);
        if !still_open {
            tracing::debug!(%door_id, "stale round timeout ignored");
            return;
        }

        tracing::info!(
            session_id = %self.session.session_id,
            %door_id,
            "response window expired, evaluating partial responses"
        );

        self.broadcast(Event::new(
            EventKind::ResponseTimeout,
            self.session.session_id,
            json!({
                "doorId": door_id,
                "message": "Time's up! Processing responses from players who submitted.",
            }),
        ))
        .await;

        self.close_round(door_id).await;
    }

    /// Round evaluation. Both the all-responded path and the timeout
    /// path converge here; the door-id check makes a second arrival a
    /// no-op, so a round can never be evaluated twice.
    async fn close_round(&mut self, door_id: DoorId) {
        let Some(round) = self.round.take_if(|r| r.door_id == door_id) else {
            return;
        };
        round.timer.abort();
        let session_id = self.session.session_id;
        self.session.current_door = None;

        let scores: Vec<serde_json::Value> = self
            .session
            .door_scores(door_id)
            .into_iter()
            .map(|(player_id, score)| json!({ "playerId": player_id, "score": score }))
            .collect();
        self.broadcast(Event::new(
            EventKind::ScoresUpdated,
            session_id,
            json!({
                "doorId": door_id,
                "scores": scores,
                "message": "Round complete! Scores updated.",
            }),
        ))
        .await;

        // Refresh every derived view for the roster.
        let progress = self.progress.session_progress(&self.session).await;
        self.broadcast(Event::new(
            EventKind::ProgressUpdate,
            session_id,
            json!({ "progress": progress }),
        ))
        .await;
        for player in &progress.players {
            self.broadcast(Event::for_player(
                EventKind::PlayerPositionUpdate,
                session_id,
                player.player_id,
                json!({
                    "playerId": player.player_id,
                    "currentPosition": player.current_position,
                    "totalDoors": player.total_doors,
                    "progressPercent": player.progress_percent(),
                }),
            ))
            .await;
        }
        let leaderboard = self.progress.leaderboard(&self.session).await;
        self.broadcast(Event::new(
            EventKind::LeaderboardUpdate,
            session_id,
            json!({
                "leaderboard": leaderboard,
                "message": "Leaderboard updated",
            }),
        ))
        .await;

        tracing::info!(%session_id, %door_id, "round closed");

        // Win check in roster order: the first player whose position
        // has reached their path length takes the session, even if
        // several qualified in the same pass.
        let mut winner = None;
        for player in &self.session.players {
            let path = self.read_path(player).await;
            if path.is_complete() {
                winner = Some(player.player_id);
                break;
            }
        }

        match winner {
            Some(winner_id) => self.complete_session(winner_id).await,
            None => {
                self.persist().await;
                // Breather so players can read the scores, then the
                // next door. Delivered as a command so the actor stays
                // responsive to snapshots while it waits.
                let sender = self.self_sender.clone();
                let pause = self.config.inter_round_pause;
                tokio::spawn(async move {
                    tokio::time::sleep(pause).await;
                    let _ = sender.send(SessionCommand::Advance).await;
                });
            }
        }
    }

    /// The inter-round pause elapsed. Stale arrivals (session already
    /// completed, or a round somehow already open) are dropped.
    async fn handle_advance(&mut self) {
        if !self.session.status.is_active() || self.round.is_some() {
            return;
        }
        let door = self.select_next_door().await;
        self.present_door(door).await;
    }

    /// Picks the next door. Multiplayer shares one door whose
    /// difficulty tracks the group's rolling average; single-player
    /// follows the lone player's adapted path.
    async fn select_next_door(&self) -> Door {
        match self.session.mode {
            GameMode::Multiplayer => {
                let latest: Vec<u32> = self
                    .session
                    .active_players()
                    .filter_map(|p| p.last_response().map(|r| r.score))
                    .collect();
                let average = if latest.is_empty() {
                    50
                } else {
                    latest.iter().sum::<u32>() / latest.len() as u32
                };
                let difficulty = adapt::difficulty_for_score(average);
                self.fetch_door(&self.theme(), difficulty).await
            }
            GameMode::SinglePlayer => match self.session.players.first() {
                Some(player) => {
                    let path = self.read_path(player).await;
                    self.fetch_door(&path.theme, path.current_difficulty).await
                }
                // The roster can't be empty once started; don't panic
                // over it if it somehow is.
                None => self.fetch_door("general", Door::MIN_DIFFICULTY).await,
            },
        }
    }

    // -----------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------

    async fn complete_session(&mut self, winner_id: PlayerId) {
        let session_id = self.session.session_id;
        debug_assert!(
            self.session
                .status
                .can_transition_to(SessionStatus::Completed)
        );
        self.session.status = SessionStatus::Completed;
        self.session.completed_at = Some(Utc::now());
        self.persist().await;

        let rankings = self.progress.final_rankings(&self.session).await;
        let stats = self.progress.performance_statistics(&self.session).await;

        let game_duration = match (self.session.started_at, self.session.completed_at) {
            (Some(started), Some(completed)) => completed
                .signed_duration_since(started)
                .to_std()
                .unwrap_or_default(),
            _ => std::time::Duration::ZERO,
        };

        // One leaderboard row per player who actually played.
        for player in &self.session.players {
            if player.responses.is_empty() {
                continue;
            }
            let entry = LeaderboardEntry {
                player_id: player.player_id,
                username: player.username.clone(),
                completion_time: game_duration,
                total_score: player.total_score,
                average_score: player.average_score(),
                doors_completed: player.responses.len(),
                game_mode: self.session.mode,
                theme: self.session.theme.clone(),
                session_id,
                completed_at: self.session.completed_at.unwrap_or_else(Utc::now),
            };
            if let Err(err) = self.deps.leaderboard.add_entry(&entry).await {
                tracing::warn!(%session_id, player_id = %player.player_id, %err, "leaderboard write failed");
            }
        }

        let winner_username = self
            .session
            .player(winner_id)
            .map(|p| p.username.clone())
            .unwrap_or_else(|| "unknown".to_string());

        self.broadcast(Event::new(
            EventKind::FinalRankings,
            session_id,
            json!({ "rankings": rankings, "message": "Final rankings calculated" }),
        ))
        .await;
        self.broadcast(Event::new(
            EventKind::PerformanceStatistics,
            session_id,
            json!({ "statistics": stats, "message": "Performance statistics calculated" }),
        ))
        .await;
        let final_board = self.progress.leaderboard(&self.session).await;
        self.broadcast(Event::new(
            EventKind::LeaderboardUpdate,
            session_id,
            json!({ "leaderboard": final_board, "message": "Leaderboard updated" }),
        ))
        .await;
        self.broadcast(Event::for_player(
            EventKind::GameCompleted,
            session_id,
            winner_id,
            json!({
                "winnerId": winner_id,
                "winnerUsername": winner_username.clone(),
                "message": format!("{winner_username} has won the game!"),
                "completedAt": self.session.completed_at,
                "finalRankings": rankings,
                "performanceStats": stats,
                "gameMode": self.session.mode,
                "gameDuration": game_duration,
            }),
        ))
        .await;

        tracing::info!(%session_id, %winner_id, "session completed");
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    fn require_status(&self, required: SessionStatus) -> Result<(), SessionError> {
        if self.session.status == required {
            Ok(())
        } else {
            Err(SessionError::InvalidStatus {
                session: self.session.session_id,
                actual: self.session.status,
                required,
            })
        }
    }

    fn theme(&self) -> String {
        self.session
            .theme
            .clone()
            .unwrap_or_else(|| "general".to_string())
    }

    async fn fetch_door(&self, theme: &str, difficulty: u8) -> Door {
        match self.deps.doors.next_door(theme, difficulty).await {
            Ok(door) => door,
            Err(err) => {
                tracing::warn!(%err, theme, difficulty, "door source failed, using stock catalog");
                StockDoors::pick(theme, difficulty)
            }
        }
    }

    /// Read-side path lookup: a miss or failure synthesizes the
    /// default (position = responses so far, total = 10).
    async fn read_path(&self, player: &Player) -> PlayerPath {
        match self.deps.paths.get(player.player_id).await {
            Ok(Some(path)) => path,
            Ok(None) => PlayerPath::synthesized(player.player_id, player.responses.len() as u32),
            Err(err) => {
                tracing::warn!(player_id = %player.player_id, %err, "path read failed, synthesizing");
                PlayerPath::synthesized(player.player_id, player.responses.len() as u32)
            }
        }
    }

    /// Applies the adaptation rule to the player's path and writes it
    /// back, best-effort.
    async fn update_path(&self, player_id: PlayerId, door_id: DoorId, score: u32) {
        let mut path = match self.deps.paths.get(player_id).await {
            Ok(Some(path)) => path,
            Ok(None) => PlayerPath::new(player_id, self.theme()),
            Err(err) => {
                tracing::warn!(%player_id, %err, "path read failed, synthesizing before update");
                // The new response is already appended; the synthesized
                // position must reflect the doors passed *before* it.
                let before = self
                    .session
                    .player(player_id)
                    .map(|p| p.responses.len().saturating_sub(1) as u32)
                    .unwrap_or(0);
                PlayerPath::synthesized(player_id, before)
            }
        };

        adapt::apply_score(&mut path, door_id, score);

        if let Err(err) = self.deps.paths.update(&path).await {
            tracing::warn!(%player_id, %err, "path store update failed");
        }
    }

    async fn persist(&self) {
        if let Err(err) = self.deps.sessions.update(&self.session).await {
            tracing::warn!(
                session_id = %self.session.session_id,
                %err,
                "session store update failed"
            );
        }
    }

    async fn broadcast(&self, event: Event) {
        let report = self
            .registry
            .broadcast(self.session.session_id, event)
            .await;
        if !report.is_complete() {
            tracing::debug!(
                session_id = %self.session.session_id,
                failed = report.failed.len(),
                "broadcast delivered partially"
            );
        }
    }
}

/// Spawns a session actor task and returns the command sender.
pub(crate) fn spawn_session(
    session: Session,
    config: CoordinatorConfig,
    deps: Arc<Collaborators>,
    registry: Arc<ConnectionRegistry>,
    progress: Arc<ProgressEngine>,
    channel_size: usize,
) -> mpsc::Sender<SessionCommand> {
    let (tx, rx) = mpsc::channel(channel_size);
    let actor = SessionActor {
        session,
        config,
        deps,
        registry,
        progress,
        round: None,
        receiver: rx,
        self_sender: tx.clone(),
    };
    tokio::spawn(actor.run());
    tx
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Actor-level tests that need the raw command channel — in
    //! particular the timeout idempotency guard, which can't be forced
    //! through the public handle API.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gatecrash_progress::StoreError;
    use gatecrash_protocol::SessionId;
    use gatecrash_registry::RegistryConfig;

    use super::*;
    use crate::oracle::OracleError;

    // -- Test doubles -----------------------------------------------------

    struct FixedOracle(u32);

    #[async_trait]
    impl ScoreOracle for FixedOracle {
        async fn score(&self, _door: &Door, _text: &str) -> Result<ScoreBreakdown, OracleError> {
            Ok(ScoreBreakdown {
                creativity: self.0,
                feasibility: self.0,
                humor: self.0,
                originality: self.0,
            })
        }
    }

    #[derive(Default)]
    struct MapPaths {
        inner: Mutex<HashMap<PlayerId, PlayerPath>>,
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

    struct NullSessions;

    #[async_trait]
    impl SessionStore for NullSessions {
        async fn get(&self, _id: SessionId) -> Result<Option<Session>, StoreError> {
            Ok(None)
        }
        async fn create(&self, _s: &Session) -> Result<(), StoreError> {
            Ok(())
        }
        async fn update(&self, _s: &Session) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct NullLeaderboard;

    #[async_trait]
    impl LeaderboardStore for NullLeaderboard {
        async fn add_entry(&self, _e: &LeaderboardEntry) -> Result<(), StoreError> {
            Ok(())
        }
    }

    // -- Harness ----------------------------------------------------------

    struct Harness {
        sender: mpsc::Sender<SessionCommand>,
        events: tokio::sync::mpsc::UnboundedReceiver<Event>,
    }

    /// Spawns an actor for a two-player multiplayer session, with
    /// player 1's channel captured for event assertions.
    async fn spawn_two_player_actor(score: u32) -> Harness {
        let paths: Arc<MapPaths> = Arc::new(MapPaths::default());
        let deps = Arc::new(Collaborators {
            oracle: Arc::new(FixedOracle(score)),
            doors: Arc::new(StockDoors),
            paths: paths.clone(),
            sessions: Arc::new(NullSessions),
            leaderboard: Arc::new(NullLeaderboard),
        });
        let registry = Arc::new(ConnectionRegistry::new(RegistryConfig::default()));
        let progress = Arc::new(ProgressEngine::new(paths));

        let mut session = Session::new(
            SessionId(1),
            GameMode::Multiplayer,
            None,
            Player::new(PlayerId(1), "alice"),
        );
        session.players.push(Player::new(PlayerId(2), "bob"));

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        registry.register(SessionId(1), PlayerId(1), tx).await;
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();
        registry.register(SessionId(1), PlayerId(2), tx2).await;

        let sender = spawn_session(
            session,
            CoordinatorConfig::default(),
            deps,
            registry,
            progress,
            64,
        );

        Harness { sender, events: rx }
    }

    async fn start(h: &Harness) {
        let (tx, rx) = oneshot::channel();
        h.sender
            .send(SessionCommand::Start { reply: tx })
            .await
            .unwrap();
        rx.await.unwrap().unwrap();
    }

    async fn submit(h: &Harness, player: u64, text: &str) -> Result<u32, SessionError> {
        let (tx, rx) = oneshot::channel();
        h.sender
            .send(SessionCommand::Submit {
                player_id: PlayerId(player),
                text: text.to_string(),
                reply: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    async fn snapshot(h: &Harness) -> Session {
        let (tx, rx) = oneshot::channel();
        h.sender
            .send(SessionCommand::Snapshot { reply: tx })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    fn drain(h: &mut Harness) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = h.events.try_recv() {
            events.push(event);
        }
        events
    }

    fn count_scores_updated_for(events: &[Event], door_id: DoorId) -> usize {
        events
            .iter()
            .filter(|e| {
                e.kind == EventKind::ScoresUpdated
                    && e.data["doorId"] == serde_json::json!(door_id)
            })
            .count()
    }

    // =====================================================================
    // Timeout idempotency
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_all_responded_close_is_noop() {
        let mut h = spawn_two_player_actor(50).await;
        start(&h).await;

        let door_id = snapshot(&h).await.current_door.expect("round open").door_id;

        // Both players answer: the round closes via "all responded".
        submit(&h, 1, "climb through the window").await.unwrap();
        submit(&h, 2, "negotiate with the door").await.unwrap();

        let session = snapshot(&h).await;
        assert!(session.current_door.is_none() || session.current_door.as_ref().unwrap().door_id != door_id);

        // Now force the timeout for the already-closed round.
        h.sender
            .send(SessionCommand::RoundTimeout { door_id })
            .await
            .unwrap();
        // And once more for good measure.
        h.sender
            .send(SessionCommand::RoundTimeout { door_id })
            .await
            .unwrap();
        // Let the actor drain its mailbox.
        snapshot(&h).await;

        let events = drain(&mut h);
        // Exactly one evaluation for that door: no double scores, no
        // stray timeout announcement after the fact.
        assert_eq!(count_scores_updated_for(&events, door_id), 1);
        assert!(
            !events
                .iter()
                .any(|e| e.kind == EventKind::ResponseTimeout
                    && e.data["doorId"] == serde_json::json!(door_id)),
            "stale timeout must not announce itself"
        );

        // No double-scoring either.
        let session = snapshot(&h).await;
        assert_eq!(session.players[0].responses.len(), 1);
        assert_eq!(session.players[0].total_score, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_for_wrong_door_is_ignored() {
        let h = spawn_two_player_actor(50).await;
        start(&h).await;

        let open_door = snapshot(&h).await.current_door.expect("round open").door_id;

        h.sender
            .send(SessionCommand::RoundTimeout {
                door_id: DoorId(open_door.0 + 999),
            })
            .await
            .unwrap();

        // The round is still open for the real door.
        let session = snapshot(&h).await;
        assert_eq!(
            session.current_door.map(|d| d.door_id),
            Some(open_door),
            "mismatched timeout must not close the round"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_responses_survive_timeout_close() {
        let mut h = spawn_two_player_actor(50).await;
        start(&h).await;
        let door_id = snapshot(&h).await.current_door.expect("round open").door_id;

        // Only player 1 answers; the genuine timer fires at +60s
        // (paused time auto-advances when the runtime goes idle).
        submit(&h, 1, "wedge it open with a spoon").await.unwrap();

        // Wait until the round for this door has closed.
        loop {
            let session = snapshot(&h).await;
            if session.current_door.as_ref().map(|d| d.door_id) != Some(door_id) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        }

        let events = drain(&mut h);
        assert!(
            events
                .iter()
                .any(|e| e.kind == EventKind::ResponseTimeout),
            "timeout should have been announced"
        );
        assert_eq!(count_scores_updated_for(&events, door_id), 1);

        // Player 1's response persisted; player 2 simply has none.
        let session = snapshot(&h).await;
        assert_eq!(session.players[0].responses.len(), 1);
        assert_eq!(session.players[1].responses.len(), 0);
    }
}
