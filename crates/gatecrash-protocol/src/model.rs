//! The shared data model: sessions, players, doors, responses, paths.
//!
//! These are the entities the whole system agrees on. The coordinator
//! owns and mutates `Session`; everything else reads snapshots of it.
//! All wire-visible structs use camelCase field names in JSON so the
//! payloads match what clients already consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DoorId, PlayerId, ResponseId, SessionId};

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// The kind of session: one player racing their own path, or up to
/// eight players sharing doors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "multiplayer")]
    Multiplayer,
    #[serde(rename = "single-player")]
    SinglePlayer,
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Multiplayer => write!(f, "multiplayer"),
            Self::SinglePlayer => write!(f, "single-player"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// Transitions only ever move forward — there is no way back:
///
/// ```text
/// Waiting → Active → Completed
/// ```
///
/// - **Waiting**: session exists, players may join, no round yet.
/// - **Active**: game started, rounds are running.
/// - **Completed**: a player finished their path (or the session was
///   torn down). Terminal — no further mutation is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Completed,
}

impl SessionStatus {
    /// Returns `true` if new players may still join.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if rounds are running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` if the session is terminal.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The next state in the strict forward ordering, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Active),
            Self::Active => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// ScoreBreakdown
// ---------------------------------------------------------------------------

/// The four sub-metrics the scoring oracle grades a response on,
/// each 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub creativity: u32,
    pub feasibility: u32,
    pub humor: u32,
    pub originality: u32,
}

impl ScoreBreakdown {
    /// The fallback used when the oracle is unavailable: a neutral 50
    /// on every axis, so a degraded oracle never punishes a player.
    pub const NEUTRAL: Self = Self {
        creativity: 50,
        feasibility: 50,
        humor: 50,
        originality: 50,
    };

    /// The overall score: the integer mean of the four sub-metrics.
    pub fn total(&self) -> u32 {
        (self.creativity + self.feasibility + self.humor + self.originality) / 4
    }
}

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

/// One round's prompt: a themed scenario with a difficulty rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Door {
    pub door_id: DoorId,
    pub content: String,
    pub theme: String,
    /// Difficulty in `[1, 3]`.
    pub difficulty: u8,
    pub created_at: DateTime<Utc>,
}

impl Door {
    /// Easiest allowed difficulty.
    pub const MIN_DIFFICULTY: u8 = 1;
    /// Hardest allowed difficulty.
    pub const MAX_DIFFICULTY: u8 = 3;
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A player's answer to one door, with its score.
///
/// Responses are append-only, and at most one exists per
/// (player, door) pair — the coordinator enforces this before
/// appending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub response_id: ResponseId,
    pub door_id: DoorId,
    pub player_id: PlayerId,
    pub content: String,
    /// The overall score (mean of the breakdown), 0–100.
    pub score: u32,
    pub metrics: ScoreBreakdown,
    pub submitted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player within a session: identity, display name, and their
/// accumulated responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: PlayerId,
    pub username: String,
    pub joined_at: DateTime<Utc>,
    /// Sum of every response's overall score.
    pub total_score: u32,
    pub responses: Vec<Response>,
    /// Whether the player still counts toward "all responded". This is
    /// game membership, not connection liveness — a player with no live
    /// channel stays on the roster.
    pub is_active: bool,
}

impl Player {
    /// Creates a fresh player joining now, with no responses yet.
    pub fn new(player_id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            player_id,
            username: username.into(),
            joined_at: Utc::now(),
            total_score: 0,
            responses: Vec::new(),
            is_active: true,
        }
    }

    /// This player's response to the given door, if they made one.
    pub fn response_to(&self, door_id: DoorId) -> Option<&Response> {
        self.responses.iter().find(|r| r.door_id == door_id)
    }

    /// Whether this player has responded to the given door.
    pub fn has_responded(&self, door_id: DoorId) -> bool {
        self.response_to(door_id).is_some()
    }

    /// The player's most recent response, if any.
    pub fn last_response(&self) -> Option<&Response> {
        self.responses.last()
    }

    /// Mean overall score across all responses (0.0 with none).
    pub fn average_score(&self) -> f64 {
        if self.responses.is_empty() {
            return 0.0;
        }
        let total: u32 = self.responses.iter().map(|r| r.score).sum();
        f64::from(total) / self.responses.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One game from creation to completion.
///
/// Owned exclusively by the session coordinator's actor task; everyone
/// else sees cloned snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub mode: GameMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub players: Vec<Player>,
    pub status: SessionStatus,
    /// The door currently open for responses. Non-`None` exactly when
    /// the session is active and a round is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_door: Option<Door>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a new session in `Waiting` with the creator as its
    /// first player.
    pub fn new(
        session_id: SessionId,
        mode: GameMode,
        theme: Option<String>,
        creator: Player,
    ) -> Self {
        Self {
            session_id,
            mode,
            theme,
            players: vec![creator],
            status: SessionStatus::Waiting,
            current_door: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Looks up a player on the roster.
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    /// Mutable lookup of a player on the roster.
    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    /// Whether the player is on the roster at all.
    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.player(player_id).is_some()
    }

    /// The players still participating (active flag set).
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active)
    }

    /// `true` when every active player has a response for `door_id`.
    ///
    /// Inactive players are skipped — a vanished player must never
    /// hold a round open.
    pub fn all_active_responded(&self, door_id: DoorId) -> bool {
        self.active_players().all(|p| p.has_responded(door_id))
    }

    /// Every (player, score) pair recorded for `door_id`, in roster
    /// order.
    pub fn door_scores(&self, door_id: DoorId) -> Vec<(PlayerId, u32)> {
        self.players
            .iter()
            .filter_map(|p| p.response_to(door_id).map(|r| (p.player_id, r.score)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// PlayerPath
// ---------------------------------------------------------------------------

/// A player's personal, score-adapted journey: how many doors they
/// have passed, how many remain, and how hard the next one is.
///
/// The path lives in an external store; the adaptation algorithm that
/// mutates it lives in the session coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPath {
    pub player_id: PlayerId,
    pub theme: String,
    /// Difficulty of the player's next door, in `[1, 3]`.
    pub current_difficulty: u8,
    pub doors_visited: Vec<DoorId>,
    /// Doors passed so far.
    pub current_position: u32,
    /// Path length. Never drops below [`Self::MIN_LENGTH`].
    pub total_doors: u32,
    pub created_at: DateTime<Utc>,
}

impl PlayerPath {
    /// Length every fresh path starts with.
    pub const DEFAULT_LENGTH: u32 = 10;
    /// The floor a path can shrink to — good play can never shorten a
    /// game below five doors.
    pub const MIN_LENGTH: u32 = 5;

    /// A brand-new path at position zero, difficulty 1.
    pub fn new(player_id: PlayerId, theme: impl Into<String>) -> Self {
        Self {
            player_id,
            theme: theme.into(),
            current_difficulty: Door::MIN_DIFFICULTY,
            doors_visited: Vec::new(),
            current_position: 0,
            total_doors: Self::DEFAULT_LENGTH,
            created_at: Utc::now(),
        }
    }

    /// The fallback used when the path store fails or has no record:
    /// position = responses recorded so far, default length.
    pub fn synthesized(player_id: PlayerId, responses_so_far: u32) -> Self {
        Self {
            current_position: responses_so_far,
            ..Self::new(player_id, "general")
        }
    }

    /// Win condition: the player has passed every door on their path.
    pub fn is_complete(&self) -> bool {
        self.current_position >= self.total_doors
    }

    /// Progress as a fraction in `[0, 1]` (guards a zero-length path).
    pub fn progress_fraction(&self) -> f64 {
        if self.total_doors == 0 {
            return 0.0;
        }
        f64::from(self.current_position) / f64::from(self.total_doors)
    }
}

// ---------------------------------------------------------------------------
// LeaderboardEntry
// ---------------------------------------------------------------------------

/// The row persisted to the global leaderboard for each player who
/// answered at least one door in a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub username: String,
    pub completion_time: std::time::Duration,
    pub total_score: u32,
    pub average_score: f64,
    pub doors_completed: usize,
    pub game_mode: GameMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub session_id: SessionId,
    pub completed_at: DateTime<Utc>,
}

// =========================================================================
// Tests
// =========================================================================
