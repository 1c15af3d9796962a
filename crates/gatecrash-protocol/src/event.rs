//! The event envelope pushed to every live connection.
//!
//! Every real-time update the core emits — joins, door presentations,
//! score updates, rankings — travels in the same envelope:
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │ type: "door-presented"           │  ← what happened
//! │ sessionId: 7                     │  ← which session
//! │ playerId: 3 (optional)           │  ← which player, when relevant
//! │ ┌──────────────────────────────┐ │
//! │ │ data: { ... }                │ │  ← kind-specific payload
//! │ └──────────────────────────────┘ │
//! │ timestamp: 2026-08-06T12:00:00Z  │  ← when it was emitted
//! └──────────────────────────────────┘
//! ```
//!
//! Broadcasts are best-effort notifications, never the source of truth
//! — a client that misses one re-queries the derived views instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlayerId, SessionId};

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Every kind of event the core emits, tagged in kebab-case on the
/// wire (`"player-joined"`, `"door-presented"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    // Roster / connection lifecycle.
    PlayerJoined,
    PlayerConnected,
    PlayerDisconnected,
    PlayerReconnected,

    // Round lifecycle.
    GameStarted,
    DoorPresented,
    ResponseSubmitted,
    ResponseTimeout,

    // Live scoring and progress.
    RealTimeScoreUpdate,
    PlayerProgressUpdate,
    ScoresUpdated,
    ProgressUpdate,
    PlayerPositionUpdate,
    LeaderboardUpdate,

    // Completion.
    FinalRankings,
    PerformanceStatistics,
    GameCompleted,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Reuse the serde rename so logs and wire agree on names.
        let s = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", s.trim_matches('"'))
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// The envelope itself. `data` is schemaless JSON so payload shapes can
/// grow without touching the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// A session-scoped event with no single player attached.
    pub fn new(kind: EventKind, session_id: SessionId, data: serde_json::Value) -> Self {
        Self {
            kind,
            session_id,
            player_id: None,
            data,
            timestamp: Utc::now(),
        }
    }

    /// A session-scoped event attributed to one player.
    pub fn for_player(
        kind: EventKind,
        session_id: SessionId,
        player_id: PlayerId,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            session_id,
            player_id: Some(player_id),
            data,
            timestamp: Utc::now(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
