//! Error types for the session layer.
//!
//! Every variant here is a *validation* error: it is returned to the
//! caller synchronously and guarantees that nothing was mutated.
//! Degraded-mode failures (oracle down, store down) never surface as
//! errors — they are handled in place and logged.

use gatecrash_protocol::{DoorId, PlayerId, SessionId, SessionStatus};

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists with this id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session is in the wrong lifecycle state for this operation.
    #[error("session {session} is {actual}, operation requires {required}")]
    InvalidStatus {
        session: SessionId,
        actual: SessionStatus,
        required: SessionStatus,
    },

    /// The player is already on this session's roster.
    #[error("player {0} already joined session {1}")]
    AlreadyJoined(PlayerId, SessionId),

    /// The multiplayer roster is at capacity.
    #[error("session {0} is full")]
    SessionFull(SessionId),

    /// A single-player session already has its one player.
    #[error("single-player session {0} already has a player")]
    SinglePlayerOccupied(SessionId),

    /// A multiplayer session needs more players before it can start.
    #[error("session {session} needs at least {need} players to start, has {have}")]
    NotEnoughPlayers {
        session: SessionId,
        have: usize,
        need: usize,
    },

    /// The player is not a member of this session.
    #[error("player {0} is not a member of session {1}")]
    NotAMember(PlayerId, SessionId),

    /// No door is currently open for responses.
    #[error("session {0} has no open round")]
    NoOpenRound(SessionId),

    /// The player already responded to this door — one response per
    /// (player, door), always.
    #[error("player {0} already responded to door {1}")]
    DuplicateResponse(PlayerId, DoorId),

    /// Empty responses are rejected outright.
    #[error("response is empty")]
    EmptyResponse,

    /// The response exceeds the character limit.
    #[error("response is {len} characters, limit is {limit}")]
    ResponseTooLong { len: usize, limit: usize },

    /// The session's actor task is gone (shut down or crashed).
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}
