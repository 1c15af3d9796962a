//! Error types for the registry layer.
//!
//! Every variant here is local-cause and recoverable: registry errors
//! inform the caller, they never abort a larger workflow.

use gatecrash_protocol::PlayerId;

/// Errors that can occur during connection-registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No connection record exists for the player.
    #[error("no connection for player {0}")]
    NotFound(PlayerId),

    /// The connection exists but is currently down (within grace).
    #[error("connection inactive for player {0}")]
    Inactive(PlayerId),

    /// A restore arrived after the grace window closed. The stale
    /// record has been purged; the player must re-join.
    #[error("reconnection window expired for player {0}")]
    GraceExpired(PlayerId),

    /// The receiving task hung up; the connection is now inactive.
    #[error("channel closed for player {0}")]
    ChannelClosed(PlayerId),
}
