//! Error types for the progress layer.

use gatecrash_protocol::PlayerId;

/// Errors that can occur while computing progress views.
///
/// Deliberately small: the engine degrades on store failures instead
/// of surfacing them, so the only hard error is asking about a player
/// who isn't on the roster.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// The player is not part of the given session.
    #[error("player {0} not found in session")]
    PlayerNotFound(PlayerId),
}
