//! Connection types: the registry's record of a player's live channel.
//!
//! A connection has its own lifecycle, independent of game membership:
//! losing a channel never removes the player from the session roster.
//!
//! ```text
//!   register ──→ [active] ──(unregister / send failure)──→ [inactive]
//!                   ↑                                          │
//!                   └──────(restore, within grace)─────────────┘
//!                                                              │
//!                                      (grace elapsed) ──→ purged
//! ```

use std::time::{Duration, Instant};

use gatecrash_protocol::{Event, PlayerId, SessionId};
use tokio::sync::mpsc;

/// The write half of a player's live channel.
///
/// Unbounded so a send never blocks the sender — a slow consumer is
/// the transport edge's problem, not the game loop's. A failed send
/// means the receiving task is gone, which the registry treats as a
/// disconnect.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Configuration for connection lifetime behavior.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a disconnected player's record is kept restorable.
    ///
    /// Default: 5 minutes. A restore attempt after this window fails
    /// and purges the record.
    pub grace: Duration,

    /// How often the background sweep purges expired records.
    ///
    /// Default: 1 minute.
    pub cleanup_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5 * 60),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// One player's connection record.
///
/// `last_seen` is a monotonic [`Instant`] — the grace window must not
/// jump around with wall-clock adjustments.
#[derive(Debug)]
pub(crate) struct Connection {
    pub(crate) session_id: SessionId,
    pub(crate) channel: EventSender,
    pub(crate) last_seen: Instant,
    pub(crate) active: bool,
}

/// A read-only snapshot of a connection, safe to hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub player_id: PlayerId,
    pub session_id: SessionId,
    pub active: bool,
}

/// The outcome of a fan-out broadcast.
///
/// Partial failure is data here, not an error: delivery to each
/// recipient is attempted independently, and the caller gets the full
/// picture without any recipient's failure aborting the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Roster size at dispatch time.
    pub attempted: usize,
    /// Recipients the event was handed to successfully.
    pub delivered: usize,
    /// Recipients that had no usable channel; now marked inactive.
    pub failed: Vec<PlayerId>,
}

impl BroadcastReport {
    /// `true` when every roster member got the event.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
