//! Live-connection tracking for Gatecrash.
//!
//! This crate owns the mapping from players to their one live channel:
//!
//! 1. **Registration** — attaching a channel when a player connects
//! 2. **Grace window** — keeping a disconnected player restorable for
//!    5 minutes before purging them
//! 3. **Fan-out** — best-effort delivery of events to a session's
//!    whole roster, where one dead connection never blocks the rest
//!
//! # How it fits in the stack
//!
//! ```text
//! Session coordinator (above)  ← broadcasts round/score events
//!     ↕
//! Registry (this crate)        ← who is reachable right now
//!     ↕
//! Protocol (below)             ← Event envelope, PlayerId/SessionId
//! ```
//!
//! Connection liveness is deliberately independent of game membership:
//! a player who drops off the network stays on the session roster and
//! keeps their place in the game.

mod connection;
mod error;
mod registry;

pub use connection::{BroadcastReport, ConnectionInfo, EventSender, RegistryConfig};
pub(crate) use connection::Connection;
pub use error::RegistryError;
pub use registry::ConnectionRegistry;
