//! Session coordination for Gatecrash.
//!
//! This crate owns the game's state machine: sessions move through
//! `Waiting → Active → Completed` while rounds race a 60-second
//! timeout against "every active player answered".
//!
//! # Key types
//!
//! - [`SessionCoordinator`] — creates sessions, routes operations
//! - [`SessionHandle`] — talk to one running session
//! - [`Collaborators`] — the external seams (scoring oracle, door
//!   source, path/session/leaderboard stores)
//! - [`CoordinatorConfig`] — the fixed gameplay constants
//!
//! # Concurrency
//!
//! Every session runs as its own actor task; joins, submissions,
//! timeout fires, and round advances are commands processed one at a
//! time. That mailbox is the serialization guarantee: overlapping
//! submissions both land, and a timeout racing a round close resolves
//! deterministically (the door-id guard makes the loser a no-op).
//!
//! # Failure posture
//!
//! Validation errors come back synchronously and mutate nothing.
//! Collaborator failures degrade: a down oracle scores neutral, a
//! down path store synthesizes defaults, failed persistence and
//! broadcast are logged and never roll anything back.

mod actor;
mod adapt;
mod config;
mod coordinator;
mod doors;
mod error;
mod oracle;
mod store;

pub use actor::Collaborators;
pub use adapt::{GOOD_SCORE_THRESHOLD, POOR_SCORE_THRESHOLD, apply_score, difficulty_for_score};
pub use config::CoordinatorConfig;
pub use coordinator::{SessionCoordinator, SessionHandle};
pub use doors::{DoorSource, StockDoors};
pub use error::SessionError;
pub use oracle::{NeutralOracle, OracleError, ScoreOracle};
pub use store::{LeaderboardStore, SessionStore};
