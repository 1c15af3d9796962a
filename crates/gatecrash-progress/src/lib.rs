//! Progress and ranking computation for Gatecrash.
//!
//! The [`ProgressEngine`] turns a session snapshot plus per-player
//! path state into every derived view the game shows:
//!
//! - [`PlayerProgress`] / [`SessionProgress`] — live standings and the
//!   current leader
//! - `leaderboard` — in-game ordering (progress, then average score)
//! - [`RankingEntry`] — the final table at completion
//! - [`PerformanceStats`] — per-player statistics at completion
//!
//! The engine reads paths through the [`PathStore`] seam and falls
//! back to a synthesized default path when the store misbehaves — a
//! flaky path store degrades the numbers, never the request.
//!
//! It deliberately knows nothing about connections; callers overlay
//! liveness via [`ProgressEngine::realtime_status`].

mod error;
mod progress;
mod rankings;
mod store;

pub use error::ProgressError;
pub use progress::{PlayerProgress, ProgressEngine, SessionProgress};
pub use rankings::{PerformanceStats, RankingEntry};
pub use store::{PathStore, StoreError};
