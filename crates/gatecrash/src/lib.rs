//! # Gatecrash
//!
//! The orchestration core for a short-lived, timed, multi-round
//! decision game: players join a session, face a prompt (a "door"),
//! answer within 60 seconds, get scored, and advance along a path that
//! adapts to how well they're doing — until someone's path runs out
//! and they win.
//!
//! The crate wires three subsystems:
//!
//! - **Session coordination** (`gatecrash-session`) — the round state
//!   machine, timeout races, scoring, path adaptation, win detection
//! - **Progress** (`gatecrash-progress`) — live standings, leaderboard
//!   ordering, final rankings, performance statistics
//! - **Connections** (`gatecrash-registry`) — one live channel per
//!   player, a 5-minute reconnection grace window, best-effort fan-out
//!
//! Storage, scoring, identity, and transport are all seams: plug in
//! real collaborators or use the in-memory defaults from [`memory`].

pub mod memory;

mod builder;

pub use builder::{Gatecrash, GatecrashBuilder};

/// Installs a process-global tracing subscriber filtered by
/// `RUST_LOG` (defaulting to `info`).
///
/// Convenience for binaries and examples; libraries embedding the
/// engine should configure their own subscriber instead. Calling it
/// twice is harmless — the second install attempt is ignored.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// The types most integrations need, re-exported in one place.
pub mod prelude {
    pub use gatecrash_progress::{
        PathStore, PerformanceStats, PlayerProgress, ProgressEngine, RankingEntry,
        SessionProgress, StoreError,
    };
    pub use gatecrash_protocol::{
        Codec, Door, DoorId, Event, EventKind, GameMode, JsonCodec, LeaderboardEntry, Player,
        PlayerId, PlayerPath, Response, ResponseId, ScoreBreakdown, Session, SessionId,
        SessionStatus,
    };
    pub use gatecrash_registry::{
        BroadcastReport, ConnectionRegistry, EventSender, RegistryConfig, RegistryError,
    };
    pub use gatecrash_session::{
        Collaborators, CoordinatorConfig, DoorSource, LeaderboardStore, NeutralOracle,
        OracleError, ScoreOracle, SessionCoordinator, SessionError, SessionHandle, SessionStore,
        StockDoors,
    };

    pub use crate::{Gatecrash, GatecrashBuilder};
}
