//! `Gatecrash` builder: wires the three subsystems together.
//!
//! The builder assembles a [`ConnectionRegistry`], a
//! [`ProgressEngine`], and a [`SessionCoordinator`] sharing the same
//! collaborators, and starts the registry's cleanup sweep. Everything
//! defaults to the in-memory implementations so a working game engine
//! is one call away:
//!
//! ```rust,no_run
//! use gatecrash::Gatecrash;
//!
//! # async fn run() {
//! let engine = Gatecrash::builder().build();
//! let _session = engine
//!     .coordinator()
//!     .create_session(
//!         gatecrash::prelude::GameMode::Multiplayer,
//!         gatecrash::prelude::PlayerId(1),
//!         "alice",
//!         None,
//!     )
//!     .await;
//! # }
//! ```

use std::sync::Arc;

use gatecrash_progress::{PathStore, ProgressEngine};
use gatecrash_registry::{ConnectionRegistry, RegistryConfig};
use gatecrash_session::{
    Collaborators, CoordinatorConfig, DoorSource, LeaderboardStore, NeutralOracle, ScoreOracle,
    SessionCoordinator, SessionStore, StockDoors,
};
use tokio::task::JoinHandle;

use crate::memory::{MemoryLeaderboard, MemoryPathStore, MemorySessionStore};

/// Builder for a [`Gatecrash`] engine.
pub struct GatecrashBuilder {
    config: CoordinatorConfig,
    registry_config: RegistryConfig,
    oracle: Option<Arc<dyn ScoreOracle>>,
    doors: Option<Arc<dyn DoorSource>>,
    paths: Option<Arc<dyn PathStore>>,
    sessions: Option<Arc<dyn SessionStore>>,
    leaderboard: Option<Arc<dyn LeaderboardStore>>,
}

impl GatecrashBuilder {
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            registry_config: RegistryConfig::default(),
            oracle: None,
            doors: None,
            paths: None,
            sessions: None,
            leaderboard: None,
        }
    }

    /// Overrides the gameplay constants.
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the connection-lifetime settings.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Plugs in a real scoring oracle. Default: [`NeutralOracle`].
    pub fn oracle(mut self, oracle: Arc<dyn ScoreOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Plugs in a door source. Default: [`StockDoors`].
    pub fn doors(mut self, doors: Arc<dyn DoorSource>) -> Self {
        self.doors = Some(doors);
        self
    }

    /// Plugs in a path store. Default: in-memory.
    pub fn paths(mut self, paths: Arc<dyn PathStore>) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Plugs in a session store. Default: in-memory.
    pub fn sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Plugs in a leaderboard store. Default: in-memory.
    pub fn leaderboard(mut self, leaderboard: Arc<dyn LeaderboardStore>) -> Self {
        self.leaderboard = Some(leaderboard);
        self
    }

    /// Assembles the engine and starts the registry cleanup sweep.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Gatecrash {
        let paths = self
            .paths
            .unwrap_or_else(|| Arc::new(MemoryPathStore::default()));

        let registry = Arc::new(ConnectionRegistry::new(self.registry_config));
        let progress = Arc::new(ProgressEngine::new(Arc::clone(&paths)));

        let deps = Collaborators {
            oracle: self.oracle.unwrap_or_else(|| Arc::new(NeutralOracle)),
            doors: self.doors.unwrap_or_else(|| Arc::new(StockDoors)),
            paths,
            sessions: self
                .sessions
                .unwrap_or_else(|| Arc::new(MemorySessionStore::default())),
            leaderboard: self
                .leaderboard
                .unwrap_or_else(|| Arc::new(MemoryLeaderboard::default())),
        };

        let coordinator = Arc::new(SessionCoordinator::new(
            self.config,
            deps,
            Arc::clone(&registry),
            Arc::clone(&progress),
        ));
        let cleanup = Arc::clone(&registry).spawn_cleanup();

        tracing::debug!("gatecrash engine assembled");

        Gatecrash {
            registry,
            progress,
            coordinator,
            cleanup,
        }
    }
}

impl Default for GatecrashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully-wired game engine: coordinator + registry + progress.
pub struct Gatecrash {
    registry: Arc<ConnectionRegistry>,
    progress: Arc<ProgressEngine>,
    coordinator: Arc<SessionCoordinator>,
    cleanup: JoinHandle<()>,
}

impl Gatecrash {
    /// Creates a builder with in-memory defaults.
    pub fn builder() -> GatecrashBuilder {
        GatecrashBuilder::new()
    }

    /// The session coordinator: create/join/start/submit.
    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    /// The connection registry: register/restore channels, observe
    /// liveness.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The progress engine: query derived views directly.
    pub fn progress(&self) -> &Arc<ProgressEngine> {
        &self.progress
    }
}

impl Drop for Gatecrash {
    fn drop(&mut self) {
        // The cleanup sweep has no work to do once the engine is gone.
        self.cleanup.abort();
    }
}
