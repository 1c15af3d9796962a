//! Coordinator configuration.
//!
//! The defaults are the game's fixed contract — tests and clients
//! depend on these exact values. They are configurable mostly so tests
//! can shrink the time-based ones.

use std::time::Duration;

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a door stays open for responses. Default: 60 seconds.
    pub response_time_limit: Duration,

    /// Maximum response length in characters. Default: 500.
    pub max_response_chars: usize,

    /// Multiplayer roster cap. Default: 8.
    pub max_players: usize,

    /// Minimum players a multiplayer session needs to start.
    /// Default: 2.
    pub min_multiplayer_players: usize,

    /// Breather between a round closing and the next door appearing,
    /// so players can read the scores. Default: 3 seconds.
    pub inter_round_pause: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            response_time_limit: Duration::from_secs(60),
            max_response_chars: 500,
            max_players: 8,
            min_multiplayer_players: 2,
            inter_round_pause: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract() {
        let cfg = CoordinatorConfig::default();
        assert_eq!(cfg.response_time_limit, Duration::from_secs(60));
        assert_eq!(cfg.max_response_chars, 500);
        assert_eq!(cfg.max_players, 8);
        assert_eq!(cfg.min_multiplayer_players, 2);
        assert_eq!(cfg.inter_round_pause, Duration::from_secs(3));
    }
}
