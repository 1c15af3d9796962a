//! The scoring-oracle seam.
//!
//! Grading a free-text response is someone else's job — typically an
//! LLM service behind an HTTP call. The coordinator only needs the
//! [`ScoreOracle`] trait, and it assumes the oracle fails
//! intermittently, substituting a neutral score rather than failing
//! the player's submission.

use async_trait::async_trait;
use gatecrash_protocol::{Door, ScoreBreakdown};

/// The oracle couldn't produce a score. Callers degrade, they don't
/// branch — hence a message-only struct.
#[derive(Debug, Clone, thiserror::Error)]
#[error("scoring oracle unavailable: {0}")]
pub struct OracleError(String);

impl OracleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Grades a response to a door on four axes, each 0–100.
#[async_trait]
pub trait ScoreOracle: Send + Sync {
    async fn score(&self, door: &Door, response: &str) -> Result<ScoreBreakdown, OracleError>;
}

/// An oracle that scores everything 50/50/50/50.
///
/// Useful for development and as an explicit stand-in where no real
/// oracle is wired up — it behaves exactly like a permanently-degraded
/// real oracle.
pub struct NeutralOracle;

#[async_trait]
impl ScoreOracle for NeutralOracle {
    async fn score(&self, _door: &Door, _response: &str) -> Result<ScoreBreakdown, OracleError> {
        Ok(ScoreBreakdown::NEUTRAL)
    }
}
