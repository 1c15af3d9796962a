//! Door sourcing: where the next prompt comes from.
//!
//! The coordinator asks a [`DoorSource`] for "a door of this theme at
//! this difficulty". Production deployments back this with a content
//! service; [`StockDoors`] ships a built-in catalog so a session can
//! always run — it also serves as the degraded-mode fallback when a
//! custom source fails mid-game.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use gatecrash_protocol::{Door, DoorId};
use gatecrash_progress::StoreError;
use rand::Rng;

/// Counter for generating unique door ids.
static NEXT_DOOR_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh door id.
pub fn next_door_id() -> DoorId {
    DoorId(NEXT_DOOR_ID.fetch_add(1, Ordering::Relaxed))
}

/// Produces the next door for a theme/difficulty pair.
#[async_trait]
pub trait DoorSource: Send + Sync {
    /// Returns a door for the given theme at the given difficulty
    /// (clamped to `[1, 3]` by the implementation).
    async fn next_door(&self, theme: &str, difficulty: u8) -> Result<Door, StoreError>;
}

/// The built-in prompt catalog.
///
/// Unknown themes fall back to the "general" prompts. When a cell has
/// several prompts, one is picked at random so back-to-back doors
/// don't repeat verbatim.
pub struct StockDoors;

impl StockDoors {
    /// Synchronous catalog lookup — also used directly as the fallback
    /// when a custom [`DoorSource`] fails.
    pub fn pick(theme: &str, difficulty: u8) -> Door {
        let difficulty = difficulty.clamp(Door::MIN_DIFFICULTY, Door::MAX_DIFFICULTY);
        let candidates = catalog(theme, difficulty);
        let content = if candidates.len() == 1 {
            candidates[0]
        } else {
            candidates[rand::rng().random_range(0..candidates.len())]
        };

        Door {
            door_id: next_door_id(),
            content: content.to_string(),
            theme: theme.to_string(),
            difficulty,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl DoorSource for StockDoors {
    async fn next_door(&self, theme: &str, difficulty: u8) -> Result<Door, StoreError> {
        Ok(Self::pick(theme, difficulty))
    }
}

fn catalog(theme: &str, difficulty: u8) -> &'static [&'static str] {
    match (theme, difficulty) {
        ("workplace", 1) => &[
            "Your coworker keeps microwaving fish in the office kitchen. How do you address this delicate situation?",
        ],
        ("workplace", 2) => &[
            "You accidentally sent a message complaining about your boss to your boss. The message was just delivered. What's your strategy?",
        ],
        ("workplace", _) => &[
            "You're in charge of organizing the office holiday party, but you have a budget of $12 and everyone has dietary restrictions. How do you pull this off?",
        ],
        ("social", 1) => &[
            "You're at a party where you don't know anyone except the host, who just disappeared. How do you survive the next hour?",
        ],
        ("social", 2) => &[
            "You accidentally called your friend by their ex's name during their wedding speech. Everyone heard it. How do you recover?",
        ],
        ("social", _) => &[
            "You're stuck in a group chat with your ex, their new partner, and your current partner planning a mutual friend's surprise party. How do you navigate this?",
        ],
        ("technology", 1) => &[
            "Your phone's autocorrect has become sentient and is now changing your messages to be increasingly dramatic. How do you communicate normally?",
        ],
        ("technology", 2) => &[
            "Every smart device in your home has formed an alliance against you. They're not malicious, just very disappointed. How do you win them back?",
        ],
        ("technology", _) => &[
            "You've been selected to negotiate a peace treaty between humans and AI, but the AI only communicates through memes. How do you proceed?",
        ],
        (_, 1) => &[
            "You wake up and discover that everyone else in the world has disappeared, but they left detailed notes about what they expect you to accomplish while they're gone. What's your plan?",
            "A delivery drone keeps bringing you packages addressed to someone with your exact name who apparently lives a far more interesting life. Today's box is ticking. What now?",
        ],
        (_, 2) => &[
            "You've been appointed as the Earth's ambassador to a visiting alien species, but they communicate entirely through interpretive dance. How do you establish diplomatic relations?",
            "Gravity takes a fifteen-minute lunch break every day at noon, and you're the only one who remembers to prepare. Today you forgot. Describe the next quarter hour.",
        ],
        (_, _) => &[
            "Time moves backwards every Tuesday, but only for you. Everyone else experiences Tuesday normally. How do you use this to your advantage without going insane?",
        ],
    }
}
