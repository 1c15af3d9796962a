//! Identity newtypes shared by every layer.
//!
//! Each id wraps a `u64` in a named struct so the compiler keeps them
//! apart — a `DoorId` can never be passed where a `PlayerId` is
//! expected, even though both are a `u64` underneath.
//!
//! `#[serde(transparent)]` makes every id serialize as the bare number,
//! so `PlayerId(42)` is `42` on the wire, not `{"0": 42}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a player.
///
/// Player ids come from the identity layer (out of scope here) — the
/// core never generates them, it only carries them around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// A unique identifier for a door (one round's prompt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoorId(pub u64);

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D-{}", self.0)
    }
}

/// A unique identifier for a player's response to a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub u64);

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&SessionId(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&DoorId(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&ResponseId(9)).unwrap(), "9");
    }

    #[test]
    fn test_ids_deserialize_from_plain_numbers() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_id_display_prefixes() {
        assert_eq!(PlayerId(1).to_string(), "P-1");
        assert_eq!(SessionId(2).to_string(), "S-2");
        assert_eq!(DoorId(3).to_string(), "D-3");
        assert_eq!(ResponseId(4).to_string(), "R-4");
    }
}
