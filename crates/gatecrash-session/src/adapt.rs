//! The path-adaptation rule: how a score reshapes a player's journey.
//!
//! Doing well shortens and eases the path; doing poorly lengthens and
//! hardens it. Middling scores leave it alone. The bounds are hard:
//! difficulty stays in `[1, 3]` and the path never drops below 5
//! doors.

use gatecrash_protocol::{Door, DoorId, PlayerPath};

/// Scores strictly above this shorten and ease the path.
pub const GOOD_SCORE_THRESHOLD: u32 = 70;

/// Scores strictly below this lengthen and harden the path.
pub const POOR_SCORE_THRESHOLD: u32 = 30;

/// Records a scored door on the path and adapts difficulty/length.
pub fn apply_score(path: &mut PlayerPath, door_id: DoorId, score: u32) {
    path.doors_visited.push(door_id);
    path.current_position += 1;

    if score > GOOD_SCORE_THRESHOLD {
        if path.total_doors > PlayerPath::MIN_LENGTH {
            path.total_doors -= 1;
        }
        if path.current_difficulty > Door::MIN_DIFFICULTY {
            path.current_difficulty -= 1;
        }
    } else if score < POOR_SCORE_THRESHOLD {
        path.total_doors += 1;
        if path.current_difficulty < Door::MAX_DIFFICULTY {
            path.current_difficulty += 1;
        }
    }
}

/// Maps a (usually group-average) score to the next shared door's
/// difficulty: reward good play with an easier door, punish poor play
/// with a harder one.
pub fn difficulty_for_score(score: u32) -> u8 {
    if score > GOOD_SCORE_THRESHOLD {
        1
    } else if score < POOR_SCORE_THRESHOLD {
        3
    } else {
        2
    }
}
