//! End-of-game computation: final rankings and performance statistics.
//!
//! Both views are produced once, at completion, from the final session
//! snapshot. Ranking order is fully deterministic:
//!
//! 1. all winners before all non-winners
//! 2. winners: ascending completion time (untimed winners last)
//! 3. non-winners: completion rate descending, then average score
//!    descending
//!
//! Ranks are assigned 1..N after sorting; the sort is stable, so
//! players tied on every key keep roster order.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gatecrash_protocol::{Player, PlayerId, PlayerPath, Session};
use serde::{Deserialize, Serialize};

use crate::ProgressEngine;

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// One row of the final ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub player_id: PlayerId,
    pub username: String,
    /// 1-based rank after sorting.
    pub rank: u32,
    /// Start-to-last-response duration; only winners with a recorded
    /// session start get one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<Duration>,
    pub total_score: u32,
    pub average_score: f64,
    pub doors_completed: usize,
    pub total_doors: u32,
    /// Percent of the path completed.
    pub completion_rate: f64,
    pub is_winner: bool,
}

/// Detailed per-player statistics computed at completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub player_id: PlayerId,
    pub username: String,
    pub total_score: u32,
    pub doors_completed: usize,
    pub total_doors: u32,
    pub completion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<Duration>,
    /// How short the player kept their path, mapped onto `[0, 100]`:
    /// 15 doors (or more) is 0%, 5 doors (or fewer) is 100%.
    pub path_efficiency: f64,
    pub highest_score: u32,
    pub lowest_score: u32,
    pub average_score: f64,
    pub average_response_time: Duration,
    pub creativity_average: f64,
    pub feasibility_average: f64,
    pub humor_average: f64,
    pub originality_average: f64,
}

// ---------------------------------------------------------------------------
// Engine methods
// ---------------------------------------------------------------------------

impl ProgressEngine {
    /// The final ranking table, one entry per roster player.
    pub async fn final_rankings(&self, session: &Session) -> Vec<RankingEntry> {
        let mut entries = Vec::with_capacity(session.players.len());
        for player in &session.players {
            let path = self.path_or_default(player).await;
            entries.push(ranking_entry(session, player, &path));
        }

        entries.sort_by(compare_rankings);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i as u32 + 1;
        }
        entries
    }

    /// Detailed statistics for every roster player.
    pub async fn performance_statistics(&self, session: &Session) -> Vec<PerformanceStats> {
        let mut stats = Vec::with_capacity(session.players.len());
        for player in &session.players {
            let path = self.path_or_default(player).await;
            stats.push(performance_stats(session, player, &path));
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

fn completion_rate(path: &PlayerPath) -> f64 {
    if path.total_doors == 0 {
        return 0.0;
    }
    f64::from(path.current_position) / f64::from(path.total_doors) * 100.0
}

/// Start-to-last-response duration, for players who finished their
/// path in a session with a recorded start.
fn completion_time(session: &Session, player: &Player, path: &PlayerPath) -> Option<Duration> {
    if !path.is_complete() {
        return None;
    }
    let started_at = session.started_at?;
    let last = player.last_response()?;
    last.submitted_at
        .signed_duration_since(started_at)
        .to_std()
        .ok()
}

fn ranking_entry(session: &Session, player: &Player, path: &PlayerPath) -> RankingEntry {
    RankingEntry {
        player_id: player.player_id,
        username: player.username.clone(),
        rank: 0, // assigned after sorting
        completion_time: completion_time(session, player, path),
        total_score: player.total_score,
        average_score: player.average_score(),
        doors_completed: player.responses.len(),
        total_doors: path.total_doors,
        completion_rate: completion_rate(path),
        is_winner: path.is_complete(),
    }
}

fn compare_rankings(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    // Winners first.
    b.is_winner.cmp(&a.is_winner).then_with(|| {
        match (a.is_winner, b.is_winner) {
            // Both winners: fastest first; untimed winners sink.
            (true, true) => match (a.completion_time, b.completion_time) {
                (Some(ta), Some(tb)) => ta.cmp(&tb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            // Both non-winners: furthest along first, scores break ties.
            (false, false) => b
                .completion_rate
                .partial_cmp(&a.completion_rate)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.average_score
                        .partial_cmp(&a.average_score)
                        .unwrap_or(Ordering::Equal)
                }),
            _ => Ordering::Equal,
        }
    })
}

/// Maps path length onto `[0, 100]`: 15 doors → 0%, 5 doors → 100%,
/// linear in between and clamped outside.
fn path_efficiency(total_doors: u32) -> f64 {
    const WORST: f64 = 15.0;
    const BEST: f64 = 5.0;
    ((WORST - f64::from(total_doors)) / (WORST - BEST) * 100.0).clamp(0.0, 100.0)
}

fn performance_stats(session: &Session, player: &Player, path: &PlayerPath) -> PerformanceStats {
    let mut stats = PerformanceStats {
        player_id: player.player_id,
        username: player.username.clone(),
        total_score: player.total_score,
        doors_completed: player.responses.len(),
        total_doors: path.total_doors,
        completion_rate: completion_rate(path),
        completion_time: completion_time(session, player, path),
        path_efficiency: path_efficiency(path.total_doors),
        highest_score: 0,
        lowest_score: 0,
        average_score: 0.0,
        average_response_time: Duration::ZERO,
        creativity_average: 0.0,
        feasibility_average: 0.0,
        humor_average: 0.0,
        originality_average: 0.0,
    };

    if player.responses.is_empty() {
        return stats;
    }

    let count = player.responses.len();
    let mut highest = player.responses[0].score;
    let mut lowest = player.responses[0].score;
    let mut score_sum = 0u32;
    let mut creativity = 0u32;
    let mut feasibility = 0u32;
    let mut humor = 0u32;
    let mut originality = 0u32;
    let mut response_time_sum = chrono::Duration::zero();

    // The first interval is anchored at session start; without a
    // recorded start, the first response anchors itself (interval 0).
    let mut interval_start: DateTime<Utc> = session
        .started_at
        .unwrap_or(player.responses[0].submitted_at);

    for response in &player.responses {
        score_sum += response.score;
        creativity += response.metrics.creativity;
        feasibility += response.metrics.feasibility;
        humor += response.metrics.humor;
        originality += response.metrics.originality;
        highest = highest.max(response.score);
        lowest = lowest.min(response.score);

        response_time_sum =
            response_time_sum + response.submitted_at.signed_duration_since(interval_start);
        interval_start = response.submitted_at;
    }

    let n = count as f64;
    stats.highest_score = highest;
    stats.lowest_score = lowest;
    stats.average_score = f64::from(score_sum) / n;
    stats.creativity_average = f64::from(creativity) / n;
    stats.feasibility_average = f64::from(feasibility) / n;
    stats.humor_average = f64::from(humor) / n;
    stats.originality_average = f64::from(originality) / n;
    stats.average_response_time = (response_time_sum / count as i32)
        .to_std()
        .unwrap_or(Duration::ZERO);

    stats
}

// =========================================================================
// Tests
// =========================================================================
