//! End-to-end games over the assembled engine.
//!
//! These tests exercise the whole stack the way a transport layer
//! would: channels registered with the registry observe the event
//! stream while the coordinator drives sessions to completion. Paused
//! time makes the 60-second window and 3-second pauses instant.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gatecrash::memory::MemoryLeaderboard;
use gatecrash::prelude::*;
use tokio::sync::mpsc;

// =========================================================================
// Fixtures
// =========================================================================

/// Scores every response the same on all four axes.
struct FixedOracle(u32);

#[async_trait]
impl ScoreOracle for FixedOracle {
    async fn score(&self, _door: &Door, _text: &str) -> Result<ScoreBreakdown, OracleError> {
        Ok(ScoreBreakdown {
            creativity: self.0,
            feasibility: self.0,
            humor: self.0,
            originality: self.0,
        })
    }
}

struct World {
    engine: Gatecrash,
    leaderboard: Arc<MemoryLeaderboard>,
}

fn world(score: u32) -> World {
    let leaderboard: Arc<MemoryLeaderboard> = Arc::new(MemoryLeaderboard::default());
    let engine = Gatecrash::builder()
        .oracle(Arc::new(FixedOracle(score)))
        .leaderboard(leaderboard.clone())
        .build();
    World {
        engine,
        leaderboard,
    }
}

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

/// Registers a live channel for a player and returns the receive half.
async fn connect(world: &World, session: SessionId, player: PlayerId) -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    world.engine.registry().register(session, player, tx).await;
    rx
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

/// Drives every listed player until the session completes, answering
/// each fresh door once per player. Panics after a generous step
/// budget so a stuck game fails loudly instead of hanging.
async fn play_until_complete(handle: &SessionHandle, players: &[PlayerId]) -> Session {
    for _ in 0..400 {
        let session = handle.snapshot().await.unwrap();
        if session.status.is_completed() {
            return session;
        }
        let mut submitted = false;
        if let Some(door) = &session.current_door {
            for player in players {
                let answered = session
                    .player(*player)
                    .is_some_and(|p| p.has_responded(door.door_id));
                if !answered {
                    let _ = handle.submit_response(*player, "improvise wildly").await;
                    submitted = true;
                }
            }
        }
        if !submitted {
            // Between rounds: let paused time run to the next door.
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
    panic!("game did not complete within the step budget");
}

// =========================================================================
// Full multiplayer game
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_multiplayer_game_runs_to_completion_with_event_stream() {
    let w = world(95);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::Multiplayer, pid(1), "alice", None)
        .await;
    let session_id = handle.session_id();

    let mut alice_rx = connect(&w, session_id, pid(1)).await;
    handle.join(pid(2), "bob").await.unwrap();
    let mut bob_rx = connect(&w, session_id, pid(2)).await;

    handle.start().await.unwrap();
    let session = play_until_complete(&handle, &[pid(1), pid(2)]).await;

    // Scoring 95 each round shortens both paths by one per answer:
    // position meets length at 5/5 after five rounds.
    assert!(session.status.is_completed());
    assert_eq!(session.players[0].responses.len(), 5);
    assert_eq!(session.players[1].responses.len(), 5);

    let events = drain(&mut alice_rx);
    let kinds = kinds(&events);
    assert!(kinds.contains(&EventKind::PlayerJoined));
    assert!(kinds.contains(&EventKind::GameStarted));
    assert!(kinds.contains(&EventKind::DoorPresented));
    assert!(kinds.contains(&EventKind::ResponseSubmitted));
    assert!(kinds.contains(&EventKind::RealTimeScoreUpdate));
    assert!(kinds.contains(&EventKind::ScoresUpdated));
    assert!(kinds.contains(&EventKind::ProgressUpdate));
    assert!(kinds.contains(&EventKind::LeaderboardUpdate));
    assert!(kinds.contains(&EventKind::FinalRankings));
    assert!(kinds.contains(&EventKind::PerformanceStatistics));
    assert!(kinds.contains(&EventKind::GameCompleted));

    // Both players crossed the line in the same evaluation pass; the
    // documented tie-break hands the win to the first in roster order.
    let completed = events
        .iter()
        .find(|e| e.kind == EventKind::GameCompleted)
        .expect("completion event");
    assert_eq!(completed.data["winnerId"], serde_json::json!(pid(1)));
    assert_eq!(completed.data["winnerUsername"], "alice");
    assert!(completed.data["finalRankings"].is_array());
    assert!(completed.data["performanceStats"].is_array());

    // Bob saw the same completion.
    assert!(
        drain(&mut bob_rx)
            .iter()
            .any(|e| e.kind == EventKind::GameCompleted)
    );

    // One leaderboard row per player who answered at least one door.
    let entries = w.leaderboard.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.doors_completed == 5));
}

#[tokio::test(start_paused = true)]
async fn test_final_rankings_winner_first() {
    let w = world(95);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::Multiplayer, pid(1), "alice", None)
        .await;
    handle.join(pid(2), "bob").await.unwrap();
    handle.start().await.unwrap();
    let session = play_until_complete(&handle, &[pid(1), pid(2)]).await;

    let rankings = w.engine.progress().final_rankings(&session).await;

    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0].rank, 1);
    assert!(rankings[0].is_winner);
    assert_eq!(rankings[0].completion_rate, 100.0);
    assert_eq!(rankings[1].rank, 2);
}

// =========================================================================
// Door presentation contract
// =========================================================================

#[tokio::test]
async fn test_door_presented_carries_sixty_second_limit() {
    let w = world(50);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::SinglePlayer, pid(1), "alice", Some("social".into()))
        .await;
    let mut rx = connect(&w, handle.session_id(), pid(1)).await;

    handle.start().await.unwrap();

    let events = drain(&mut rx);
    let presented = events
        .iter()
        .find(|e| e.kind == EventKind::DoorPresented)
        .expect("door presented");
    assert_eq!(presented.data["timeLimit"], 60);
    assert_eq!(presented.data["door"]["theme"], "social");
    assert_eq!(presented.data["door"]["difficulty"], 1);
}

// =========================================================================
// Timeout path
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_round_times_out_with_partial_responses() {
    let w = world(50);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::Multiplayer, pid(1), "alice", None)
        .await;
    let session_id = handle.session_id();
    let mut rx = connect(&w, session_id, pid(1)).await;
    handle.join(pid(2), "bob").await.unwrap();
    handle.start().await.unwrap();

    let first_door = handle
        .snapshot()
        .await
        .unwrap()
        .current_door
        .expect("round open")
        .door_id;

    // Only Alice answers. Bob never does; the 60s timer must close
    // the round on its own.
    handle
        .submit_response(pid(1), "slip out the back")
        .await
        .unwrap();

    let mut closed = false;
    for _ in 0..100 {
        let session = handle.snapshot().await.unwrap();
        if session.current_door.as_ref().map(|d| d.door_id) != Some(first_door) {
            closed = true;
            break;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    assert!(closed, "timeout never closed the round");

    let events = drain(&mut rx);
    assert!(
        events.iter().any(|e| e.kind == EventKind::ResponseTimeout),
        "response-timeout should have been announced"
    );

    // Alice's answer persisted; Bob simply has none for that door.
    let session = handle.snapshot().await.unwrap();
    assert_eq!(session.player(pid(1)).unwrap().responses.len(), 1);
    assert_eq!(session.player(pid(2)).unwrap().responses.len(), 0);
    assert!(session.status.is_active(), "timeout must not end the game");
}

// =========================================================================
// Reconnection
// =========================================================================

#[tokio::test]
async fn test_reconnection_events_reach_the_rest_of_the_roster() {
    let w = world(50);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::Multiplayer, pid(1), "alice", None)
        .await;
    let session_id = handle.session_id();
    let mut alice_rx = connect(&w, session_id, pid(1)).await;
    handle.join(pid(2), "bob").await.unwrap();
    let _bob_rx = connect(&w, session_id, pid(2)).await;
    drain(&mut alice_rx);

    // Bob drops and comes back within the grace window.
    w.engine.registry().unregister(pid(2)).await.unwrap();
    let (tx, _new_bob_rx) = mpsc::unbounded_channel();
    let restored = w.engine.registry().restore(pid(2), tx).await.unwrap();
    assert_eq!(restored, session_id);

    let events = drain(&mut alice_rx);
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EventKind::PlayerDisconnected));
    assert!(kinds.contains(&EventKind::PlayerReconnected));

    // Dropping the channel never touched game membership.
    let session = handle.snapshot().await.unwrap();
    assert!(session.player(pid(2)).unwrap().is_active);
}

#[tokio::test]
async fn test_disconnected_player_keeps_roster_slot() {
    let w = world(50);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::Multiplayer, pid(1), "alice", None)
        .await;
    handle.join(pid(2), "bob").await.unwrap();
    let session_id = handle.session_id();
    let _rx = connect(&w, session_id, pid(2)).await;

    w.engine.registry().unregister(pid(2)).await.unwrap();

    // Connection gone, membership intact.
    assert!(
        w.engine
            .registry()
            .active_connections(session_id)
            .await
            .is_empty()
    );
    assert_eq!(handle.snapshot().await.unwrap().players.len(), 2);
}

// =========================================================================
// Liveness annotation
// =========================================================================

#[tokio::test]
async fn test_realtime_status_reflects_registry_liveness() {
    let w = world(50);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::Multiplayer, pid(1), "alice", None)
        .await;
    let session_id = handle.session_id();
    let _alice_rx = connect(&w, session_id, pid(1)).await;
    handle.join(pid(2), "bob").await.unwrap();
    // Bob never connects a channel.

    let session = handle.snapshot().await.unwrap();
    let active = w.engine.registry().active_connections(session_id).await;
    let status = w.engine.progress().realtime_status(&session, &active).await;

    assert!(status.players[0].is_active);
    assert!(!status.players[1].is_active);
}

// =========================================================================
// Wire format
// =========================================================================

#[tokio::test]
async fn test_event_stream_survives_the_json_codec() {
    // What a transport edge would do: encode each pushed event and
    // send the bytes. Round-trip every event of a session start.
    let w = world(50);
    let handle = w
        .engine
        .coordinator()
        .create_session(GameMode::SinglePlayer, pid(1), "alice", None)
        .await;
    let mut rx = connect(&w, handle.session_id(), pid(1)).await;
    handle.start().await.unwrap();

    let codec = JsonCodec;
    for event in drain(&mut rx) {
        let bytes = codec.encode(&event).unwrap();
        let decoded: Event = codec.decode(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
