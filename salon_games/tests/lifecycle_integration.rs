//! Integration tests for the shared game lifecycle: create, join, ready,
//! surrender and rematch.

use std::sync::Arc;

use salon_games::audit::MemoryAuditLog;
use salon_games::game::{
    CreateOptions, ErrorKind, GameEngine, GameError, GameStatus,
};
use salon_games::stats::{MemoryStatsStore, StatsStore};
use salon_games::store::{GameStore, MemoryGameStore};

struct World {
    engine: GameEngine,
    store: Arc<MemoryGameStore>,
    stats: Arc<MemoryStatsStore>,
    audit: Arc<MemoryAuditLog>,
}

fn world() -> World {
    let store = Arc::new(MemoryGameStore::new());
    let stats = Arc::new(MemoryStatsStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let engine = GameEngine::new(store.clone(), stats.clone(), audit.clone());
    World {
        engine,
        store,
        stats,
        audit,
    }
}

#[tokio::test]
async fn create_and_join_battleship() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    assert_eq!(created.code.len(), 8);

    let game = w.engine.join_game(2, &created.code).await.unwrap();
    assert_eq!(game.players.len(), 2);
    assert_eq!(game.status, GameStatus::Waiting);

    // Duplicate join is rejected for every game type.
    let err = w.engine.join_game(2, &created.code).await.unwrap_err();
    assert!(matches!(err, GameError::AlreadyJoined));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Battleship is strictly head-to-head.
    let err = w.engine.join_game(3, &created.code).await.unwrap_err();
    assert!(matches!(err, GameError::GameFull));
}

#[tokio::test]
async fn join_with_unknown_code_is_not_found() {
    let w = world();
    let err = w.engine.join_game(1, "NOPE2345").await.unwrap_err();
    assert!(matches!(err, GameError::GameNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unsupported_game_type_is_rejected() {
    let w = world();
    let err = w
        .engine
        .create_game(1, "checkers", CreateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::UnsupportedGameType(_)));
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[tokio::test]
async fn both_ready_starts_battleship_in_progress() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();

    let outcome = w.engine.set_ready(1, created.game_id).await.unwrap();
    assert!(!outcome.all_ready);
    assert_eq!(outcome.status, GameStatus::Waiting);

    let outcome = w.engine.set_ready(2, created.game_id).await.unwrap();
    assert!(outcome.all_ready);
    assert_eq!(outcome.status, GameStatus::InProgress);

    let game = w.store.game(created.game_id).await.unwrap().unwrap();
    assert!(matches!(game.current_turn, Some(1) | Some(2)));
    assert!(w
        .audit
        .events_for(created.game_id)
        .contains(&"game_started".to_string()));
}

#[tokio::test]
async fn ready_is_idempotent() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();

    w.engine.set_ready(1, created.game_id).await.unwrap();
    let again = w.engine.set_ready(1, created.game_id).await.unwrap();
    assert!(!again.all_ready);
    assert_eq!(again.status, GameStatus::Waiting);
}

#[tokio::test]
async fn game_status_is_gated_until_start() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();

    let err = w.engine.game_status(1, created.game_id).await.unwrap_err();
    assert!(matches!(err, GameError::NotStarted));

    // Non-participants cannot even see the lobby.
    let err = w.engine.lobby_status(9, created.game_id).await.unwrap_err();
    assert!(matches!(err, GameError::Forbidden(9)));
}

#[tokio::test]
async fn lobby_withdrawal_deletes_player_and_empty_game() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();

    // The second player withdraws; the lobby stays up.
    w.engine.surrender(2, created.game_id).await.unwrap();
    let game = w.store.game(created.game_id).await.unwrap().unwrap();
    assert_eq!(game.players.len(), 1);
    assert!(w
        .store
        .player_for_user(created.game_id, 2)
        .await
        .unwrap()
        .is_none());

    // The last player leaving deletes the game entirely.
    w.engine.surrender(1, created.game_id).await.unwrap();
    assert!(w.store.game(created.game_id).await.unwrap().is_none());
}

#[tokio::test]
async fn loteria_host_transfers_on_lobby_withdrawal() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "loteria", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();
    w.engine.join_game(3, &created.code).await.unwrap();

    w.engine.surrender(1, created.game_id).await.unwrap();

    let game = w.store.game(created.game_id).await.unwrap().unwrap();
    assert_eq!(game.loteria().unwrap().host_user_id, 2);
    let player = w
        .store
        .player_for_user(created.game_id, 2)
        .await
        .unwrap()
        .unwrap();
    assert!(player.loteria().unwrap().is_host);
}

#[tokio::test]
async fn surrender_of_started_battleship_declares_the_other_winner() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();
    w.engine.set_ready(1, created.game_id).await.unwrap();
    w.engine.set_ready(2, created.game_id).await.unwrap();

    w.engine.surrender(1, created.game_id).await.unwrap();

    let game = w.store.game(created.game_id).await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::Finished);
    assert_eq!(game.winner, Some(2));
    assert_eq!(game.current_turn, None);

    // Both outcomes land in the stats, but a concession earns nothing.
    let winner = &w.stats.stats(2).await.unwrap()[0];
    assert_eq!(winner.wins, 1);
    assert_eq!(winner.experience, 0);
    let loser = &w.stats.stats(1).await.unwrap()[0];
    assert_eq!(loser.losses, 1);
    assert_eq!(loser.experience, 0);

    // Finished is terminal for surrender too.
    let err = w.engine.surrender(2, created.game_id).await.unwrap_err();
    assert!(matches!(err, GameError::GameFinished));
}

#[tokio::test]
async fn rematch_requires_a_finished_game_and_is_idempotent() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();
    w.engine.set_ready(1, created.game_id).await.unwrap();
    w.engine.set_ready(2, created.game_id).await.unwrap();

    let err = w
        .engine
        .request_rematch(1, created.game_id)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidStatus(_)));

    w.engine.surrender(1, created.game_id).await.unwrap();

    let outcome = w.engine.request_rematch(1, created.game_id).await.unwrap();
    assert_eq!(outcome.requested, 1);
    assert!(!outcome.all_requested);

    // Repeating the request changes nothing.
    let outcome = w.engine.request_rematch(1, created.game_id).await.unwrap();
    assert_eq!(outcome.requested, 1);

    let outcome = w.engine.request_rematch(2, created.game_id).await.unwrap();
    assert!(outcome.all_requested);
}
