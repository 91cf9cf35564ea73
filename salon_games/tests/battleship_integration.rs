//! Battleship rules integration tests.
//!
//! Boards are rewritten through the store to known layouts so the attack
//! outcomes are deterministic.

use std::sync::Arc;

use salon_games::audit::MemoryAuditLog;
use salon_games::game::entities::{Board, Cell, MoveAction};
use salon_games::game::{
    AttackResult, CreateOptions, GameEngine, GameError, GameId, GameStatus, GameType,
    GameStatusView, UserId,
};
use salon_games::stats::{LOSS_EXPERIENCE, MemoryStatsStore, StatsStore, WIN_EXPERIENCE};
use salon_games::store::{GameStore, MemoryGameStore};

struct World {
    engine: GameEngine,
    store: Arc<MemoryGameStore>,
    stats: Arc<MemoryStatsStore>,
}

fn world() -> World {
    let store = Arc::new(MemoryGameStore::new());
    let stats = Arc::new(MemoryStatsStore::new());
    let engine = GameEngine::new(store.clone(), stats.clone(), Arc::new(MemoryAuditLog::new()));
    World {
        engine,
        store,
        stats,
    }
}

/// Create a two-player battleship game, mark both ready and replace both
/// boards with known layouts. Player 1 always has the first turn.
async fn started_game(w: &World, ships_1: &[(u8, u8)], ships_2: &[(u8, u8)]) -> GameId {
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();
    w.engine.set_ready(1, created.game_id).await.unwrap();
    w.engine.set_ready(2, created.game_id).await.unwrap();
    rig_board(&w.store, created.game_id, 1, ships_1).await;
    rig_board(&w.store, created.game_id, 2, ships_2).await;
    created.game_id
}

async fn rig_board(store: &MemoryGameStore, game_id: GameId, user: UserId, ships: &[(u8, u8)]) {
    let mut player = store.player_for_user(game_id, user).await.unwrap().unwrap();
    let board = &mut player.battleship_mut().unwrap().board;
    *board = Board::default();
    for &(x, y) in ships {
        board.set(x, y, Cell::Ship);
    }
    store.update_player(&player).await.unwrap();
}

async fn current_turn(store: &MemoryGameStore, game_id: GameId) -> Option<UserId> {
    store.game(game_id).await.unwrap().unwrap().current_turn
}

#[tokio::test]
async fn miss_transfers_the_turn() {
    let w = world();
    let game_id = started_game(&w, &[(0, 0)], &[(0, 0)]).await;
    assert_eq!(current_turn(&w.store, game_id).await, Some(1));

    let outcome = w.engine.attack(1, game_id, 5, 5).await.unwrap();
    assert!(matches!(outcome.status, AttackResult::Miss));
    assert_eq!(current_turn(&w.store, game_id).await, Some(2));

    // The miss is recorded on the defender's board.
    let defender = w.store.player_for_user(game_id, 2).await.unwrap().unwrap();
    assert_eq!(defender.battleship().unwrap().board.cell(5, 5), Cell::Miss);
}

#[tokio::test]
async fn hit_keeps_the_turn() {
    let w = world();
    let game_id = started_game(&w, &[(0, 0)], &[(3, 4), (7, 7)]).await;

    let outcome = w.engine.attack(1, game_id, 3, 4).await.unwrap();
    assert!(matches!(outcome.status, AttackResult::Hit));
    assert_eq!(current_turn(&w.store, game_id).await, Some(1));

    let attacker = w.store.player_for_user(game_id, 1).await.unwrap().unwrap();
    assert_eq!(attacker.battleship().unwrap().ships_sunk, 1);
    let defender = w.store.player_for_user(game_id, 2).await.unwrap().unwrap();
    assert_eq!(defender.battleship().unwrap().ships_lost, 1);
}

#[tokio::test]
async fn attacking_the_same_cell_twice_is_a_conflict() {
    let w = world();
    let game_id = started_game(&w, &[(0, 0)], &[(3, 4), (7, 7)]).await;

    // A hit keeps the turn, so the same attacker can try the cell again.
    w.engine.attack(1, game_id, 3, 4).await.unwrap();
    let err = w.engine.attack(1, game_id, 3, 4).await.unwrap_err();
    assert!(matches!(err, GameError::AlreadyAttacked));
}

#[tokio::test]
async fn out_of_turn_and_out_of_bounds_attacks_are_rejected() {
    let w = world();
    let game_id = started_game(&w, &[(0, 0)], &[(0, 0)]).await;

    let err = w.engine.attack(2, game_id, 0, 0).await.unwrap_err();
    assert!(matches!(err, GameError::NotYourTurn));

    let err = w.engine.attack(1, game_id, 8, 0).await.unwrap_err();
    assert!(matches!(err, GameError::InvalidCoordinates { x: 8, y: 0 }));
}

#[tokio::test]
async fn attack_before_start_is_rejected() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "battleship", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();

    let err = w.engine.attack(1, created.game_id, 0, 0).await.unwrap_err();
    assert!(matches!(err, GameError::NotStarted));
}

#[tokio::test]
async fn sinking_the_last_ship_wins_and_awards_experience() {
    let w = world();
    let game_id = started_game(&w, &[(0, 0)], &[(2, 2)]).await;

    let outcome = w.engine.attack(1, game_id, 2, 2).await.unwrap();
    assert!(matches!(outcome.status, AttackResult::Win));

    let game = w.store.game(game_id).await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::Finished);
    assert_eq!(game.winner, Some(1));
    assert_eq!(game.current_turn, None);

    let winner = &w.stats.stats(1).await.unwrap()[0];
    assert_eq!(winner.game_type, GameType::Battleship);
    assert_eq!(winner.wins, 1);
    assert_eq!(winner.experience, u64::from(WIN_EXPERIENCE));
    let loser = &w.stats.stats(2).await.unwrap()[0];
    assert_eq!(loser.losses, 1);
    assert_eq!(loser.experience, u64::from(LOSS_EXPERIENCE));

    // Terminal state rejects further moves.
    let err = w.engine.attack(2, game_id, 0, 0).await.unwrap_err();
    assert!(matches!(err, GameError::GameFinished));
}

#[tokio::test]
async fn every_attack_is_recorded_as_a_move() {
    let w = world();
    let game_id = started_game(&w, &[(0, 0)], &[(3, 4), (7, 7)]).await;

    w.engine.attack(1, game_id, 3, 4).await.unwrap();
    w.engine.attack(1, game_id, 0, 1).await.unwrap();

    let player = w.store.player_for_user(game_id, 1).await.unwrap().unwrap();
    let moves = w.store.moves_for_player(player.id).await.unwrap();
    assert_eq!(moves.len(), 2);
    assert!(moves.iter().all(|m| m.action == MoveAction::Attack));
    assert_eq!(moves[0].detail["x"], 3);
    assert_eq!(moves[0].detail["y"], 4);
    assert_eq!(moves[0].detail["result"], "hit");
}

#[tokio::test]
async fn status_view_masks_the_opponent_board() {
    let w = world();
    let game_id = started_game(&w, &[(0, 0)], &[(3, 4)]).await;
    w.engine.attack(1, game_id, 5, 5).await.unwrap();

    let view = w.engine.game_status(1, game_id).await.unwrap();
    let GameStatusView::Battleship(view) = view else {
        panic!("expected a battleship view");
    };
    let opponent = view.opponent.unwrap();
    assert_eq!(opponent.user_id, 2);
    // The un-hit ship at (3, 4) must look empty to the attacker.
    assert_eq!(opponent.board.cell(3, 4), Cell::Empty);
    assert_eq!(opponent.board.cell(5, 5), Cell::Miss);
    // Your own board shows your ships.
    assert_eq!(view.your_board.cell(0, 0), Cell::Ship);
}
