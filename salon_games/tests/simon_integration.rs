//! Simon says rules integration tests.

use std::sync::Arc;

use salon_games::audit::MemoryAuditLog;
use salon_games::game::{
    CreateOptions, GameEngine, GameError, GameId, GameStatus, GameStatusView, SimonPhase,
};
use salon_games::stats::{MemoryStatsStore, StatsStore};
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

fn palette_a() -> Vec<String> {
    ["#111111", "#222222", "#333333", "#444444", "#555555", "#666666"]
        .map(String::from)
        .to_vec()
}

fn palette_b() -> Vec<String> {
    ["#AAAAAA", "#BBBBBB", "#CCCCCC", "#DDDDDD", "#EEEEEE", "#FFFFFF"]
        .map(String::from)
        .to_vec()
}

/// Create a two-player game with both palettes committed and both players
/// ready. User 1 is the starter.
async fn started_game(w: &World) -> GameId {
    let created = w
        .engine
        .create_game(1, "simonsay", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();
    w.engine.set_colors(1, created.game_id, palette_a()).await.unwrap();
    w.engine.set_colors(2, created.game_id, palette_b()).await.unwrap();
    w.engine.set_ready(1, created.game_id).await.unwrap();
    let outcome = w.engine.set_ready(2, created.game_id).await.unwrap();
    assert_eq!(outcome.status, GameStatus::Started);
    created.game_id
}

#[tokio::test]
async fn palettes_must_be_six_valid_colors_committed_in_the_lobby() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "simonsay", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();

    let err = w
        .engine
        .set_colors(1, created.game_id, vec!["#111111".into()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::WrongColorCount { expected: 6, got: 1 }
    ));

    let mut bad = palette_a();
    bad[0] = "red".into();
    let err = w.engine.set_colors(1, created.game_id, bad).await.unwrap_err();
    assert!(matches!(err, GameError::InvalidColor(_)));

    // Lowercase input is normalized before storage.
    let lower: Vec<String> = palette_a().iter().map(|c| c.to_lowercase()).collect();
    w.engine.set_colors(1, created.game_id, lower).await.unwrap();
    let player = w
        .store
        .player_for_user(created.game_id, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(player.simon().unwrap().custom_colors, palette_a());
}

#[tokio::test]
async fn readiness_without_palettes_does_not_start_the_game() {
    let w = world();
    let created = w
        .engine
        .create_game(1, "simonsay", CreateOptions::default())
        .await
        .unwrap();
    w.engine.join_game(2, &created.code).await.unwrap();
    w.engine.set_colors(1, created.game_id, palette_a()).await.unwrap();

    w.engine.set_ready(1, created.game_id).await.unwrap();
    let outcome = w.engine.set_ready(2, created.game_id).await.unwrap();
    assert_eq!(outcome.status, GameStatus::Waiting);

    // The lobby reflects the missing palette too.
    let lobby = w.engine.lobby_status(1, created.game_id).await.unwrap();
    assert!(!lobby.can_start);

    // Committing the missing palette is what unlocks the start.
    w.engine.set_colors(2, created.game_id, palette_b()).await.unwrap();
    let lobby = w.engine.lobby_status(1, created.game_id).await.unwrap();
    assert!(lobby.can_start);
    w.engine.set_ready(2, created.game_id).await.unwrap();
    let game = w.store.game(created.game_id).await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::Started);
    assert_eq!(game.current_turn, Some(1));
    assert_eq!(game.simon().unwrap().starter, Some(1));
}

#[tokio::test]
async fn first_color_choice_seeds_the_opponent_sequence() {
    let w = world();
    let game_id = started_game(&w).await;

    // The color must come from the opponent's palette, not the chooser's.
    let err = w
        .engine
        .choose_color(1, game_id, "#111111")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::ColorNotInPalette));

    w.engine.choose_color(1, game_id, "#AAAAAA").await.unwrap();

    let game = w.store.game(game_id).await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::InProgress);
    assert_eq!(game.current_turn, Some(2));

    let opponent = w.store.player_for_user(game_id, 2).await.unwrap().unwrap();
    let state = opponent.simon().unwrap();
    assert_eq!(state.sequence, vec!["#AAAAAA".to_string()]);
    assert_eq!(state.current_index, 0);
}

#[tokio::test]
async fn completed_sequence_switches_to_choosing_without_moving_the_turn() {
    let w = world();
    let game_id = started_game(&w).await;
    w.engine.choose_color(1, game_id, "#AAAAAA").await.unwrap();

    // Player 2 cannot choose before repeating their sequence.
    let err = w
        .engine
        .choose_color(2, game_id, "#111111")
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::SequenceIncomplete));

    let outcome = w.engine.play_color(2, game_id, "#AAAAAA").await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.phase, SimonPhase::ChooseColor);

    // The turn is still player 2's; playing past the end is rejected.
    let game = w.store.game(game_id).await.unwrap().unwrap();
    assert_eq!(game.current_turn, Some(2));
    let err = w.engine.play_color(2, game_id, "#AAAAAA").await.unwrap_err();
    assert!(matches!(err, GameError::SequenceCompleted));

    // Now player 2 extends player 1's sequence and hands the turn over.
    w.engine.choose_color(2, game_id, "#111111").await.unwrap();
    let game = w.store.game(game_id).await.unwrap().unwrap();
    assert_eq!(game.current_turn, Some(1));
}

#[tokio::test]
async fn sequences_grow_round_by_round() {
    let w = world();
    let game_id = started_game(&w).await;
    w.engine.choose_color(1, game_id, "#AAAAAA").await.unwrap();
    w.engine.play_color(2, game_id, "#AAAAAA").await.unwrap();
    w.engine.choose_color(2, game_id, "#111111").await.unwrap();
    w.engine.play_color(1, game_id, "#111111").await.unwrap();
    w.engine.choose_color(1, game_id, "#BBBBBB").await.unwrap();

    // Player 2 now repeats a two-color sequence.
    let outcome = w.engine.play_color(2, game_id, "#AAAAAA").await.unwrap();
    assert_eq!(outcome.phase, SimonPhase::Repeat);
    let outcome = w.engine.play_color(2, game_id, "#BBBBBB").await.unwrap();
    assert_eq!(outcome.phase, SimonPhase::ChooseColor);
}

#[tokio::test]
async fn wrong_color_ends_the_game_without_experience() {
    let w = world();
    let game_id = started_game(&w).await;
    w.engine.choose_color(1, game_id, "#AAAAAA").await.unwrap();

    let outcome = w.engine.play_color(2, game_id, "#BBBBBB").await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.phase, SimonPhase::Finished);

    let game = w.store.game(game_id).await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::Finished);
    assert_eq!(game.winner, Some(1));

    // The failing player's sequence is left as it was.
    let loser = w.store.player_for_user(game_id, 2).await.unwrap().unwrap();
    assert_eq!(loser.simon().unwrap().sequence.len(), 1);

    // Outcomes are recorded but no experience changes hands.
    let winner_stats = &w.stats.stats(1).await.unwrap()[0];
    assert_eq!(winner_stats.wins, 1);
    assert_eq!(winner_stats.experience, 0);
    let loser_stats = &w.stats.stats(2).await.unwrap()[0];
    assert_eq!(loser_stats.losses, 1);
    assert_eq!(loser_stats.experience, 0);
}

#[tokio::test]
async fn status_view_hides_the_sequences_behind_lengths() {
    let w = world();
    let game_id = started_game(&w).await;
    w.engine.choose_color(1, game_id, "#AAAAAA").await.unwrap();
    w.engine.play_color(2, game_id, "#AAAAAA").await.unwrap();
    w.engine.choose_color(2, game_id, "#111111").await.unwrap();
    w.engine.play_color(1, game_id, "#111111").await.unwrap();
    w.engine.choose_color(1, game_id, "#BBBBBB").await.unwrap();

    // Player 2 owes two colors but only sees the newest one.
    let GameStatusView::SimonSays(view) = w.engine.game_status(2, game_id).await.unwrap()
    else {
        panic!("wrong view variant");
    };
    assert_eq!(view.your_sequence_len, 2);
    assert_eq!(view.your_index, 0);
    assert_eq!(view.latest_color, Some("#BBBBBB".to_string()));
    let opponent = view.opponent.unwrap();
    assert_eq!(opponent.user_id, 1);
    assert_eq!(opponent.sequence_len, 1);
}

#[tokio::test]
async fn surrender_of_started_simon_records_a_loss_without_a_winner() {
    let w = world();
    let game_id = started_game(&w).await;

    w.engine.surrender(2, game_id).await.unwrap();

    let game = w.store.game(game_id).await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::Finished);
    assert_eq!(game.winner, None);
    let loser = w.store.player_for_user(game_id, 2).await.unwrap().unwrap();
    assert!(game.surrendered_by.contains(&loser.id));

    // The walkout goes on the leaver's record; nobody is credited a win.
    let loser_stats = &w.stats.stats(2).await.unwrap()[0];
    assert_eq!(loser_stats.losses, 1);
    assert_eq!(loser_stats.experience, 0);
    assert!(w.stats.stats(1).await.unwrap().is_empty());
}
