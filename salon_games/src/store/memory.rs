//! In-memory entity store used by tests and local single-process play.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{GameStore, NewGame, NewMove, NewPlayerGame, StoreError, StoreResult};
use crate::game::entities::{
    Game, GameId, MoveRecord, PlayerGame, PlayerGameId, UserId,
};

#[derive(Default)]
struct Tables {
    games: HashMap<GameId, Game>,
    players: HashMap<PlayerGameId, PlayerGame>,
    moves: Vec<MoveRecord>,
    next_game_id: GameId,
    next_player_id: PlayerGameId,
    next_move_id: i64,
}

/// Hash-map backed [`GameStore`].
#[derive(Default)]
pub struct MemoryGameStore {
    tables: Mutex<Tables>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock means a panic mid-test; propagating the panic is
        // the right outcome there.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn create_game(&self, game: NewGame) -> StoreResult<Game> {
        let mut tables = self.lock();
        let taken = tables
            .games
            .values()
            .any(|g| g.status.in_lobby() && g.code == game.code);
        if taken {
            return Err(StoreError::CodeTaken);
        }

        tables.next_game_id += 1;
        let id = tables.next_game_id;
        let now = Utc::now();
        let game = Game {
            id,
            code: game.code,
            status: game.status,
            min_players: game.min_players,
            max_players: game.max_players,
            players: Vec::new(),
            current_turn: None,
            winner: None,
            surrendered_by: Default::default(),
            rematch_requested_by: Default::default(),
            state: game.state,
            created_at: now,
            updated_at: now,
        };
        tables.games.insert(id, game.clone());
        Ok(game)
    }

    async fn game(&self, id: GameId) -> StoreResult<Option<Game>> {
        Ok(self.lock().games.get(&id).cloned())
    }

    async fn joinable_game_by_code(&self, code: &str) -> StoreResult<Option<Game>> {
        Ok(self
            .lock()
            .games
            .values()
            .find(|g| g.status.in_lobby() && g.code == code)
            .cloned())
    }

    async fn update_game(&self, game: &Game) -> StoreResult<()> {
        let mut updated = game.clone();
        updated.updated_at = Utc::now();
        self.lock().games.insert(game.id, updated);
        Ok(())
    }

    async fn delete_game(&self, id: GameId) -> StoreResult<()> {
        self.lock().games.remove(&id);
        Ok(())
    }

    async fn create_player(&self, player: NewPlayerGame) -> StoreResult<PlayerGame> {
        let mut tables = self.lock();
        tables.next_player_id += 1;
        let id = tables.next_player_id;
        let player = PlayerGame {
            id,
            game_id: player.game_id,
            user_id: player.user_id,
            result: player.result,
            ready: player.ready,
            state: player.state,
            created_at: Utc::now(),
        };
        tables.players.insert(id, player.clone());
        Ok(player)
    }

    async fn player(&self, id: PlayerGameId) -> StoreResult<Option<PlayerGame>> {
        Ok(self.lock().players.get(&id).cloned())
    }

    async fn player_for_user(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> StoreResult<Option<PlayerGame>> {
        Ok(self
            .lock()
            .players
            .values()
            .find(|p| p.game_id == game_id && p.user_id == user_id)
            .cloned())
    }

    async fn players_of_game(&self, game_id: GameId) -> StoreResult<Vec<PlayerGame>> {
        let mut players: Vec<PlayerGame> = self
            .lock()
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect();
        players.sort_by_key(|p| p.id);
        Ok(players)
    }

    async fn update_player(&self, player: &PlayerGame) -> StoreResult<()> {
        self.lock().players.insert(player.id, player.clone());
        Ok(())
    }

    async fn delete_player(&self, id: PlayerGameId) -> StoreResult<()> {
        self.lock().players.remove(&id);
        Ok(())
    }

    async fn record_move(&self, mv: NewMove) -> StoreResult<MoveRecord> {
        let mut tables = self.lock();
        tables.next_move_id += 1;
        let record = MoveRecord {
            id: tables.next_move_id,
            game_id: mv.game_id,
            player_game_id: mv.player_game_id,
            user_id: mv.user_id,
            action: mv.action,
            detail: mv.detail,
            created_at: Utc::now(),
        };
        tables.moves.push(record.clone());
        Ok(record)
    }

    async fn moves_for_player(
        &self,
        player_game_id: PlayerGameId,
    ) -> StoreResult<Vec<MoveRecord>> {
        Ok(self
            .lock()
            .moves
            .iter()
            .filter(|m| m.player_game_id == player_game_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{GameState, GameStatus, LoteriaGame, PlayerResult, PlayerState};
    use crate::game::generators;

    fn new_loteria(code: &str) -> NewGame {
        NewGame {
            code: code.to_string(),
            status: GameStatus::Waiting,
            min_players: 4,
            max_players: 16,
            state: GameState::Loteria(LoteriaGame {
                host_user_id: 1,
                available_cards: generators::full_deck(),
                drawn_cards: vec![],
                current_card: None,
            }),
        }
    }

    #[tokio::test]
    async fn codes_are_unique_while_in_lobby() {
        let store = MemoryGameStore::new();
        store.create_game(new_loteria("AAAA2222")).await.unwrap();
        let err = store.create_game(new_loteria("AAAA2222")).await.unwrap_err();
        assert!(matches!(err, StoreError::CodeTaken));

        // Once the first game leaves the lobby the code is reusable.
        let mut game = store.joinable_game_by_code("AAAA2222").await.unwrap().unwrap();
        game.status = GameStatus::Finished;
        store.update_game(&game).await.unwrap();
        store.create_game(new_loteria("AAAA2222")).await.unwrap();
    }

    #[tokio::test]
    async fn players_are_returned_in_join_order() {
        let store = MemoryGameStore::new();
        let game = store.create_game(new_loteria("BBBB3333")).await.unwrap();
        for user_id in [10, 11, 12] {
            store
                .create_player(NewPlayerGame {
                    game_id: game.id,
                    user_id,
                    result: PlayerResult::Pending,
                    ready: false,
                    state: PlayerState::Loteria(Default::default()),
                })
                .await
                .unwrap();
        }
        let players = store.players_of_game(game.id).await.unwrap();
        let ids: Vec<_> = players.iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }
}
