//! Entity store abstraction over Game, PlayerGame and Move records.
//!
//! Rules modules load entities, mutate them in memory and write them back as
//! whole documents. The trait keeps the engine testable against the
//! in-memory store and deployable against Postgres.

use async_trait::async_trait;
use thiserror::Error;

use crate::game::entities::{
    Game, GameId, GameState, GameStatus, MoveAction, MoveRecord, PlayerGame, PlayerGameId,
    PlayerResult, PlayerState, UserId,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryGameStore;
pub use postgres::PgGameStore;

/// Errors from the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("join code already taken")]
    CodeTaken,
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A game document before the store assigns its id.
#[derive(Clone, Debug)]
pub struct NewGame {
    pub code: String,
    pub status: GameStatus,
    pub min_players: u8,
    pub max_players: u8,
    pub state: GameState,
}

/// A player-game document before the store assigns its id.
#[derive(Clone, Debug)]
pub struct NewPlayerGame {
    pub game_id: GameId,
    pub user_id: UserId,
    pub result: PlayerResult,
    pub ready: bool,
    pub state: PlayerState,
}

/// A move audit record before the store assigns its id.
#[derive(Clone, Debug)]
pub struct NewMove {
    pub game_id: GameId,
    pub player_game_id: PlayerGameId,
    pub user_id: UserId,
    pub action: MoveAction,
    pub detail: serde_json::Value,
}

/// Persistence contract for game entities.
///
/// Updates replace the whole document. Filters are equality predicates over
/// indexed fields (id, code, game id, user id, status).
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_game(&self, game: NewGame) -> StoreResult<Game>;

    async fn game(&self, id: GameId) -> StoreResult<Option<Game>>;

    /// Point lookup by join code, restricted to games still in their lobby
    /// phase. Codes are only unique while a game is joinable.
    async fn joinable_game_by_code(&self, code: &str) -> StoreResult<Option<Game>>;

    async fn update_game(&self, game: &Game) -> StoreResult<()>;

    async fn delete_game(&self, id: GameId) -> StoreResult<()>;

    async fn create_player(&self, player: NewPlayerGame) -> StoreResult<PlayerGame>;

    async fn player(&self, id: PlayerGameId) -> StoreResult<Option<PlayerGame>>;

    async fn player_for_user(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> StoreResult<Option<PlayerGame>>;

    /// All players of a game in join order.
    async fn players_of_game(&self, game_id: GameId) -> StoreResult<Vec<PlayerGame>>;

    async fn update_player(&self, player: &PlayerGame) -> StoreResult<()>;

    /// Lobby abandonment only; finished games keep their players for stats
    /// history.
    async fn delete_player(&self, id: PlayerGameId) -> StoreResult<()>;

    async fn record_move(&self, mv: NewMove) -> StoreResult<MoveRecord>;

    async fn moves_for_player(&self, player_game_id: PlayerGameId)
        -> StoreResult<Vec<MoveRecord>>;
}
