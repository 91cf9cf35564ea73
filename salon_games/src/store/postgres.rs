//! Postgres-backed entity store.
//!
//! Games and player-games are stored as JSONB documents alongside a few
//! indexed columns (code, game type, status, foreign keys) used by filters.
//! Updates replace the whole document, matching the engine's
//! load-mutate-write model.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;

use super::{GameStore, NewGame, NewMove, NewPlayerGame, StoreError, StoreResult};
use crate::game::entities::{
    Game, GameId, MoveAction, MoveRecord, PlayerGame, PlayerGameId, UserId,
};

/// Postgres implementation of [`GameStore`].
#[derive(Clone)]
pub struct PgGameStore {
    pool: Arc<PgPool>,
}

impl PgGameStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn game_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<Game> {
        let doc: serde_json::Value = row.get("doc");
        let mut game: Game = serde_json::from_value(doc)
            .map_err(|_| StoreError::Corrupt(format!("games.doc id={}", row.get::<i64, _>("id"))))?;
        // The id column is authoritative; the doc copy is advisory.
        game.id = row.get("id");
        Ok(game)
    }

    fn player_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<PlayerGame> {
        let doc: serde_json::Value = row.get("doc");
        let mut player: PlayerGame = serde_json::from_value(doc).map_err(|_| {
            StoreError::Corrupt(format!("player_games.doc id={}", row.get::<i64, _>("id")))
        })?;
        player.id = row.get("id");
        Ok(player)
    }

    fn move_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<MoveRecord> {
        let action: String = row.get("action");
        let action: MoveAction = serde_json::from_value(serde_json::Value::String(action))
            .map_err(|_| StoreError::Corrupt("moves.action".to_string()))?;
        Ok(MoveRecord {
            id: row.get("id"),
            game_id: row.get("game_id"),
            player_game_id: row.get("player_game_id"),
            user_id: row.get("user_id"),
            action,
            detail: row.get("detail"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn create_game(&self, game: NewGame) -> StoreResult<Game> {
        let now = Utc::now();
        let mut doc = Game {
            id: 0,
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

        let row = sqlx::query(
            r#"
            INSERT INTO games (code, game_type, status, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id
            "#,
        )
        .bind(&doc.code)
        .bind(doc.game_type().to_string())
        .bind(doc.status.to_string())
        .bind(serde_json::to_value(&doc)?)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::CodeTaken
            } else {
                StoreError::Database(e)
            }
        })?;

        doc.id = row.get("id");
        // Re-write the doc so its embedded id matches the assigned one.
        self.update_game(&doc).await?;
        Ok(doc)
    }

    async fn game(&self, id: GameId) -> StoreResult<Option<Game>> {
        let row = sqlx::query("SELECT id, doc FROM games WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(Self::game_from_row).transpose()
    }

    async fn joinable_game_by_code(&self, code: &str) -> StoreResult<Option<Game>> {
        let row = sqlx::query(
            "SELECT id, doc FROM games
             WHERE code = $1 AND status IN ('waiting', 'card_selection')",
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.as_ref().map(Self::game_from_row).transpose()
    }

    async fn update_game(&self, game: &Game) -> StoreResult<()> {
        let mut updated = game.clone();
        updated.updated_at = Utc::now();
        sqlx::query(
            "UPDATE games SET code = $2, status = $3, doc = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(game.id)
        .bind(&updated.code)
        .bind(updated.status.to_string())
        .bind(serde_json::to_value(&updated)?)
        .bind(updated.updated_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn delete_game(&self, id: GameId) -> StoreResult<()> {
        sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn create_player(&self, player: NewPlayerGame) -> StoreResult<PlayerGame> {
        let now = Utc::now();
        let mut doc = PlayerGame {
            id: 0,
            game_id: player.game_id,
            user_id: player.user_id,
            result: player.result,
            ready: player.ready,
            state: player.state,
            created_at: now,
        };

        let row = sqlx::query(
            r#"
            INSERT INTO player_games (game_id, user_id, doc, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(doc.game_id)
        .bind(doc.user_id)
        .bind(serde_json::to_value(&doc)?)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        doc.id = row.get("id");
        self.update_player(&doc).await?;
        Ok(doc)
    }

    async fn player(&self, id: PlayerGameId) -> StoreResult<Option<PlayerGame>> {
        let row = sqlx::query("SELECT id, doc FROM player_games WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(Self::player_from_row).transpose()
    }

    async fn player_for_user(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> StoreResult<Option<PlayerGame>> {
        let row = sqlx::query(
            "SELECT id, doc FROM player_games WHERE game_id = $1 AND user_id = $2",
        )
        .bind(game_id)
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.as_ref().map(Self::player_from_row).transpose()
    }

    async fn players_of_game(&self, game_id: GameId) -> StoreResult<Vec<PlayerGame>> {
        let rows = sqlx::query(
            "SELECT id, doc FROM player_games WHERE game_id = $1 ORDER BY id ASC",
        )
        .bind(game_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(Self::player_from_row).collect()
    }

    async fn update_player(&self, player: &PlayerGame) -> StoreResult<()> {
        sqlx::query("UPDATE player_games SET doc = $2 WHERE id = $1")
            .bind(player.id)
            .bind(serde_json::to_value(player)?)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn delete_player(&self, id: PlayerGameId) -> StoreResult<()> {
        sqlx::query("DELETE FROM player_games WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn record_move(&self, mv: NewMove) -> StoreResult<MoveRecord> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO moves (game_id, player_game_id, user_id, action, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(mv.game_id)
        .bind(mv.player_game_id)
        .bind(mv.user_id)
        .bind(mv.action.to_string())
        .bind(&mv.detail)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(MoveRecord {
            id: row.get("id"),
            game_id: mv.game_id,
            player_game_id: mv.player_game_id,
            user_id: mv.user_id,
            action: mv.action,
            detail: mv.detail,
            created_at: now,
        })
    }

    async fn moves_for_player(
        &self,
        player_game_id: PlayerGameId,
    ) -> StoreResult<Vec<MoveRecord>> {
        let rows = sqlx::query(
            "SELECT id, game_id, player_game_id, user_id, action, detail, created_at
             FROM moves WHERE player_game_id = $1 ORDER BY id ASC",
        )
        .bind(player_game_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(Self::move_from_row).collect()
    }
}
