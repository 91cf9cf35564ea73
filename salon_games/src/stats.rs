//! Player statistics and experience grants.
//!
//! Victory awards 250 experience to the winner and 125 to the loser.
//! Grants happen after a game is already finished, so failures are logged
//! and swallowed rather than failing the move that ended the game.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::game::entities::{GameType, UserId};

/// Experience granted to the winner of a finished game.
pub const WIN_EXPERIENCE: u32 = 250;
/// Experience granted to each losing participant.
pub const LOSS_EXPERIENCE: u32 = 125;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StatsResult<T> = Result<T, StatsError>;

/// Accumulated per-user, per-game-type record.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerStats {
    pub user_id: UserId,
    pub game_type: GameType,
    pub wins: u32,
    pub losses: u32,
    pub experience: u64,
    pub updated_at: DateTime<Utc>,
}

/// One finished-game outcome for one player.
#[derive(Clone, Copy, Debug)]
pub struct GameOutcome {
    pub user_id: UserId,
    pub game_type: GameType,
    pub won: bool,
    pub experience: u32,
}

/// Persistence for player statistics.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn add_outcome(&self, outcome: GameOutcome) -> StatsResult<()>;

    /// All per-game-type rows for a user, empty if they have never finished
    /// a game.
    async fn stats(&self, user_id: UserId) -> StatsResult<Vec<PlayerStats>>;
}

/// Postgres implementation of [`StatsStore`], one upserted row per
/// (user, game type).
#[derive(Clone)]
pub struct PgStatsStore {
    pool: Arc<PgPool>,
}

impl PgStatsStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn add_outcome(&self, outcome: GameOutcome) -> StatsResult<()> {
        let (wins, losses) = if outcome.won { (1i32, 0i32) } else { (0, 1) };
        sqlx::query(
            r#"
            INSERT INTO player_stats (user_id, game_type, wins, losses, experience, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, game_type) DO UPDATE SET
                wins = player_stats.wins + EXCLUDED.wins,
                losses = player_stats.losses + EXCLUDED.losses,
                experience = player_stats.experience + EXCLUDED.experience,
                updated_at = NOW()
            "#,
        )
        .bind(outcome.user_id)
        .bind(outcome.game_type.to_string())
        .bind(wins)
        .bind(losses)
        .bind(i64::from(outcome.experience))
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn stats(&self, user_id: UserId) -> StatsResult<Vec<PlayerStats>> {
        let rows = sqlx::query(
            "SELECT user_id, game_type, wins, losses, experience, updated_at
             FROM player_stats WHERE user_id = $1 ORDER BY game_type",
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in rows {
            let game_type: String = row.get("game_type");
            let Ok(game_type) = game_type.parse::<GameType>() else {
                // Unknown rows from a newer schema are skipped, not fatal.
                continue;
            };
            stats.push(PlayerStats {
                user_id: row.get("user_id"),
                game_type,
                wins: row.get::<i32, _>("wins") as u32,
                losses: row.get::<i32, _>("losses") as u32,
                experience: row.get::<i64, _>("experience") as u64,
                updated_at: row.get("updated_at"),
            });
        }
        Ok(stats)
    }
}

/// In-memory implementation of [`StatsStore`] for tests.
#[derive(Default)]
pub struct MemoryStatsStore {
    rows: Mutex<HashMap<(UserId, GameType), PlayerStats>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn add_outcome(&self, outcome: GameOutcome) -> StatsResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let entry = rows
            .entry((outcome.user_id, outcome.game_type))
            .or_insert_with(|| PlayerStats {
                user_id: outcome.user_id,
                game_type: outcome.game_type,
                wins: 0,
                losses: 0,
                experience: 0,
                updated_at: Utc::now(),
            });
        if outcome.won {
            entry.wins += 1;
        } else {
            entry.losses += 1;
        }
        entry.experience += u64::from(outcome.experience);
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn stats(&self, user_id: UserId) -> StatsResult<Vec<PlayerStats>> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let mut stats: Vec<PlayerStats> = rows
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        stats.sort_by_key(|s| s.game_type.to_string());
        Ok(stats)
    }
}

/// Applies experience grants when a game finishes.
#[derive(Clone)]
pub struct ExperienceManager {
    store: Arc<dyn StatsStore>,
}

impl ExperienceManager {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// Record a win for `winner` and a loss for every user in `losers`.
    /// Stats failures never fail the game that triggered them.
    pub async fn grant_victory(
        &self,
        game_type: GameType,
        winner: UserId,
        losers: &[UserId],
    ) {
        self.apply(GameOutcome {
            user_id: winner,
            game_type,
            won: true,
            experience: WIN_EXPERIENCE,
        })
        .await;
        for &loser in losers {
            self.apply(GameOutcome {
                user_id: loser,
                game_type,
                won: false,
                experience: LOSS_EXPERIENCE,
            })
            .await;
        }
    }

    /// Record win/loss rows without any experience change. Used by game
    /// types whose outcomes do not award experience.
    pub async fn record_outcome_only(
        &self,
        game_type: GameType,
        winner: UserId,
        losers: &[UserId],
    ) {
        self.apply(GameOutcome {
            user_id: winner,
            game_type,
            won: true,
            experience: 0,
        })
        .await;
        for &loser in losers {
            self.apply(GameOutcome {
                user_id: loser,
                game_type,
                won: false,
                experience: 0,
            })
            .await;
        }
    }

    /// Record a single loss with no experience. Used when a player drops out
    /// of a game that keeps running without them.
    pub async fn record_loss(&self, game_type: GameType, user_id: UserId) {
        self.apply(GameOutcome {
            user_id,
            game_type,
            won: false,
            experience: 0,
        })
        .await;
    }

    pub async fn stats(&self, user_id: UserId) -> StatsResult<Vec<PlayerStats>> {
        self.store.stats(user_id).await
    }

    async fn apply(&self, outcome: GameOutcome) {
        if let Err(error) = self.store.add_outcome(outcome).await {
            log::error!(
                "failed to record {} outcome for user {}: {error}",
                outcome.game_type,
                outcome.user_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn victory_awards_asymmetric_experience() {
        let store = Arc::new(MemoryStatsStore::new());
        let manager = ExperienceManager::new(store.clone());

        manager
            .grant_victory(GameType::Battleship, 1, &[2])
            .await;

        let winner = &store.stats(1).await.unwrap()[0];
        assert_eq!(winner.wins, 1);
        assert_eq!(winner.experience, u64::from(WIN_EXPERIENCE));

        let loser = &store.stats(2).await.unwrap()[0];
        assert_eq!(loser.losses, 1);
        assert_eq!(loser.experience, u64::from(LOSS_EXPERIENCE));
    }

    #[tokio::test]
    async fn outcome_only_grants_no_experience() {
        let store = Arc::new(MemoryStatsStore::new());
        let manager = ExperienceManager::new(store.clone());

        manager
            .record_outcome_only(GameType::SimonSays, 1, &[2])
            .await;

        let winner = &store.stats(1).await.unwrap()[0];
        assert_eq!(winner.wins, 1);
        assert_eq!(winner.experience, 0);
        let loser = &store.stats(2).await.unwrap()[0];
        assert_eq!(loser.losses, 1);
        assert_eq!(loser.experience, 0);
    }

    #[tokio::test]
    async fn outcomes_accumulate_per_game_type() {
        let store = Arc::new(MemoryStatsStore::new());
        let manager = ExperienceManager::new(store.clone());

        manager.grant_victory(GameType::Battleship, 1, &[2]).await;
        manager.grant_victory(GameType::Battleship, 1, &[2]).await;
        manager.grant_victory(GameType::Loteria, 1, &[2]).await;

        let stats = store.stats(1).await.unwrap();
        assert_eq!(stats.len(), 2);
        let battleship = stats
            .iter()
            .find(|s| s.game_type == GameType::Battleship)
            .unwrap();
        assert_eq!(battleship.wins, 2);
        assert_eq!(battleship.experience, 2 * u64::from(WIN_EXPERIENCE));
    }
}
