//! Battleship rules: attack resolution and victory detection.
//!
//! Boards are 8×8 with 15 single-cell ships. A hit keeps the attacker's
//! turn; only a miss passes it. Sinking the last ship cell finishes the
//! game and awards experience to both sides.

use serde::Serialize;

use super::entities::{Board, Cell, GameId, GameType, MoveAction, UserId};
use super::errors::{GameError, GameResult};
use super::lifecycle::GameEngine;
use crate::store::NewMove;

/// Result of one shot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackResult {
    Hit,
    Miss,
    Win,
}

/// Response projection of an attack.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct AttackOutcome {
    pub status: AttackResult,
    pub x: u8,
    pub y: u8,
}

impl GameEngine {
    /// Fire at `(x, y)` on the opponent's board.
    pub async fn attack(
        &self,
        user: UserId,
        game_id: GameId,
        x: u8,
        y: u8,
    ) -> GameResult<AttackOutcome> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, mut attacker) = self.load_participant(game_id, user).await?;
        attacker.battleship()?;

        if game.status.is_finished() {
            return Err(GameError::GameFinished);
        }
        if game.status.in_lobby() {
            return Err(GameError::NotStarted);
        }
        if game.current_turn != Some(user) {
            return Err(GameError::NotYourTurn);
        }
        if !Board::in_bounds(x, y) {
            return Err(GameError::InvalidCoordinates { x, y });
        }

        let mut defender = self
            .store
            .players_of_game(game_id)
            .await?
            .into_iter()
            .find(|p| p.user_id != user)
            .ok_or(GameError::PlayerNotFound)?;

        let target = defender.battleship()?.board.cell(x, y);
        if target.is_attacked() {
            return Err(GameError::AlreadyAttacked);
        }
        let revealed = target.reveal();
        defender.battleship_mut()?.board.set(x, y, revealed);

        let result = if revealed == Cell::Hit {
            attacker.battleship_mut()?.ships_sunk += 1;
            defender.battleship_mut()?.ships_lost += 1;
            if defender.battleship()?.board.ships_remaining() == 0 {
                AttackResult::Win
            } else {
                AttackResult::Hit
            }
        } else {
            AttackResult::Miss
        };

        self.store
            .record_move(NewMove {
                game_id,
                player_game_id: attacker.id,
                user_id: user,
                action: MoveAction::Attack,
                detail: serde_json::json!({ "x": x, "y": y, "result": result }),
            })
            .await?;

        match result {
            AttackResult::Win => {
                let loser = defender.user_id;
                self.finish_head_to_head(&mut game, &mut attacker, &mut defender)
                    .await?;
                // Post-victory bookkeeping never fails the attack itself.
                self.experience
                    .grant_victory(GameType::Battleship, user, &[loser])
                    .await;
            }
            AttackResult::Hit => {
                // Attacker keeps the turn after a hit.
                self.store.update_player(&attacker).await?;
                self.store.update_player(&defender).await?;
            }
            AttackResult::Miss => {
                self.store.update_player(&defender).await?;
                game.current_turn = Some(defender.user_id);
                self.store.update_game(&game).await?;
            }
        }

        Ok(AttackOutcome { status: result, x, y })
    }
}
