//! Simon says rules: palette commitment, per-player sequences and the
//! call-and-response loop.
//!
//! Each player carries their own sequence, grown one color at a time by the
//! opponent. A round is: repeat your whole sequence, then choose the next
//! color for the opponent from the opponent's palette. A single wrong color
//! ends the game with the opponent as winner. No experience is granted for
//! this game type.

use serde::Serialize;

use super::entities::{
    GameId, GameStatus, GameType, MoveAction, PALETTE_SIZE, PlayerGame, UserId,
};
use super::errors::{GameError, GameResult};
use super::lifecycle::GameEngine;
use crate::store::NewMove;

/// What the caller should do next after a successful `play_color`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimonPhase {
    /// More of the sequence remains to repeat.
    Repeat,
    /// Sequence complete; choose a color for the opponent.
    ChooseColor,
    /// The game ended on this play.
    Finished,
}

/// Response projection of a sequence play.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PlayOutcome {
    pub success: bool,
    pub phase: SimonPhase,
}

/// Normalize a `#RRGGBB` color to uppercase, rejecting anything else.
fn normalize_color(color: &str) -> GameResult<String> {
    let rest = color
        .strip_prefix('#')
        .ok_or_else(|| GameError::InvalidColor(color.to_string()))?;
    if rest.len() != 6 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GameError::InvalidColor(color.to_string()));
    }
    Ok(format!("#{}", rest.to_ascii_uppercase()))
}

impl GameEngine {
    /// Commit the caller's 6-color palette. Only allowed before the game
    /// starts; committing again replaces the previous palette.
    pub async fn set_colors(
        &self,
        user: UserId,
        game_id: GameId,
        colors: Vec<String>,
    ) -> GameResult<()> {
        let _guard = self.lock_game(game_id).await;
        let (game, mut player) = self.load_participant(game_id, user).await?;
        if game.status != GameStatus::Waiting {
            return Err(GameError::InvalidStatus(game.status));
        }
        if colors.len() != PALETTE_SIZE {
            return Err(GameError::WrongColorCount {
                expected: PALETTE_SIZE,
                got: colors.len(),
            });
        }
        let normalized = colors
            .iter()
            .map(|c| normalize_color(c))
            .collect::<GameResult<Vec<_>>>()?;

        player.simon_mut()?.custom_colors = normalized;
        self.store.update_player(&player).await?;
        Ok(())
    }

    /// Choose the next color for the opponent's sequence. Also serves as the
    /// starter's first-color pick when the game is freshly started.
    pub async fn choose_color(
        &self,
        user: UserId,
        game_id: GameId,
        color: &str,
    ) -> GameResult<()> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, player) = self.load_participant(game_id, user).await?;
        let mine = player.simon()?;

        if game.status.is_finished() {
            return Err(GameError::GameFinished);
        }
        if !matches!(game.status, GameStatus::Started | GameStatus::InProgress) {
            return Err(GameError::NotStarted);
        }
        if game.current_turn != Some(user) {
            return Err(GameError::NotYourTurn);
        }
        // A color may only be chosen once the chooser's own sequence is done.
        if mine.current_index < mine.sequence.len() {
            return Err(GameError::SequenceIncomplete);
        }

        let color = normalize_color(color)?;
        let mut opponent = self.opponent_of(game_id, user).await?;
        {
            let theirs = opponent.simon_mut()?;
            if !theirs.custom_colors.contains(&color) {
                return Err(GameError::ColorNotInPalette);
            }
            theirs.sequence.push(color.clone());
            theirs.current_index = 0;
        }
        self.store.update_player(&opponent).await?;

        self.store
            .record_move(NewMove {
                game_id,
                player_game_id: player.id,
                user_id: user,
                action: MoveAction::ChooseColor,
                detail: serde_json::json!({ "color": color }),
            })
            .await?;

        game.current_turn = Some(opponent.user_id);
        if game.status == GameStatus::Started {
            game.status.advance(GameStatus::InProgress)?;
        }
        self.store.update_game(&game).await?;
        Ok(())
    }

    /// Repeat the next color of the caller's own sequence. A wrong color
    /// ends the game immediately with the opponent as winner; the failing
    /// player's sequence is left untouched.
    pub async fn play_color(
        &self,
        user: UserId,
        game_id: GameId,
        color: &str,
    ) -> GameResult<PlayOutcome> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, mut player) = self.load_participant(game_id, user).await?;

        if game.status.is_finished() {
            return Err(GameError::GameFinished);
        }
        if game.status != GameStatus::InProgress {
            return Err(GameError::NotStarted);
        }
        if game.current_turn != Some(user) {
            return Err(GameError::NotYourTurn);
        }
        {
            let mine = player.simon()?;
            if mine.current_index >= mine.sequence.len() {
                return Err(GameError::SequenceCompleted);
            }
        }

        let color = normalize_color(color)?;
        let expected = {
            let mine = player.simon()?;
            mine.sequence[mine.current_index].clone()
        };
        let success = color == expected;

        self.store
            .record_move(NewMove {
                game_id,
                player_game_id: player.id,
                user_id: user,
                action: MoveAction::PlayColor,
                detail: serde_json::json!({ "color": color, "success": success }),
            })
            .await?;

        if !success {
            let mut opponent = self.opponent_of(game_id, user).await?;
            let winner = opponent.user_id;
            self.finish_head_to_head(&mut game, &mut opponent, &mut player)
                .await?;
            self.experience
                .record_outcome_only(GameType::SimonSays, winner, &[user])
                .await;
            return Ok(PlayOutcome {
                success: false,
                phase: SimonPhase::Finished,
            });
        }

        let phase = {
            let mine = player.simon_mut()?;
            mine.current_index += 1;
            if mine.current_index == mine.sequence.len() {
                // Turn stays with the player until they choose a color.
                SimonPhase::ChooseColor
            } else {
                SimonPhase::Repeat
            }
        };
        self.store.update_player(&player).await?;

        Ok(PlayOutcome {
            success: true,
            phase,
        })
    }

    async fn opponent_of(&self, game_id: GameId, user: UserId) -> GameResult<PlayerGame> {
        self.store
            .players_of_game(game_id)
            .await?
            .into_iter()
            .find(|p| p.user_id != user)
            .ok_or(GameError::PlayerNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_normalize_to_uppercase_hex() {
        assert_eq!(normalize_color("#ff00aa").unwrap(), "#FF00AA");
        assert_eq!(normalize_color("#FF00AA").unwrap(), "#FF00AA");
        assert!(normalize_color("ff00aa").is_err());
        assert!(normalize_color("#ff00a").is_err());
        assert!(normalize_color("#ff00zz").is_err());
        assert!(normalize_color("#ff00aa0").is_err());
    }
}
