//! Lotería rules: host-driven card draws, token placement and win-claim
//! verification.
//!
//! The host draws from a 54-card pouch without replacement, two-phase: a
//! drawn card stays current until processed, so clients can render it before
//! the next draw. Wins are full-card (all 16 cells) and verified against the
//! drawn history; an invalid claim demotes the claimant to spectator.

use rand::Rng;
use serde::Serialize;

use super::entities::{
    CardId, GameId, GameStatus, GameType, PLAYER_CARD_SIZE, UserId,
};
use super::errors::{GameError, GameResult};
use super::generators;
use super::lifecycle::GameEngine;
use crate::audit::AuditEntry;

/// A card as announced to the table.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DrawnCard {
    pub id: CardId,
    pub name: &'static str,
}

/// Outcome of a win claim after synchronous verification.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// Claim verified; the game is finished with the claimant as winner.
    Win,
    /// Claim rejected; the claimant is now a spectator and play continues.
    Rejected,
}

impl GameEngine {
    /// Deal the caller a fresh 16-card table. Allowed until the game starts;
    /// dealing again replaces the table and clears its marks. The first
    /// table dealt moves the game from `waiting` to `card_selection`.
    pub async fn generate_player_card(&self, user: UserId, game_id: GameId) -> GameResult<()> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, mut player) = self.load_participant(game_id, user).await?;
        game.loteria()?;
        if !game.status.in_lobby() {
            return Err(GameError::InvalidStatus(game.status));
        }
        {
            let mine = player.loteria_mut()?;
            if mine.is_spectator {
                return Err(GameError::Spectator);
            }
            mine.player_card = generators::random_player_card();
            mine.marked_cells = vec![false; PLAYER_CARD_SIZE];
            mine.tokens_used = 0;
        }
        self.store.update_player(&player).await?;

        if game.status == GameStatus::Waiting {
            game.status.advance(GameStatus::CardSelection)?;
            self.store.update_game(&game).await?;
        }
        Ok(())
    }

    /// Host draws the next card from the pouch.
    pub async fn draw_card(&self, user: UserId, game_id: GameId) -> GameResult<DrawnCard> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, _player) = self.load_participant(game_id, user).await?;
        self.require_in_progress(&game)?;
        let state = game.loteria_mut()?;
        if state.host_user_id != user {
            return Err(GameError::HostOnly);
        }
        if state.current_card.is_some() {
            return Err(GameError::CardAlreadyActive);
        }
        if state.available_cards.is_empty() {
            return Err(GameError::NoCardsAvailable);
        }

        let index = rand::rng().random_range(0..state.available_cards.len());
        let card = state.available_cards.remove(index);
        state.drawn_cards.push(card);
        state.current_card = Some(card);
        self.store.update_game(&game).await?;

        self.audit
            .append(
                AuditEntry::new(game_id, Some(user), "card_drawn")
                    .with_detail(serde_json::json!({ "card": card })),
            )
            .await;
        Ok(DrawnCard {
            id: card,
            name: generators::card_name(card),
        })
    }

    /// Host acknowledges the current card, re-enabling the next draw.
    pub async fn process_current_card(&self, user: UserId, game_id: GameId) -> GameResult<()> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, _player) = self.load_participant(game_id, user).await?;
        self.require_in_progress(&game)?;
        let state = game.loteria_mut()?;
        if state.host_user_id != user {
            return Err(GameError::HostOnly);
        }
        if state.current_card.take().is_none() {
            return Err(GameError::NoActiveCard);
        }
        self.store.update_game(&game).await?;
        Ok(())
    }

    /// Host returns every drawn card to the pouch for a fresh pass. Players'
    /// marked cells are untouched.
    pub async fn reshuffle_cards(&self, user: UserId, game_id: GameId) -> GameResult<()> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, _player) = self.load_participant(game_id, user).await?;
        self.require_in_progress(&game)?;
        let state = game.loteria_mut()?;
        if state.host_user_id != user {
            return Err(GameError::HostOnly);
        }
        if state.drawn_cards.is_empty() {
            return Err(GameError::NothingToReshuffle);
        }

        state.available_cards = generators::full_deck();
        state.drawn_cards.clear();
        state.current_card = None;
        self.store.update_game(&game).await?;

        self.audit
            .append(AuditEntry::new(game_id, Some(user), "deck_reshuffled"))
            .await;
        Ok(())
    }

    /// Mark a cell of the caller's table with the currently active card.
    pub async fn place_token(
        &self,
        user: UserId,
        game_id: GameId,
        cell_index: u8,
    ) -> GameResult<()> {
        let _guard = self.lock_game(game_id).await;
        let (game, mut player) = self.load_participant(game_id, user).await?;
        self.require_in_progress(&game)?;
        let current = game
            .loteria()?
            .current_card
            .ok_or(GameError::NoActiveCard)?;

        let mine = player.loteria_mut()?;
        if mine.is_spectator {
            return Err(GameError::Spectator);
        }
        let index = cell_index as usize;
        if index >= PLAYER_CARD_SIZE || index >= mine.player_card.len() {
            return Err(GameError::InvalidCellIndex(cell_index));
        }
        if mine.marked_cells.get(index).copied().unwrap_or(false) {
            return Err(GameError::AlreadyMarked);
        }
        if mine.player_card[index] != current {
            return Err(GameError::CardMismatch);
        }

        mine.marked_cells[index] = true;
        mine.tokens_used += 1;
        self.store.update_player(&player).await?;
        Ok(())
    }

    /// Claim a full-card win. The claim is verified synchronously: every
    /// marked card must have been drawn. A rejected claim demotes the
    /// claimant to spectator and returns the game to play.
    pub async fn claim_win(&self, user: UserId, game_id: GameId) -> GameResult<ClaimOutcome> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, mut player) = self.load_participant(game_id, user).await?;
        self.require_in_progress(&game)?;
        {
            let mine = player.loteria_mut()?;
            if mine.is_spectator {
                return Err(GameError::Spectator);
            }
            if usize::from(mine.tokens_used) < PLAYER_CARD_SIZE {
                return Err(GameError::BoardNotFull);
            }
            mine.claimed_win = true;
        }
        game.status.advance(GameStatus::Verification)?;
        self.store.update_game(&game).await?;
        self.store.update_player(&player).await?;

        let valid = {
            let state = game.loteria()?;
            let mine = player.loteria()?;
            mine.marked_cells.len() == PLAYER_CARD_SIZE
                && mine.marked_cells.iter().all(|&marked| marked)
                && mine
                    .player_card
                    .iter()
                    .all(|card| state.drawn_cards.contains(card))
        };

        if valid {
            {
                let mine = player.loteria_mut()?;
                mine.verification_result = Some(true);
            }
            self.store.update_player(&player).await?;
            self.finish_loteria(&mut game, user).await?;
            Ok(ClaimOutcome::Win)
        } else {
            // Invalid claim: demote to spectator, clear the claim and
            // return the game to play.
            {
                let mine = player.loteria_mut()?;
                mine.is_spectator = true;
                mine.claimed_win = false;
                mine.verification_result = Some(false);
            }
            self.store.update_player(&player).await?;
            game.status.rollback_failed_claim()?;
            self.store.update_game(&game).await?;

            self.audit
                .append(AuditEntry::new(game_id, Some(user), "claim_rejected"))
                .await;
            Ok(ClaimOutcome::Rejected)
        }
    }

    async fn finish_loteria(&self, game: &mut super::entities::Game, winner: UserId) -> GameResult<()> {
        use super::entities::PlayerResult;

        let mut losers = Vec::new();
        for mut p in self.store.players_of_game(game.id).await? {
            if p.user_id == winner {
                p.result = PlayerResult::Win;
            } else {
                p.result = PlayerResult::Lose;
                losers.push(p.user_id);
            }
            self.store.update_player(&p).await?;
        }

        game.winner = Some(winner);
        game.status.advance(GameStatus::Finished)?;
        self.store.update_game(game).await?;

        self.experience
            .record_outcome_only(GameType::Loteria, winner, &losers)
            .await;
        self.audit
            .append(
                AuditEntry::new(game.id, Some(winner), "game_finished")
                    .with_detail(serde_json::json!({ "winner": winner })),
            )
            .await;
        Ok(())
    }

    fn require_in_progress(&self, game: &super::entities::Game) -> GameResult<()> {
        match game.status {
            GameStatus::InProgress => Ok(()),
            GameStatus::Finished => Err(GameError::GameFinished),
            other => Err(GameError::InvalidStatus(other)),
        }
    }
}
