//! Shared game lifecycle: create, join, ready-up, status, surrender and
//! rematch.
//!
//! Every mutating operation serializes on a per-game async mutex, so a game
//! only ever has one writer at a time. Reads project a consistent snapshot
//! without taking the lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::entities::{
    BattleshipPlayer, Game, GameId, GameState, GameStatus, GameType, LoteriaGame, LoteriaPlayer,
    PlayerGame, PlayerResult, PlayerState, SimonGame, SimonPlayer, UserId,
};
use super::errors::{GameError, GameResult};
use super::generators;
use super::views::{self, GameStatusView, LobbyView};
use crate::audit::{AuditEntry, AuditLog};
use crate::stats::{ExperienceManager, PlayerStats, StatsStore};
use crate::store::{GameStore, NewGame, NewPlayerGame};

/// Attempts to allocate an unused join code before giving up.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Player bounds per game type. Turn-based types are strictly head-to-head;
/// lotería tables seat four to sixteen, with overrides inside that range.
const fn default_bounds(game_type: GameType) -> (u8, u8) {
    match game_type {
        GameType::Battleship | GameType::SimonSays => (2, 2),
        GameType::Loteria => (4, 16),
    }
}

/// Creation-time overrides. Only lotería accepts custom bounds.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct CreateOptions {
    pub min_players: Option<u8>,
    pub max_players: Option<u8>,
}

/// Result of a successful game creation.
#[derive(Clone, Debug, Serialize)]
pub struct CreatedGame {
    pub game_id: GameId,
    pub code: String,
    pub game_type: GameType,
}

/// Result of a ready-up, reporting whether it started the game.
#[derive(Clone, Debug, Serialize)]
pub struct ReadyOutcome {
    pub all_ready: bool,
    pub status: GameStatus,
}

/// Result of a rematch request.
#[derive(Clone, Debug, Serialize)]
pub struct RematchOutcome {
    pub requested: usize,
    pub total: usize,
    pub all_requested: bool,
}

/// The engine owning all game operations. Rules specific to one game type
/// live in the sibling modules; everything here is shared.
pub struct GameEngine {
    pub(crate) store: Arc<dyn GameStore>,
    pub(crate) experience: ExperienceManager,
    pub(crate) audit: Arc<dyn AuditLog>,
    locks: Mutex<HashMap<GameId, Arc<tokio::sync::Mutex<()>>>>,
}

impl GameEngine {
    pub fn new(
        store: Arc<dyn GameStore>,
        stats: Arc<dyn StatsStore>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            store,
            experience: ExperienceManager::new(stats),
            audit,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the single-writer lock for one game.
    pub(crate) async fn lock_game(&self, game_id: GameId) -> tokio::sync::OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(game_id).or_default())
        };
        mutex.lock_owned().await
    }

    fn forget_lock(&self, game_id: GameId) {
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&game_id);
    }

    pub(crate) async fn load_game(&self, game_id: GameId) -> GameResult<Game> {
        self.store
            .game(game_id)
            .await?
            .ok_or(GameError::GameNotFound)
    }

    /// Load a game together with the caller's player record, rejecting
    /// non-participants.
    pub(crate) async fn load_participant(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> GameResult<(Game, PlayerGame)> {
        let game = self.load_game(game_id).await?;
        let player = self
            .store
            .player_for_user(game_id, user_id)
            .await?
            .ok_or(GameError::Forbidden(user_id))?;
        Ok((game, player))
    }

    /// Create a game of the given type and seat the creator in it.
    pub async fn create_game(
        &self,
        host: UserId,
        game_type: &str,
        options: CreateOptions,
    ) -> GameResult<CreatedGame> {
        let game_type: GameType = game_type.parse()?;
        let (min_players, max_players) = bounds_for(game_type, options)?;

        let state = match game_type {
            GameType::Battleship => GameState::Battleship(Default::default()),
            GameType::SimonSays => GameState::SimonSays(SimonGame::default()),
            GameType::Loteria => GameState::Loteria(LoteriaGame {
                host_user_id: host,
                available_cards: generators::full_deck(),
                drawn_cards: Vec::new(),
                current_card: None,
            }),
        };

        let mut game = self.create_with_fresh_code(min_players, max_players, state).await?;
        let _guard = self.lock_game(game.id).await;

        let player = self
            .store
            .create_player(NewPlayerGame {
                game_id: game.id,
                user_id: host,
                result: PlayerResult::Pending,
                ready: false,
                state: initial_player_state(game_type, true),
            })
            .await?;
        game.players.push(player.id);
        self.store.update_game(&game).await?;

        self.audit
            .append(
                AuditEntry::new(game.id, Some(host), "game_created")
                    .with_detail(serde_json::json!({ "game_type": game_type, "code": game.code })),
            )
            .await;

        Ok(CreatedGame {
            game_id: game.id,
            code: game.code,
            game_type,
        })
    }

    async fn create_with_fresh_code(
        &self,
        min_players: u8,
        max_players: u8,
        state: GameState,
    ) -> GameResult<Game> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let attempt = NewGame {
                code: generators::join_code(),
                status: GameStatus::Waiting,
                min_players,
                max_players,
                state: state.clone(),
            };
            match self.store.create_game(attempt).await {
                Ok(game) => return Ok(game),
                Err(crate::store::StoreError::CodeTaken) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(GameError::CodeExhausted)
    }

    /// Join a lobby by its code.
    pub async fn join_game(&self, user: UserId, code: &str) -> GameResult<Game> {
        let found = self
            .store
            .joinable_game_by_code(code)
            .await?
            .ok_or(GameError::GameNotFound)?;

        let _guard = self.lock_game(found.id).await;
        // Re-read under the lock; the lobby may have moved on meanwhile.
        let mut game = self.load_game(found.id).await?;
        if !game.status.in_lobby() {
            return Err(GameError::InvalidStatus(game.status));
        }
        if self.store.player_for_user(game.id, user).await?.is_some() {
            return Err(GameError::AlreadyJoined);
        }
        if game.is_full() {
            return Err(GameError::GameFull);
        }

        let player = self
            .store
            .create_player(NewPlayerGame {
                game_id: game.id,
                user_id: user,
                result: PlayerResult::Pending,
                ready: false,
                state: initial_player_state(game.game_type(), false),
            })
            .await?;
        game.players.push(player.id);
        self.store.update_game(&game).await?;

        self.audit
            .append(AuditEntry::new(game.id, Some(user), "player_joined"))
            .await;
        Ok(game)
    }

    /// Mark the caller ready. Battleship and simon says start automatically
    /// once every seat is ready; lotería waits for the host's start call.
    pub async fn set_ready(&self, user: UserId, game_id: GameId) -> GameResult<ReadyOutcome> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, mut player) = self.load_participant(game_id, user).await?;
        if !game.status.in_lobby() {
            return Err(GameError::InvalidStatus(game.status));
        }

        if !player.ready {
            player.ready = true;
            self.store.update_player(&player).await?;
        }

        let players = self.store.players_of_game(game_id).await?;
        let all_ready =
            players.iter().all(|p| p.ready) && players.len() >= game.min_players as usize;

        match game.game_type() {
            GameType::Battleship if all_ready => {
                game.status.advance(GameStatus::InProgress)?;
                game.current_turn = players.first().map(|p| p.user_id);
                self.store.update_game(&game).await?;
                self.audit
                    .append(AuditEntry::new(game_id, None, "game_started"))
                    .await;
            }
            GameType::SimonSays if all_ready && palettes_committed(&players) => {
                let starter = players.first().map(|p| p.user_id);
                game.simon_mut()?.starter = starter;
                game.current_turn = starter;
                game.status.advance(GameStatus::Started)?;
                self.store.update_game(&game).await?;
                self.audit
                    .append(AuditEntry::new(game_id, None, "game_started"))
                    .await;
            }
            _ => {}
        }

        Ok(ReadyOutcome {
            all_ready,
            status: game.status,
        })
    }

    /// Lobby snapshot for a participant.
    pub async fn lobby_status(&self, user: UserId, game_id: GameId) -> GameResult<LobbyView> {
        let (game, _player) = self.load_participant(game_id, user).await?;
        let players = self.store.players_of_game(game_id).await?;
        Ok(views::lobby_view(&game, &players))
    }

    /// Gameplay snapshot for a participant of a started game.
    pub async fn game_status(&self, user: UserId, game_id: GameId) -> GameResult<GameStatusView> {
        let (game, _player) = self.load_participant(game_id, user).await?;
        if !game.status.has_started() {
            return Err(GameError::NotStarted);
        }
        let players = self.store.players_of_game(game_id).await?;
        views::game_status_view(&game, &players, user)
    }

    /// Leave a lobby, or concede a running game.
    pub async fn surrender(&self, user: UserId, game_id: GameId) -> GameResult<()> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, mut player) = self.load_participant(game_id, user).await?;
        if game.status.is_finished() {
            return Err(GameError::GameFinished);
        }

        if game.status.in_lobby() {
            return self.withdraw_from_lobby(&mut game, &player).await;
        }

        game.surrendered_by.insert(player.id);
        player.result = PlayerResult::Lose;

        match game.game_type() {
            // Head-to-head concession: the other player wins outright.
            GameType::Battleship => {
                self.store.update_player(&player).await?;
                let players = self.store.players_of_game(game_id).await?;
                if let Some(mut opponent) = players.into_iter().find(|p| p.user_id != user) {
                    opponent.result = PlayerResult::Win;
                    self.store.update_player(&opponent).await?;
                    game.winner = Some(opponent.user_id);
                }
                game.current_turn = None;
                game.status.advance(GameStatus::Finished)?;
                self.store.update_game(&game).await?;
                // Concessions count on the record but award no experience;
                // only attack victories do.
                if let Some(winner) = game.winner {
                    self.experience
                        .record_outcome_only(GameType::Battleship, winner, &[user])
                        .await;
                }
            }
            // Simon says ends without declaring a winner.
            GameType::SimonSays => {
                self.store.update_player(&player).await?;
                game.current_turn = None;
                game.status.advance(GameStatus::Finished)?;
                self.store.update_game(&game).await?;
                self.experience.record_loss(GameType::SimonSays, user).await;
            }
            GameType::Loteria => {
                // The table keeps playing; the leaver becomes a spectator.
                player.loteria_mut()?.is_spectator = true;
                self.store.update_player(&player).await?;
                let state = game.loteria_mut()?;
                if state.host_user_id == user {
                    if let Some(next_host) = self.next_loteria_host(game_id, user).await? {
                        state.host_user_id = next_host;
                    }
                }
                self.store.update_game(&game).await?;
                self.experience.record_loss(GameType::Loteria, user).await;
            }
        }

        self.audit
            .append(AuditEntry::new(game_id, Some(user), "player_surrendered"))
            .await;
        Ok(())
    }

    async fn withdraw_from_lobby(&self, game: &mut Game, player: &PlayerGame) -> GameResult<()> {
        self.store.delete_player(player.id).await?;
        game.players.retain(|&id| id != player.id);

        if game.players.is_empty() {
            self.store.delete_game(game.id).await?;
            self.forget_lock(game.id);
        } else {
            let game_id = game.id;
            if let Ok(state) = game.loteria_mut() {
                if state.host_user_id == player.user_id {
                    // Host left the lobby; the oldest remaining seat takes over.
                    if let Some(next_host) =
                        self.next_loteria_host(game_id, player.user_id).await?
                    {
                        state.host_user_id = next_host;
                    }
                }
            }
            self.store.update_game(game).await?;
        }

        self.audit
            .append(AuditEntry::new(game.id, Some(player.user_id), "player_withdrew"))
            .await;
        Ok(())
    }

    async fn next_loteria_host(
        &self,
        game_id: GameId,
        leaving: UserId,
    ) -> GameResult<Option<UserId>> {
        let players = self.store.players_of_game(game_id).await?;
        for mut candidate in players {
            if candidate.user_id == leaving {
                continue;
            }
            let state = candidate.loteria_mut()?;
            if state.is_spectator {
                continue;
            }
            state.is_host = true;
            self.store.update_player(&candidate).await?;
            return Ok(Some(candidate.user_id));
        }
        Ok(None)
    }

    /// Flag intent to play again. Only valid once the game is finished;
    /// repeat requests are idempotent.
    pub async fn request_rematch(
        &self,
        user: UserId,
        game_id: GameId,
    ) -> GameResult<RematchOutcome> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, player) = self.load_participant(game_id, user).await?;
        if !game.status.is_finished() {
            return Err(GameError::InvalidStatus(game.status));
        }

        if game.rematch_requested_by.insert(player.id) {
            self.store.update_game(&game).await?;
            self.audit
                .append(AuditEntry::new(game_id, Some(user), "rematch_requested"))
                .await;
        }

        let total = game.players.len();
        let requested = game.rematch_requested_by.len();
        Ok(RematchOutcome {
            requested,
            total,
            all_requested: requested == total,
        })
    }

    /// Lotería only: the host starts the game once every seat is ready and
    /// every table is generated.
    pub async fn start_game(&self, user: UserId, game_id: GameId) -> GameResult<GameStatus> {
        let _guard = self.lock_game(game_id).await;
        let (mut game, _player) = self.load_participant(game_id, user).await?;
        if game.loteria()?.host_user_id != user {
            return Err(GameError::HostOnly);
        }
        if !game.status.in_lobby() {
            return Err(GameError::InvalidStatus(game.status));
        }

        let players = self.store.players_of_game(game_id).await?;
        if !views::can_start(&game, &players) {
            return Err(GameError::CannotStart);
        }

        game.status.advance(GameStatus::InProgress)?;
        self.store.update_game(&game).await?;
        self.audit
            .append(AuditEntry::new(game_id, Some(user), "game_started"))
            .await;
        Ok(game.status)
    }

    /// Lifetime win/loss/experience record for a user.
    pub async fn player_stats(&self, user: UserId) -> GameResult<Vec<PlayerStats>> {
        self.experience
            .stats(user)
            .await
            .map_err(|e| GameError::Store(crate::store::StoreError::Corrupt(e.to_string())))
    }

    /// Finish a two-player game in favor of `winner`, updating both player
    /// records. Shared by the battleship and simon says endgames.
    pub(crate) async fn finish_head_to_head(
        &self,
        game: &mut Game,
        winner: &mut PlayerGame,
        loser: &mut PlayerGame,
    ) -> GameResult<()> {
        winner.result = PlayerResult::Win;
        loser.result = PlayerResult::Lose;
        self.store.update_player(winner).await?;
        self.store.update_player(loser).await?;

        game.winner = Some(winner.user_id);
        game.current_turn = None;
        game.status.advance(GameStatus::Finished)?;
        self.store.update_game(game).await?;

        self.audit
            .append(
                AuditEntry::new(game.id, Some(winner.user_id), "game_finished")
                    .with_detail(serde_json::json!({ "winner": winner.user_id })),
            )
            .await;
        Ok(())
    }
}

fn bounds_for(game_type: GameType, options: CreateOptions) -> GameResult<(u8, u8)> {
    let (default_min, default_max) = default_bounds(game_type);
    let (min, max) = match game_type {
        // Head-to-head types ignore overrides.
        GameType::Battleship | GameType::SimonSays => (default_min, default_max),
        GameType::Loteria => (
            options.min_players.unwrap_or(default_min),
            options.max_players.unwrap_or(default_max),
        ),
    };
    if min < default_min || max < min || max > default_max {
        return Err(GameError::InvalidPlayerBounds { min, max });
    }
    Ok((min, max))
}

fn initial_player_state(game_type: GameType, is_host: bool) -> PlayerState {
    match game_type {
        GameType::Battleship => PlayerState::Battleship(BattleshipPlayer {
            board: generators::random_board(super::entities::SHIP_COUNT),
            ..Default::default()
        }),
        GameType::SimonSays => PlayerState::SimonSays(SimonPlayer::default()),
        GameType::Loteria => PlayerState::Loteria(LoteriaPlayer {
            is_host,
            ..Default::default()
        }),
    }
}

fn palettes_committed(players: &[PlayerGame]) -> bool {
    players
        .iter()
        .all(|p| p.simon().map(|s| !s.custom_colors.is_empty()).unwrap_or(false))
}
