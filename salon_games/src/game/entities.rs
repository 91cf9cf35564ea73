//! Game and player entities shared by all three rule sets.
//!
//! A `Game` is one match; a `PlayerGame` is one user's state inside one match.
//! Game-type-specific fields live in the `GameState`/`PlayerState` tagged
//! unions so shared code never branches on a string discriminator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::errors::GameError;

pub type UserId = i64;
pub type GameId = i64;
pub type PlayerGameId = i64;

/// Lotería card identifier, an index into the fixed 54-card deck.
pub type CardId = u8;

/// Battleship board edge length.
pub const BOARD_SIZE: usize = 8;
/// Ships placed on each battleship board (single-cell ships).
pub const SHIP_COUNT: usize = 15;
/// Cells on a lotería player table.
pub const PLAYER_CARD_SIZE: usize = 16;
/// Colors each simon says player commits to their palette.
pub const PALETTE_SIZE: usize = 6;
/// Length of a lobby join code.
pub const JOIN_CODE_LEN: usize = 8;

/// The three supported game types.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum GameType {
    #[serde(rename = "battleship")]
    Battleship,
    #[serde(rename = "simonsay")]
    SimonSays,
    #[serde(rename = "loteria")]
    Loteria,
}

impl GameType {
    /// Whether this game type alternates a turn between players.
    /// Lotería is host-driven and has no turn concept.
    pub const fn is_turn_based(self) -> bool {
        !matches!(self, Self::Loteria)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Battleship => "battleship",
            Self::SimonSays => "simonsay",
            Self::Loteria => "loteria",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for GameType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "battleship" => Ok(Self::Battleship),
            "simonsay" => Ok(Self::SimonSays),
            "loteria" => Ok(Self::Loteria),
            other => Err(GameError::UnsupportedGameType(other.to_string())),
        }
    }
}

/// Lifecycle status of a game.
///
/// The label set is shared; each game type uses a subset:
/// battleship `waiting → in_progress → finished`, simon says
/// `waiting → started → in_progress → finished`, lotería
/// `waiting → card_selection → in_progress → verification → finished`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    CardSelection,
    Started,
    InProgress,
    Verification,
    Finished,
}

impl GameStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::CardSelection => 1,
            Self::Started => 2,
            Self::InProgress => 3,
            Self::Verification => 4,
            Self::Finished => 5,
        }
    }

    /// Whether the game is still in its lobby phase (join/ready/configure).
    pub const fn in_lobby(self) -> bool {
        matches!(self, Self::Waiting | Self::CardSelection)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Whether a gameplay status projection is available.
    pub const fn has_started(self) -> bool {
        matches!(
            self,
            Self::Started | Self::InProgress | Self::Verification | Self::Finished
        )
    }

    /// Move to `next`, rejecting any backward transition. `finished` is
    /// terminal.
    pub fn advance(&mut self, next: GameStatus) -> Result<(), GameError> {
        if self.is_finished() || next.rank() < self.rank() {
            return Err(GameError::InvalidStatus(*self));
        }
        *self = next;
        Ok(())
    }

    /// The single sanctioned rollback: an invalid lotería win claim returns
    /// the game from `verification` to `in_progress`.
    pub fn rollback_failed_claim(&mut self) -> Result<(), GameError> {
        if !matches!(self, Self::Verification) {
            return Err(GameError::InvalidStatus(*self));
        }
        *self = Self::InProgress;
        Ok(())
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::CardSelection => "card_selection",
            Self::Started => "started",
            Self::InProgress => "in_progress",
            Self::Verification => "verification",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Per-player outcome of a match.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerResult {
    #[default]
    Pending,
    Win,
    Lose,
}

/// One cell of a battleship board.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Ship,
    Miss,
    Hit,
}

impl Cell {
    /// Pure attack transition: an empty cell becomes a miss, a ship cell a
    /// hit. Attacked cells are unchanged (the caller rejects re-attacks).
    pub const fn reveal(self) -> Cell {
        match self {
            Self::Empty => Self::Miss,
            Self::Ship => Self::Hit,
            attacked => attacked,
        }
    }

    pub const fn is_attacked(self) -> bool {
        matches!(self, Self::Miss | Self::Hit)
    }

    /// What the opponent is allowed to see: un-hit ships look empty,
    /// hit/miss markers pass through.
    pub const fn masked(self) -> Cell {
        match self {
            Self::Ship => Self::Empty,
            visible => visible,
        }
    }
}

/// An 8×8 battleship board, row-major (`grid[y][x]`).
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Board {
    grid: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn cell(&self, x: u8, y: u8) -> Cell {
        self.grid[y as usize][x as usize]
    }

    pub fn set(&mut self, x: u8, y: u8, cell: Cell) {
        self.grid[y as usize][x as usize] = cell;
    }

    pub const fn in_bounds(x: u8, y: u8) -> bool {
        (x as usize) < BOARD_SIZE && (y as usize) < BOARD_SIZE
    }

    pub fn ships_remaining(&self) -> usize {
        self.cells().filter(|c| matches!(c, Cell::Ship)).count()
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.grid.iter().flatten().copied()
    }

    /// The board as the opponent sees it.
    pub fn masked(&self) -> Board {
        let mut masked = self.clone();
        for row in &mut masked.grid {
            for cell in row {
                *cell = cell.masked();
            }
        }
        masked
    }
}

/// Game-type-specific fields of a [`Game`]. The variant tag doubles as the
/// game-type discriminator, so a game can never carry another type's fields.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "game_type")]
pub enum GameState {
    #[serde(rename = "battleship")]
    Battleship(BattleshipGame),
    #[serde(rename = "simonsay")]
    SimonSays(SimonGame),
    #[serde(rename = "loteria")]
    Loteria(LoteriaGame),
}

impl GameState {
    pub const fn game_type(&self) -> GameType {
        match self {
            Self::Battleship(_) => GameType::Battleship,
            Self::SimonSays(_) => GameType::SimonSays,
            Self::Loteria(_) => GameType::Loteria,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BattleshipGame {
    pub board_size: u8,
    pub ship_count: u8,
}

impl Default for BattleshipGame {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE as u8,
            ship_count: SHIP_COUNT as u8,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SimonGame {
    /// The player designated to choose the first color, picked when the
    /// game starts.
    pub starter: Option<UserId>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LoteriaGame {
    pub host_user_id: UserId,
    /// Cards still in the pouch, drawable without replacement.
    pub available_cards: Vec<CardId>,
    /// Cards already called out, in draw order.
    pub drawn_cards: Vec<CardId>,
    /// The active card; must be processed before the next draw.
    pub current_card: Option<CardId>,
}

/// One match. `players` is the ordered list of [`PlayerGame`] ids; the first
/// entry is the creator.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Game {
    pub id: GameId,
    pub code: String,
    pub status: GameStatus,
    pub min_players: u8,
    pub max_players: u8,
    pub players: Vec<PlayerGameId>,
    pub current_turn: Option<UserId>,
    pub winner: Option<UserId>,
    /// Irreversible per-player flags, by player-game id.
    pub surrendered_by: BTreeSet<PlayerGameId>,
    pub rematch_requested_by: BTreeSet<PlayerGameId>,
    pub state: GameState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub const fn game_type(&self) -> GameType {
        self.state.game_type()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn loteria(&self) -> Result<&LoteriaGame, GameError> {
        match &self.state {
            GameState::Loteria(state) => Ok(state),
            _ => Err(GameError::WrongGameType(self.game_type())),
        }
    }

    pub fn loteria_mut(&mut self) -> Result<&mut LoteriaGame, GameError> {
        match &mut self.state {
            GameState::Loteria(state) => Ok(state),
            other => Err(GameError::WrongGameType(other.game_type())),
        }
    }

    pub fn simon(&self) -> Result<&SimonGame, GameError> {
        match &self.state {
            GameState::SimonSays(state) => Ok(state),
            _ => Err(GameError::WrongGameType(self.game_type())),
        }
    }

    pub fn simon_mut(&mut self) -> Result<&mut SimonGame, GameError> {
        match &mut self.state {
            GameState::SimonSays(state) => Ok(state),
            other => Err(GameError::WrongGameType(other.game_type())),
        }
    }
}

/// Game-type-specific fields of a [`PlayerGame`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "game_type")]
pub enum PlayerState {
    #[serde(rename = "battleship")]
    Battleship(BattleshipPlayer),
    #[serde(rename = "simonsay")]
    SimonSays(SimonPlayer),
    #[serde(rename = "loteria")]
    Loteria(LoteriaPlayer),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BattleshipPlayer {
    pub board: Board,
    /// Opposing ship cells this player has hit.
    pub ships_sunk: u32,
    /// Own ship cells lost to opposing hits.
    pub ships_lost: u32,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SimonPlayer {
    /// The 6-color palette this player committed before the game started.
    pub custom_colors: Vec<String>,
    /// Colors this player must repeat, grown by the opponent's choices.
    pub sequence: Vec<String>,
    /// Progress through `sequence` in the current round.
    pub current_index: usize,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LoteriaPlayer {
    /// The 4×4 table, empty until the player generates it.
    pub player_card: Vec<CardId>,
    pub marked_cells: Vec<bool>,
    pub tokens_used: u8,
    pub is_host: bool,
    /// Demoted after an invalid win claim; spectators may watch but not act.
    pub is_spectator: bool,
    pub claimed_win: bool,
    pub verification_result: Option<bool>,
}

impl LoteriaPlayer {
    pub fn card_generated(&self) -> bool {
        self.player_card.len() == PLAYER_CARD_SIZE
    }
}

/// One user's state inside one match. Exactly one exists per
/// (user, game) pair.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerGame {
    pub id: PlayerGameId,
    pub game_id: GameId,
    pub user_id: UserId,
    pub result: PlayerResult,
    pub ready: bool,
    pub state: PlayerState,
    pub created_at: DateTime<Utc>,
}

impl PlayerGame {
    pub fn battleship(&self) -> Result<&BattleshipPlayer, GameError> {
        match &self.state {
            PlayerState::Battleship(state) => Ok(state),
            _ => Err(GameError::WrongGameType(GameType::Battleship)),
        }
    }

    pub fn battleship_mut(&mut self) -> Result<&mut BattleshipPlayer, GameError> {
        match &mut self.state {
            PlayerState::Battleship(state) => Ok(state),
            _ => Err(GameError::WrongGameType(GameType::Battleship)),
        }
    }

    pub fn simon(&self) -> Result<&SimonPlayer, GameError> {
        match &self.state {
            PlayerState::SimonSays(state) => Ok(state),
            _ => Err(GameError::WrongGameType(GameType::SimonSays)),
        }
    }

    pub fn simon_mut(&mut self) -> Result<&mut SimonPlayer, GameError> {
        match &mut self.state {
            PlayerState::SimonSays(state) => Ok(state),
            _ => Err(GameError::WrongGameType(GameType::SimonSays)),
        }
    }

    pub fn loteria(&self) -> Result<&LoteriaPlayer, GameError> {
        match &self.state {
            PlayerState::Loteria(state) => Ok(state),
            _ => Err(GameError::WrongGameType(GameType::Loteria)),
        }
    }

    pub fn loteria_mut(&mut self) -> Result<&mut LoteriaPlayer, GameError> {
        match &mut self.state {
            PlayerState::Loteria(state) => Ok(state),
            _ => Err(GameError::WrongGameType(GameType::Loteria)),
        }
    }
}

/// Kind of audited move.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveAction {
    Attack,
    ChooseColor,
    PlayColor,
}

impl fmt::Display for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Attack => "attack",
            Self::ChooseColor => "choose_color",
            Self::PlayColor => "play_color",
        };
        write!(f, "{repr}")
    }
}

/// Append-only record of one attack or sequence play. Never mutated.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MoveRecord {
    pub id: i64,
    pub game_id: GameId,
    pub player_game_id: PlayerGameId,
    pub user_id: UserId,
    pub action: MoveAction,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
