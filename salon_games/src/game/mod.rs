//! Core game logic: entities, lifecycle engine and the per-type rules.
//!
//! The [`lifecycle::GameEngine`] owns every operation; the rules modules
//! ([`battleship`], [`simon`], [`loteria`]) extend it with game-type-specific
//! actions. Everything here is transport-agnostic; the HTTP layer lives in
//! the server crate.

pub mod battleship;
pub mod entities;
pub mod errors;
pub mod generators;
pub mod lifecycle;
pub mod loteria;
pub mod simon;
pub mod views;

pub use battleship::{AttackOutcome, AttackResult};
pub use entities::{
    Board, Cell, Game, GameId, GameState, GameStatus, GameType, MoveRecord, PlayerGame,
    PlayerResult, PlayerState, UserId,
};
pub use errors::{ErrorKind, GameError, GameResult};
pub use lifecycle::{CreateOptions, CreatedGame, GameEngine, ReadyOutcome, RematchOutcome};
pub use loteria::{ClaimOutcome, DrawnCard};
pub use simon::{PlayOutcome, SimonPhase};
pub use views::{GameStatusView, LobbyView};
