//! Typed errors raised by the game engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{GameStatus, GameType, UserId};
use crate::store::StoreError;

/// Errors surfaced by lifecycle and rules operations.
///
/// Variants are specific so call sites stay readable; [`GameError::kind`]
/// collapses them into the coarse categories the HTTP boundary maps to
/// status codes.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("game not found")]
    GameNotFound,
    #[error("player not found")]
    PlayerNotFound,
    #[error("user {0} is not a participant of this game")]
    Forbidden(UserId),
    #[error("only the host may do that")]
    HostOnly,
    #[error("not your turn")]
    NotYourTurn,
    #[error("game has not started")]
    NotStarted,
    #[error("game is already finished")]
    GameFinished,
    #[error("action not allowed while game is {0}")]
    InvalidStatus(GameStatus),
    #[error("game is full")]
    GameFull,
    #[error("already joined this game")]
    AlreadyJoined,
    #[error("cell already attacked")]
    AlreadyAttacked,
    #[error("cell already marked")]
    AlreadyMarked,
    #[error("a drawn card is still active")]
    CardAlreadyActive,
    #[error("no drawn card to process")]
    NoActiveCard,
    #[error("no cards left to draw")]
    NoCardsAvailable,
    #[error("nothing to reshuffle")]
    NothingToReshuffle,
    #[error("coordinates ({x}, {y}) are outside the board")]
    InvalidCoordinates { x: u8, y: u8 },
    #[error("invalid cell index {0}")]
    InvalidCellIndex(u8),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    #[error("expected exactly {expected} colors, got {got}")]
    WrongColorCount { expected: usize, got: usize },
    #[error("color is not in the opponent's palette")]
    ColorNotInPalette,
    #[error("finish repeating your sequence first")]
    SequenceIncomplete,
    #[error("sequence already completed, choose a color for your opponent")]
    SequenceCompleted,
    #[error("card does not match the current draw")]
    CardMismatch,
    #[error("spectators cannot act")]
    Spectator,
    #[error("board is not full yet")]
    BoardNotFull,
    #[error("not all players are ready")]
    CannotStart,
    #[error("invalid player bounds {min}..={max}")]
    InvalidPlayerBounds { min: u8, max: u8 },
    #[error("unsupported game type {0:?}")]
    UnsupportedGameType(String),
    #[error("operation does not apply to a {0} game")]
    WrongGameType(GameType),
    #[error("could not allocate a unique join code")]
    CodeExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse error categories, stable across message changes.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidState,
    InvalidInput,
    Conflict,
    Unsupported,
    Internal,
}

impl GameError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::GameNotFound | Self::PlayerNotFound => ErrorKind::NotFound,
            Self::Forbidden(_) | Self::HostOnly | Self::NotYourTurn | Self::Spectator => {
                ErrorKind::Forbidden
            }
            Self::NotStarted
            | Self::GameFinished
            | Self::InvalidStatus(_)
            | Self::NoActiveCard
            | Self::NoCardsAvailable
            | Self::NothingToReshuffle
            | Self::SequenceIncomplete
            | Self::SequenceCompleted
            | Self::BoardNotFull
            | Self::CannotStart
            | Self::WrongGameType(_) => ErrorKind::InvalidState,
            Self::InvalidCoordinates { .. }
            | Self::InvalidCellIndex(_)
            | Self::InvalidColor(_)
            | Self::WrongColorCount { .. }
            | Self::ColorNotInPalette
            | Self::CardMismatch
            | Self::InvalidPlayerBounds { .. } => ErrorKind::InvalidInput,
            Self::GameFull
            | Self::AlreadyJoined
            | Self::AlreadyAttacked
            | Self::AlreadyMarked
            | Self::CardAlreadyActive => ErrorKind::Conflict,
            Self::UnsupportedGameType(_) => ErrorKind::Unsupported,
            Self::CodeExhausted | Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Client-safe message. Store errors are sanitized so SQL details never
    /// leak to API consumers.
    pub fn client_message(&self) -> String {
        match self {
            Self::Store(_) | Self::CodeExhausted => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_the_expected_categories() {
        assert_eq!(GameError::GameNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(GameError::NotYourTurn.kind(), ErrorKind::Forbidden);
        assert_eq!(GameError::GameFinished.kind(), ErrorKind::InvalidState);
        assert_eq!(
            GameError::InvalidCoordinates { x: 9, y: 0 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(GameError::AlreadyAttacked.kind(), ErrorKind::Conflict);
        assert_eq!(
            GameError::UnsupportedGameType("chess".into()).kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn store_errors_are_sanitized() {
        let err = GameError::Store(StoreError::Corrupt("games.doc".into()));
        assert_eq!(err.client_message(), "internal server error");
    }
}
