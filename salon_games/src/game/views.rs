//! Read-only projections of game state.
//!
//! Projections are pure functions over already-loaded entities and never
//! mutate anything. Per-viewer masking happens here: a battleship opponent
//! board hides un-hit ships, simon says sequences are reported by length
//! only.

use serde::Serialize;

use super::entities::{
    Board, CardId, Game, GameId, GameStatus, GameType, PlayerGame, UserId,
};
use super::errors::{GameError, GameResult};
use super::generators;

/// One participant as shown in the lobby.
#[derive(Clone, Debug, Serialize)]
pub struct LobbyPlayer {
    pub user_id: UserId,
    pub ready: bool,
    pub is_host: bool,
    /// Lotería only: whether the player has generated their table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_generated: Option<bool>,
    /// Simon says only: whether the player has committed a palette.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors_committed: Option<bool>,
}

/// Pre-start lobby snapshot.
#[derive(Clone, Debug, Serialize)]
pub struct LobbyView {
    pub game_id: GameId,
    pub code: String,
    pub game_type: GameType,
    pub status: GameStatus,
    pub min_players: u8,
    pub max_players: u8,
    /// Whether the start conditions are currently met. Informational for
    /// battleship and simon says (they start automatically), authoritative
    /// for the lotería host's start action.
    pub can_start: bool,
    pub players: Vec<LobbyPlayer>,
}

/// Project the lobby for a game still in its lobby phase.
pub fn lobby_view(game: &Game, players: &[PlayerGame]) -> LobbyView {
    let game_type = game.game_type();
    let lobby_players: Vec<LobbyPlayer> = players
        .iter()
        .map(|p| LobbyPlayer {
            user_id: p.user_id,
            ready: p.ready,
            is_host: is_host(game, p),
            card_generated: p.loteria().ok().map(|l| l.card_generated()),
            colors_committed: p.simon().ok().map(|s| !s.custom_colors.is_empty()),
        })
        .collect();

    LobbyView {
        game_id: game.id,
        code: game.code.clone(),
        game_type,
        status: game.status,
        min_players: game.min_players,
        max_players: game.max_players,
        can_start: can_start(game, players),
        players: lobby_players,
    }
}

/// Whether the per-type start conditions hold: enough players, everyone
/// ready, every lotería table generated, every simon says palette committed.
pub fn can_start(game: &Game, players: &[PlayerGame]) -> bool {
    if !game.status.in_lobby() {
        return false;
    }
    if players.len() < game.min_players as usize {
        return false;
    }
    if !players.iter().all(|p| p.ready) {
        return false;
    }
    match game.game_type() {
        GameType::Loteria => players.iter().all(|p| {
            p.loteria()
                .map(|l| l.is_spectator || l.card_generated())
                .unwrap_or(false)
        }),
        GameType::SimonSays => players.iter().all(|p| {
            p.simon()
                .map(|s| !s.custom_colors.is_empty())
                .unwrap_or(false)
        }),
        GameType::Battleship => true,
    }
}

fn is_host(game: &Game, player: &PlayerGame) -> bool {
    match player.loteria() {
        Ok(state) => state.is_host,
        // Turn-based types treat the creator (first join) as host.
        Err(_) => game.players.first() == Some(&player.id),
    }
}

/// In-progress (or finished) game snapshot, per game type and viewer.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "game_type")]
pub enum GameStatusView {
    #[serde(rename = "battleship")]
    Battleship(BattleshipView),
    #[serde(rename = "simonsay")]
    SimonSays(SimonView),
    #[serde(rename = "loteria")]
    Loteria(LoteriaView),
}

#[derive(Clone, Debug, Serialize)]
pub struct BattleshipView {
    pub status: GameStatus,
    pub current_turn: Option<UserId>,
    pub winner: Option<UserId>,
    /// The viewer's own board, ships visible.
    pub your_board: Board,
    pub your_ships_sunk: u32,
    pub your_ships_lost: u32,
    /// The opponent board with un-hit ships masked out.
    pub opponent: Option<BattleshipOpponent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BattleshipOpponent {
    pub user_id: UserId,
    pub board: Board,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimonView {
    pub status: GameStatus,
    pub current_turn: Option<UserId>,
    pub winner: Option<UserId>,
    pub your_palette: Vec<String>,
    /// How many colors the viewer must repeat. The literal sequence stays
    /// hidden; only the color the opponent just appended is revealed, so
    /// the client can flash it once.
    pub your_sequence_len: usize,
    pub your_index: usize,
    pub latest_color: Option<String>,
    pub opponent: Option<SimonOpponent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimonOpponent {
    pub user_id: UserId,
    pub palette: Vec<String>,
    /// Length only; the opponent's pending colors stay hidden.
    pub sequence_len: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoteriaView {
    pub status: GameStatus,
    pub host_user_id: UserId,
    pub winner: Option<UserId>,
    pub current_card: Option<LoteriaCard>,
    pub drawn_cards: Vec<LoteriaCard>,
    pub cards_remaining: usize,
    pub your_card: Vec<CardId>,
    pub your_marked_cells: Vec<bool>,
    pub tokens_used: u8,
    pub is_spectator: bool,
    pub players: Vec<LoteriaPeer>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoteriaCard {
    pub id: CardId,
    pub name: &'static str,
}

impl LoteriaCard {
    fn new(id: CardId) -> Self {
        Self {
            id,
            name: generators::card_name(id),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LoteriaPeer {
    pub user_id: UserId,
    pub tokens_used: u8,
    pub is_spectator: bool,
    pub claimed_win: bool,
}

/// Project the gameplay status for `viewer`. The caller has already checked
/// the game has started and the viewer participates.
pub fn game_status_view(
    game: &Game,
    players: &[PlayerGame],
    viewer: UserId,
) -> GameResult<GameStatusView> {
    let me = players
        .iter()
        .find(|p| p.user_id == viewer)
        .ok_or(GameError::Forbidden(viewer))?;

    match game.game_type() {
        GameType::Battleship => {
            let mine = me.battleship()?;
            let opponent = players
                .iter()
                .find(|p| p.user_id != viewer)
                .map(|p| {
                    Ok::<_, GameError>(BattleshipOpponent {
                        user_id: p.user_id,
                        board: p.battleship()?.board.masked(),
                    })
                })
                .transpose()?;
            Ok(GameStatusView::Battleship(BattleshipView {
                status: game.status,
                current_turn: game.current_turn,
                winner: game.winner,
                your_board: mine.board.clone(),
                your_ships_sunk: mine.ships_sunk,
                your_ships_lost: mine.ships_lost,
                opponent,
            }))
        }
        GameType::SimonSays => {
            let mine = me.simon()?;
            let opponent = players
                .iter()
                .find(|p| p.user_id != viewer)
                .map(|p| {
                    let state = p.simon()?;
                    Ok::<_, GameError>(SimonOpponent {
                        user_id: p.user_id,
                        palette: state.custom_colors.clone(),
                        sequence_len: state.sequence.len(),
                    })
                })
                .transpose()?;
            Ok(GameStatusView::SimonSays(SimonView {
                status: game.status,
                current_turn: game.current_turn,
                winner: game.winner,
                your_palette: mine.custom_colors.clone(),
                your_sequence_len: mine.sequence.len(),
                your_index: mine.current_index,
                latest_color: mine.sequence.last().cloned(),
                opponent,
            }))
        }
        GameType::Loteria => {
            let state = game.loteria()?;
            let mine = me.loteria()?;
            let peers = players
                .iter()
                .filter(|p| p.user_id != viewer)
                .map(|p| {
                    let l = p.loteria()?;
                    Ok::<_, GameError>(LoteriaPeer {
                        user_id: p.user_id,
                        tokens_used: l.tokens_used,
                        is_spectator: l.is_spectator,
                        claimed_win: l.claimed_win,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GameStatusView::Loteria(LoteriaView {
                status: game.status,
                host_user_id: state.host_user_id,
                winner: game.winner,
                current_card: state.current_card.map(LoteriaCard::new),
                drawn_cards: state.drawn_cards.iter().copied().map(LoteriaCard::new).collect(),
                cards_remaining: state.available_cards.len(),
                your_card: mine.player_card.clone(),
                your_marked_cells: mine.marked_cells.clone(),
                tokens_used: mine.tokens_used,
                is_spectator: mine.is_spectator,
                players: peers,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{
        BattleshipGame, BattleshipPlayer, Cell, GameState, PlayerResult, PlayerState,
    };
    use chrono::Utc;

    fn battleship_game() -> Game {
        Game {
            id: 1,
            code: "ABCD2345".into(),
            status: GameStatus::InProgress,
            min_players: 2,
            max_players: 2,
            players: vec![10, 11],
            current_turn: Some(100),
            winner: None,
            surrendered_by: Default::default(),
            rematch_requested_by: Default::default(),
            state: GameState::Battleship(BattleshipGame::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn battleship_player(id: i64, user_id: UserId, ready: bool) -> PlayerGame {
        let mut state = BattleshipPlayer::default();
        state.board.set(0, 0, Cell::Ship);
        state.board.set(1, 1, Cell::Hit);
        PlayerGame {
            id,
            game_id: 1,
            user_id,
            result: PlayerResult::Pending,
            ready,
            state: PlayerState::Battleship(state),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn opponent_board_is_masked_but_own_is_not() {
        let game = battleship_game();
        let players = vec![
            battleship_player(10, 100, true),
            battleship_player(11, 101, true),
        ];

        let GameStatusView::Battleship(view) =
            game_status_view(&game, &players, 100).unwrap()
        else {
            panic!("wrong view variant");
        };

        assert_eq!(view.your_board.cell(0, 0), Cell::Ship);
        let opponent = view.opponent.unwrap();
        assert_eq!(opponent.user_id, 101);
        assert_eq!(opponent.board.cell(0, 0), Cell::Empty);
        assert_eq!(opponent.board.cell(1, 1), Cell::Hit);
    }

    #[test]
    fn non_participants_cannot_view_gameplay() {
        let game = battleship_game();
        let players = vec![battleship_player(10, 100, true)];
        let err = game_status_view(&game, &players, 999).unwrap_err();
        assert!(matches!(err, GameError::Forbidden(999)));
    }

    #[test]
    fn lobby_can_start_requires_everyone_ready() {
        let mut game = battleship_game();
        game.status = GameStatus::Waiting;
        let players = vec![
            battleship_player(10, 100, true),
            battleship_player(11, 101, false),
        ];
        let view = lobby_view(&game, &players);
        assert!(!view.can_start);
        assert!(view.players[0].is_host);
        assert!(!view.players[1].is_host);

        let players = vec![
            battleship_player(10, 100, true),
            battleship_player(11, 101, true),
        ];
        assert!(lobby_view(&game, &players).can_start);
    }
}
