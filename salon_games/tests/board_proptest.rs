/// Property-based tests for boards, masking and the status machine using
/// proptest.
use proptest::prelude::*;
use salon_games::game::entities::{BOARD_SIZE, Board, Cell, GameStatus, SHIP_COUNT};
use salon_games::game::generators::{DECK_SIZE, random_board, random_player_card};

// Strategy for an in-bounds coordinate pair
fn coord_strategy() -> impl Strategy<Value = (u8, u8)> {
    (0u8..BOARD_SIZE as u8, 0u8..BOARD_SIZE as u8)
}

// Strategy for an arbitrary sequence of attack coordinates, duplicates allowed
fn attack_sequence_strategy() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec(coord_strategy(), 0..128)
}

fn status_strategy() -> impl Strategy<Value = GameStatus> {
    prop_oneof![
        Just(GameStatus::Waiting),
        Just(GameStatus::CardSelection),
        Just(GameStatus::Started),
        Just(GameStatus::InProgress),
        Just(GameStatus::Verification),
        Just(GameStatus::Finished),
    ]
}

/// Replay a sequence of attacks the way the rules engine does: skip cells
/// that were already attacked, reveal the rest.
fn replay_attacks(board: &mut Board, attacks: &[(u8, u8)]) {
    for &(x, y) in attacks {
        let cell = board.cell(x, y);
        if !cell.is_attacked() {
            board.set(x, y, cell.reveal());
        }
    }
}

proptest! {
    #[test]
    fn ship_count_is_conserved_under_attacks(attacks in attack_sequence_strategy()) {
        let mut board = random_board(SHIP_COUNT);
        replay_attacks(&mut board, &attacks);

        let hits = board.cells().filter(|c| matches!(c, Cell::Hit)).count();
        prop_assert_eq!(board.ships_remaining() + hits, SHIP_COUNT);
    }

    #[test]
    fn masked_boards_never_leak_ships(attacks in attack_sequence_strategy()) {
        let mut board = random_board(SHIP_COUNT);
        replay_attacks(&mut board, &attacks);

        let masked = board.masked();
        prop_assert!(masked.cells().all(|c| !matches!(c, Cell::Ship)));

        // Masking preserves everything the opponent is entitled to see.
        for y in 0..BOARD_SIZE as u8 {
            for x in 0..BOARD_SIZE as u8 {
                let original = board.cell(x, y);
                let shown = masked.cell(x, y);
                if original.is_attacked() {
                    prop_assert_eq!(shown, original);
                } else {
                    prop_assert_eq!(shown, Cell::Empty);
                }
            }
        }
    }

    #[test]
    fn attacked_cells_stay_attacked(attacks in attack_sequence_strategy(), (x, y) in coord_strategy()) {
        let mut board = random_board(SHIP_COUNT);
        board.set(x, y, board.cell(x, y).reveal());
        let before = board.cell(x, y);

        replay_attacks(&mut board, &attacks);
        prop_assert_eq!(board.cell(x, y), before);
    }

    #[test]
    fn player_cards_are_distinct_and_in_deck(_seed in 0u8..32) {
        let card = random_player_card();
        prop_assert_eq!(card.len(), 16);
        prop_assert!(card.iter().all(|&c| (c as usize) < DECK_SIZE));
        let mut sorted = card.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), 16);
    }

    #[test]
    fn status_never_moves_backward(from in status_strategy(), to in status_strategy()) {
        let mut status = from;
        match status.advance(to) {
            Ok(()) => prop_assert_eq!(status, to),
            Err(_) => prop_assert_eq!(status, from),
        }
        // Finished is terminal no matter what is attempted.
        if from == GameStatus::Finished && from != to {
            prop_assert!(status.advance(to).is_err());
        }
    }
}
