//! Pure randomized initial-state generators: ship placement, the lotería
//! deck, player tables, and lobby join codes.

use rand::rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::entities::{
    Board, BOARD_SIZE, Cell, CardId, JOIN_CODE_LEN, PLAYER_CARD_SIZE,
};

/// Number of cards in the fixed Mexican lotería deck.
pub const DECK_SIZE: usize = 54;

/// The canonical 54-card deck, indexed by [`CardId`].
pub const CARD_NAMES: [&str; DECK_SIZE] = [
    "El Gallo",
    "El Diablito",
    "La Dama",
    "El Catrín",
    "El Paraguas",
    "La Sirena",
    "La Escalera",
    "La Botella",
    "El Barril",
    "El Árbol",
    "El Melón",
    "El Valiente",
    "El Gorrito",
    "La Muerte",
    "La Pera",
    "La Bandera",
    "El Bandolón",
    "El Violoncello",
    "La Garza",
    "El Pájaro",
    "La Mano",
    "La Bota",
    "La Luna",
    "El Cotorro",
    "El Borracho",
    "El Negrito",
    "El Corazón",
    "La Sandía",
    "El Tambor",
    "El Camarón",
    "Las Jaras",
    "El Músico",
    "La Araña",
    "El Soldado",
    "La Estrella",
    "El Cazo",
    "El Mundo",
    "El Apache",
    "El Nopal",
    "El Alacrán",
    "La Rosa",
    "La Calavera",
    "La Campana",
    "El Cantarito",
    "El Venado",
    "El Sol",
    "La Corona",
    "La Chalupa",
    "El Pino",
    "El Pescado",
    "La Palma",
    "La Maceta",
    "El Arpa",
    "La Rana",
];

/// Display name for a card id. Out-of-range ids map to a placeholder rather
/// than panicking on corrupt data.
pub fn card_name(card: CardId) -> &'static str {
    CARD_NAMES.get(card as usize).copied().unwrap_or("?")
}

/// A full deck in canonical order.
pub fn full_deck() -> Vec<CardId> {
    (0..DECK_SIZE as CardId).collect()
}

/// Place `ship_count` single-cell ships on distinct random cells of an
/// otherwise empty board.
pub fn random_board(ship_count: usize) -> Board {
    let mut cells: Vec<(u8, u8)> = (0..BOARD_SIZE as u8)
        .flat_map(|y| (0..BOARD_SIZE as u8).map(move |x| (x, y)))
        .collect();
    cells.shuffle(&mut rng());

    let mut board = Board::default();
    for &(x, y) in cells.iter().take(ship_count) {
        board.set(x, y, Cell::Ship);
    }
    board
}

/// Shuffle the full deck and deal the first 16 distinct cards as a player's
/// 4×4 table.
pub fn random_player_card() -> Vec<CardId> {
    let mut deck = full_deck();
    deck.shuffle(&mut rng());
    deck.truncate(PLAYER_CARD_SIZE);
    deck
}

/// Generate an 8-character join code. Ambiguous characters (0/O, 1/I) are
/// excluded since codes are typed by hand.
pub fn join_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rng();
    (0..JOIN_CODE_LEN)
        .map(|_| {
            let chosen = ALPHABET
                .choose(&mut rng)
                .copied()
                .unwrap_or(b'A');
            chosen as char
        })
        .collect()
}
