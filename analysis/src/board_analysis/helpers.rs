use cozy_chess::{BitBoard, Color, Piece, Square};

use chess::Placement;

/// Returns the union of all attack squares for a given color.
pub fn attacked_squares(placement: &Placement, color: Color) -> BitBoard {
    let mut attacks = BitBoard::EMPTY;
    for piece in Piece::ALL {
        for sq in placement.colored_pieces(color, piece) {
            attacks |= piece_attacks(placement.occupied(), sq, piece, color);
        }
    }
    attacks
}

/// Returns all pieces of `color` that attack the given square.
pub fn attackers_of(placement: &Placement, sq: Square, color: Color) -> BitBoard {
    let occupied = placement.occupied();
    let color_pieces = placement.colors(color);
    let queens = placement.pieces(Piece::Queen);

    let mut attackers = BitBoard::EMPTY;

    // A pawn of `color` attacks `sq` if `sq` is in its attack set; equivalently,
    // look from `sq` as if it were the opposite color's pawn.
    attackers |= cozy_chess::get_pawn_attacks(sq, !color) & placement.pieces(Piece::Pawn);
    attackers |= cozy_chess::get_knight_moves(sq) & placement.pieces(Piece::Knight);
    attackers |=
        cozy_chess::get_bishop_moves(sq, occupied) & (placement.pieces(Piece::Bishop) | queens);
    attackers |= cozy_chess::get_rook_moves(sq, occupied) & (placement.pieces(Piece::Rook) | queens);
    attackers |= cozy_chess::get_king_moves(sq) & placement.pieces(Piece::King);

    attackers & color_pieces
}

/// Standard piece values in centipawns.
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20000,
    }
}

/// Returns the attack bitboard for a specific piece on a square.
pub fn piece_attacks(occupied: BitBoard, sq: Square, piece: Piece, color: Color) -> BitBoard {
    match piece {
        Piece::Pawn => cozy_chess::get_pawn_attacks(sq, color),
        Piece::Knight => cozy_chess::get_knight_moves(sq),
        Piece::Bishop => cozy_chess::get_bishop_moves(sq, occupied),
        Piece::Rook => cozy_chess::get_rook_moves(sq, occupied),
        Piece::Queen => {
            cozy_chess::get_bishop_moves(sq, occupied) | cozy_chess::get_rook_moves(sq, occupied)
        }
        Piece::King => cozy_chess::get_king_moves(sq),
    }
}
