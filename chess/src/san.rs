//! Standard Algebraic Notation (SAN) formatting and parsing.
//!
//! SAN is the standard human-readable chess notation used in scoresheets,
//! books, and GUIs. Examples: "e4", "Nf3", "Bxc6+", "O-O", "e8=Q#"

use cozy_chess::{Board, Move, Piece};

use crate::geometry::{file_of, rank_of, square_name};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("empty move")]
    Empty,
    #[error("no legal move found for: {0}")]
    NoLegalMove(String),
}

/// Format a legal move as SAN. The move must use cozy-chess castling notation
/// (king takes own rook).
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return crate::uci::format_uci_move(mv);
    };

    let mut san = String::new();
    let mover = board.side_to_move();

    if piece == Piece::King && board.colors(mover).has(mv.to) {
        if file_of(mv.to) > file_of(mv.from) {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = board.piece_on(mv.to).is_some()
            || (piece == Piece::Pawn && file_of(mv.from) != file_of(mv.to));

        if piece == Piece::Pawn {
            if is_capture {
                san.push(file_char(mv));
            }
        } else {
            san.push(piece_letter(piece));
            let (needs_file, needs_rank) = disambiguation(board, mv, piece);
            if needs_file {
                san.push(file_char(mv));
            }
            if needs_rank {
                san.push((b'1' + rank_of(mv.from)) as char);
            }
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&square_name(mv.to));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(piece_letter(promo));
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if has_legal_moves(&after) {
            san.push('+');
        } else {
            san.push('#');
        }
    }

    san
}

/// Parse a SAN move by matching it against the SAN of every legal move.
/// Check/mate suffixes and annotation glyphs (`!`, `?`) are ignored, and
/// `0-0` is accepted for `O-O`.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = strip_suffixes(san);
    if wanted.is_empty() {
        return Err(SanError::Empty);
    }
    let wanted = wanted.replace('0', "O");

    crate::uci::legal_moves(board)
        .into_iter()
        .find(|&mv| strip_suffixes(&format_san(board, mv)) == wanted)
        .ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

/// Returns true if the side to move has at least one legal move.
pub fn has_legal_moves(board: &Board) -> bool {
    let mut found = false;
    board.generate_moves(|mvs| {
        found = !mvs.is_empty();
        found
    });
    found
}

fn strip_suffixes(san: &str) -> &str {
    san.trim().trim_end_matches(['+', '#', '!', '?'])
}

/// Returns (`needs_file`, `needs_rank`) for a non-pawn move.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> (bool, bool) {
    let mut rivals = Vec::new();
    board.generate_moves(|mvs| {
        if mvs.piece == piece {
            rivals.extend(mvs.into_iter().filter(|m| m.to == mv.to && m.from != mv.from));
        }
        false
    });

    if rivals.is_empty() {
        return (false, false);
    }

    let same_file = rivals.iter().any(|m| file_of(m.from) == file_of(mv.from));
    let same_rank = rivals.iter().any(|m| rank_of(m.from) == rank_of(mv.from));

    match (same_file, same_rank) {
        (false, _) => (true, false),
        (true, false) => (false, true),
        (true, true) => (true, true),
    }
}

fn file_char(mv: Move) -> char {
    (b'a' + file_of(mv.from)) as char
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::resolve_uci_move;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn san_of(fen: &str, uci: &str) -> String {
        let board: Board = fen.parse().unwrap();
        let mv = resolve_uci_move(&board, uci).unwrap();
        format_san(&board, mv)
    }

    #[test]
    fn test_pawn_push_and_knight() {
        assert_eq!(san_of(START_FEN, "e2e4"), "e4");
        assert_eq!(san_of(START_FEN, "g1f3"), "Nf3");
    }

    #[test]
    fn test_capture() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(san_of(fen, "e4d5"), "exd5");
    }

    #[test]
    fn test_en_passant() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert_eq!(san_of(fen, "e5f6"), "exf6");
    }

    #[test]
    fn test_castling() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(fen, "e1g1"), "O-O");
        assert_eq!(san_of(fen, "e1c1"), "O-O-O");
    }

    #[test]
    fn test_promotion() {
        let fen = "8/P7/8/8/8/8/8/4K2k w - - 0 1";
        // The new queen checks along the long diagonal.
        assert_eq!(san_of(fen, "a7a8q"), "a8=Q+");
        assert_eq!(san_of(fen, "a7a8n"), "a8=N");
    }

    #[test]
    fn test_disambiguation() {
        // Knights on b1 and f1 can both reach d2.
        let fen = "4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1";
        assert_eq!(san_of(fen, "b1d2"), "Nbd2");

        // Rooks on a1 and a5 can both reach a3.
        let fen = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1a3"), "R1a3");
    }

    #[test]
    fn test_check_and_mate_suffix() {
        // Scholar's mate final move.
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
        assert_eq!(san_of(fen, "f3f7"), "Qxf7#");

        let fen = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1a8"), "Ra8+");
    }

    #[test]
    fn test_parse_san() {
        let board = Board::default();
        let mv = parse_san(&board, "Nf3").unwrap();
        assert_eq!(crate::uci::format_uci_move(mv), "g1f3");

        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        let board: Board = fen.parse().unwrap();
        let mv = parse_san(&board, "0-0").unwrap();
        assert_eq!(crate::uci::format_uci_move(mv), "e1h1");
    }

    #[test]
    fn test_parse_san_ignores_suffixes() {
        let board = Board::default();
        assert!(parse_san(&board, "e4!?").is_ok());
    }

    #[test]
    fn test_parse_san_rejects_illegal() {
        let board = Board::default();
        assert!(matches!(
            parse_san(&board, "Ke2"),
            Err(SanError::NoLegalMove(_))
        ));
        assert_eq!(parse_san(&board, "  "), Err(SanError::Empty));
    }
}
