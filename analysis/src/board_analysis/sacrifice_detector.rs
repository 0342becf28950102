use cozy_chess::{Board, Move, Piece};
use serde::{Deserialize, Serialize};

use chess::{square_name, PieceKind, Placement};

use super::helpers::{attackers_of, piece_value};

/// Material must drop by more than this for a move to count as a sacrifice.
const MIN_MATERIAL_GIVEN: i32 = 100;
/// The evaluation must improve by more than this, from the mover's point of view.
const MIN_EVAL_GAIN: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SacrificeKind {
    Queen,
    Rook,
    Minor,
    Pawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sacrifice {
    pub kind: SacrificeKind,
    pub piece: PieceKind,
    pub square: String,
    /// Material given up, in centipawns (positive).
    pub material: i32,
}

/// Detects sacrifices: the moved piece lands en prise for less than its
/// value, yet the evaluation improves for the mover.
///
/// `board` is the position before the legal move `mv`; both evaluations are
/// from the mover's point of view.
pub fn detect_sacrifice(board: &Board, mv: Move, eval_before: i32, eval_after: i32) -> Option<Sacrifice> {
    let moving_piece = board.piece_on(mv.from)?;
    if moving_piece == Piece::King {
        return None;
    }
    let mover = board.side_to_move();

    let captured = if board.colors(!mover).has(mv.to) {
        board.piece_on(mv.to)
    } else {
        None
    };
    let gained = captured.map(piece_value).unwrap_or(0);
    let net = gained - piece_value(moving_piece);

    if net >= -MIN_MATERIAL_GIVEN || eval_after.saturating_sub(eval_before) <= MIN_EVAL_GAIN {
        return None;
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if attackers_of(&Placement::from(&after), mv.to, !mover).is_empty() {
        return None;
    }

    let kind = match net {
        n if n <= -800 => SacrificeKind::Queen,
        n if n <= -500 => SacrificeKind::Rook,
        n if n <= -300 => SacrificeKind::Minor,
        _ => SacrificeKind::Pawn,
    };

    Some(Sacrifice {
        kind,
        piece: PieceKind::from(moving_piece),
        square: square_name(mv.to),
        material: -net,
    })
}
