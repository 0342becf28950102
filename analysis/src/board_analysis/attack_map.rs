use cozy_chess::{BitBoard, Color, Square};

use chess::Placement;

use super::helpers::attacked_squares;

/// Raw attack coverage of both colors. Turn order and check legality are
/// ignored: a square is covered if any piece of that color could capture there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackedSquares {
    pub white: BitBoard,
    pub black: BitBoard,
}

impl AttackedSquares {
    pub fn compute(placement: &Placement) -> Self {
        Self {
            white: attacked_squares(placement, Color::White),
            black: attacked_squares(placement, Color::Black),
        }
    }

    pub fn by(&self, color: Color) -> BitBoard {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        self.by(by).has(sq)
    }
}
