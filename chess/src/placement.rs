//! Occupancy-only board view.
//!
//! `cozy_chess::Board` only accepts legal positions (exactly one king per side,
//! no pawns on the back ranks, ...). Feature detection works on raw piece
//! placement, so this type also models empty and king-less boards.

use std::str::FromStr;

use cozy_chess::{BitBoard, Board, Color, Piece, Square};

use crate::geometry::square_of;
use crate::types::parse_fen_piece;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not describe exactly 8 files")]
    RankWidth { rank: u8 },
    #[error("invalid piece character: {0}")]
    InvalidPiece(char),
    #[error("empty placement")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    colors: [BitBoard; 2],
    pieces: [BitBoard; 6],
}

impl Placement {
    pub fn empty() -> Self {
        Self {
            colors: [BitBoard::EMPTY; 2],
            pieces: [BitBoard::EMPTY; 6],
        }
    }

    /// Parse the placement field of a FEN. A full FEN is accepted too; only its
    /// first field is read.
    pub fn from_fen(fen: &str) -> Result<Self, PlacementError> {
        let field = fen.split_whitespace().next().ok_or(PlacementError::Empty)?;
        let ranks: Vec<&str> = field.split('/').collect();
        if ranks.len() != 8 {
            return Err(PlacementError::RankCount(ranks.len()));
        }

        let mut placement = Self::empty();
        for (i, row) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file: u8 = 0;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(PlacementError::InvalidPiece(c));
                    }
                    file += skip as u8;
                    continue;
                }
                let (piece, color) = parse_fen_piece(c).ok_or(PlacementError::InvalidPiece(c))?;
                let sq = square_of(file, rank).map_err(|_| PlacementError::RankWidth { rank: rank + 1 })?;
                placement.put(sq, piece, color);
                file += 1;
            }
            if file != 8 {
                return Err(PlacementError::RankWidth { rank: rank + 1 });
            }
        }

        Ok(placement)
    }

    /// Place a piece, replacing whatever stood on the square.
    pub fn put(&mut self, sq: Square, piece: Piece, color: Color) {
        self.clear(sq);
        self.colors[color as usize] |= sq.bitboard();
        self.pieces[piece as usize] |= sq.bitboard();
    }

    pub fn clear(&mut self, sq: Square) {
        let mask = !sq.bitboard();
        for bb in self.colors.iter_mut().chain(self.pieces.iter_mut()) {
            *bb &= mask;
        }
    }

    /// Copy of this placement with `sq` emptied.
    pub fn without(&self, sq: Square) -> Self {
        let mut copy = self.clone();
        copy.clear(sq);
        copy
    }

    pub fn occupied(&self) -> BitBoard {
        self.colors[0] | self.colors[1]
    }

    pub fn colors(&self, color: Color) -> BitBoard {
        self.colors[color as usize]
    }

    pub fn pieces(&self, piece: Piece) -> BitBoard {
        self.pieces[piece as usize]
    }

    pub fn colored_pieces(&self, color: Color, piece: Piece) -> BitBoard {
        self.colors(color) & self.pieces(piece)
    }

    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        Piece::ALL
            .into_iter()
            .find(|&piece| self.pieces(piece).has(sq))
    }

    pub fn color_on(&self, sq: Square) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|&color| self.colors(color).has(sq))
    }

    /// The king of `color`, if exactly one stands on the board.
    pub fn king(&self, color: Color) -> Option<Square> {
        let kings = self.colored_pieces(color, Piece::King);
        if kings.len() != 1 {
            return None;
        }
        kings.into_iter().next()
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::from(&Board::default())
    }
}

impl From<&Board> for Placement {
    fn from(board: &Board) -> Self {
        let mut placement = Self::empty();
        for color in Color::ALL {
            placement.colors[color as usize] = board.colors(color);
        }
        for piece in Piece::ALL {
            placement.pieces[piece as usize] = board.pieces(piece);
        }
        placement
    }
}

impl FromStr for Placement {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}
