//! Serializable overlay shapes consumed by the renderer. Squares are written
//! by name ("e4") so the output stays independent of the board library.

use serde::{Deserialize, Serialize};

use chess::{square_name, PieceColor};
use cozy_chess::BitBoard;

use super::attack_map::AttackedSquares;
use super::pin_detector::Pin;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinOverlay {
    /// The pinned square.
    pub sq: String,
    pub ray: Vec<String>,
    pub attacker: String,
    pub king: String,
    pub color: PieceColor,
}

impl From<&Pin> for PinOverlay {
    fn from(pin: &Pin) -> Self {
        Self {
            sq: square_name(pin.pinned),
            ray: pin.ray.iter().copied().map(square_name).collect(),
            attacker: square_name(pin.attacker),
            king: square_name(pin.king),
            color: pin.color.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOverlay {
    pub white: Vec<String>,
    pub black: Vec<String>,
}

impl From<&AttackedSquares> for AttackOverlay {
    fn from(attacked: &AttackedSquares) -> Self {
        Self {
            white: names(attacked.white),
            black: names(attacked.black),
        }
    }
}

/// Square names in a1, b1, ..., h8 order.
fn names(squares: BitBoard) -> Vec<String> {
    squares.into_iter().map(square_name).collect()
}
