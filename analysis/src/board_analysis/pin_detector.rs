use cozy_chess::{Color, Piece, Square};
use smallvec::SmallVec;

use chess::geometry::{between, direction, walk, Direction};
use chess::Placement;

use super::helpers::attackers_of;

/// A piece that cannot leave its line without exposing its own king to a
/// sliding attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub pinned: Square,
    pub attacker: Square,
    pub king: Square,
    /// From one step past the attacker up to and including the king. Always
    /// contains `pinned`; never contains `attacker`.
    pub ray: SmallVec<[Square; 8]>,
    /// Color of the pinned piece.
    pub color: Color,
}

impl Pin {
    pub fn direction(&self) -> Option<Direction> {
        direction(self.attacker, self.king)
    }
}

/// All absolute pins on the board, white pins first, each color in square order.
pub fn compute_pins(placement: &Placement) -> Vec<Pin> {
    let mut pins = Vec::new();

    for color in [Color::White, Color::Black] {
        let Some(king) = placement.king(color) else {
            continue;
        };

        for candidate in placement.colors(color) {
            if candidate == king {
                continue;
            }
            if let Some(pin) = pin_through(placement, color, king, candidate) {
                debug_assert!(exposes_king(placement, &pin));
                pins.push(pin);
            }
        }
    }

    tracing::trace!(count = pins.len(), "computed pins");
    pins
}

fn pin_through(placement: &Placement, color: Color, king: Square, candidate: Square) -> Option<Pin> {
    let dir = direction(king, candidate)?;

    let occupied = placement.occupied();
    if between(king, candidate).any(|sq| occupied.has(sq)) {
        return None;
    }

    let attacker = walk(candidate, dir).find(|&sq| occupied.has(sq))?;
    if placement.color_on(attacker) != Some(!color) {
        return None;
    }
    let slides_along = match placement.piece_on(attacker)? {
        Piece::Queen => true,
        Piece::Bishop => dir.is_diagonal(),
        Piece::Rook => !dir.is_diagonal(),
        _ => false,
    };
    if !slides_along {
        return None;
    }

    let mut ray = SmallVec::new();
    for sq in walk(attacker, dir.opposite()) {
        ray.push(sq);
        if sq == king {
            break;
        }
    }

    Some(Pin {
        pinned: candidate,
        attacker,
        king,
        ray,
        color,
    })
}

/// Whether lifting the pinned piece lets the attacker hit the king.
pub fn exposes_king(placement: &Placement, pin: &Pin) -> bool {
    let lifted = placement.without(pin.pinned);
    attackers_of(&lifted, pin.king, !pin.color).has(pin.attacker)
}
