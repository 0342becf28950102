pub mod attack_map;
pub mod helpers;
pub mod pin_detector;
pub mod sacrifice_detector;
pub mod tactical_types;

pub use attack_map::AttackedSquares;
pub use pin_detector::{compute_pins, exposes_king, Pin};
pub use sacrifice_detector::{detect_sacrifice, Sacrifice, SacrificeKind};
pub use tactical_types::{AttackOverlay, PinOverlay};

use chess::Placement;

/// Per-position overlay features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionFeatures {
    pub pins: Vec<Pin>,
    pub attacked: AttackedSquares,
}

impl PositionFeatures {
    pub fn compute(placement: &Placement) -> Self {
        Self {
            pins: compute_pins(placement),
            attacked: AttackedSquares::compute(placement),
        }
    }

    pub fn pin_overlays(&self) -> Vec<PinOverlay> {
        self.pins.iter().map(PinOverlay::from).collect()
    }

    pub fn attack_overlay(&self) -> AttackOverlay {
        AttackOverlay::from(&self.attacked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_features() {
        let features = PositionFeatures::compute(&Placement::default());
        assert!(features.pins.is_empty());
        // 8 third-rank squares + the 14 covered on the back two ranks
        assert_eq!(features.attacked.white.len(), 22);
        assert_eq!(features.attacked.black.len(), 22);
    }
}
