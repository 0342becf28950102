//! Engine score types and their normalization to a single point of view.

use cozy_chess::Color;
use serde::{Deserialize, Serialize};

/// Centipawn equivalent of a mate in zero. Mate-in-N scores are placed just
/// inside this bound so shorter mates compare as larger.
pub const MATE_CP: i32 = 30000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("invalid score: expected exactly one of cp/mate, got cp={cp:?} mate={mate:?}")]
    InvalidScore { cp: Option<i32>, mate: Option<i32> },
}

/// Engine evaluation score.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves,
/// zero = side-to-move is already mated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisScore {
    Centipawns(i32),
    Mate(i32),
}

impl AnalysisScore {
    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }

    /// Convert to centipawns for comparison. Mate scores use large values.
    pub fn to_cp(&self) -> i32 {
        match self {
            Self::Centipawns(cp) => *cp,
            Self::Mate(m) => {
                // Distant mates stay on their side of zero.
                let distance = m.saturating_abs().saturating_mul(100).min(MATE_CP - 1);
                if *m > 0 {
                    MATE_CP - distance
                } else {
                    distance - MATE_CP
                }
            }
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self, Self::Mate(_))
    }
}

impl std::fmt::Display for AnalysisScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A score as it arrives from an engine adapter: two optional fields of which
/// exactly one must be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScore {
    pub cp: Option<i32>,
    pub mate: Option<i32>,
}

impl TryFrom<RawScore> for AnalysisScore {
    type Error = ScoreError;

    fn try_from(raw: RawScore) -> Result<Self, Self::Error> {
        match (raw.cp, raw.mate) {
            (Some(cp), None) => Ok(Self::Centipawns(cp)),
            (None, Some(mate)) => Ok(Self::Mate(mate)),
            (cp, mate) => Err(ScoreError::InvalidScore { cp, mate }),
        }
    }
}

/// Output shape of a normalized score: exactly one field is non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalScore {
    pub cp: Option<i32>,
    pub mate: Option<i32>,
}

impl From<AnalysisScore> for CanonicalScore {
    fn from(score: AnalysisScore) -> Self {
        match score {
            AnalysisScore::Centipawns(cp) => Self {
                cp: Some(cp),
                mate: None,
            },
            AnalysisScore::Mate(m) => Self {
                cp: None,
                mate: Some(m),
            },
        }
    }
}

/// The fixed point of view normalized scores are expressed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Perspective {
    #[default]
    White,
    SideToMove,
}

impl Perspective {
    /// Resolve to a concrete color for a position with `side_to_move` on move.
    pub fn color(self, side_to_move: Color) -> Color {
        match self {
            Self::White => Color::White,
            Self::SideToMove => side_to_move,
        }
    }
}

/// A score together with the color it is expressed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PovScore {
    pub score: AnalysisScore,
    pub pov: Color,
}

impl PovScore {
    pub fn new(score: AnalysisScore, pov: Color) -> Self {
        Self { score, pov }
    }

    /// Same evaluation, expressed for the opposite color.
    pub fn flipped(self) -> Self {
        Self {
            score: self.score.negate(),
            pov: !self.pov,
        }
    }

    pub fn relative_to(self, color: Color) -> AnalysisScore {
        if self.pov == color {
            self.score
        } else {
            self.score.negate()
        }
    }

    pub fn white(self) -> AnalysisScore {
        self.relative_to(Color::White)
    }

    /// Centipawn equivalent for `color`. Unlike `relative_to(..).to_cp()` this
    /// keeps the sign of an already-delivered mate, which negation cannot.
    pub fn cp_for(self, color: Color) -> i32 {
        if self.pov == color {
            self.score.to_cp()
        } else {
            -self.score.to_cp()
        }
    }
}

/// Interpret an engine score given from `pov` and re-express it for `target`.
pub fn normalize(
    raw: RawScore,
    pov: Color,
    target: Perspective,
    side_to_move: Color,
) -> Result<CanonicalScore, ScoreError> {
    let score = AnalysisScore::try_from(raw)?;
    let target = target.color(side_to_move);
    Ok(PovScore::new(score, pov).relative_to(target).into())
}

/// Depth and breadth of one candidate-line request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub depth: u32,
    /// Number of ranked lines (MultiPV).
    pub breadth: u32,
}

/// One ranked continuation reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLine {
    /// Principal variation as UCI move strings.
    pub pv: Vec<String>,
    /// Score from the point of view of the side to move in the analysed position.
    pub score: AnalysisScore,
    pub depth: u32,
    pub nodes: u64,
    pub time_ms: u64,
    /// 1 = best.
    pub rank: u32,
}

/// Returns true if the given 1-indexed ply belongs to White.
/// Convention: odd plies (1, 3, 5, …) are White moves; even plies (2, 4, 6, …) are Black.
pub fn is_white_ply(ply: u32) -> bool {
    ply % 2 == 1
}
