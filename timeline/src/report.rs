//! Per-ply diagnostics produced alongside a timeline.

use analysis::{EvalTag, Sacrifice};
use chess::{CanonicalScore, StartPosition};
use serde::{Deserialize, Serialize};

use crate::scene::{GameMeta, Timeline};

/// A finished move sequence to synthesize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(default)]
    pub meta: GameMeta,
    /// Standard start position when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_fen: Option<String>,
    /// Moves in SAN or UCI.
    pub moves: Vec<String>,
}

impl GameRecord {
    pub fn start_position(&self) -> StartPosition {
        match &self.start_fen {
            Some(fen) => StartPosition::Fen(fen.clone()),
            None => StartPosition::Standard,
        }
    }
}

/// Engine view of one ply, used by game-selection heuristics downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlyAnalysis {
    pub ply: usize,
    /// Position after the move.
    pub fen: String,
    pub san: String,
    /// Best-line score after the move, from White's point of view.
    pub eval: CanonicalScore,
    /// Engine's preferred move in the pre-move position (SAN).
    pub best_move: Option<String>,
    /// First moves of the other ranked lines in the pre-move position (SAN).
    pub alt_moves: Vec<String>,
    pub tag: EvalTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sacrifice: Option<Sacrifice>,
}

/// A ply where less data than requested was available. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub ply: usize,
    pub reason: String,
}

/// Everything one synthesis run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub timeline: Timeline,
    pub plies: Vec<PlyAnalysis>,
    pub degraded: Vec<Degradation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_record_from_json() {
        let record: GameRecord = serde_json::from_str(
            r#"{"meta": {"white": "Morphy", "result": "1-0"}, "moves": ["e4", "e7e5"]}"#,
        )
        .unwrap();
        assert_eq!(record.meta.white.as_deref(), Some("Morphy"));
        assert_eq!(record.moves.len(), 2);
        assert!(matches!(record.start_position(), StartPosition::Standard));
    }

    #[test]
    fn game_record_with_start_fen() {
        let record: GameRecord =
            serde_json::from_str(r#"{"startFen": "4k3/8/8/8/8/8/8/4K3 w - - 0 1", "moves": []}"#)
                .unwrap();
        assert!(matches!(record.start_position(), StartPosition::Fen(_)));
        assert_eq!(record.meta, GameMeta::default());
    }
}
