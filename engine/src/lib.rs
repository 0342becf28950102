pub mod stockfish;
pub mod uci;

pub use stockfish::{EngineConfig, StockfishEngine};
pub use uci::{UciError, UciMessage};

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chess::{AnalysisRequest, AnalysisScore, CandidateLine, ScoreError};
use cozy_chess::Move;

/// Source of ranked candidate lines for a position.
///
/// Implementations own whatever process or connection they need; callers
/// acquire one for a whole run and release it when done.
pub trait LineProvider {
    /// Lines for `fen`, best first, at most `request.breadth` of them.
    /// Scores are from the point of view of the side to move in `fen`.
    fn candidate_lines(
        &mut self,
        fen: &str,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<Vec<CandidateLine>, EngineError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Stockfish not found (looked for {0:?})")]
    NotFound(Option<PathBuf>),
    #[error("failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine handshake failed: {0}")]
    Handshake(String),
    #[error("engine did not finish within {0:?}")]
    Timeout(Duration),
    #[error("engine channel closed")]
    ChannelClosed,
    #[error("engine sent a malformed score: {0}")]
    InvalidScore(#[from] ScoreError),
    #[error("UCI error: {0}")]
    Uci(#[from] UciError),
}

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    SetPosition { fen: String, moves: Vec<Move> },
    SetOption { name: String, value: Option<String> },
    IsReady,
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u32>,    // Search depth
    pub infinite: bool,        // Search until "stop"
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    /// `None` when the engine answered `bestmove (none)` (no legal moves).
    BestMove(Option<Move>),
    Info(EngineInfo),
    /// An `info` line whose score could not be read.
    InvalidScore(ScoreError),
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<Move>, // Principal variation
    pub multipv: Option<u32>,
    pub currmove: Option<Move>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Negative for being mated
}

impl From<Score> for AnalysisScore {
    fn from(score: Score) -> Self {
        match score {
            Score::Centipawns(cp) => AnalysisScore::Centipawns(cp),
            Score::Mate(m) => AnalysisScore::Mate(m),
        }
    }
}
