pub mod analysis;
pub mod fen;
pub mod game;
pub mod geometry;
pub mod placement;
pub mod san;
pub mod types;
pub mod uci;

pub use analysis::{
    is_white_ply, normalize, AnalysisRequest, AnalysisScore, CandidateLine, CanonicalScore,
    Perspective, PovScore, RawScore, ScoreError, MATE_CP,
};
pub use game::{terminal_state, Game, GameError, HistoryEntry, StartPosition, Terminal};
pub use geometry::{
    direction, file_of, parse_square, rank_of, square_name, square_of, walk, Direction,
    GeometryError, Ray,
};
pub use placement::{Placement, PlacementError};
pub use san::{format_san, parse_san, SanError};
pub use types::{parse_fen_piece, PieceColor, PieceKind};
pub use uci::{convert_uci_castling_to_cozy, format_uci_move, parse_uci_move, UciMoveError};
