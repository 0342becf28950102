use cozy_chess::{Board, Color, Move, Piece, Square};

use crate::san::{format_san, has_legal_moves, parse_san};
use crate::uci::{convert_cozy_castling_to_uci, legal_moves, resolve_uci_move};

/// A game being replayed move by move from a start position.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    start_position: StartPosition,
}

/// Record of one applied move.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// The move in cozy-chess encoding (castling as king-takes-rook).
    pub mv: Move,
    /// Origin square as a human would draw it.
    pub from: Square,
    /// Destination square as a human would draw it (castling: the king's target).
    pub to: Square,
    pub piece: Piece,
    pub piece_color: Color,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    /// Standard Algebraic Notation, including check and mate markers.
    pub san: String,
    /// Full-move number of the position the move was played in.
    pub move_number: u16,
    pub fen_before: String,
    /// FEN after this move
    pub fen: String,
}

/// Starting position of the game
#[derive(Debug, Clone)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

/// Why a position has no legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Checkmate,
    Stalemate,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = crate::fen::parse_fen(fen)?;
        Ok(Self {
            position,
            history: Vec::new(),
            start_position: StartPosition::Fen(fen.to_string()),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Resolve a move written in UCI (either castling style) or SAN against the
    /// current position.
    pub fn parse_move(&self, text: &str) -> Result<Move, GameError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::UnparseableMove(text.to_string()));
        }
        if let Some(mv) = resolve_uci_move(&self.position, text) {
            return Ok(mv);
        }
        parse_san(&self.position, text).map_err(|_| GameError::IllegalMove(text.to_string()))
    }

    /// Parse and apply a move in one step.
    pub fn play(&mut self, text: &str) -> Result<HistoryEntry, GameError> {
        let mv = self.parse_move(text)?;
        self.make_move(mv)
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        let uci = crate::uci::format_uci_move(mv);
        if !self.position.is_legal(mv) {
            return Err(GameError::IllegalMove(uci));
        }

        let piece = self
            .position
            .piece_on(mv.from)
            .ok_or_else(|| GameError::IllegalMove(uci.clone()))?;
        let piece_color = self.position.side_to_move();
        let shown = convert_cozy_castling_to_uci(&self.position, mv);
        let captured = if shown.to == mv.to {
            self.position.piece_on(mv.to)
        } else {
            None
        };
        let captured = captured.or_else(|| {
            // En passant: pawn changes file onto an empty square.
            (piece == Piece::Pawn && mv.from.file() != mv.to.file()).then_some(Piece::Pawn)
        });

        let san = format_san(&self.position, mv);
        let move_number = self.position.fullmove_number();
        let fen_before = self.to_fen();

        self.position.play_unchecked(mv);

        let entry = HistoryEntry {
            mv,
            from: shown.from,
            to: shown.to,
            piece,
            piece_color,
            captured,
            promotion: mv.promotion,
            san,
            move_number,
            fen_before,
            fen: self.to_fen(),
        };

        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.position)
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }

    pub fn terminal(&self) -> Option<Terminal> {
        terminal_state(&self.position)
    }
}

/// `Some` when the side to move has no legal moves.
pub fn terminal_state(board: &Board) -> Option<Terminal> {
    if has_legal_moves(board) {
        return None;
    }
    if board.checkers().is_empty() {
        Some(Terminal::Stalemate)
    } else {
        Some(Terminal::Checkmate)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Unparseable move: {0:?}")]
    UnparseableMove(String),
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}
