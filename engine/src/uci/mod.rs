//! UCI wire protocol: engine output lines in, typed messages out.

pub mod parser;

pub use parser::{parse_uci_message, UciMessage};

/// Problems talking to the engine process at the protocol level.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("engine process was spawned without a stdin pipe")]
    NoStdin,
    #[error("engine process was spawned without a stdout pipe")]
    NoStdout,
    #[error("truncated engine line: {0:?}")]
    MalformedMessage(String),
    #[error("unrecognized engine line: {0:?}")]
    UnknownMessage(String),
    #[error("engine reported an unreadable score: {0}")]
    InvalidScore(#[from] chess::ScoreError),
    #[error("engine reported an unreadable move: {0}")]
    InvalidMove(#[from] chess::UciMoveError),
}
