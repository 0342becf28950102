use std::path::PathBuf;

use chess::ScoreError;
use engine::EngineError;

/// Why a synthesis run (or a timeline file operation) failed.
///
/// Synthesis is all-or-nothing: any of these means no timeline was produced.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("invalid input at ply {ply}: {reason}")]
    InvalidInput { ply: usize, reason: String },
    #[error("invalid score: {0}")]
    InvalidScore(#[from] ScoreError),
    #[error("no best line for ply {ply} ({fen})")]
    EngineUnavailable {
        ply: usize,
        fen: String,
        #[source]
        source: Option<EngineError>,
    },
    #[error("synthesis aborted before ply {ply}")]
    Aborted { ply: usize },
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TimelineError {
    pub(crate) fn invalid_input(ply: usize, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            ply,
            reason: reason.into(),
        }
    }

    /// A provider failure on a position whose best line is required. A
    /// malformed score keeps its own kind.
    pub(crate) fn engine_unavailable(ply: usize, fen: &str, source: EngineError) -> Self {
        match source {
            EngineError::InvalidScore(e) => Self::InvalidScore(e),
            other => Self::EngineUnavailable {
                ply,
                fen: fen.to_string(),
                source: Some(other),
            },
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the durable analysis cache store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
