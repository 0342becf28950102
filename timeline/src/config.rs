use chess::{AnalysisRequest, Perspective};
use serde::{Deserialize, Serialize};

use crate::duration::DurationPolicy;

/// Default engine search depth per position.
pub const DEFAULT_DEPTH: u32 = 20;

/// Default number of ranked lines requested per position.
pub const DEFAULT_MULTIPV: u32 = 4;

/// Default number of alternate lines previewed per ply.
pub const DEFAULT_ALT_MAX: usize = 2;

/// Default number of plies played out in each alternate preview.
pub const DEFAULT_ALT_PREVIEW_PLIES: usize = 2;

/// Tunables for one synthesis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisConfig {
    pub depth: u32,
    /// Lines requested per position (MultiPV).
    pub multipv: u32,
    /// Maximum alternate previews per ply; 0 disables them.
    pub alt_max: usize,
    pub alt_preview_plies: usize,
    /// Stop after this many plies.
    pub max_plies: Option<usize>,
    /// Point of view for the eval bar and alternate scores.
    pub perspective: Perspective,
    pub durations: DurationPolicy,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            multipv: DEFAULT_MULTIPV,
            alt_max: DEFAULT_ALT_MAX,
            alt_preview_plies: DEFAULT_ALT_PREVIEW_PLIES,
            max_plies: None,
            perspective: Perspective::White,
            durations: DurationPolicy::default(),
        }
    }
}

impl SynthesisConfig {
    /// Engine request for every position. Breadth always covers the best line
    /// plus `alt_max` alternates.
    pub fn request(&self) -> AnalysisRequest {
        let wanted = u32::try_from(self.alt_max.saturating_add(1)).unwrap_or(u32::MAX);
        AnalysisRequest {
            depth: self.depth,
            breadth: self.multipv.max(wanted),
        }
    }
}
