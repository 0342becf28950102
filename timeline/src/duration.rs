//! Scene durations.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Externally supplied per-scene durations in milliseconds, keyed by scene id
/// (usually the measured length of that scene's narration clip).
pub type DurationHints = HashMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    Main,
    Alt,
    Reset,
}

/// How long each scene is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationPolicy {
    pub main_ms: u64,
    pub alt_ms: u64,
    pub reset_ms: u64,
    /// Added to a hint before clamping.
    pub padding_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            main_ms: 2000,
            alt_ms: 1200,
            reset_ms: 200,
            padding_ms: 150,
            min_ms: 1200,
            max_ms: 2500,
        }
    }
}

impl DurationPolicy {
    pub fn default_for(&self, kind: SceneKind) -> u64 {
        match kind {
            SceneKind::Main => self.main_ms,
            SceneKind::Alt => self.alt_ms,
            SceneKind::Reset => self.reset_ms,
        }
    }

    /// Duration of scene `id`: its hint plus padding clamped to
    /// `[min_ms, max_ms]`, or the per-kind default when there is no hint.
    pub fn duration_for(&self, id: &str, hints: Option<&DurationHints>, kind: SceneKind) -> u64 {
        match hints.and_then(|h| h.get(id)) {
            Some(&hint) => hint
                .saturating_add(self.padding_ms)
                .clamp(self.min_ms, self.max_ms.max(self.min_ms)),
            None => self.default_for(kind),
        }
    }
}

/// Read a `{sceneId: ms}` JSON document.
pub fn load_hints(path: &Path) -> Result<DurationHints, TimelineError> {
    let contents = std::fs::read_to_string(path).map_err(|e| TimelineError::io(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}
