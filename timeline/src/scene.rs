//! Timeline document model consumed by the renderer and narration stages.

use std::collections::BTreeMap;
use std::path::Path;

use analysis::{AttackOverlay, PinOverlay};
use chess::PieceColor;
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Named cue offsets (seconds into the scene) used to sync animations.
pub type CueTimes = BTreeMap<String, f64>;

/// Game metadata carried through to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eco: Option<String>,
}

/// The move actually played, shown on the resulting position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainScene {
    pub id: String,
    pub fen: String,
    /// SAN of the played move.
    #[serde(rename = "move")]
    pub san: String,
    pub last_move_arrow: [String; 2],
    /// Eval bar position in [-1, 1].
    pub eval_bar_target: f64,
    pub pins: Vec<PinOverlay>,
    pub attacked: AttackOverlay,
    pub duration_ms: u64,
    pub move_number: u16,
    pub player: PieceColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue_times: Option<CueTimes>,
}

/// A short preview of a non-best engine line from the pre-move position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltScene {
    pub id: String,
    pub label: String,
    /// SAN of each previewed ply.
    pub pv: Vec<String>,
    /// `[from, to]` per previewed ply.
    pub arrows: Vec<[String; 2]>,
    /// Attacked squares after the last previewed ply.
    pub attacked: AttackOverlay,
    pub cp: Option<i32>,
    pub mate: Option<i32>,
    pub duration_ms: u64,
    /// Rank of the line this preview shows.
    pub multipv: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue_times: Option<CueTimes>,
}

/// Return to the main line after an alternate preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetScene {
    pub id: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue_times: Option<CueTimes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Scene {
    Main(MainScene),
    Alt(AltScene),
    Reset(ResetScene),
}

impl Scene {
    pub fn id(&self) -> &str {
        match self {
            Self::Main(s) => &s.id,
            Self::Alt(s) => &s.id,
            Self::Reset(s) => &s.id,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Main(s) => s.duration_ms,
            Self::Alt(s) => s.duration_ms,
            Self::Reset(s) => s.duration_ms,
        }
    }

    pub fn cue_times(&self) -> Option<&CueTimes> {
        match self {
            Self::Main(s) => s.cue_times.as_ref(),
            Self::Alt(s) => s.cue_times.as_ref(),
            Self::Reset(s) => s.cue_times.as_ref(),
        }
    }

    fn set_cue_times(&mut self, cues: CueTimes) {
        let slot = match self {
            Self::Main(s) => &mut s.cue_times,
            Self::Alt(s) => &mut s.cue_times,
            Self::Reset(s) => &mut s.cue_times,
        };
        *slot = Some(cues);
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Main(_) => "main",
            Self::Alt(_) => "alt",
            Self::Reset(_) => "reset",
        }
    }
}

/// Word-level alignment for one scene's narration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneAlignment {
    #[serde(default)]
    pub keywords: CueTimes,
}

/// `{sceneId: {keywords: {word: seconds}}}`
pub type Alignment = BTreeMap<String, SceneAlignment>;

/// Ordered scenes for one game. The scene set is fixed once synthesized;
/// only cue times may be annotated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    meta: GameMeta,
    scenes: Vec<Scene>,
    total_duration_ms: u64,
}

impl Timeline {
    pub fn new(meta: GameMeta, scenes: Vec<Scene>) -> Self {
        let total_duration_ms = scenes.iter().map(Scene::duration_ms).sum();
        Self {
            meta,
            scenes,
            total_duration_ms,
        }
    }

    pub fn meta(&self) -> &GameMeta {
        &self.meta
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }

    /// Attach cue times to every scene whose id appears in `alignment`.
    /// Returns how many scenes were annotated.
    pub fn apply_cue_times(&mut self, alignment: &Alignment) -> usize {
        let mut applied = 0;
        for scene in &mut self.scenes {
            if let Some(entry) = alignment.get(scene.id()) {
                scene.set_cue_times(entry.keywords.clone());
                applied += 1;
            }
        }
        tracing::debug!(applied, "applied alignment cue times");
        applied
    }

    pub fn to_json(&self) -> Result<String, TimelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), TimelineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TimelineError::io(parent, e))?;
        }
        std::fs::write(path, self.to_json()?).map_err(|e| TimelineError::io(path, e))?;
        tracing::info!("Timeline saved to {:?}", path);
        Ok(())
    }

    /// Read a timeline document. The total is recomputed from the scenes.
    pub fn load(path: &Path) -> Result<Self, TimelineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| TimelineError::io(path, e))?;
        let loaded: Self = serde_json::from_str(&contents)?;
        Ok(Self::new(loaded.meta, loaded.scenes))
    }
}

/// Read an alignment document.
pub fn load_alignment(path: &Path) -> Result<Alignment, TimelineError> {
    let contents = std::fs::read_to_string(path).map_err(|e| TimelineError::io(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}
