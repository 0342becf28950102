//! Turns a finished game plus engine lines into an ordered scene timeline.

pub mod abort;
pub mod cache;
pub mod config;
pub mod duration;
pub mod error;
pub mod report;
pub mod scene;
pub mod synthesizer;

pub use abort::AbortSignal;
pub use cache::{cache_key, AnalysisCache, CachedAnalysis, JsonCacheStore};
pub use config::SynthesisConfig;
pub use duration::{load_hints, DurationHints, DurationPolicy, SceneKind};
pub use error::{CacheError, TimelineError};
pub use report::{Degradation, GameRecord, PlyAnalysis, Synthesis};
pub use scene::{
    load_alignment, Alignment, AltScene, CueTimes, GameMeta, MainScene, ResetScene, Scene,
    SceneAlignment, Timeline,
};
pub use synthesizer::Synthesizer;
