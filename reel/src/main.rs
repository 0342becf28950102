//! chess-reel: builds presentation timelines for finished chess games.
//!
//! Subcommands:
//! - **`build`**: replays a game, analyses every position with Stockfish and
//!   writes the scene timeline (plus an optional per-ply report).
//! - **`annotate`**: attaches narration cue times to an existing timeline.
//! - **`features`**: prints pins and attacked squares for one position.
//!
//! Runtime tunables are read from `CHESS_REEL_*` environment variables (see
//! [`config`]); command-line flags override them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{de::DeserializeOwned, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use analysis::PositionFeatures;
use chess::{Perspective, Placement};
use engine::{EngineConfig, StockfishEngine};
use timeline::{
    load_alignment, load_hints, AbortSignal, AnalysisCache, DurationPolicy, GameRecord,
    JsonCacheStore, SynthesisConfig, Synthesizer, Timeline,
};

mod config;

#[derive(Parser)]
#[command(name = "chess-reel", about = "Chess game timeline synthesizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a game and write its scene timeline.
    Build(BuildArgs),
    /// Apply alignment cue times to a timeline.
    Annotate {
        /// Timeline JSON to annotate.
        #[arg(long)]
        timeline: PathBuf,
        /// Alignment JSON: `{sceneId: {keywords: {word: seconds}}}`.
        #[arg(long)]
        alignment: PathBuf,
        /// Output path; defaults to overwriting `--timeline`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print pins and attacked squares for a position.
    Features {
        /// Full FEN or just its piece-placement field.
        #[arg(long)]
        fen: String,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Game JSON: `{meta, startFen?, moves: [..]}`.
    #[arg(long)]
    game: PathBuf,
    /// Where to write the timeline JSON.
    #[arg(long)]
    out: PathBuf,
    /// Scene duration hints: `{sceneId: ms}`.
    #[arg(long)]
    hints: Option<PathBuf>,
    /// Also write per-ply analysis and degradation notes here.
    #[arg(long)]
    report: Option<PathBuf>,
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long)]
    multipv: Option<u32>,
    /// Alternate previews per ply (0 disables them).
    #[arg(long)]
    alt_max: Option<usize>,
    /// Plies shown in each alternate preview.
    #[arg(long)]
    alt_plies: Option<usize>,
    /// Stop after this many plies.
    #[arg(long)]
    max_plies: Option<usize>,
    /// Persist engine results here and reuse them across runs.
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Point of view for eval bars and alternate scores.
    #[arg(long, value_enum, default_value_t = PerspectiveArg::White)]
    perspective: PerspectiveArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PerspectiveArg {
    White,
    SideToMove,
}

impl From<PerspectiveArg> for Perspective {
    fn from(arg: PerspectiveArg) -> Self {
        match arg {
            PerspectiveArg::White => Perspective::White,
            PerspectiveArg::SideToMove => Perspective::SideToMove,
        }
    }
}

impl BuildArgs {
    fn synthesis_config(&self) -> SynthesisConfig {
        SynthesisConfig {
            depth: self.depth.unwrap_or_else(config::get_engine_depth),
            multipv: self.multipv.unwrap_or_else(config::get_engine_multipv),
            alt_max: self.alt_max.unwrap_or_else(config::get_alt_max),
            alt_preview_plies: self.alt_plies.unwrap_or_else(config::get_alt_preview_plies),
            max_plies: self.max_plies,
            perspective: self.perspective.into(),
            durations: DurationPolicy::default(),
        }
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            path: config::get_stockfish_path(),
            threads: Some(config::get_engine_threads()),
            hash_mb: Some(config::get_engine_hash_mb()),
            analysis_timeout: config::get_analysis_timeout(),
        }
    }

    fn cache(&self) -> AnalysisCache {
        match self.cache_dir.clone().or_else(config::get_cache_dir) {
            Some(dir) => {
                tracing::info!("Using analysis cache at {}", dir.display());
                AnalysisCache::with_store(JsonCacheStore::new(dir))
            }
            None => AnalysisCache::new(),
        }
    }
}

/// Error type for CLI input handling.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid position {fen:?}: {source}")]
    InvalidPosition {
        fen: String,
        source: chess::PlacementError,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CliError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Install stderr logging, plus a daily rolling file when `log_dir` is set.
/// The returned guard must live until exit so buffered file output is flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok();
            let file_appender = tracing_appender::rolling::daily(dir, "chess-reel");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    guard
}

async fn run_build(args: BuildArgs) -> anyhow::Result<()> {
    let record: GameRecord = read_json(&args.game)?;
    let hints = args
        .hints
        .as_deref()
        .map(load_hints)
        .transpose()
        .context("failed to load duration hints")?;
    let synthesis_config = args.synthesis_config();
    let mut cache = args.cache();

    tracing::info!(
        moves = record.moves.len(),
        depth = synthesis_config.depth,
        multipv = synthesis_config.multipv,
        "Building timeline"
    );

    let mut engine = StockfishEngine::spawn_with_config(args.engine_config())
        .await
        .context("failed to start engine")?;

    let abort = AbortSignal::new();
    let interrupt = {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current ply");
                abort.abort();
            }
        })
    };

    let result = {
        let mut synthesizer =
            Synthesizer::new(&mut engine, &mut cache, synthesis_config).with_abort(abort);
        if let Some(hints) = &hints {
            synthesizer = synthesizer.with_hints(hints);
        }
        synthesizer.synthesize(&record).await
    };

    interrupt.abort();
    engine.shutdown().await;
    tracing::info!(
        hits = cache.hits(),
        misses = cache.misses(),
        "Engine shut down"
    );

    let synthesis = result.context("timeline synthesis failed")?;
    synthesis
        .timeline
        .save(&args.out)
        .context("failed to save timeline")?;

    if let Some(report) = &args.report {
        write_json(
            report,
            &serde_json::json!({
                "plies": synthesis.plies,
                "degraded": synthesis.degraded,
            }),
        )?;
    }

    println!(
        "Wrote {} scenes ({} ms) to {}",
        synthesis.timeline.scenes().len(),
        synthesis.timeline.total_duration_ms(),
        args.out.display()
    );
    if !synthesis.degraded.is_empty() {
        println!("{} plies had degraded data", synthesis.degraded.len());
    }
    Ok(())
}

fn run_annotate(timeline_path: &Path, alignment_path: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let mut timeline = Timeline::load(timeline_path).context("failed to load timeline")?;
    let alignment = load_alignment(alignment_path).context("failed to load alignment")?;
    let applied = timeline.apply_cue_times(&alignment);

    let out = out.unwrap_or(timeline_path);
    timeline.save(out).context("failed to save timeline")?;
    println!("Applied cue times to {} scenes in {}", applied, out.display());
    Ok(())
}

fn features_json(fen: &str) -> Result<serde_json::Value, CliError> {
    let placement = Placement::from_fen(fen).map_err(|source| CliError::InvalidPosition {
        fen: fen.to_string(),
        source,
    })?;
    let features = PositionFeatures::compute(&placement);
    Ok(serde_json::json!({
        "pins": features.pin_overlays(),
        "attacked": features.attack_overlay(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing(config::get_log_dir().as_deref());
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => run_build(args).await,
        Commands::Annotate {
            timeline,
            alignment,
            out,
        } => run_annotate(&timeline, &alignment, out.as_deref()),
        Commands::Features { fen } => {
            let json = features_json(&fen)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(())
        }
    }
}
