//! Walks a move sequence and builds the scene timeline.
//!
//! Per ply: main scene on the post-move position, then one alt scene and one
//! reset scene for each previewed non-best line of the pre-move position.

use analysis::{detect_sacrifice, eval_bar_for, tag, EvalTag, PositionFeatures, Sacrifice};
use chess::game::{terminal_state, HistoryEntry, Terminal};
use chess::san::format_san;
use chess::uci::{convert_cozy_castling_to_uci, legal_moves, resolve_uci_move};
use chess::{
    square_name, AnalysisScore, CandidateLine, CanonicalScore, Game, PieceColor, Placement,
    PovScore, StartPosition,
};
use cozy_chess::{Board, Color};
use engine::{EngineError, LineProvider};

use crate::abort::AbortSignal;
use crate::cache::AnalysisCache;
use crate::config::SynthesisConfig;
use crate::duration::{DurationHints, SceneKind};
use crate::error::TimelineError;
use crate::report::{Degradation, GameRecord, PlyAnalysis, Synthesis};
use crate::scene::{AltScene, MainScene, ResetScene, Scene, Timeline};

/// One replayed ply: the choice point, the move, and its outcome.
#[derive(Debug)]
struct ReplayedPly {
    before: Board,
    entry: HistoryEntry,
    after: Board,
}

/// Moves and board state of an alternate-line preview.
struct Preview {
    sans: Vec<String>,
    arrows: Vec<[String; 2]>,
    board: Board,
}

pub struct Synthesizer<'a, P> {
    provider: &'a mut P,
    cache: &'a mut AnalysisCache,
    config: SynthesisConfig,
    hints: Option<&'a DurationHints>,
    abort: AbortSignal,
}

impl<'a, P: LineProvider> Synthesizer<'a, P> {
    pub fn new(provider: &'a mut P, cache: &'a mut AnalysisCache, config: SynthesisConfig) -> Self {
        Self {
            provider,
            cache,
            config,
            hints: None,
            abort: AbortSignal::default(),
        }
    }

    pub fn with_hints(mut self, hints: &'a DurationHints) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Build the timeline for `record`. All-or-nothing: on error no partial
    /// timeline is returned.
    #[tracing::instrument(level = "info", skip_all, fields(moves = record.moves.len()))]
    pub async fn synthesize(&mut self, record: &GameRecord) -> Result<Synthesis, TimelineError> {
        let replayed = replay(record, self.config.max_plies)?;
        tracing::info!(plies = replayed.len(), "Synthesizing timeline");

        let request = self.config.request();
        let mut scenes = Vec::new();
        let mut plies = Vec::with_capacity(replayed.len());
        let mut degraded = Vec::new();
        // White-POV centipawns of the last non-mate position.
        let mut previous_cp: Option<i32> = None;

        for (index, played) in replayed.iter().enumerate() {
            let ply = index + 1;
            if self.abort.is_aborted() {
                tracing::info!(ply, "Synthesis aborted");
                return Err(TimelineError::Aborted { ply });
            }

            let fen = &played.entry.fen;
            let mover = played.before.side_to_move();
            let best = self.best_score(ply, played).await?;
            let post = PovScore::new(best, played.after.side_to_move());

            scenes.push(self.main_scene(ply, played, post));

            let pre_lines = match self
                .cache
                .fetch(&mut *self.provider, &played.entry.fen_before, request)
                .await
            {
                Ok(lines) => lines,
                Err(EngineError::InvalidScore(e)) => {
                    tracing::error!(ply, "Malformed score on pre-move position: {}", e);
                    return Err(TimelineError::InvalidScore(e));
                }
                Err(e) => {
                    degrade(&mut degraded, ply, format!("pre-move analysis failed: {}", e));
                    Vec::new()
                }
            };

            let wanted = self
                .config
                .alt_max
                .min(legal_moves(&played.before).len().saturating_sub(1));
            let mut shown = 0;
            for line in pre_lines.iter().skip(1).take(self.config.alt_max) {
                match self.alt_scenes(ply, &played.before, line) {
                    Some([alt, reset]) => {
                        scenes.push(alt);
                        scenes.push(reset);
                        shown += 1;
                    }
                    None => degrade(
                        &mut degraded,
                        ply,
                        format!("line {} has no playable preview", line.rank),
                    ),
                }
            }
            if shown < wanted {
                degrade(
                    &mut degraded,
                    ply,
                    format!("{} of {} alternates available", shown, wanted),
                );
            }

            let reference = previous_cp.or_else(|| {
                pre_lines
                    .first()
                    .filter(|line| !line.score.is_mate())
                    .map(|line| PovScore::new(line.score, mover).cp_for(Color::White))
            });
            let (eval_tag, sacrifice) = classify(played, post, reference);
            if !best.is_mate() {
                previous_cp = Some(post.cp_for(Color::White));
            }

            tracing::debug!(ply, fen = %fen, san = %played.entry.san, tag = %eval_tag, "ply synthesized");
            plies.push(PlyAnalysis {
                ply,
                fen: fen.clone(),
                san: played.entry.san.clone(),
                eval: CanonicalScore::from(post.white()),
                best_move: pre_lines
                    .first()
                    .and_then(|line| first_move_san(&played.before, line)),
                alt_moves: pre_lines
                    .iter()
                    .skip(1)
                    .filter_map(|line| first_move_san(&played.before, line))
                    .collect(),
                tag: eval_tag,
                sacrifice,
            });
        }

        let timeline = Timeline::new(record.meta.clone(), scenes);
        tracing::info!(
            "Built timeline with {} scenes, total {} ms",
            timeline.scenes().len(),
            timeline.total_duration_ms()
        );
        Ok(Synthesis {
            timeline,
            plies,
            degraded,
        })
    }

    /// Rank-1 score of the post-move position, side to move's point of view.
    /// Finished positions are scored without the engine.
    async fn best_score(&mut self, ply: usize, played: &ReplayedPly) -> Result<AnalysisScore, TimelineError> {
        match terminal_state(&played.after) {
            Some(Terminal::Checkmate) => return Ok(AnalysisScore::Mate(0)),
            Some(Terminal::Stalemate) => return Ok(AnalysisScore::Centipawns(0)),
            None => {}
        }

        let fen = &played.entry.fen;
        let request = self.config.request();
        let lines = self
            .cache
            .fetch(&mut *self.provider, fen, request)
            .await
            .map_err(|e| {
                tracing::error!(ply, fen = %fen, "Engine failed on post-move position: {}", e);
                TimelineError::engine_unavailable(ply, fen, e)
            })?;

        match lines.first() {
            Some(line) => Ok(line.score),
            None => {
                tracing::error!(ply, fen = %fen, "Engine returned no lines");
                Err(TimelineError::EngineUnavailable {
                    ply,
                    fen: fen.clone(),
                    source: None,
                })
            }
        }
    }

    fn main_scene(&self, ply: usize, played: &ReplayedPly, post: PovScore) -> Scene {
        let id = format!("m{}", ply);
        let features = PositionFeatures::compute(&Placement::from(&played.after));
        let view = self.config.perspective.color(played.after.side_to_move());

        Scene::Main(MainScene {
            duration_ms: self.duration(&id, SceneKind::Main),
            fen: played.entry.fen.clone(),
            san: played.entry.san.clone(),
            last_move_arrow: [square_name(played.entry.from), square_name(played.entry.to)],
            eval_bar_target: eval_bar_for(post, view),
            pins: features.pin_overlays(),
            attacked: features.attack_overlay(),
            move_number: played.entry.move_number,
            player: PieceColor::from(played.entry.piece_color),
            cue_times: None,
            id,
        })
    }

    /// Alt scene and its reset for `line`, or `None` if not even its first
    /// move can be played from `before`.
    fn alt_scenes(&self, ply: usize, before: &Board, line: &CandidateLine) -> Option<[Scene; 2]> {
        let preview = preview_line(before, &line.pv, self.config.alt_preview_plies.max(1));
        if preview.sans.is_empty() {
            tracing::warn!(ply, rank = line.rank, "Skipping alternate with unplayable line");
            return None;
        }

        let stm = before.side_to_move();
        let view = self.config.perspective.color(stm);
        let score = CanonicalScore::from(PovScore::new(line.score, stm).relative_to(view));
        let features = PositionFeatures::compute(&Placement::from(&preview.board));

        let alt_id = format!("m{}_alt{}", ply, line.rank);
        let reset_id = format!("m{}_reset{}", ply, line.rank);
        let alt = Scene::Alt(AltScene {
            duration_ms: self.duration(&alt_id, SceneKind::Alt),
            label: format!("Alt #{}", line.rank.saturating_sub(1)),
            pv: preview.sans,
            arrows: preview.arrows,
            attacked: features.attack_overlay(),
            cp: score.cp,
            mate: score.mate,
            multipv: line.rank,
            cue_times: None,
            id: alt_id,
        });
        let reset = Scene::Reset(ResetScene {
            duration_ms: self.duration(&reset_id, SceneKind::Reset),
            cue_times: None,
            id: reset_id,
        });
        Some([alt, reset])
    }

    fn duration(&self, id: &str, kind: SceneKind) -> u64 {
        self.config.durations.duration_for(id, self.hints, kind)
    }
}

/// Replay every move up front so an illegal move fails before any engine work.
fn replay(record: &GameRecord, max_plies: Option<usize>) -> Result<Vec<ReplayedPly>, TimelineError> {
    let mut game = match record.start_position() {
        StartPosition::Standard => Game::new(),
        StartPosition::Fen(fen) => {
            Game::from_fen(&fen).map_err(|e| TimelineError::invalid_input(0, e.to_string()))?
        }
    };

    let limit = max_plies.unwrap_or(usize::MAX);
    let mut replayed = Vec::new();
    for (index, text) in record.moves.iter().take(limit).enumerate() {
        let before = game.position().clone();
        let entry = game
            .play(text)
            .map_err(|e| TimelineError::invalid_input(index + 1, e.to_string()))?;
        replayed.push(ReplayedPly {
            before,
            entry,
            after: game.position().clone(),
        });
    }

    if replayed.is_empty() {
        return Err(TimelineError::invalid_input(0, "empty move sequence"));
    }
    Ok(replayed)
}

/// Play up to `plies` moves of `pv` from `start`, stopping at the first move
/// that is malformed or illegal.
fn preview_line(start: &Board, pv: &[String], plies: usize) -> Preview {
    let mut board = start.clone();
    let mut sans = Vec::new();
    let mut arrows = Vec::new();

    for uci in pv.iter().take(plies) {
        let Some(mv) = resolve_uci_move(&board, uci) else {
            break;
        };
        let shown = convert_cozy_castling_to_uci(&board, mv);
        sans.push(format_san(&board, mv));
        arrows.push([square_name(shown.from), square_name(shown.to)]);
        board.play_unchecked(mv);
    }

    Preview {
        sans,
        arrows,
        board,
    }
}

fn first_move_san(board: &Board, line: &CandidateLine) -> Option<String> {
    let mv = resolve_uci_move(board, line.pv.first()?)?;
    Some(format_san(board, mv))
}

/// Tag the swing from `reference` (White-POV centipawns) to `post`, both seen
/// by the mover, and look for a sacrifice.
fn classify(played: &ReplayedPly, post: PovScore, reference: Option<i32>) -> (EvalTag, Option<Sacrifice>) {
    let mover = played.before.side_to_move();
    let after = post.relative_to(mover);

    let Some(white_cp) = reference else {
        let eval_tag = if after.is_mate() {
            EvalTag::ForcedMate
        } else {
            EvalTag::None
        };
        return (eval_tag, None);
    };

    let before_cp = PovScore::new(AnalysisScore::Centipawns(white_cp), Color::White).cp_for(mover);
    let eval_tag = tag(AnalysisScore::Centipawns(before_cp), after);
    let sacrifice = detect_sacrifice(&played.before, played.entry.mv, before_cp, post.cp_for(mover));
    (eval_tag, sacrifice)
}

fn degrade(degraded: &mut Vec<Degradation>, ply: usize, reason: String) {
    tracing::warn!(ply, "Degraded: {}", reason);
    degraded.push(Degradation { ply, reason });
}
