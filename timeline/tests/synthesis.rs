use std::collections::{HashMap, HashSet};

use analysis::EvalTag;
use chess::uci::{format_uci_move, legal_moves};
use chess::{AnalysisRequest, AnalysisScore, CandidateLine, Perspective, ScoreError};
use cozy_chess::Board;
use engine::{EngineError, LineProvider};
use timeline::{
    AbortSignal, Alignment, AnalysisCache, DurationHints, GameMeta, GameRecord, Scene,
    SynthesisConfig, Synthesizer, TimelineError,
};

/// Deterministic engine stand-in: the first `breadth` legal moves, scored
/// 40, 30, 20, ... for the side to move.
#[derive(Default)]
struct FakeProvider {
    calls: HashMap<String, usize>,
    failing: HashSet<String>,
    /// Positions whose engine output carries an unreadable score.
    malformed: HashSet<String>,
    silent: HashSet<String>,
    /// Report at most this many lines regardless of the requested breadth.
    breadth_cap: Option<u32>,
}

impl FakeProvider {
    fn total_calls(&self) -> usize {
        self.calls.values().sum()
    }
}

impl LineProvider for FakeProvider {
    async fn candidate_lines(
        &mut self,
        fen: &str,
        request: AnalysisRequest,
    ) -> Result<Vec<CandidateLine>, EngineError> {
        *self.calls.entry(fen.to_string()).or_default() += 1;
        if self.failing.contains(fen) {
            return Err(EngineError::ChannelClosed);
        }
        if self.malformed.contains(fen) {
            return Err(EngineError::InvalidScore(ScoreError::InvalidScore {
                cp: None,
                mate: None,
            }));
        }
        if self.silent.contains(fen) {
            return Ok(Vec::new());
        }

        let board: Board = fen.parse().expect("synthesizer sends valid FENs");
        let breadth = self.breadth_cap.map_or(request.breadth, |cap| cap.min(request.breadth));
        Ok(legal_moves(&board)
            .into_iter()
            .take(breadth as usize)
            .zip(1u32..)
            .map(|(mv, rank)| CandidateLine {
                pv: vec![format_uci_move(mv)],
                score: AnalysisScore::Centipawns(50 - 10 * rank as i32),
                depth: request.depth,
                nodes: 1000,
                time_ms: 1,
                rank,
            })
            .collect())
    }
}

fn record(moves: &[&str]) -> GameRecord {
    GameRecord {
        meta: GameMeta {
            white: Some("White".to_string()),
            black: Some("Black".to_string()),
            ..Default::default()
        },
        start_fen: None,
        moves: moves.iter().map(|m| m.to_string()).collect(),
    }
}

fn config(alt_max: usize) -> SynthesisConfig {
    SynthesisConfig {
        depth: 8,
        multipv: 3,
        alt_max,
        ..Default::default()
    }
}

fn fen_after(moves: &[&str]) -> String {
    let mut game = chess::Game::new();
    for mv in moves {
        game.play(mv).unwrap();
    }
    game.to_fen()
}

fn kinds(scenes: &[Scene]) -> Vec<&'static str> {
    scenes.iter().map(Scene::kind_name).collect()
}

#[tokio::test]
async fn single_move_without_alternates_is_one_main_scene() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(0))
        .synthesize(&record(&["e4"]))
        .await
        .unwrap();

    let scenes = synthesis.timeline.scenes();
    assert_eq!(kinds(scenes), vec!["main"]);
    assert_eq!(scenes[0].id(), "m1");
    assert_eq!(synthesis.timeline.total_duration_ms(), scenes[0].duration_ms());
    assert!(synthesis.degraded.is_empty());
}

#[tokio::test]
async fn two_plies_with_two_alternates_interleave_resets() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap();

    let scenes = synthesis.timeline.scenes();
    assert_eq!(
        kinds(scenes),
        vec!["main", "alt", "reset", "alt", "reset", "main", "alt", "reset", "alt", "reset"]
    );
    let ids: Vec<&str> = scenes.iter().map(Scene::id).collect();
    assert_eq!(
        ids,
        vec![
            "m1", "m1_alt2", "m1_reset2", "m1_alt3", "m1_reset3", "m2", "m2_alt2", "m2_reset2",
            "m2_alt3", "m2_reset3"
        ]
    );
    let sum: u64 = scenes.iter().map(Scene::duration_ms).sum();
    assert_eq!(synthesis.timeline.total_duration_ms(), sum);
    assert_eq!(sum, 2 * (2000 + 2 * (1200 + 200)));
}

#[tokio::test]
async fn main_scene_carries_move_and_metadata() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(1))
        .synthesize(&record(&["e4", "e5", "Nf3"]))
        .await
        .unwrap();

    let json = serde_json::to_value(&synthesis.timeline).unwrap();
    assert_eq!(json["meta"]["white"], "White");
    let scenes = json["scenes"].as_array().unwrap();

    let black_main = scenes.iter().find(|s| s["id"] == "m2").unwrap();
    assert_eq!(black_main["type"], "main");
    assert_eq!(black_main["move"], "e5");
    assert_eq!(black_main["lastMoveArrow"], serde_json::json!(["e7", "e5"]));
    assert_eq!(black_main["moveNumber"], 1);
    assert_eq!(black_main["player"], "black");
    assert_eq!(black_main["fen"], fen_after(&["e4", "e5"]));

    let third = scenes.iter().find(|s| s["id"] == "m3").unwrap();
    assert_eq!(third["moveNumber"], 2);
    assert_eq!(third["player"], "white");
    assert_eq!(json["totalDurationMs"], synthesis.timeline.total_duration_ms());
}

#[tokio::test]
async fn eval_bar_and_alt_scores_use_white_perspective() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(1))
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap();
    let scenes = synthesis.timeline.scenes();

    // After 1.e4 Black is to move and the fake engine gives Black +40.
    let Scene::Main(first) = &scenes[0] else {
        panic!("expected main scene");
    };
    assert!(first.eval_bar_target < 0.0);

    // Ply 2 alternates branch from Black's choice; rank 2 is +30 for Black.
    let Scene::Alt(alt) = &scenes[4] else {
        panic!("expected alt scene, got {:?}", scenes[4]);
    };
    assert_eq!(alt.id, "m2_alt2");
    assert_eq!(alt.label, "Alt #1");
    assert_eq!(alt.multipv, 2);
    assert_eq!(alt.cp, Some(-30));
    assert_eq!(alt.mate, None);
    assert_eq!(alt.pv.len(), 1);
    assert_eq!(alt.arrows.len(), 1);

    assert_eq!(synthesis.plies[0].eval.cp, Some(-40));
}

#[tokio::test]
async fn side_to_move_perspective_flips_alt_scores() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let config = SynthesisConfig {
        perspective: Perspective::SideToMove,
        ..config(1)
    };
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config)
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap();

    let Scene::Alt(alt) = &synthesis.timeline.scenes()[4] else {
        panic!("expected alt scene");
    };
    assert_eq!(alt.cp, Some(30));
    // The report stays White-relative regardless.
    assert_eq!(synthesis.plies[1].eval.cp, Some(40));
}

#[tokio::test]
async fn duration_hints_feed_the_total() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let hints: DurationHints = [("m1".to_string(), 2000), ("m1_alt2".to_string(), 100)]
        .into_iter()
        .collect();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(1))
        .with_hints(&hints)
        .synthesize(&record(&["d4"]))
        .await
        .unwrap();

    let durations: Vec<u64> = synthesis
        .timeline
        .scenes()
        .iter()
        .map(Scene::duration_ms)
        .collect();
    assert_eq!(durations, vec![2150, 1200, 200]);
    assert_eq!(synthesis.timeline.total_duration_ms(), 3550);
}

#[tokio::test]
async fn illegal_move_fails_before_any_engine_work() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let err = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4", "e5", "Ke3"]))
        .await
        .unwrap_err();

    assert!(matches!(err, TimelineError::InvalidInput { ply: 3, .. }));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn empty_game_is_invalid_input() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let err = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, TimelineError::InvalidInput { .. }));
}

#[tokio::test]
async fn missing_best_line_is_fatal() {
    let mut provider = FakeProvider::default();
    provider.failing.insert(fen_after(&["e4", "e5"]));
    let mut cache = AnalysisCache::new();
    let err = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4", "e5", "Nf3"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TimelineError::EngineUnavailable { ply: 2, source: Some(_), .. }
    ));

    let mut provider = FakeProvider::default();
    provider.silent.insert(fen_after(&["d4"]));
    let mut cache = AnalysisCache::new();
    let err = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["d4"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TimelineError::EngineUnavailable { ply: 1, source: None, .. }
    ));
}

#[tokio::test]
async fn pre_move_failure_only_drops_alternates() {
    let mut provider = FakeProvider::default();
    provider.failing.insert(chess::Game::new().to_fen());
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap();

    assert_eq!(
        kinds(synthesis.timeline.scenes()),
        vec!["main", "main", "alt", "reset", "alt", "reset"]
    );
    assert!(synthesis.degraded.iter().all(|d| d.ply == 1));
    assert!(!synthesis.degraded.is_empty());
    assert_eq!(synthesis.plies[0].best_move, None);
}

#[tokio::test]
async fn malformed_post_move_score_is_invalid_score() {
    let mut provider = FakeProvider::default();
    provider.malformed.insert(fen_after(&["e4"]));
    let mut cache = AnalysisCache::new();
    let err = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap_err();

    assert!(matches!(err, TimelineError::InvalidScore(ScoreError::InvalidScore { .. })));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn malformed_pre_move_score_aborts_instead_of_degrading() {
    let mut provider = FakeProvider::default();
    provider.malformed.insert(chess::Game::new().to_fen());
    let mut cache = AnalysisCache::new();
    let err = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap_err();

    assert!(matches!(err, TimelineError::InvalidScore(_)));
}

#[tokio::test]
async fn too_few_alternates_is_recorded_not_fatal() {
    let mut provider = FakeProvider {
        breadth_cap: Some(2),
        ..Default::default()
    };
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap();

    assert_eq!(
        kinds(synthesis.timeline.scenes()),
        vec!["main", "alt", "reset", "main", "alt", "reset"]
    );
    let plies: Vec<usize> = synthesis.degraded.iter().map(|d| d.ply).collect();
    assert_eq!(plies, vec![1, 2]);
}

#[tokio::test]
async fn single_legal_reply_is_not_degraded() {
    // Black's only move is Ka7.
    let game = GameRecord {
        start_fen: Some("k7/2K5/8/8/8/8/8/8 b - - 0 1".to_string()),
        moves: vec!["Ka7".to_string()],
        ..Default::default()
    };
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&game)
        .await
        .unwrap();

    assert_eq!(kinds(synthesis.timeline.scenes()), vec!["main"]);
    assert!(synthesis.degraded.is_empty());
    assert_eq!(synthesis.plies[0].best_move.as_deref(), Some("Ka7"));
}

#[tokio::test]
async fn checkmate_is_scored_without_the_engine() {
    let moves = ["f3", "e5", "g4", "Qh4#"];
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(0))
        .synthesize(&record(&moves))
        .await
        .unwrap();

    let mated = fen_after(&moves);
    assert!(!provider.calls.contains_key(&mated));

    let last = synthesis.plies.last().unwrap();
    assert_eq!(last.san, "Qh4#");
    assert_eq!(last.eval.mate, Some(0));
    assert_eq!(last.tag, EvalTag::ForcedMate);

    let Scene::Main(main) = synthesis.timeline.scenes().last().unwrap() else {
        panic!("expected main scene");
    };
    assert!(main.eval_bar_target < -0.99);
}

#[tokio::test]
async fn pins_are_reported_on_the_main_scene() {
    let game = GameRecord {
        start_fen: Some("4k1r1/8/8/8/8/8/6B1/6K1 b - - 0 1".to_string()),
        moves: vec!["Ke7".to_string()],
        ..Default::default()
    };
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(0))
        .synthesize(&game)
        .await
        .unwrap();

    let Scene::Main(main) = &synthesis.timeline.scenes()[0] else {
        panic!("expected main scene");
    };
    assert_eq!(main.pins.len(), 1);
    assert_eq!(main.pins[0].sq, "g2");
    assert_eq!(main.pins[0].attacker, "g8");
    assert_eq!(main.pins[0].king, "g1");
    assert!(main.attacked.black.contains(&"g2".to_string()));
}

#[tokio::test]
async fn abort_before_first_ply_yields_no_timeline() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let abort = AbortSignal::new();
    abort.abort();
    let err = Synthesizer::new(&mut provider, &mut cache, config(2))
        .with_abort(abort)
        .synthesize(&record(&["e4", "e5"]))
        .await
        .unwrap_err();

    assert!(matches!(err, TimelineError::Aborted { ply: 1 }));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn shared_positions_hit_the_cache() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let game = record(&["e4", "e5"]);

    Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&game)
        .await
        .unwrap();
    // start, after e4 (post-move of ply 1 and pre-move of ply 2), after e5
    assert_eq!(provider.total_calls(), 3);
    assert!(provider.calls.values().all(|&n| n == 1));

    Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&game)
        .await
        .unwrap();
    assert_eq!(provider.total_calls(), 3);
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn identical_inputs_give_identical_timelines() {
    let game = record(&["d4", "d5", "c4", "e6"]);
    let mut first_provider = FakeProvider::default();
    let mut second_provider = FakeProvider::default();
    let mut first_cache = AnalysisCache::new();
    let mut second_cache = AnalysisCache::new();

    let first = Synthesizer::new(&mut first_provider, &mut first_cache, config(2))
        .synthesize(&game)
        .await
        .unwrap();
    let second = Synthesizer::new(&mut second_provider, &mut second_cache, config(2))
        .synthesize(&game)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn cue_times_annotate_synthesized_scenes_by_id() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let mut synthesis = Synthesizer::new(&mut provider, &mut cache, config(1))
        .synthesize(&record(&["e4", "c5"]))
        .await
        .unwrap();
    let before: Vec<String> = synthesis
        .timeline
        .scenes()
        .iter()
        .map(|s| s.id().to_string())
        .collect();
    let total = synthesis.timeline.total_duration_ms();

    let alignment: Alignment = serde_json::from_str(
        r#"{"m2": {"keywords": {"sicilian": 0.3}}, "m2_alt2": {"keywords": {"other": 0.2}}, "m7": {}}"#,
    )
    .unwrap();
    assert_eq!(synthesis.timeline.apply_cue_times(&alignment), 2);

    let after: Vec<String> = synthesis
        .timeline
        .scenes()
        .iter()
        .map(|s| s.id().to_string())
        .collect();
    assert_eq!(before, after);
    assert_eq!(synthesis.timeline.total_duration_ms(), total);
    let m2 = synthesis.timeline.scenes().iter().find(|s| s.id() == "m2").unwrap();
    assert_eq!(m2.cue_times().unwrap()["sicilian"], 0.3);
}

#[tokio::test]
async fn report_lists_best_and_alternate_moves() {
    let mut provider = FakeProvider::default();
    let mut cache = AnalysisCache::new();
    let synthesis = Synthesizer::new(&mut provider, &mut cache, config(2))
        .synthesize(&record(&["e4"]))
        .await
        .unwrap();

    let ply = &synthesis.plies[0];
    assert_eq!(ply.ply, 1);
    assert_eq!(ply.san, "e4");
    assert!(ply.best_move.is_some());
    assert_eq!(ply.alt_moves.len(), 2);
    // Reference is the pre-move best line (+40 for White), after is -40: a drop of 80.
    assert_eq!(ply.tag, EvalTag::None);
}
