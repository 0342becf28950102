//! Squashing of unbounded evaluations into the renderer's bar range.

use chess::PovScore;
use cozy_chess::Color;

/// Centipawns at which the bar reaches tanh(1), about 76% of full scale.
pub const EVAL_BAR_SCALE: f64 = 400.0;

/// Map centipawns onto [-1, 1]. Large scores saturate near the bounds.
pub fn eval_bar(cp: i32) -> f64 {
    (f64::from(cp) / EVAL_BAR_SCALE).tanh().clamp(-1.0, 1.0)
}

/// Bar value of `score` as seen by `color`. Mates saturate toward the mating side.
pub fn eval_bar_for(score: PovScore, color: Color) -> f64 {
    eval_bar(score.cp_for(color))
}
