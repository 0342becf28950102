pub mod board_analysis;
pub mod eval_bar;
pub mod tagging;

pub use board_analysis::*;
pub use chess::{is_white_ply, AnalysisScore};
pub use eval_bar::{eval_bar, eval_bar_for};
pub use tagging::{tag, tag_cp, EvalTag};
