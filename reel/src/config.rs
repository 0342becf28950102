//! Configuration for the chess-reel runtime.
//!
//! Every tunable has a compile-time default and can be overridden via a
//! dedicated `CHESS_REEL_*` environment variable. Command-line flags take
//! precedence over both.

use std::path::PathBuf;
use std::time::Duration;

/// Default engine thread count.
const DEFAULT_ENGINE_THREADS: u32 = 4;

/// Default engine hash table size in megabytes.
const DEFAULT_ENGINE_HASH_MB: u32 = 1024;

/// Default search depth per position.
const DEFAULT_ENGINE_DEPTH: u32 = timeline::config::DEFAULT_DEPTH;

/// Default number of ranked lines per position.
const DEFAULT_ENGINE_MULTIPV: u32 = timeline::config::DEFAULT_MULTIPV;

/// Default plies played out in each alternate preview.
const DEFAULT_ALT_PREVIEW_PLIES: usize = timeline::config::DEFAULT_ALT_PREVIEW_PLIES;

/// Default number of alternate previews per ply.
const DEFAULT_ALT_MAX: usize = timeline::config::DEFAULT_ALT_MAX;

/// Default upper bound for a single engine request (in seconds).
const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 120;

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}", name, value);
            default
        }),
        Err(_) => default,
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Get the Stockfish binary path.
///
/// Priority:
/// 1. `CHESS_REEL_STOCKFISH_PATH` env variable if set
/// 2. `None`, meaning common install locations and `PATH` are probed
pub fn get_stockfish_path() -> Option<PathBuf> {
    env_path("CHESS_REEL_STOCKFISH_PATH")
}

/// Get the engine thread count.
///
/// Priority:
/// 1. `CHESS_REEL_ENGINE_THREADS` env variable if set (falls back to default
///    if the value cannot be parsed)
/// 2. `4` as fallback
pub fn get_engine_threads() -> u32 {
    env_parse("CHESS_REEL_ENGINE_THREADS", DEFAULT_ENGINE_THREADS)
}

/// Get the engine hash size in megabytes.
///
/// Priority:
/// 1. `CHESS_REEL_ENGINE_HASH_MB` env variable if set
/// 2. `1024` as fallback
pub fn get_engine_hash_mb() -> u32 {
    env_parse("CHESS_REEL_ENGINE_HASH_MB", DEFAULT_ENGINE_HASH_MB)
}

/// Get the search depth.
///
/// Priority:
/// 1. `CHESS_REEL_ENGINE_DEPTH` env variable if set
/// 2. `20` as fallback
pub fn get_engine_depth() -> u32 {
    env_parse("CHESS_REEL_ENGINE_DEPTH", DEFAULT_ENGINE_DEPTH)
}

/// Get the number of ranked lines (MultiPV).
///
/// Priority:
/// 1. `CHESS_REEL_ENGINE_MULTIPV` env variable if set
/// 2. `4` as fallback
pub fn get_engine_multipv() -> u32 {
    env_parse("CHESS_REEL_ENGINE_MULTIPV", DEFAULT_ENGINE_MULTIPV)
}

/// Get the number of plies shown per alternate preview.
///
/// Priority:
/// 1. `CHESS_REEL_ALT_PREVIEW_PLIES` env variable if set
/// 2. `2` as fallback
pub fn get_alt_preview_plies() -> usize {
    env_parse("CHESS_REEL_ALT_PREVIEW_PLIES", DEFAULT_ALT_PREVIEW_PLIES)
}

/// Get the maximum number of alternate previews per ply.
///
/// Priority:
/// 1. `CHESS_REEL_ALT_MAX` env variable if set
/// 2. `2` as fallback
pub fn get_alt_max() -> usize {
    env_parse("CHESS_REEL_ALT_MAX", DEFAULT_ALT_MAX)
}

/// Get the durable analysis cache directory.
///
/// Priority:
/// 1. `CHESS_REEL_CACHE_DIR` env variable if set
/// 2. `None`: the cache lives in memory only
pub fn get_cache_dir() -> Option<PathBuf> {
    env_path("CHESS_REEL_CACHE_DIR")
}

/// Get the directory for daily rolling log files.
///
/// Priority:
/// 1. `CHESS_REEL_LOG_DIR` env variable if set
/// 2. `None`: logs go to stderr only
pub fn get_log_dir() -> Option<PathBuf> {
    env_path("CHESS_REEL_LOG_DIR")
}

/// Get the per-request engine timeout.
///
/// Priority:
/// 1. `CHESS_REEL_ANALYSIS_TIMEOUT_SECS` env variable if set
/// 2. `120` seconds as fallback
pub fn get_analysis_timeout() -> Duration {
    Duration::from_secs(env_parse(
        "CHESS_REEL_ANALYSIS_TIMEOUT_SECS",
        DEFAULT_ANALYSIS_TIMEOUT_SECS,
    ))
}
