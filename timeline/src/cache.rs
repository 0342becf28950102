//! Memoized candidate lines keyed by (position, depth, breadth).

use std::collections::HashMap;
use std::path::PathBuf;

use chess::{AnalysisRequest, CandidateLine};
use engine::{EngineError, LineProvider};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CacheError;

/// Hex SHA-256 of `"{fen}:{depth}:{breadth}"`.
pub fn cache_key(fen: &str, depth: u32, breadth: u32) -> String {
    let digest = Sha256::digest(format!("{}:{}:{}", fen, depth, breadth).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// One cached analysis, as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub key: String,
    pub fen: String,
    pub depth: u32,
    pub breadth: u32,
    pub lines: Vec<CandidateLine>,
}

/// JSON-file-per-entry durable store.
pub struct JsonCacheStore {
    dir: PathBuf,
}

impl JsonCacheStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn save(&self, entry: &CachedAnalysis) -> Result<(), CacheError> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(entry)?;
        std::fs::write(self.file_path(&entry.key), json)?;
        Ok(())
    }

    /// Returns None if not found.
    pub fn load(&self, key: &str) -> Result<Option<CachedAnalysis>, CacheError> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

/// Process-lifetime cache with an optional durable backing store. No eviction.
#[derive(Default)]
pub struct AnalysisCache {
    entries: HashMap<String, Vec<CandidateLine>>,
    store: Option<JsonCacheStore>,
    hits: usize,
    misses: usize,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: JsonCacheStore) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    pub fn get(&mut self, fen: &str, depth: u32, breadth: u32) -> Option<&[CandidateLine]> {
        let key = cache_key(fen, depth, breadth);
        if !self.entries.contains_key(&key) {
            let loaded = self.load_durable(&key)?;
            self.entries.insert(key.clone(), loaded);
        }
        self.entries.get(&key).map(Vec::as_slice)
    }

    pub fn set(&mut self, fen: &str, depth: u32, breadth: u32, lines: Vec<CandidateLine>) {
        let key = cache_key(fen, depth, breadth);
        if let Some(store) = &self.store {
            let entry = CachedAnalysis {
                key: key.clone(),
                fen: fen.to_string(),
                depth,
                breadth,
                lines: lines.clone(),
            };
            if let Err(e) = store.save(&entry) {
                tracing::warn!(%key, "Failed to persist cached analysis: {}", e);
            }
        }
        self.entries.insert(key, lines);
    }

    /// Cached lines for `fen`, asking `provider` on a miss. Empty results are
    /// not cached.
    pub async fn fetch<P: LineProvider>(
        &mut self,
        provider: &mut P,
        fen: &str,
        request: AnalysisRequest,
    ) -> Result<Vec<CandidateLine>, EngineError> {
        if let Some(lines) = self.get(fen, request.depth, request.breadth) {
            let lines = lines.to_vec();
            self.hits += 1;
            tracing::trace!(fen, "analysis cache hit");
            return Ok(lines);
        }

        self.misses += 1;
        let lines = provider.candidate_lines(fen, request).await?;
        if !lines.is_empty() {
            self.set(fen, request.depth, request.breadth, lines.clone());
        }
        Ok(lines)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    fn load_durable(&self, key: &str) -> Option<Vec<CandidateLine>> {
        let store = self.store.as_ref()?;
        match store.load(key) {
            Ok(entry) => entry.map(|e| e.lines),
            Err(e) => {
                tracing::warn!(%key, "Ignoring unreadable cache entry: {}", e);
                None
            }
        }
    }
}
