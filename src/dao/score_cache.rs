use std::sync::Arc;

use tracing::warn;

use crate::{
    dao::storage::{KeyValueStore, StorageError, StorageResult},
    dto::score::ScoreRecord,
};

/// Storage slot holding the JSON-encoded high-score list.
pub const SCORES_KEY: &str = "scores";
/// Maximum number of records kept in the local list.
pub const MAX_CACHED_SCORES: usize = 10;

/// Local, ordered high-score list backed by the `"scores"` storage slot.
///
/// The list is kept sorted by score descending and capped at
/// [`MAX_CACHED_SCORES`] entries after every write.
#[derive(Clone)]
pub struct LocalScoreCache {
    store: Arc<dyn KeyValueStore>,
}

impl LocalScoreCache {
    /// Wrap a storage backend.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the cached list. Missing, unreadable or corrupt slots read as empty.
    pub fn load(&self) -> Vec<ScoreRecord> {
        let raw = match self.store.get(SCORES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read local scores; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<ScoreRecord>>(&raw) {
            Ok(mut scores) => {
                normalize(&mut scores);
                scores
            }
            Err(err) => {
                warn!(error = %err, "local scores are corrupt; treating as empty");
                Vec::new()
            }
        }
    }

    /// Merge `record` into the local list and persist it, returning the new list.
    pub fn insert(&self, record: ScoreRecord) -> StorageResult<Vec<ScoreRecord>> {
        let mut scores = self.load();
        insert_ranked(&mut scores, record);
        self.write(&scores)?;
        Ok(scores)
    }

    /// Replace the local list with an authoritative one, returning what was stored.
    pub fn replace(&self, mut scores: Vec<ScoreRecord>) -> StorageResult<Vec<ScoreRecord>> {
        normalize(&mut scores);
        self.write(&scores)?;
        Ok(scores)
    }

    fn write(&self, scores: &[ScoreRecord]) -> StorageResult<()> {
        let encoded =
            serde_json::to_string(scores).map_err(|source| StorageError::Encode { source })?;
        self.store.set(SCORES_KEY, &encoded)
    }
}

/// Insert `record` before the first entry with a strictly smaller score, then
/// truncate to [`MAX_CACHED_SCORES`]. Equal scores already present stay ahead.
pub fn insert_ranked(scores: &mut Vec<ScoreRecord>, record: ScoreRecord) {
    let position = scores
        .iter()
        .position(|existing| existing.score < record.score)
        .unwrap_or(scores.len());
    scores.insert(position, record);
    scores.truncate(MAX_CACHED_SCORES);
}

/// Stable sort by score descending and cap the length.
fn normalize(scores: &mut Vec<ScoreRecord>) {
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores.truncate(MAX_CACHED_SCORES);
}
