use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    dao::{
        score_api::ScoreApi,
        score_cache::{LocalScoreCache, insert_ranked},
    },
    dto::score::ScoreRecord,
};

/// Where the high-score list returned by [`ScoreGateway::submit`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The remote service accepted the record; its list replaced the cache.
    Remote(Vec<ScoreRecord>),
    /// The remote service failed; the record was merged into the local cache.
    Local(Vec<ScoreRecord>),
}

impl SubmitOutcome {
    /// High-score list to render.
    pub fn scores(&self) -> &[ScoreRecord] {
        match self {
            Self::Remote(scores) | Self::Local(scores) => scores,
        }
    }
}

/// Best-effort score persistence: remote first, local cache as fallback.
#[derive(Clone)]
pub struct ScoreGateway {
    api: Arc<dyn ScoreApi>,
    cache: LocalScoreCache,
    timeout: Duration,
}

impl ScoreGateway {
    /// Build a gateway bounding each remote submission by `timeout`.
    pub fn new(api: Arc<dyn ScoreApi>, cache: LocalScoreCache, timeout: Duration) -> Self {
        Self {
            api,
            cache,
            timeout,
        }
    }

    /// Submit `record`. Never fails: remote and storage errors are logged and
    /// the best list available is returned.
    pub async fn submit(&self, record: ScoreRecord) -> SubmitOutcome {
        let remote = timeout(self.timeout, self.api.submit(record.clone())).await;

        match remote {
            Ok(Ok(scores)) => {
                info!(entries = scores.len(), "score stored remotely");
                match self.cache.replace(scores.clone()) {
                    Ok(stored) => SubmitOutcome::Remote(stored),
                    Err(err) => {
                        warn!(error = %err, "failed to mirror remote scores locally");
                        SubmitOutcome::Remote(scores)
                    }
                }
            }
            Ok(Err(err)) => {
                warn!(error = %err, "score submission failed; caching locally");
                self.store_locally(record)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "score submission timed out; caching locally"
                );
                self.store_locally(record)
            }
        }
    }

    /// Current high-score list from the local cache.
    pub fn high_scores(&self) -> Vec<ScoreRecord> {
        self.cache.load()
    }

    fn store_locally(&self, record: ScoreRecord) -> SubmitOutcome {
        match self.cache.insert(record.clone()) {
            Ok(scores) => SubmitOutcome::Local(scores),
            Err(err) => {
                warn!(error = %err, "failed to write local scores");
                let mut scores = self.cache.load();
                insert_ranked(&mut scores, record);
                SubmitOutcome::Local(scores)
            }
        }
    }
}
