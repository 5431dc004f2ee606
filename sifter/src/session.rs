//! Scoring service
//!
//! Owns the session state (records plus scores) for one job. Every operation
//! takes the session lock, so submissions are applied one at a time and each
//! one is persisted before it is acknowledged.

use sifter_common::api::{FirstUnscoredResponse, PairView, StatusResponse};
use sifter_common::dataset::{unique_fonts, DatasetStore, Record};
use sifter_common::score::{count_scored, first_unscored};
use sifter_common::{Error, Result, Score};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Records and their index-aligned scores
#[derive(Debug)]
struct SessionState {
    /// Fixed after load; shared with the blocking persist task
    records: Arc<Vec<Record>>,
    scores: Vec<Option<Score>>,
}

impl SessionState {
    fn check_index(&self, index: i64) -> Result<usize> {
        let total = self.records.len();
        usize::try_from(index)
            .ok()
            .filter(|&i| i < total)
            .ok_or(Error::OutOfRange { index, total })
    }
}

/// Authoritative in-memory scoring state for one job
#[derive(Debug)]
pub struct ScoringService {
    store: DatasetStore,
    state: Mutex<SessionState>,
}

impl ScoringService {
    /// Load records and resume scores from the store
    pub fn open(store: DatasetStore) -> Result<Self> {
        let (records, scores) = store.open()?;
        Self::new(store, records, scores)
    }

    /// Build from already loaded records and scores
    pub fn new(store: DatasetStore, records: Vec<Record>, scores: Vec<Option<Score>>) -> Result<Self> {
        if records.len() != scores.len() {
            return Err(Error::Internal(format!(
                "record/score length mismatch: {} vs {}",
                records.len(),
                scores.len()
            )));
        }
        Ok(Self {
            store,
            state: Mutex::new(SessionState {
                records: Arc::new(records),
                scores,
            }),
        })
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Total and scored counts
    pub async fn status(&self) -> StatusResponse {
        let state = self.state.lock().await;
        StatusResponse {
            total: state.records.len(),
            scored: count_scored(&state.scores),
        }
    }

    /// Validate an index against the current record count
    pub async fn check_index(&self, index: i64) -> Result<usize> {
        self.state.lock().await.check_index(index)
    }

    /// Record at `index` merged with its current score
    pub async fn record(&self, index: i64) -> Result<PairView> {
        let state = self.state.lock().await;
        let i = state.check_index(index)?;
        Ok(PairView {
            index: i,
            record: state.records[i].clone(),
            score: state.scores[i],
        })
    }

    /// Smallest unscored index, or 0 when everything is scored
    pub async fn first_unscored(&self) -> FirstUnscoredResponse {
        let state = self.state.lock().await;
        FirstUnscoredResponse {
            index: first_unscored(&state.scores),
        }
    }

    /// Store a score and persist the whole session before returning
    ///
    /// The index is checked before the value. If the write to disk fails the
    /// previous in-memory score is restored, so memory never runs ahead of
    /// the output file.
    pub async fn submit_score(&self, index: i64, value: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let i = state.check_index(index)?;
        let score = Score::new(value)?;

        let previous = state.scores[i].replace(score);
        if let Err(e) = self.persist(&state).await {
            state.scores[i] = previous;
            error!(index = i, "Failed to persist score: {}", e);
            return Err(e);
        }

        debug!(index = i, score = %score, "Score persisted");
        Ok(())
    }

    /// Write the session to disk on the blocking pool
    ///
    /// The caller keeps the session lock across the await, so writes never
    /// interleave.
    async fn persist(&self, state: &SessionState) -> Result<()> {
        tokio::task::spawn_blocking({
            let store = self.store.clone();
            let records = Arc::clone(&state.records);
            let scores = state.scores.clone();

            move || store.persist(&records, &scores)
        })
        .await
        .map_err(|e| Error::Internal(format!("Persist task join error: {}", e)))?
    }

    /// Unique font names across all records
    pub async fn fonts(&self) -> BTreeSet<String> {
        let state = self.state.lock().await;
        unique_fonts(&state.records)
    }
}
