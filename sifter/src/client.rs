//! Navigation/scoring client state machine
//!
//! Mirrors the browser client in `ui/app.js` so its behavior can be driven and
//! tested from Rust. The client tracks the current index, the last known total
//! and a busy flag:
//!
//! - `Idle`: ready for input
//! - `Loading`: a request sequence is in flight; any input is dropped, not queued
//!
//! Displayed state is always rebuilt from server responses. A score is shown
//! as selected only after the server acknowledged (and persisted) it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sifter_common::api::{ErrorResponse, FirstUnscoredResponse, PairView, ScoreRequest, StatusResponse};
use sifter_common::{Error, Result, Score};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use crate::session::ScoringService;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// The four scoring operations, wherever they are served from
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn status(&self) -> Result<StatusResponse>;
    async fn pair(&self, index: i64) -> Result<PairView>;
    async fn first_unscored(&self) -> Result<FirstUnscoredResponse>;
    async fn submit_score(&self, index: i64, value: i64) -> Result<()>;
}

#[async_trait]
impl ScoringBackend for ScoringService {
    async fn status(&self) -> Result<StatusResponse> {
        Ok(ScoringService::status(self).await)
    }

    async fn pair(&self, index: i64) -> Result<PairView> {
        self.record(index).await
    }

    async fn first_unscored(&self) -> Result<FirstUnscoredResponse> {
        Ok(ScoringService::first_unscored(self).await)
    }

    async fn submit_score(&self, index: i64, value: i64) -> Result<()> {
        ScoringService::submit_score(self, index, value).await
    }
}

#[async_trait]
impl<T: ScoringBackend + ?Sized> ScoringBackend for Arc<T> {
    async fn status(&self) -> Result<StatusResponse> {
        (**self).status().await
    }

    async fn pair(&self, index: i64) -> Result<PairView> {
        (**self).pair(index).await
    }

    async fn first_unscored(&self) -> Result<FirstUnscoredResponse> {
        (**self).first_unscored().await
    }

    async fn submit_score(&self, index: i64, value: i64) -> Result<()> {
        (**self).submit_score(index, value).await
    }
}

/// Scoring API over HTTP
///
/// A 404 maps to `Error::NotFound`, a 400 to `Error::InvalidScore`, anything
/// else non-2xx or a transport failure to `Error::Http`.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| Error::Http(format!("Invalid response body: {}", e)));
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());
    Err(match status {
        reqwest::StatusCode::NOT_FOUND => Error::NotFound(message),
        reqwest::StatusCode::BAD_REQUEST => Error::InvalidScore(message),
        _ => Error::Http(format!("HTTP {}: {}", status.as_u16(), message)),
    })
}

#[async_trait]
impl ScoringBackend for HttpBackend {
    async fn status(&self) -> Result<StatusResponse> {
        self.get("/api/status").await
    }

    async fn pair(&self, index: i64) -> Result<PairView> {
        self.get(&format!("/api/pair/{}", index)).await
    }

    async fn first_unscored(&self) -> Result<FirstUnscoredResponse> {
        self.get("/api/first-unscored").await
    }

    async fn submit_score(&self, index: i64, value: i64) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/api/pair/{}/score", index)))
            .json(&ScoreRequest { score: value })
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }
}

/// Operator input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Move by a relative offset (±1 from the arrow keys)
    Navigate(i64),
    /// Score the current pair
    Score(i64),
}

impl Input {
    /// Map a DOM `KeyboardEvent.key` value to an input
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Input::Navigate(-1)),
            "ArrowRight" => Some(Input::Navigate(1)),
            "1" | "2" | "3" | "4" | "5" => key.parse().ok().map(Input::Score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    Loading,
}

/// What the operator currently sees
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub index: usize,
    pub total: usize,
    pub scored: usize,
    /// Record plus the selected (server-confirmed) score
    pub pair: PairView,
}

/// Why an input was refused without a round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutOfBounds { target: i64, total: usize },
    InvalidScore(i64),
    NoCurrentPair,
}

/// Result of one input
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Rendered(View),
    /// Started on an empty dataset
    Empty,
    /// Another request sequence was in flight
    Dropped,
    Rejected(Rejection),
}

#[derive(Debug, Default)]
struct Local {
    current_index: usize,
    total: usize,
    view: Option<View>,
}

/// Clears the busy flag when the request sequence ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct NavigationClient<B> {
    backend: B,
    auto_advance: bool,
    busy: AtomicBool,
    local: Mutex<Local>,
}

impl<B: ScoringBackend> NavigationClient<B> {
    pub fn new(backend: B, auto_advance: bool) -> Self {
        Self {
            backend,
            auto_advance,
            busy: AtomicBool::new(false),
            local: Mutex::new(Local::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> ClientState {
        if self.busy.load(Ordering::Acquire) {
            ClientState::Loading
        } else {
            ClientState::Idle
        }
    }

    pub fn current_index(&self) -> usize {
        self.local().current_index
    }

    pub fn total(&self) -> usize {
        self.local().total
    }

    pub fn view(&self) -> Option<View> {
        self.local().view.clone()
    }

    /// Jump to the first unscored pair and render it
    pub async fn start(&self) -> Result<Step> {
        let Some(_busy) = self.try_begin() else {
            return Ok(Step::Dropped);
        };

        let first = self.backend.first_unscored().await?;
        let status = self.backend.status().await?;
        if status.total == 0 {
            let mut local = self.local();
            local.current_index = 0;
            local.total = 0;
            local.view = None;
            return Ok(Step::Empty);
        }
        self.render(first.index).await.map(Step::Rendered)
    }

    /// Dispatch one operator input
    pub async fn handle(&self, input: Input) -> Result<Step> {
        match input {
            Input::Navigate(delta) => self.navigate(delta).await,
            Input::Score(value) => self.score(value).await,
        }
    }

    /// Move by `delta`; refused if the target falls outside `0..total`
    pub async fn navigate(&self, delta: i64) -> Result<Step> {
        let Some(_busy) = self.try_begin() else {
            return Ok(Step::Dropped);
        };

        let target = {
            let local = self.local();
            let target = local.current_index as i64 + delta;
            if target < 0 || target >= local.total as i64 {
                return Ok(Step::Rejected(Rejection::OutOfBounds {
                    target,
                    total: local.total,
                }));
            }
            target as usize
        };

        self.render(target).await.map(Step::Rendered)
    }

    /// Submit a score for the current pair
    ///
    /// On success the selection reflects the confirmed value and the status is
    /// refreshed; with auto-advance the next pair (if any) is rendered.
    pub async fn score(&self, value: i64) -> Result<Step> {
        let Some(_busy) = self.try_begin() else {
            return Ok(Step::Dropped);
        };

        let Ok(score) = Score::new(value) else {
            return Ok(Step::Rejected(Rejection::InvalidScore(value)));
        };
        // Always the pair on screen, never an index that failed to render
        let Some(index) = self.local().view.as_ref().map(|view| view.index) else {
            return Ok(Step::Rejected(Rejection::NoCurrentPair));
        };

        self.backend.submit_score(index as i64, value).await?;
        let status = self.backend.status().await?;
        debug!(index, score = %score, scored = status.scored, "Score confirmed");

        let view = {
            let mut local = self.local();
            local.total = status.total;
            local.view.as_mut().map(|view| {
                view.pair.score = Some(score);
                view.total = status.total;
                view.scored = status.scored;
                view.clone()
            })
        };

        if self.auto_advance && index + 1 < status.total {
            return self.render(index + 1).await.map(Step::Rendered);
        }
        view.map(Step::Rendered)
            .ok_or_else(|| Error::Internal("view cleared while scoring".to_string()))
    }

    /// Fetch record and status for `index` concurrently
    ///
    /// The index and view move only once both responses are in; on error the
    /// previous pair stays current.
    async fn render(&self, index: usize) -> Result<View> {
        let (pair, status) = tokio::try_join!(
            self.backend.pair(index as i64),
            self.backend.status()
        )?;

        let view = View {
            index,
            total: status.total,
            scored: status.scored,
            pair,
        };
        let mut local = self.local();
        local.current_index = index;
        local.total = status.total;
        local.view = Some(view.clone());
        Ok(view)
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    fn local(&self) -> MutexGuard<'_, Local> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
