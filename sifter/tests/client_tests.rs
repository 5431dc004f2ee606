//! Navigation/scoring client state machine tests
//!
//! Drives `NavigationClient` against an in-process `ScoringService`, a gated
//! backend (to hold a request in flight), and the real HTTP server.

mod helpers;

use async_trait::async_trait;
use helpers::test_job::TestJob;
use sifter::client::{
    ClientState, HttpBackend, Input, NavigationClient, Rejection, ScoringBackend, Step,
};
use sifter::ScoringService;
use sifter_common::api::{FirstUnscoredResponse, PairView, StatusResponse};
use sifter_common::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

fn rendered(step: Step) -> sifter::client::View {
    match step {
        Step::Rendered(view) => view,
        other => panic!("expected a rendered view, got {other:?}"),
    }
}

/// Backend whose status call waits for a notification while `gate` is armed
struct GatedBackend {
    inner: Arc<ScoringService>,
    armed: std::sync::atomic::AtomicBool,
    gate: Notify,
}

#[async_trait]
impl ScoringBackend for GatedBackend {
    async fn status(&self) -> Result<StatusResponse> {
        if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
            self.gate.notified().await;
        }
        self.inner.status().await
    }

    async fn pair(&self, index: i64) -> Result<PairView> {
        self.inner.pair(index).await
    }

    async fn first_unscored(&self) -> Result<FirstUnscoredResponse> {
        self.inner.first_unscored().await
    }

    async fn submit_score(&self, index: i64, value: i64) -> Result<()> {
        self.inner.submit_score(index, value).await
    }
}

/// Backend that fails the next call of an operation once its flag is set
struct FaultyBackend {
    inner: Arc<ScoringService>,
    fail_status: AtomicBool,
    fail_pair: AtomicBool,
    fail_submit: AtomicBool,
}

impl FaultyBackend {
    fn new(inner: Arc<ScoringService>) -> Self {
        Self {
            inner,
            fail_status: AtomicBool::new(false),
            fail_pair: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
        }
    }

    fn trip(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(Error::Http(format!("{op}: connection reset")));
        }
        Ok(())
    }
}

#[async_trait]
impl ScoringBackend for FaultyBackend {
    async fn status(&self) -> Result<StatusResponse> {
        Self::trip(&self.fail_status, "status")?;
        self.inner.status().await
    }

    async fn pair(&self, index: i64) -> Result<PairView> {
        Self::trip(&self.fail_pair, "pair")?;
        self.inner.pair(index).await
    }

    async fn first_unscored(&self) -> Result<FirstUnscoredResponse> {
        self.inner.first_unscored().await
    }

    async fn submit_score(&self, index: i64, value: i64) -> Result<()> {
        Self::trip(&self.fail_submit, "submit")?;
        self.inner.submit_score(index, value).await
    }
}

// =============================================================================
// Startup and navigation
// =============================================================================

#[tokio::test]
async fn test_start_at_first_unscored() {
    let job = TestJob::with_records(4);
    let svc = job.open();
    svc.submit_score(0, 3).await.unwrap();
    svc.submit_score(1, 3).await.unwrap();

    let client = NavigationClient::new(Arc::clone(&svc), false);
    let view = rendered(client.start().await.unwrap());
    assert_eq!(view.index, 2);
    assert_eq!(view.total, 4);
    assert_eq!(view.scored, 2);
    assert_eq!(view.pair.record.a, "a2");
    assert_eq!(view.pair.score, None);
    assert_eq!(client.state(), ClientState::Idle);
}

#[tokio::test]
async fn test_start_on_empty_dataset() {
    let job = TestJob::with_lines(&[]);
    let client = NavigationClient::new(job.open(), false);

    assert_eq!(client.start().await.unwrap(), Step::Empty);
    assert_eq!(client.view(), None);
    assert!(matches!(
        client.navigate(1).await.unwrap(),
        Step::Rejected(Rejection::OutOfBounds { target: 1, total: 0 })
    ));
    assert_eq!(
        client.score(3).await.unwrap(),
        Step::Rejected(Rejection::NoCurrentPair)
    );
}

#[tokio::test]
async fn test_navigation_bounds() {
    let job = TestJob::with_records(2);
    let client = NavigationClient::new(job.open(), false);
    rendered(client.start().await.unwrap());

    assert_eq!(
        client.navigate(-1).await.unwrap(),
        Step::Rejected(Rejection::OutOfBounds { target: -1, total: 2 })
    );
    assert_eq!(client.current_index(), 0);

    let view = rendered(client.navigate(1).await.unwrap());
    assert_eq!(view.index, 1);
    assert_eq!(view.pair.record.b, "b1");

    assert_eq!(
        client.navigate(1).await.unwrap(),
        Step::Rejected(Rejection::OutOfBounds { target: 2, total: 2 })
    );
    assert_eq!(client.current_index(), 1);
}

// =============================================================================
// Scoring
// =============================================================================

#[tokio::test]
async fn test_score_stays_in_place_by_default() {
    let job = TestJob::with_records(3);
    let svc = job.open();
    let client = NavigationClient::new(Arc::clone(&svc), false);
    rendered(client.start().await.unwrap());

    let view = rendered(client.handle(Input::Score(4)).await.unwrap());
    assert_eq!(view.index, 0);
    assert_eq!(view.pair.score.map(|s| s.get()), Some(4));
    assert_eq!(view.scored, 1);
    assert_eq!(client.current_index(), 0);

    // The server agrees with what the client shows
    assert_eq!(svc.record(0).await.unwrap().score.map(|s| s.get()), Some(4));
}

#[tokio::test]
async fn test_score_auto_advances_when_enabled() {
    let job = TestJob::with_records(2);
    let client = NavigationClient::new(job.open(), true);
    rendered(client.start().await.unwrap());

    let view = rendered(client.score(5).await.unwrap());
    assert_eq!(view.index, 1);
    assert_eq!(view.pair.score, None);
    assert_eq!(view.scored, 1);

    // Last pair: nothing to advance to
    let view = rendered(client.score(2).await.unwrap());
    assert_eq!(view.index, 1);
    assert_eq!(view.pair.score.map(|s| s.get()), Some(2));
    assert_eq!(view.scored, 2);
}

#[tokio::test]
async fn test_invalid_score_rejected_without_round_trip() {
    let job = TestJob::with_records(1);
    let client = NavigationClient::new(job.open(), false);
    rendered(client.start().await.unwrap());

    for v in [0, 6, -3] {
        assert_eq!(
            client.score(v).await.unwrap(),
            Step::Rejected(Rejection::InvalidScore(v))
        );
    }
    assert!(!job.paths.output.exists());
}

#[tokio::test]
async fn test_keyboard_inputs_drive_the_machine() {
    let job = TestJob::with_records(3);
    let client = NavigationClient::new(job.open(), false);
    rendered(client.start().await.unwrap());

    for key in ["ArrowRight", "3", "ArrowRight", "ArrowLeft"] {
        let input = Input::from_key(key).unwrap();
        rendered(client.handle(input).await.unwrap());
    }
    let view = client.view().unwrap();
    assert_eq!(view.index, 1);
    assert_eq!(view.pair.score.map(|s| s.get()), Some(3));
}

// =============================================================================
// Busy flag
// =============================================================================

#[tokio::test]
async fn test_input_dropped_while_request_in_flight() {
    let job = TestJob::with_records(3);
    let backend = GatedBackend {
        inner: job.open(),
        armed: std::sync::atomic::AtomicBool::new(false),
        gate: Notify::new(),
    };
    let client = Arc::new(NavigationClient::new(backend, false));
    rendered(client.start().await.unwrap());

    // Hold the next status request open
    client
        .backend()
        .armed
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let pending = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.navigate(1).await })
    };
    while client.state() != ClientState::Loading {
        tokio::task::yield_now().await;
    }

    assert_eq!(client.score(5).await.unwrap(), Step::Dropped);
    assert_eq!(client.navigate(1).await.unwrap(), Step::Dropped);
    assert_eq!(client.start().await.unwrap(), Step::Dropped);

    client.backend().gate.notify_one();
    let view = rendered(pending.await.unwrap().unwrap());
    assert_eq!(view.index, 1);
    assert_eq!(client.state(), ClientState::Idle);

    // The dropped score never reached the server
    assert_eq!(view.scored, 0);
    assert!(!job.paths.output.exists());
}

// =============================================================================
// Backend failures
// =============================================================================

#[tokio::test]
async fn test_failed_navigation_keeps_shown_pair_current() {
    let job = TestJob::with_records(3);
    let svc = job.open();
    let client = NavigationClient::new(FaultyBackend::new(Arc::clone(&svc)), false);
    rendered(client.start().await.unwrap());

    client.backend().fail_pair.store(true, Ordering::SeqCst);
    assert!(matches!(client.navigate(1).await, Err(Error::Http(_))));
    assert_eq!(client.state(), ClientState::Idle);
    assert_eq!(client.current_index(), 0);
    assert_eq!(client.view().unwrap().index, 0);

    // The score lands on the pair that is still on screen
    let view = rendered(client.score(4).await.unwrap());
    assert_eq!(view.index, 0);
    assert_eq!(view.pair.score.map(|s| s.get()), Some(4));
    assert_eq!(svc.record(0).await.unwrap().score.map(|s| s.get()), Some(4));
    assert_eq!(svc.record(1).await.unwrap().score, None);

    // A retry reaches the next pair
    let view = rendered(client.navigate(1).await.unwrap());
    assert_eq!(view.index, 1);
    assert_eq!(client.current_index(), 1);
}

#[tokio::test]
async fn test_failed_submission_leaves_selection_untouched() {
    let job = TestJob::with_records(2);
    let svc = job.open();
    let client = NavigationClient::new(FaultyBackend::new(Arc::clone(&svc)), true);
    rendered(client.start().await.unwrap());

    client.backend().fail_submit.store(true, Ordering::SeqCst);
    assert!(matches!(client.score(3).await, Err(Error::Http(_))));
    assert_eq!(client.state(), ClientState::Idle);

    let view = client.view().unwrap();
    assert_eq!(view.index, 0);
    assert_eq!(view.pair.score, None);
    assert_eq!(view.scored, 0);
    assert_eq!(ScoringService::status(&svc).await.scored, 0);
    assert!(!job.paths.output.exists());
}

#[tokio::test]
async fn test_failed_advance_after_score_stays_on_scored_pair() {
    let job = TestJob::with_records(2);
    let svc = job.open();
    let client = NavigationClient::new(FaultyBackend::new(Arc::clone(&svc)), true);
    rendered(client.start().await.unwrap());

    client.backend().fail_pair.store(true, Ordering::SeqCst);
    assert!(matches!(client.score(5).await, Err(Error::Http(_))));
    assert_eq!(client.state(), ClientState::Idle);

    // The score was confirmed, the advance was not
    let view = client.view().unwrap();
    assert_eq!(view.index, 0);
    assert_eq!(view.pair.score.map(|s| s.get()), Some(5));
    assert_eq!(client.current_index(), 0);
    assert_eq!(svc.record(0).await.unwrap().score.map(|s| s.get()), Some(5));
}

#[tokio::test]
async fn test_failed_start_renders_nothing() {
    let job = TestJob::with_records(2);
    let client = NavigationClient::new(FaultyBackend::new(job.open()), false);

    client.backend().fail_status.store(true, Ordering::SeqCst);
    assert!(matches!(client.start().await, Err(Error::Http(_))));
    assert_eq!(client.state(), ClientState::Idle);
    assert_eq!(client.view(), None);
    assert_eq!(
        client.score(2).await.unwrap(),
        Step::Rejected(Rejection::NoCurrentPair)
    );
    assert!(!job.paths.output.exists());

    let view = rendered(client.start().await.unwrap());
    assert_eq!(view.index, 0);
    assert_eq!(view.total, 2);
}

// =============================================================================
// HTTP backend
// =============================================================================

#[tokio::test]
async fn test_http_backend_end_to_end() {
    let job = TestJob::with_records(3);
    let (addr, svc) = job.serve().await;

    let backend = HttpBackend::new(format!("http://{}", addr)).unwrap();
    let client = NavigationClient::new(backend, true);

    let view = rendered(client.start().await.unwrap());
    assert_eq!(view.index, 0);
    assert_eq!(view.pair.record.font.as_deref(), Some("Roboto"));

    let view = rendered(client.score(4).await.unwrap());
    assert_eq!(view.index, 1);
    assert_eq!(
        ScoringService::status(&svc).await,
        StatusResponse { total: 3, scored: 1 }
    );
    assert_eq!(job.output_lines()[0]["score"], 4);
}

#[tokio::test]
async fn test_http_backend_maps_errors() {
    let job = TestJob::with_records(1);
    let (addr, _) = job.serve().await;
    let backend = HttpBackend::new(format!("http://{}/", addr)).unwrap();

    assert!(matches!(backend.pair(1).await, Err(Error::NotFound(_))));
    assert!(matches!(backend.submit_score(0, 9).await, Err(Error::InvalidScore(_))));
    backend.submit_score(0, 1).await.unwrap();
    assert_eq!(backend.status().await.unwrap(), StatusResponse { total: 1, scored: 1 });
}
