//! Temporary job directory for integration tests
//!
//! Creates `<tmp>/jobs/<name>/input.jsonl` and opens scoring services over it,
//! so a "restart" is simply opening a second service on the same job.

use std::collections::BTreeSet;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sifter::{build_router, AppState, ScoringService};
use sifter_common::api::ClientConfig;
use sifter_common::config::JobPaths;
use tempfile::TempDir;

pub struct TestJob {
    _root: TempDir,
    pub paths: JobPaths,
}

impl TestJob {
    /// Job with `n` records `{"a": "a<i>", "b": "b<i>", "font": "Roboto"}`
    pub fn with_records(n: usize) -> Self {
        let lines: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"a": "a{i}", "b": "b{i}", "font": "Roboto"}}"#))
            .collect();
        Self::with_lines(&lines.iter().map(String::as_str).collect::<Vec<_>>())
    }

    /// Job whose input.jsonl contains exactly these lines
    pub fn with_lines(lines: &[&str]) -> Self {
        let root = TempDir::new().expect("Should create temp dir");
        let paths = JobPaths::resolve(&root.path().join("jobs"), "test-job")
            .expect("Should resolve job paths");
        fs::create_dir_all(&paths.dir).expect("Should create job dir");

        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&paths.input, content).expect("Should write input.jsonl");

        Self { _root: root, paths }
    }

    /// Open a fresh service (simulates a process start)
    pub fn open(&self) -> Arc<ScoringService> {
        Arc::new(ScoringService::open(self.paths.store()).expect("Should open job"))
    }

    pub fn output_lines(&self) -> Vec<serde_json::Value> {
        fs::read_to_string(&self.paths.output)
            .expect("Should read output.jsonl")
            .lines()
            .map(|l| serde_json::from_str(l).expect("Output line should be JSON"))
            .collect()
    }

    /// Router over a freshly opened service
    pub async fn router(&self, auto_advance: bool) -> (Router, Arc<ScoringService>) {
        let service = self.open();
        let fonts: BTreeSet<String> = service.fonts().await;
        let state = AppState::new(
            Arc::clone(&service),
            ClientConfig {
                job: self.paths.name.clone(),
                auto_advance,
            },
            &fonts,
        );
        (build_router(state), service)
    }

    /// Serve the router on an ephemeral localhost port
    pub async fn serve(&self) -> (SocketAddr, Arc<ScoringService>) {
        let (app, service) = self.router(false).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind ephemeral port");
        let addr = listener.local_addr().expect("Should have local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });
        (addr, service)
    }
}
