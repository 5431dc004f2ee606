//! sifter - pairwise scoring server
//!
//! Reads `<jobs_dir>/<job>/input.jsonl`, resumes any scores already in
//! `output.jsonl`, and serves the scoring UI until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sifter::fonts::{FontValidator, GoogleFontsValidator};
use sifter::{build_router, AppState, ScoringService};
use sifter_common::api::ClientConfig;
use sifter_common::config::{
    default_config_path, load_toml_config, CliOverrides, JobPaths, Settings, TomlConfig,
};
use sifter_common::dataset::unique_fonts;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for sifter
#[derive(Parser, Debug)]
#[command(name = "sifter")]
#[command(about = "Human A/B comparison scoring tool")]
#[command(version)]
struct Args {
    /// Job name (reads <jobs-dir>/<job>/input.jsonl)
    job: String,

    /// Port to listen on
    #[arg(short, long, env = "SIFTER_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "SIFTER_HOST")]
    host: Option<String>,

    /// Directory containing job directories
    #[arg(long, env = "SIFTER_JOBS_DIR")]
    jobs_dir: Option<PathBuf>,

    /// TOML config file (default: ~/.config/sifter/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Advance to the next pair after each score
    #[arg(long)]
    auto_advance: bool,

    /// Do not check fonts against the font host before starting
    #[arg(long)]
    skip_font_preflight: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            jobs_dir: self.jobs_dir.clone(),
            host: self.host.clone(),
            port: self.port,
            auto_advance: self.auto_advance,
            skip_font_preflight: self.skip_font_preflight,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sifter=info,sifter_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting sifter v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let file_config = match args.config.clone().or_else(default_config_path) {
        Some(path) => load_toml_config(&path)?,
        None => TomlConfig::default(),
    };
    let settings = Settings::resolve(&args.overrides(), &file_config);

    let job = JobPaths::resolve(&settings.jobs_dir, &args.job)?;
    info!("Job '{}' in {}", job.name, job.dir.display());

    let store = job.store();
    let records = store
        .load()
        .with_context(|| format!("Failed to load {}", job.input.display()))?;

    let fonts = unique_fonts(&records);
    if settings.font_preflight {
        let names: Vec<String> = fonts.iter().cloned().collect();
        GoogleFontsValidator::new()?
            .validate(&names)
            .await
            .context("Font preflight failed")?;
    }

    let scores = store
        .resume(&records)
        .with_context(|| format!("Failed to resume {}", job.output.display()))?;
    let service = Arc::new(ScoringService::new(store, records, scores)?);
    let status = service.status().await;
    info!("Loaded {} pairs, {} already scored", status.total, status.scored);

    let state = AppState::new(
        service,
        ClientConfig {
            job: job.name.clone(),
            auto_advance: settings.auto_advance,
        },
        &fonts,
    );
    let app = build_router(state);

    let listener = bind(&settings.host, settings.port).await?;
    let addr = listener.local_addr().context("Failed to read bound address")?;
    info!("sifter listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Bind the listener; `host` may be an IPv4/IPv6 literal or a hostname
async fn bind(host: &str, port: u16) -> Result<tokio::net::TcpListener> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
