//! Generate the all-characters job
//!
//! Writes every unordered pair of `a-z A-Z 0-9` in Roboto and Roboto Mono to
//! `<jobs_dir>/<job>/input.jsonl`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sifter_common::config::{JobPaths, DEFAULT_JOBS_DIR};
use sifter_common::generate::{
    alphanumeric_chars, pairwise_records, write_input, ALL_CHARS_FONTS, ALL_CHARS_JOB,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sifter-gen-all-chars")]
#[command(about = "Generate input.jsonl for all pairwise single-character comparisons")]
struct Args {
    /// Directory containing job directories
    #[arg(long, env = "SIFTER_JOBS_DIR", default_value = DEFAULT_JOBS_DIR)]
    jobs_dir: PathBuf,

    /// Job name to write
    #[arg(long, default_value = ALL_CHARS_JOB)]
    job: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let job = JobPaths::resolve(&args.jobs_dir, &args.job)?;

    let chars = alphanumeric_chars();
    let records = pairwise_records(&chars, &ALL_CHARS_FONTS);
    write_input(&job.input, &records)
        .with_context(|| format!("Failed to write {}", job.input.display()))?;

    info!("Chars:  {}", chars.len());
    info!("Fonts:  {}", ALL_CHARS_FONTS.len());
    info!("Pairs:  {}", records.len());
    info!("Wrote:  {}", job.input.display());
    Ok(())
}
