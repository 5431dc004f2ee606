//! Configuration loading and job path resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (or its environment variable, handled by clap)
//! 2. TOML config file
//! 3. Compiled default

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::dataset::DatasetStore;
use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9413;
pub const DEFAULT_JOBS_DIR: &str = "jobs";

pub const INPUT_FILE: &str = "input.jsonl";
pub const OUTPUT_FILE: &str = "output.jsonl";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub jobs_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub auto_advance: Option<bool>,
    pub font_preflight: Option<bool>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub jobs_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub auto_advance: bool,
    pub skip_font_preflight: bool,
}

/// Fully resolved server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub jobs_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Move to the next pair after a successful score
    pub auto_advance: bool,
    /// Check every font against the font host before serving
    pub font_preflight: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jobs_dir: PathBuf::from(DEFAULT_JOBS_DIR),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auto_advance: false,
            font_preflight: true,
        }
    }
}

impl Settings {
    /// Merge CLI values over the TOML file over compiled defaults
    pub fn resolve(cli: &CliOverrides, file: &TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            jobs_dir: cli
                .jobs_dir
                .clone()
                .or_else(|| file.jobs_dir.clone())
                .unwrap_or(defaults.jobs_dir),
            host: cli
                .host
                .clone()
                .or_else(|| file.host.clone())
                .unwrap_or(defaults.host),
            port: cli.port.or(file.port).unwrap_or(defaults.port),
            auto_advance: cli.auto_advance
                || file.auto_advance.unwrap_or(defaults.auto_advance),
            font_preflight: !cli.skip_font_preflight
                && file.font_preflight.unwrap_or(defaults.font_preflight),
        }
    }
}

/// Per-user config file location (`~/.config/sifter/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sifter").join("config.toml"))
}

/// Load a TOML config file; a missing file yields the empty config
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(TomlConfig::default());
        }
        Err(e) => {
            return Err(Error::Config(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Files belonging to one named job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub name: String,
    pub dir: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl JobPaths {
    /// Resolve `<jobs_dir>/<job>/{input,output}.jsonl`
    ///
    /// The job name must be exactly one normal path component.
    pub fn resolve(jobs_dir: &Path, job: &str) -> Result<Self> {
        let mut components = Path::new(job).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !job.contains(['/', '\\']) => {}
            _ => return Err(Error::InvalidJobName(job.to_string())),
        }

        let dir = jobs_dir.join(job);
        Ok(Self {
            name: job.to_string(),
            input: dir.join(INPUT_FILE),
            output: dir.join(OUTPUT_FILE),
            dir,
        })
    }

    pub fn store(&self) -> DatasetStore {
        DatasetStore::new(&self.input, &self.output)
    }
}
