//! Dataset store
//!
//! A job's dataset lives in two newline-delimited JSON files:
//! - `input.jsonl`: one record per line (`a`, `b`, optional `font`, any extra fields)
//! - `output.jsonl`: the same records in the same order, each with a `score` field
//!
//! The output file is rewritten in full after every score submission. Writes go to
//! a temporary file in the same directory which is then renamed over the output,
//! so readers see either the previous or the new contents, never a partial file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::score::{count_scored, Score};
use crate::{Error, Result};

/// Keys owned by the merged pair view; never taken from input lines.
const RESERVED_KEYS: [&str; 2] = ["index", "score"];

/// One immutable comparison unit, identified by its position in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub a: String,
    pub b: String,

    /// Typeface the specimens are rendered in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    /// Any other fields from the input line, carried through to the output
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(a: impl Into<String>, b: impl Into<String>, font: Option<&str>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            font: font.map(str::to_string),
            extra: Map::new(),
        }
    }
}

/// Output line: a record merged with its current score
#[derive(Serialize)]
struct OutputLine<'a> {
    #[serde(flatten)]
    record: &'a Record,
    score: Option<Score>,
}

/// Only the score is read back when resuming
#[derive(Deserialize)]
struct ScoredLine {
    #[serde(default)]
    score: Option<Score>,
}

/// Load records from a newline-delimited JSON file
///
/// Blank lines are skipped. Any malformed line fails the whole load.
pub fn load(path: &Path) -> Result<Vec<Record>> {
    let file = open_existing(path)?;
    let mut records = Vec::new();

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut record: Record =
            serde_json::from_str(&line).map_err(|e| parse_error(path, i, e))?;
        for key in RESERVED_KEYS {
            if record.extra.remove(key).is_some() {
                debug!(line = i + 1, key, "Dropped reserved key from input record");
            }
        }
        records.push(record);
    }

    Ok(records)
}

/// Read prior scores from an output file
///
/// Returns one entry per record. A missing file means nothing is scored yet.
/// Lines past `records.len()` are ignored; a short file leaves the tail unscored.
pub fn resume(path: &Path, records: &[Record]) -> Result<Vec<Option<Score>>> {
    let mut scores = vec![None; records.len()];

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No prior output at {}", path.display());
            return Ok(scores);
        }
        Err(e) => return Err(e.into()),
    };

    let mut next = 0;
    for (i, line) in BufReader::new(file).lines().enumerate() {
        if next >= scores.len() {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let scored: ScoredLine =
            serde_json::from_str(&line).map_err(|e| parse_error(path, i, e))?;
        scores[next] = scored.score;
        next += 1;
    }

    Ok(scores)
}

/// Write every record with its score, replacing the output file atomically
pub fn persist(path: &Path, records: &[Record], scores: &[Option<Score>]) -> Result<()> {
    if records.len() != scores.len() {
        return Err(Error::Internal(format!(
            "record/score length mismatch: {} vs {}",
            records.len(),
            scores.len()
        )));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        for (record, score) in records.iter().zip(scores) {
            serde_json::to_writer(
                &mut writer,
                &OutputLine {
                    record,
                    score: *score,
                },
            )?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(())
}

/// Unique, non-empty font names in sorted order
pub fn unique_fonts(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|r| r.font.as_deref())
        .filter(|f| !f.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn open_existing(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}

fn parse_error(path: &Path, index: usize, e: serde_json::Error) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line: index + 1,
        message: e.to_string(),
    }
}

/// Input and output files of one job
#[derive(Debug, Clone)]
pub struct DatasetStore {
    input: PathBuf,
    output: PathBuf,
}

impl DatasetStore {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn load(&self) -> Result<Vec<Record>> {
        load(&self.input)
    }

    pub fn resume(&self, records: &[Record]) -> Result<Vec<Option<Score>>> {
        resume(&self.output, records)
    }

    pub fn persist(&self, records: &[Record], scores: &[Option<Score>]) -> Result<()> {
        persist(&self.output, records, scores)
    }

    /// Load records and resume their scores
    pub fn open(&self) -> Result<(Vec<Record>, Vec<Option<Score>>)> {
        let records = self.load()?;
        let scores = self.resume(&records)?;
        info!(
            "Loaded {} pairs, {} already scored",
            records.len(),
            count_scored(&scores)
        );
        Ok((records, scores))
    }
}
