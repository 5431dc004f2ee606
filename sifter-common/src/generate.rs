//! Job input generation
//!
//! Builds `input.jsonl` files for labeling jobs. The stock job compares every
//! unordered pair of alphanumeric characters in each of two fonts.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dataset::Record;
use crate::Result;

/// a-z, A-Z, 0-9
pub fn alphanumeric_chars() -> Vec<char> {
    ('a'..='z').chain('A'..='Z').chain('0'..='9').collect()
}

pub const ALL_CHARS_FONTS: [&str; 2] = ["Roboto", "Roboto Mono"];
pub const ALL_CHARS_JOB: &str = "001-all-chars";

/// Every unordered pair of `chars` (in order of appearance), once per font
pub fn pairwise_records(chars: &[char], fonts: &[&str]) -> Vec<Record> {
    let mut records = Vec::with_capacity(fonts.len() * chars.len() * chars.len() / 2);
    for font in fonts {
        for (i, a) in chars.iter().enumerate() {
            for b in &chars[i + 1..] {
                records.push(Record::new(a.to_string(), b.to_string(), Some(*font)));
            }
        }
    }
    records
}

/// Write records as `input.jsonl`, creating parent directories
pub fn write_input(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
