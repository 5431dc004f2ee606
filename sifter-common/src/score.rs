//! Ordinal preference score
//!
//! A [`Score`] is always in `1..=5`; out-of-range values are rejected at
//! construction and at deserialization, so a stored score is valid by type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Operator-assigned judgment for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw integer
    pub fn new(value: i64) -> Result<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidScore(format!(
                "score must be {}-{}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of present scores in a score sequence
pub fn count_scored(scores: &[Option<Score>]) -> usize {
    scores.iter().filter(|s| s.is_some()).count()
}

/// Index of the first absent score, or 0 when every record is scored
pub fn first_unscored(scores: &[Option<Score>]) -> usize {
    scores.iter().position(Option::is_none).unwrap_or(0)
}
