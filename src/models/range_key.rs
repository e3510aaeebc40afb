//! Rank-range identifiers.
//!
//! A range key names one contiguous block of finishing positions, either a
//! single rank (`"1"`) or an inclusive span (`"5-16"`). Operators type these
//! by hand, so parsing is strict about digits but tolerant of reversed spans
//! (`"16-5"` is kept as typed and compared by its greater endpoint).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a range key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeKeyError {
    #[error("malformed range key: {0:?}")]
    Format(String),
}

/// One contiguous block of finishing positions.
///
/// Endpoints are stored in the order the operator typed them; `low()` and
/// `high()` give the normalized bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeKey {
    start: u32,
    end: u32,
}

impl RangeKey {
    /// Build a single-rank key.
    pub fn single(rank: u32) -> Self {
        Self {
            start: rank,
            end: rank,
        }
    }

    /// Build a span key with the endpoints as given.
    pub fn span(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Lowest position covered.
    pub fn low(&self) -> u32 {
        self.start.min(self.end)
    }

    /// Highest position covered.
    pub fn high(&self) -> u32 {
        self.start.max(self.end)
    }

    /// Value used for display ordering: the greater endpoint.
    pub fn sort_value(&self) -> u32 {
        self.high()
    }

    /// Whether the given 1-based position falls inside this key.
    pub fn contains(&self, position: u32) -> bool {
        position >= self.low() && position <= self.high()
    }

    /// Whether two keys cover at least one common position.
    pub fn overlaps(&self, other: &RangeKey) -> bool {
        self.low() <= other.high() && other.low() <= self.high()
    }

    /// Display ordering: descending by the greater endpoint, so the widest
    /// tail range sorts first and rank 1 sorts last. Callers that want the
    /// top of the table first iterate the sorted sequence as-is; the UI
    /// ascending view is the reverse.
    pub fn compare_for_display(a: &RangeKey, b: &RangeKey) -> Ordering {
        b.sort_value().cmp(&a.sort_value())
    }
}

fn parse_endpoint(text: &str, original: &str) -> Result<u32, RangeKeyError> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(RangeKeyError::Format(original.to_string()));
    }
    let value: u32 = text
        .parse()
        .map_err(|_| RangeKeyError::Format(original.to_string()))?;
    if value == 0 {
        // Rank positions start at 1.
        return Err(RangeKeyError::Format(original.to_string()));
    }
    Ok(value)
}

impl FromStr for RangeKey {
    type Err = RangeKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('-') {
            Some((first, second)) => {
                let start = parse_endpoint(first, s)?;
                let end = parse_endpoint(second, s)?;
                Ok(Self { start, end })
            }
            None => {
                let rank = parse_endpoint(trimmed, s)?;
                Ok(Self::single(rank))
            }
        }
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl TryFrom<String> for RangeKey {
    type Error = RangeKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RangeKey> for String {
    fn from(key: RangeKey) -> String {
        key.to_string()
    }
}
