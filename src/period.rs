// Period keys - one token per yearly dataset
//
// Ordering: all-digit keys compare numerically and come first,
// anything else compares as text after them. Digit strings are compared
// by significant length then by digits, so keys of any width order by value.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Number of trailing characters of a file stem that name its year
pub const FILE_KEY_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidPeriodKey("period key is empty".to_string()));
        }
        Ok(PeriodKey(trimmed.to_string()))
    }

    /// Derive a key from an uploaded file name
    ///
    /// Takes the part before the first `.` and keeps its last four
    /// characters, so `sales_2023.csv` becomes `2023`.
    pub fn from_file_name(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPeriodKey(format!("{:?} has no file name", path)))?;

        let stem = name.split('.').next().unwrap_or("");
        let chars: Vec<char> = stem.chars().collect();
        let start = chars.len().saturating_sub(FILE_KEY_WIDTH);
        let key: String = chars[start..].iter().collect();

        PeriodKey::new(key)
            .map_err(|_| Error::InvalidPeriodKey(format!("cannot derive a period from {:?}", name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits with leading zeros stripped, for all-digit keys
    fn digits(&self) -> Option<&str> {
        if self.0.bytes().all(|b| b.is_ascii_digit()) {
            Some(self.0.trim_start_matches('0'))
        } else {
            None
        }
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.digits(), other.digits()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        PeriodKey::new(value)
    }
}

impl TryFrom<&str> for PeriodKey {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        PeriodKey::new(value)
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.0
    }
}
