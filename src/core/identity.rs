//! Record identity: auto-incremented integer ids

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix accepted (and printed in file names) for record ids
pub const RECORD_PREFIX: &str = "CCA";

/// Identifier of an analysis record, assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// The first id a fresh store hands out
    pub const FIRST: RecordId = RecordId(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The id following this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Parse an id from "7", "#7" or "CCA-7"
    pub fn parse(s: &str) -> Result<Self, RecordIdError> {
        s.parse()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = if let Some(rest) = trimmed.strip_prefix('#') {
            rest
        } else if trimmed
            .get(..RECORD_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(RECORD_PREFIX))
        {
            trimmed[RECORD_PREFIX.len()..].trim_start_matches('-')
        } else {
            trimmed
        };

        if digits.is_empty() {
            return Err(RecordIdError::Empty);
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| RecordIdError::NotANumber(s.to_string()))?;

        if value == 0 {
            return Err(RecordIdError::Zero);
        }

        Ok(Self(value))
    }
}

/// Errors that can occur when parsing record ids
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordIdError {
    #[error("record id is empty")]
    Empty,

    #[error("invalid record id '{0}' (expected a number such as 7, #7 or CCA-7)")]
    NotANumber(String),

    #[error("record ids start at 1")]
    Zero,
}
