//! Advertisement reference numbers.
//!
//! A reference is 16 ASCII digits: the newspaper serial zero-padded to five
//! digits followed by an 11-digit per-newspaper sequence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const PREFIX_DIGITS: usize = 5;
pub const SEQUENCE_DIGITS: usize = 11;
pub const REFERENCE_DIGITS: usize = PREFIX_DIGITS + SEQUENCE_DIGITS;

const MAX_SERIAL: u32 = 99_999;
const MAX_SEQUENCE: u64 = 99_999_999_999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("newspaper serial {0} does not fit in {PREFIX_DIGITS} digits")]
    SerialOutOfRange(i64),
    #[error("reference number must be {REFERENCE_DIGITS} digits")]
    Malformed,
    #[error("reference sequence for prefix {0} is exhausted")]
    SequenceExhausted(String),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
    /// Five-digit prefix for a newspaper serial.
    pub fn prefix(serial: i64) -> Result<String, ReferenceError> {
        if !(0..=i64::from(MAX_SERIAL)).contains(&serial) {
            return Err(ReferenceError::SerialOutOfRange(serial));
        }
        Ok(format!("{serial:0>width$}", width = PREFIX_DIGITS))
    }

    /// Reference following `last` under `prefix`, or the first one when
    /// there is none yet.
    pub fn next_after(prefix: &str, last: Option<&str>) -> Result<Self, ReferenceError> {
        if prefix.len() != PREFIX_DIGITS || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ReferenceError::Malformed);
        }
        let next = match last {
            None => 1,
            Some(last) => {
                let parsed = Self::parse(last)?;
                parsed.sequence() + 1
            }
        };
        if next > MAX_SEQUENCE {
            return Err(ReferenceError::SequenceExhausted(prefix.to_string()));
        }
        Ok(Self(format!(
            "{prefix}{next:0>width$}",
            width = SEQUENCE_DIGITS
        )))
    }

    pub fn parse(value: &str) -> Result<Self, ReferenceError> {
        if value.len() == REFERENCE_DIGITS && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value.to_string()))
        } else {
            Err(ReferenceError::Malformed)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix_part(&self) -> &str {
        &self.0[..PREFIX_DIGITS]
    }

    pub fn sequence(&self) -> u64 {
        // Only digit strings are ever constructed.
        self.0[PREFIX_DIGITS..].parse().unwrap_or(0)
    }
}

impl fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReferenceNumber {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceNumber {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferenceNumber> for String {
    fn from(value: ReferenceNumber) -> Self {
        value.0
    }
}
