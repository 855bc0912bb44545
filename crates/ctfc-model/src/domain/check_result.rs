use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of a check, shared with the scoring system.
///
/// The numeric codes map directly onto the scoring database and onto the
/// `RESULT` action of the controller protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum CheckResult {
    /// Sentinel, never a legitimate terminal value.
    Invalid,
    /// Service works and every checked flag was retrievable.
    Ok,
    /// Network connection failed (timeout, reset, refused, ...).
    Down,
    /// Service is reachable but does not behave as expected.
    Faulty,
    /// A flag could not be retrieved.
    FlagNotFound,
    /// Current round is healthy but older flags went missing.
    Recovering,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown check result code: {0}")]
pub struct UnknownResultCode(pub i8);

impl CheckResult {
    /// Returns the numeric code used on the wire.
    pub fn code(&self) -> i8 {
        match self {
            CheckResult::Invalid => -1,
            CheckResult::Ok => 0,
            CheckResult::Down => 1,
            CheckResult::Faulty => 2,
            CheckResult::FlagNotFound => 3,
            CheckResult::Recovering => 4,
        }
    }

    /// Returns the symbolic name of the result.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckResult::Invalid => "INVALID",
            CheckResult::Ok => "OK",
            CheckResult::Down => "DOWN",
            CheckResult::Faulty => "FAULTY",
            CheckResult::FlagNotFound => "FLAG_NOT_FOUND",
            CheckResult::Recovering => "RECOVERING",
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckResult::Ok)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CheckResult> for i8 {
    fn from(r: CheckResult) -> Self {
        r.code()
    }
}

impl TryFrom<i8> for CheckResult {
    type Error = UnknownResultCode;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(CheckResult::Invalid),
            0 => Ok(CheckResult::Ok),
            1 => Ok(CheckResult::Down),
            2 => Ok(CheckResult::Faulty),
            3 => Ok(CheckResult::FlagNotFound),
            4 => Ok(CheckResult::Recovering),
            other => Err(UnknownResultCode(other)),
        }
    }
}
