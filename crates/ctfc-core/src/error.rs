use std::path::PathBuf;

use ctfc_ipc::IpcError;
use ctfc_model::UsageError;
use thiserror::Error;

/// Error returned by checker operations.
///
/// Network failures among these are folded into a `DOWN` verdict; anything
/// else aborts the run.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("operation timed out")]
    Timeout(#[from] tokio::time::error::Elapsed),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Unrecoverable runtime defect, as opposed to a competition verdict.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("control channel failure: {0}")]
    Ipc(#[from] IpcError),
    #[error("state file {path}: {source}")]
    StateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {path} is not a JSON object of strings: {source}")]
    StateFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize state {key:?}: {source}")]
    StateEncode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode state {key:?}: {reason}")]
    StateDecode { key: String, reason: String },
    #[error("flag id must not be longer than {max} bytes (got {len})")]
    FlagIdTooLong { len: usize, max: usize },
    #[error("unexpected error during {phase}: {source}")]
    Checker {
        phase: String,
        #[source]
        source: Box<CheckError>,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlagError {
    #[error("flag does not match the expected format")]
    InvalidFormat,
    #[error("flag authentication tag does not match")]
    InvalidMac,
}
