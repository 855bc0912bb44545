use serde::Serialize;

use crate::error::IpcError;

/// Actions understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Fetch the canonical flag of a round.
    Flag,
    /// Record the auxiliary identifier of the placed flag.
    FlagId,
    /// Persist a state entry.
    Store,
    /// Retrieve a state entry.
    Load,
    /// Report the final result. Terminal.
    Result,
    /// Forward a log line. Never answered.
    Log,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Flag => "FLAG",
            Action::FlagId => "FLAGID",
            Action::Store => "STORE",
            Action::Load => "LOAD",
            Action::Result => "RESULT",
            Action::Log => "LOG",
        }
    }
}

#[derive(Debug, Serialize)]
struct Request<'a, P: Serialize> {
    action: Action,
    param: &'a P,
}

/// Param of [`Action::Flag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagParam {
    pub tick: u64,
}

/// Param of [`Action::Store`]. `data` is base64 of the serialized value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreParam {
    pub key: String,
    pub data: String,
}

/// Param of [`Action::Log`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogParam {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levelno: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(rename = "funcName", skip_serializing_if = "Option::is_none")]
    pub func_name: Option<String>,
}

/// Serializes one request into exactly one line.
///
/// Line breaks are removed from the serialized form, never escaped, and a
/// single trailing `\n` is appended.
pub fn encode_line<P: Serialize>(action: Action, param: &P) -> Result<Vec<u8>, IpcError> {
    let mut line = serde_json::to_vec(&Request { action, param }).map_err(|source| {
        IpcError::Encode {
            action: action.as_str(),
            source,
        }
    })?;
    line.retain(|b| *b != b'\n' && *b != b'\r');
    line.push(b'\n');
    Ok(line)
}
