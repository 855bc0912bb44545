use thiserror::Error;

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("controller closed the channel")]
    Closed,
    #[error("channel io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode {action} request: {source}")]
    Encode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed controller response: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unexpected response to {action}: {reason}")]
    UnexpectedResponse { action: &'static str, reason: String },
    #[error("controller descriptor {fd} is not open")]
    BadDescriptor { fd: i32 },
    #[error("channel lock poisoned")]
    Poisoned,
}
