//! Line-framed JSON channel between a checker process and its controller.
//!
//! Every message is one JSON object on one line. Requests carry an
//! `action` and a `param`; responses carry a single `response` value.

mod channel;
pub use channel::IpcChannel;

mod error;
pub use error::IpcError;

mod message;
pub use message::{Action, FlagParam, LogParam, StoreParam, encode_line};
