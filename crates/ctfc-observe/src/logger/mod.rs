mod config;
mod error;
mod format;
mod log;

use std::sync::Arc;

use ctfc_ipc::IpcChannel;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Installs the local logger used when no controller is attached.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => log::Logger::text(cfg),
        LoggerFormat::Json => log::Logger::json(cfg),
    }
}

/// Installs a logger that forwards every event to the controller as `LOG`.
pub fn forward_init(cfg: &LoggerConfig, channel: Arc<IpcChannel>) -> Result<(), LoggerError> {
    log::Logger::forward(cfg, channel)
}
