use std::io::IsTerminal;

use crate::logger::{error::LoggerError, format::LoggerFormat};

pub const ENV_LOG_LEVEL: &str = "CTF_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CTF_LOG_FORMAT";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stderr().is_terminal();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: false,
            use_color,
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `CTF_LOG_LEVEL` and `CTF_LOG_FORMAT`.
    pub fn from_env() -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            cfg.level = level;
        }
        if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
            cfg.format = format.parse()?;
        }
        Ok(cfg)
    }
}
