use std::{path::PathBuf, time::Duration};

use ctfc_model::TeamId;
use ctfc_observe::LoggerConfig;

use crate::{flag, runner::LOOKBACK};

/// Presence of this variable means the process was launched by a controller.
pub const ENV_CONTROLLER: &str = "CTF_CHECKERSCRIPT";

/// Descriptors pre-opened by the controller.
pub const IPC_IN_FD: i32 = 3;
pub const IPC_OUT_FD: i32 = 4;

/// Bound for every outbound network operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Route everything through the controller instead of local fallbacks.
    pub controller: bool,
    pub ipc_in_fd: i32,
    pub ipc_out_fd: i32,
    pub timeout: Duration,
    /// Number of past rounds re-checked alongside the current one.
    pub lookback: u64,
    /// Directory of the standalone state file.
    pub state_dir: PathBuf,
    /// Standalone only; the controller owns the real secret.
    pub flag_secret: Vec<u8>,
    pub flag_kind: u32,
    pub logger: LoggerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            controller: false,
            ipc_in_fd: IPC_IN_FD,
            ipc_out_fd: IPC_OUT_FD,
            timeout: DEFAULT_TIMEOUT,
            lookback: LOOKBACK,
            state_dir: PathBuf::from("."),
            flag_secret: flag::DEV_SECRET.to_vec(),
            flag_kind: flag::DEV_FLAG_KIND,
            logger: LoggerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let logger = LoggerConfig::from_env().unwrap_or_else(|e| {
            eprintln!("ignoring logger settings: {e}");
            LoggerConfig::default()
        });

        Self {
            controller: std::env::var_os(ENV_CONTROLLER).is_some(),
            logger,
            ..Self::default()
        }
    }

    /// Standalone state file of `team`.
    pub fn state_path(&self, team: TeamId) -> PathBuf {
        self.state_dir.join(format!("_{team}_state.json"))
    }
}
