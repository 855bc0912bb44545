//! Client-side runtime for attack/defense service checkers.
//!
//! A checker implements [`Checker`]; [`run_check`] drives it through flag
//! placement, a service check and flag retrieval over a lookback window, and
//! reports the verdict to the controller (or prints it when run standalone).

pub mod config;
pub use config::RuntimeConfig;

mod error;
pub use error::{CheckError, FlagError, RuntimeError};

pub mod flag;
pub use flag::FlagCodec;

pub mod control;
pub use control::Control;

pub mod state;
pub use state::StateStore;

pub mod net;

mod checker;
pub use checker::{CheckContext, CheckOutcome, Checker};

mod runner;
pub use runner::{LOOKBACK, Verifier};

mod entry;
pub use entry::{execute, run_check};

pub use ctfc_model::{CheckResult, Invocation, Round, TeamId, UsageError};

#[cfg(test)]
pub(crate) mod testutil;

pub mod prelude {
    pub use crate::{
        CheckContext, CheckError, CheckOutcome, CheckResult, Checker, Round, TeamId, run_check,
    };
    pub use async_trait::async_trait;
}
