use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ctfc_model::{CheckResult, Invocation, Round, TeamId};
use serde::{Serialize, de::DeserializeOwned};
use tokio::net::TcpStream;

use crate::{
    control::Control,
    error::{CheckError, RuntimeError},
    net,
    state::StateStore,
};

pub type CheckOutcome = Result<CheckResult, CheckError>;

/// Service-specific check logic, supplied by each competition.
///
/// Return a [`CheckResult`] for anything the service did (or failed to do)
/// and an error only when the check itself could not be carried out.
/// Network errors turn into `DOWN`; every other error aborts the run.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Stores the flag of `round` in the service.
    async fn place_flag(&self, ctx: &CheckContext, round: Round) -> CheckOutcome;

    /// Checks general service functionality.
    async fn check_service(&self, ctx: &CheckContext) -> CheckOutcome;

    /// Retrieves the flag of `round` and compares it to the expected one.
    async fn check_flag(&self, ctx: &CheckContext, round: Round) -> CheckOutcome;
}

/// Everything a checker may need during one run.
pub struct CheckContext {
    invocation: Invocation,
    timeout: Duration,
    control: Arc<Control>,
}

impl CheckContext {
    pub fn new(invocation: Invocation, timeout: Duration, control: Arc<Control>) -> Self {
        Self {
            invocation,
            timeout,
            control,
        }
    }

    /// Address of the team's vulnbox.
    pub fn target(&self) -> &str {
        &self.invocation.target
    }

    pub fn team(&self) -> TeamId {
        self.invocation.team
    }

    /// Round this run was started for.
    pub fn round(&self) -> Round {
        self.invocation.round
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Flag of `round` for this team and service, usable for placement and checks.
    pub fn flag(&self, round: Round) -> Result<String, RuntimeError> {
        self.control.flag(round)
    }

    pub fn set_flag_id(&self, data: &str) -> Result<(), RuntimeError> {
        self.control.set_flag_id(data)
    }

    pub fn store_state<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), RuntimeError> {
        StateStore::new(&self.control).store(key, value)
    }

    pub fn load_state<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RuntimeError> {
        StateStore::new(&self.control).load(key)
    }

    /// Connects to `port` on the target within the run's timeout.
    pub async fn connect(&self, port: u16) -> Result<TcpStream, CheckError> {
        net::dial((self.target(), port), self.timeout).await
    }

    /// HTTP client bounded by the run's timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, CheckError> {
        net::http_client(self.timeout)
    }
}
