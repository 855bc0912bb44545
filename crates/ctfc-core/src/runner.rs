use std::fmt;

use ctfc_model::{CheckResult, Round};
use tracing::{info, instrument, warn};

use crate::{
    checker::{CheckContext, Checker},
    error::{CheckError, RuntimeError},
    net,
};

/// Number of past rounds whose flags are re-checked.
pub const LOOKBACK: Round = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Placement,
    Liveness,
    Retrieval(Round),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Placement => f.write_str("flag placement"),
            Phase::Liveness => f.write_str("service check"),
            Phase::Retrieval(round) => write!(f, "flag check of tick {round}"),
        }
    }
}

struct StepError {
    phase: Phase,
    source: CheckError,
}

/// Drives a [`Checker`] through one round of one team.
///
/// Placement, service check and the retrieval window run strictly in this
/// order; the first non-`OK` verdict ends the run. An older round whose flag
/// is merely missing only downgrades the final verdict to `RECOVERING`.
pub struct Verifier<'a, C: ?Sized> {
    checker: &'a C,
    lookback: Round,
}

impl<'a, C> Verifier<'a, C>
where
    C: Checker + ?Sized,
{
    pub fn new(checker: &'a C) -> Self {
        Self {
            checker,
            lookback: LOOKBACK,
        }
    }

    pub fn with_lookback(mut self, lookback: Round) -> Self {
        self.lookback = lookback;
        self
    }

    /// Runs all phases and reduces them to one verdict.
    ///
    /// Network failures become [`CheckResult::Down`]; any other checker
    /// error is returned as a [`RuntimeError`].
    #[instrument(level = "debug", skip_all, fields(team = ctx.team(), tick = ctx.round()))]
    pub async fn run(&self, ctx: &CheckContext) -> Result<CheckResult, RuntimeError> {
        match self.steps(ctx).await {
            Ok(result) => Ok(result),
            Err(e) if net::is_network_error(&e.source) => {
                warn!(phase = %e.phase, error = %e.source, "Connection error during check");
                Ok(CheckResult::Down)
            }
            Err(StepError {
                source: CheckError::Runtime(e),
                ..
            }) => Err(e),
            Err(e) => Err(RuntimeError::Checker {
                phase: e.phase.to_string(),
                source: Box::new(e.source),
            }),
        }
    }

    async fn steps(&self, ctx: &CheckContext) -> Result<CheckResult, StepError> {
        let tick = ctx.round();

        info!("Placing flag");
        let result = self
            .checker
            .place_flag(ctx, tick)
            .await
            .map_err(at(Phase::Placement))?;
        info!("Flag placement result: {result}");
        if !result.is_ok() {
            return Ok(result);
        }

        info!("Checking service");
        let result = self
            .checker
            .check_service(ctx)
            .await
            .map_err(at(Phase::Liveness))?;
        info!("Service check result: {result}");
        if !result.is_ok() {
            return Ok(result);
        }

        let oldest = tick.saturating_sub(self.lookback);
        let mut recovering = false;

        for cur in (oldest..=tick).rev() {
            info!("Checking flag of tick {cur}");
            let result = self
                .checker
                .check_flag(ctx, cur)
                .await
                .map_err(at(Phase::Retrieval(cur)))?;
            info!("Flag check result of tick {cur}: {result}");

            match result {
                CheckResult::Ok => {}
                CheckResult::FlagNotFound if cur != tick => recovering = true,
                other => return Ok(other),
            }
        }

        Ok(if recovering {
            CheckResult::Recovering
        } else {
            CheckResult::Ok
        })
    }
}

fn at(phase: Phase) -> impl FnOnce(CheckError) -> StepError {
    move |source| StepError { phase, source }
}
