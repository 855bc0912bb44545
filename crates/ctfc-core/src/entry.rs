use std::sync::Arc;

use ctfc_model::{CheckResult, Invocation};
use ctfc_observe::{forward_init, logger_init};
use tracing::error;

use crate::{
    checker::{CheckContext, Checker},
    config::RuntimeConfig,
    control::Control,
    error::RuntimeError,
    runner::Verifier,
};

/// Process entry for checker binaries.
///
/// Parses `<ip> <team-net-no> <tick>` from the command line, picks the
/// controller or standalone mode from the environment, runs the check and
/// reports the verdict. An `Err` is a runtime defect, never a verdict.
pub async fn run_check<C: Checker>(checker: C) -> Result<CheckResult, RuntimeError> {
    let invocation = Invocation::from_args(std::env::args())?;
    let cfg = RuntimeConfig::from_env();

    let control = Arc::new(Control::open(&cfg, &invocation)?);
    init_logging(&cfg, &control);

    execute(&checker, invocation, &cfg, control).await
}

/// Runs one check with an already established control handle.
pub async fn execute<C>(
    checker: &C,
    invocation: Invocation,
    cfg: &RuntimeConfig,
    control: Arc<Control>,
) -> Result<CheckResult, RuntimeError>
where
    C: Checker + ?Sized,
{
    let ctx = CheckContext::new(invocation, cfg.timeout, Arc::clone(&control));

    let verdict = Verifier::new(checker)
        .with_lookback(cfg.lookback)
        .run(&ctx)
        .await;

    match verdict {
        Ok(result) => {
            control.report(result)?;
            Ok(result)
        }
        Err(e) => {
            error!(error = %e, "check aborted");
            Err(e)
        }
    }
}

fn init_logging(cfg: &RuntimeConfig, control: &Control) {
    let res = match control.channel() {
        Some(channel) => forward_init(&cfg.logger, Arc::clone(channel)),
        None => logger_init(&cfg.logger),
    };
    if let Err(e) = res {
        eprintln!("logger initialization failed: {e}");
    }
}
