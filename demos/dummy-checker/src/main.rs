//! Checker for a toy key/value service speaking a line protocol on port 9999:
//!
//! ```text
//! PING            -> PONG
//! SET <key> <val> -> OK
//! GET <key>       -> <val> | MISSING
//! ```

use std::process::ExitCode;

use ctfc_core::{net, prelude::*};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::debug;

const PORT: u16 = 9999;

struct KvChecker;

impl KvChecker {
    async fn exchange(&self, ctx: &CheckContext, line: &str) -> Result<Option<String>, CheckError> {
        let stream = ctx.connect(PORT).await?;
        net::bounded(ctx.timeout(), roundtrip(stream, line)).await
    }
}

async fn roundtrip(stream: TcpStream, line: &str) -> Result<Option<String>, std::io::Error> {
    let (read, mut write) = stream.into_split();
    write.write_all(format!("{line}\n").as_bytes()).await?;

    let mut lines = BufReader::new(read).lines();
    lines.next_line().await
}

fn key_for(round: Round) -> String {
    format!("tick-{round}")
}

#[async_trait]
impl Checker for KvChecker {
    async fn place_flag(&self, ctx: &CheckContext, round: Round) -> CheckOutcome {
        let flag = ctx.flag(round)?;
        let key = key_for(round);

        let reply = self.exchange(ctx, &format!("SET {key} {flag}")).await?;
        debug!(?reply, "SET answered");
        if reply.as_deref() != Some("OK") {
            return Ok(CheckResult::Faulty);
        }

        ctx.set_flag_id(&key)?;
        ctx.store_state(&key, &flag)?;
        Ok(CheckResult::Ok)
    }

    async fn check_service(&self, ctx: &CheckContext) -> CheckOutcome {
        match self.exchange(ctx, "PING").await?.as_deref() {
            Some("PONG") => Ok(CheckResult::Ok),
            _ => Ok(CheckResult::Faulty),
        }
    }

    async fn check_flag(&self, ctx: &CheckContext, round: Round) -> CheckOutcome {
        // Nothing placed by this checker for that round.
        if ctx.load_state::<String>(&key_for(round))?.is_none() {
            return Ok(CheckResult::FlagNotFound);
        }

        let flag = ctx.flag(round)?;
        match self.exchange(ctx, &format!("GET {}", key_for(round))).await? {
            Some(value) if value == flag => Ok(CheckResult::Ok),
            Some(value) if value == "MISSING" => Ok(CheckResult::FlagNotFound),
            None => Ok(CheckResult::Faulty),
            Some(_) => Ok(CheckResult::FlagNotFound),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run_check(KvChecker).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("checker failed: {e}");
            ExitCode::FAILURE
        }
    }
}
