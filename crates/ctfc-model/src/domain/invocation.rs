use std::str::FromStr;

use thiserror::Error;

use crate::{Round, TeamId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("usage: {program} <ip> <team-net-no> <tick>")]
    WrongArgCount { program: String },
    #[error("invalid team net number: {0}")]
    InvalidTeam(String),
    #[error("invalid tick: {0}")]
    InvalidRound(String),
}

/// One checker invocation: which target, which team, which round.
///
/// Created fresh for every process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub target: String,
    pub team: TeamId,
    pub round: Round,
}

impl Invocation {
    /// Parses the three positional arguments `<ip> <team-net-no> <tick>`.
    ///
    /// The first item of `args` is the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let program = args
            .first()
            .cloned()
            .unwrap_or_else(|| "checker".to_string());

        let [_, target, team, round] = args.as_slice() else {
            return Err(UsageError::WrongArgCount { program });
        };

        let team = TeamId::from_str(team).map_err(|_| UsageError::InvalidTeam(team.clone()))?;
        let round = Round::from_str(round).map_err(|_| UsageError::InvalidRound(round.clone()))?;

        Ok(Self {
            target: target.clone(),
            team,
            round,
        })
    }
}
