//! Routing of every controller-backed operation.
//!
//! The mode is fixed when the [`Control`] is built: either all operations go
//! through the controller channel, or all of them use their local fallback.

use std::sync::Arc;

use ctfc_ipc::{Action, FlagParam, IpcChannel, IpcError, StoreParam};
use ctfc_model::{CheckResult, Invocation, Round, TeamId};
use tracing::info;

use crate::{
    config::RuntimeConfig, error::RuntimeError, flag::FlagCodec, state::LocalStateFile,
};

/// Longest flag id the controller accepts.
pub const MAX_FLAG_ID_LEN: usize = 200;

pub enum Control {
    /// Launched by a controller.
    Controller(Arc<IpcChannel>),
    /// Local development run.
    Standalone(Standalone),
}

pub struct Standalone {
    codec: FlagCodec,
    team: TeamId,
    state: LocalStateFile,
}

impl Control {
    /// Builds the handle for this process according to `cfg`.
    pub fn open(cfg: &RuntimeConfig, invocation: &Invocation) -> Result<Self, RuntimeError> {
        if cfg.controller {
            let channel = IpcChannel::from_fds(cfg.ipc_in_fd, cfg.ipc_out_fd)?;
            return Ok(Self::controller(Arc::new(channel)));
        }

        Ok(Self::standalone(
            FlagCodec::new(cfg.flag_secret.clone(), cfg.flag_kind),
            invocation.team,
            LocalStateFile::new(cfg.state_path(invocation.team)),
        ))
    }

    pub fn controller(channel: Arc<IpcChannel>) -> Self {
        Control::Controller(channel)
    }

    pub fn standalone(codec: FlagCodec, team: TeamId, state: LocalStateFile) -> Self {
        Control::Standalone(Standalone { codec, team, state })
    }

    pub fn is_controller(&self) -> bool {
        matches!(self, Control::Controller(_))
    }

    pub fn channel(&self) -> Option<&Arc<IpcChannel>> {
        match self {
            Control::Controller(channel) => Some(channel),
            Control::Standalone(_) => None,
        }
    }

    /// Flag of `round` for the team and service of this run.
    pub fn flag(&self, round: Round) -> Result<String, RuntimeError> {
        match self {
            Control::Controller(channel) => channel
                .request::<_, String>(Action::Flag, &FlagParam { tick: round })?
                .ok_or_else(|| {
                    IpcError::UnexpectedResponse {
                        action: Action::Flag.as_str(),
                        reason: "no flag in response".into(),
                    }
                    .into()
                }),
            Control::Standalone(local) => Ok(local.codec.derive(round, local.team)),
        }
    }

    /// Records the auxiliary identifier of the flag placed in this run.
    pub fn set_flag_id(&self, data: &str) -> Result<(), RuntimeError> {
        if data.len() > MAX_FLAG_ID_LEN {
            return Err(RuntimeError::FlagIdTooLong {
                len: data.len(),
                max: MAX_FLAG_ID_LEN,
            });
        }

        match self {
            Control::Controller(channel) => {
                channel.send_recv(Action::FlagId, &data)?;
            }
            Control::Standalone(_) => info!("Storing Flag ID: {data:?}"),
        }
        Ok(())
    }

    /// Persists an already encoded state entry.
    pub fn store_encoded(&self, key: &str, data: String) -> Result<(), RuntimeError> {
        match self {
            Control::Controller(channel) => {
                let param = StoreParam {
                    key: key.to_owned(),
                    data,
                };
                channel.send_recv(Action::Store, &param)?;
                Ok(())
            }
            Control::Standalone(local) => local.state.store(key, data),
        }
    }

    /// Retrieves an encoded state entry, `None` if it was never stored.
    pub fn load_encoded(&self, key: &str) -> Result<Option<String>, RuntimeError> {
        match self {
            Control::Controller(channel) => Ok(channel.request::<_, String>(Action::Load, &key)?),
            Control::Standalone(local) => local.state.load(key),
        }
    }

    /// Delivers the final verdict. Nothing may be sent after this.
    pub fn report(&self, result: CheckResult) -> Result<(), RuntimeError> {
        match self {
            Control::Controller(channel) => {
                channel.send_recv(Action::Result, &result)?;
            }
            Control::Standalone(_) => {
                info!(result = %result, "Check result");
                println!("Check result: {result}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use ctfc_ipc::LogParam;
    use serde_json::json;

    use crate::testutil::{MockController, standalone};

    #[test]
    fn controller_flag_comes_from_controller() {
        let mock = MockController::spawn().with_flag(8, "FLAG_from_controller");
        let control = Control::controller(mock.channel());

        assert_eq!(control.flag(8).unwrap(), "FLAG_from_controller");
        assert_eq!(mock.requests()[0], json!({"action": "FLAG", "param": {"tick": 8}}));
    }

    #[test]
    fn missing_controller_flag_is_fatal() {
        let mock = MockController::spawn();
        let control = Control::controller(mock.channel());

        let err = control.flag(3).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Ipc(IpcError::UnexpectedResponse { action: "FLAG", .. })
        ));
    }

    #[test]
    fn standalone_flag_is_derived_locally() {
        let (_dir, control) = standalone(4);
        assert_eq!(control.flag(10).unwrap(), FlagCodec::dev().derive(10, 4));
        assert!(!control.is_controller());
        assert!(control.channel().is_none());
    }

    #[test]
    fn flag_id_is_acknowledged() {
        let mock = MockController::spawn();
        let control = Control::controller(mock.channel());

        control.set_flag_id("user-1337").unwrap();
        assert_eq!(
            mock.requests()[0],
            json!({"action": "FLAGID", "param": "user-1337"})
        );
    }

    #[test]
    fn overlong_flag_id_is_rejected_before_sending() {
        let mock = MockController::spawn();
        let control = Control::controller(mock.channel());

        let err = control.set_flag_id(&"x".repeat(201)).unwrap_err();
        assert!(matches!(err, RuntimeError::FlagIdTooLong { len: 201, max: 200 }));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn result_is_reported_as_numeric_code() {
        let mock = MockController::spawn();
        let control = Control::controller(mock.channel());

        control.report(CheckResult::Recovering).unwrap();
        assert_eq!(mock.requests()[0], json!({"action": "RESULT", "param": 4}));
    }

    #[test]
    fn closed_controller_is_fatal() {
        let mock = MockController::spawn();
        let control = Control::controller(mock.channel());
        mock.shutdown();

        let err = control.report(CheckResult::Ok).unwrap_err();
        assert!(matches!(err, RuntimeError::Ipc(_)));
    }

    #[test]
    fn logs_never_split_a_request_from_its_response() {
        let mock = MockController::spawn();
        let channel = mock.channel();

        let logger = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for i in 0..500 {
                    let param = LogParam {
                        message: format!("background {i}"),
                        ..Default::default()
                    };
                    channel.send(Action::Log, &param).unwrap();
                }
            })
        };

        for i in 0..100 {
            let store = StoreParam {
                key: format!("k{i}"),
                data: format!("v{i}"),
            };
            let ack: Option<String> = channel.request(Action::Store, &store).unwrap();
            assert_eq!(ack, None);

            let loaded: Option<String> = channel.request(Action::Load, &store.key).unwrap();
            assert_eq!(loaded.as_deref(), Some(store.data.as_str()), "round trip {i}");
        }
        logger.join().unwrap();

        // Answered only after every earlier line has been consumed.
        let last: Option<String> = channel.request(Action::Load, &"k99").unwrap();
        assert_eq!(last.as_deref(), Some("v99"));

        let actions: Vec<_> = mock
            .requests()
            .iter()
            .map(|r| r["action"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(actions.iter().filter(|a| *a == "LOG").count(), 500);
        assert_eq!(actions.len(), 500 + 201);
    }
}
