use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Write},
    net::Shutdown,
    os::unix::net::UnixStream,
    sync::{Arc, Mutex},
    thread,
};

use ctfc_ipc::IpcChannel;
use ctfc_model::TeamId;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{FlagCodec, control::Control, state::LocalStateFile};

/// In-process controller answering on the other end of a socket pair.
///
/// Echoes stored state back on `LOAD`, serves configured flags on `FLAG` and
/// acknowledges everything else except `LOG`.
pub(crate) struct MockController {
    channel: Arc<IpcChannel>,
    peer: UnixStream,
    requests: Arc<Mutex<Vec<Value>>>,
    flags: Arc<Mutex<HashMap<u64, String>>>,
    state: Arc<Mutex<HashMap<String, String>>>,
}

impl MockController {
    pub(crate) fn spawn() -> Self {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let channel = Arc::new(IpcChannel::new(ours.try_clone().unwrap(), ours));

        let mock = Self {
            channel,
            peer: theirs.try_clone().unwrap(),
            requests: Arc::default(),
            flags: Arc::default(),
            state: Arc::default(),
        };

        let requests = Arc::clone(&mock.requests);
        let flags = Arc::clone(&mock.flags);
        let state = Arc::clone(&mock.state);
        thread::spawn(move || serve(theirs, requests, flags, state));

        mock
    }

    pub(crate) fn with_flag(self, tick: u64, flag: &str) -> Self {
        self.flags.lock().unwrap().insert(tick, flag.to_owned());
        self
    }

    pub(crate) fn channel(&self) -> Arc<IpcChannel> {
        Arc::clone(&self.channel)
    }

    pub(crate) fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn stored(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn shutdown(&self) {
        let _ = self.peer.shutdown(Shutdown::Both);
    }
}

fn serve(
    stream: UnixStream,
    requests: Arc<Mutex<Vec<Value>>>,
    flags: Arc<Mutex<HashMap<u64, String>>>,
    state: Arc<Mutex<HashMap<String, String>>>,
) {
    let reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;

    for line in reader.lines() {
        let Ok(line) = line else { break };
        let req: Value = serde_json::from_str(&line).unwrap();
        requests.lock().unwrap().push(req.clone());

        let param = &req["param"];
        let response = match req["action"].as_str() {
            Some("LOG") => continue,
            Some("FLAG") => param["tick"]
                .as_u64()
                .and_then(|tick| flags.lock().unwrap().get(&tick).cloned())
                .map_or(Value::Null, Value::String),
            Some("STORE") => {
                let key = param["key"].as_str().unwrap().to_owned();
                let data = param["data"].as_str().unwrap().to_owned();
                state.lock().unwrap().insert(key, data);
                Value::Null
            }
            Some("LOAD") => param
                .as_str()
                .and_then(|key| state.lock().unwrap().get(key).cloned())
                .map_or(Value::Null, Value::String),
            _ => Value::Null,
        };

        if writeln!(writer, "{}", json!({ "response": response })).is_err() {
            break;
        }
    }
}

/// Standalone control with the dev secret and a fresh state directory.
pub(crate) fn standalone(team: TeamId) -> (TempDir, Control) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("_{team}_state.json"));
    let control = Control::standalone(FlagCodec::dev(), team, LocalStateFile::new(path));
    (dir, control)
}
