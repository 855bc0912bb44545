//! Persistent per-(team, service) state.
//!
//! Values are serialized to JSON and base64-encoded before they leave the
//! process, whether they go to the controller or to the local state file, so
//! both backends hold the same representation.

use std::{collections::BTreeMap, fs, io, path::PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{control::Control, error::RuntimeError};

/// Typed access to the state of the current team and service.
pub struct StateStore<'a> {
    control: &'a Control,
}

impl<'a> StateStore<'a> {
    pub fn new(control: &'a Control) -> Self {
        Self { control }
    }

    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), RuntimeError> {
        let encoded = encode(key, value)?;
        self.control.store_encoded(key, encoded)
    }

    /// Returns `None` when nothing was stored under `key`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RuntimeError> {
        match self.control.load_encoded(key)? {
            Some(encoded) => decode(key, &encoded).map(Some),
            None => Ok(None),
        }
    }
}

pub fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, RuntimeError> {
    let json = serde_json::to_vec(value).map_err(|source| RuntimeError::StateEncode {
        key: key.to_owned(),
        source,
    })?;
    Ok(STANDARD.encode(json))
}

pub fn decode<T: DeserializeOwned>(key: &str, encoded: &str) -> Result<T, RuntimeError> {
    let raw = STANDARD
        .decode(encoded)
        .map_err(|e| RuntimeError::StateDecode {
            key: key.to_owned(),
            reason: e.to_string(),
        })?;
    serde_json::from_slice(&raw).map_err(|e| RuntimeError::StateDecode {
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

/// JSON object of key to encoded payload, rewritten wholesale on every store.
///
/// Used only when no controller is attached.
pub struct LocalStateFile {
    path: PathBuf,
}

impl LocalStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn store(&self, key: &str, encoded: String) -> Result<(), RuntimeError> {
        let mut entries = self.read()?;
        entries.insert(key.to_owned(), encoded);

        let json = serde_json::to_string_pretty(&entries).map_err(|source| {
            RuntimeError::StateFormat {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|source| RuntimeError::StateFile {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), key, "state stored");
        Ok(())
    }

    pub fn load(&self, key: &str) -> Result<Option<String>, RuntimeError> {
        let mut entries = self.read()?;
        Ok(entries.remove(key))
    }

    // A missing file is an empty store.
    fn read(&self) -> Result<BTreeMap<String, String>, RuntimeError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(RuntimeError::StateFile {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| RuntimeError::StateFormat {
            path: self.path.clone(),
            source,
        })
    }
}
