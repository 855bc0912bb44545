use std::{
    io::{BufRead, BufReader, Read, Write},
    sync::{Mutex, MutexGuard},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    error::IpcError,
    message::{Action, encode_line},
};

/// Duplex, line-framed channel to the controller.
///
/// A single lock covers a whole request and, for [`IpcChannel::send_recv`],
/// its paired response, so concurrent callers never interleave on the wire.
/// The lock is not reentrant: nothing may log through this channel while
/// holding it.
pub struct IpcChannel {
    wire: Mutex<Wire>,
}

struct Wire {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl IpcChannel {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            wire: Mutex::new(Wire {
                reader: Box::new(BufReader::new(reader)),
                writer: Box::new(writer),
            }),
        }
    }

    /// Adopts descriptors pre-opened by the controller.
    #[cfg(unix)]
    pub fn from_fds(in_fd: i32, out_fd: i32) -> Result<Self, IpcError> {
        use std::{fs::File, os::fd::FromRawFd};

        for fd in [in_fd, out_fd] {
            // SAFETY: F_GETFD only inspects the descriptor table.
            if unsafe { libc::fcntl(fd, libc::F_GETFD) } == -1 {
                return Err(IpcError::BadDescriptor { fd });
            }
        }

        // SAFETY: both descriptors are open and handed over to this process
        // exclusively; nothing else in the process wraps them.
        let (input, output) = unsafe { (File::from_raw_fd(in_fd), File::from_raw_fd(out_fd)) };
        Ok(Self::new(input, output))
    }

    /// Writes one request without waiting for an answer.
    pub fn send<P: Serialize>(&self, action: Action, param: &P) -> Result<(), IpcError> {
        let line = encode_line(action, param)?;
        let mut wire = self.lock()?;
        wire.write_line(&line)
    }

    /// Writes one request and blocks until its response line arrives.
    ///
    /// Returns `None` when the controller answered with `null` or omitted the
    /// response.
    pub fn send_recv<P: Serialize>(
        &self,
        action: Action,
        param: &P,
    ) -> Result<Option<Value>, IpcError> {
        let line = encode_line(action, param)?;
        let mut wire = self.lock()?;
        wire.write_line(&line)?;
        wire.read_response()
    }

    /// Like [`IpcChannel::send_recv`], decoding the response into `T`.
    pub fn request<P, T>(&self, action: Action, param: &P) -> Result<Option<T>, IpcError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        match self.send_recv(action, param)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| IpcError::UnexpectedResponse {
                    action: action.as_str(),
                    reason: e.to_string(),
                }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Wire>, IpcError> {
        self.wire.lock().map_err(|_| IpcError::Poisoned)
    }
}

impl Wire {
    fn write_line(&mut self, line: &[u8]) -> Result<(), IpcError> {
        self.writer.write_all(line)?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_response(&mut self) -> Result<Option<Value>, IpcError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(IpcError::Closed);
        }
        // Anything but a JSON object is rejected here, arrays included.
        let mut resp: Map<String, Value> =
            serde_json::from_str(&line).map_err(IpcError::Malformed)?;
        Ok(resp.remove("response").filter(|v| !v.is_null()))
    }
}
