//! Outbound networking with bounded time, and recognition of network failures.

use std::{error::Error as StdError, future::Future, io, time::Duration};

use tokio::{
    net::{TcpStream, ToSocketAddrs},
    time::error::Elapsed,
};

use ctfc_ipc::IpcError;

use crate::error::{CheckError, RuntimeError};

/// Errnos that mean the target is unreachable rather than broken.
#[cfg(unix)]
const CONN_ERRNOS: &[i32] = &[
    libc::EACCES,
    libc::ECONNABORTED,
    libc::ECONNREFUSED,
    libc::ECONNRESET,
    libc::EHOSTDOWN,
    libc::EHOSTUNREACH,
    libc::ENETDOWN,
    libc::ENETRESET,
    libc::ENETUNREACH,
    libc::EPIPE,
    libc::ETIMEDOUT,
];

#[cfg(not(unix))]
const CONN_ERRNOS: &[i32] = &[];

/// Opens a TCP connection, giving up after `timeout`.
pub async fn dial<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<TcpStream, CheckError> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr)).await??;
    Ok(stream)
}

/// Runs `fut`, failing with [`CheckError::Timeout`] after `timeout`.
pub async fn bounded<F, T, E>(timeout: Duration, fut: F) -> Result<T, CheckError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<CheckError>,
{
    tokio::time::timeout(timeout, fut).await?.map_err(Into::into)
}

/// HTTP client whose connects and requests are bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, CheckError> {
    let client = reqwest::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Whether `err` means the service is unreachable (verdict `DOWN`).
///
/// Wrapped errors are classified by the outermost recognizable cause. A
/// runtime or control channel failure anywhere in the chain is never a
/// network error, whatever it wraps.
pub fn is_network_error(err: &CheckError) -> bool {
    match err {
        CheckError::Timeout(_) => true,
        CheckError::Io(e) => is_conn_io_error(e),
        CheckError::Http(e) => is_conn_http_error(e),
        CheckError::Decode(_) | CheckError::Runtime(_) => false,
        CheckError::Other(e) => verdict(e.chain()),
    }
}

fn is_conn_io_error(e: &io::Error) -> bool {
    use io::ErrorKind::*;

    if matches!(
        e.kind(),
        ConnectionRefused
            | ConnectionReset
            | ConnectionAborted
            | HostUnreachable
            | NetworkUnreachable
            | NetworkDown
            | BrokenPipe
            | TimedOut
            | UnexpectedEof
    ) {
        return true;
    }
    if e.raw_os_error().is_some_and(|code| CONN_ERRNOS.contains(&code)) {
        return true;
    }
    // io::Error::other(..) and friends
    e.get_ref().is_some_and(|inner| verdict(chain(inner)))
}

fn is_conn_http_error(e: &reqwest::Error) -> bool {
    if e.is_timeout() || e.is_connect() {
        return true;
    }
    e.source().is_some_and(|inner| verdict(chain(inner)))
}

/// First decision found along `causes`; undecided chains are not network errors.
fn verdict<'a>(mut causes: impl Iterator<Item = &'a (dyn StdError + 'static)>) -> bool {
    causes.find_map(classify).unwrap_or(false)
}

/// `Some` when `cause` settles the classification, `None` to look deeper.
fn classify(cause: &(dyn StdError + 'static)) -> Option<bool> {
    if cause.is::<RuntimeError>() || cause.is::<IpcError>() {
        return Some(false);
    }
    if let Some(e) = cause.downcast_ref::<CheckError>() {
        return Some(is_network_error(e));
    }
    if let Some(e) = cause.downcast_ref::<io::Error>() {
        return Some(is_conn_io_error(e));
    }
    if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
        return Some(is_conn_http_error(e));
    }
    if let Some(e) = cause.downcast_ref::<hyper::Error>() {
        // Peer hung up before a complete response.
        if e.is_incomplete_message() || e.is_closed() {
            return Some(true);
        }
        return None;
    }
    cause.downcast_ref::<Elapsed>().map(|_| true)
}

fn chain<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}
