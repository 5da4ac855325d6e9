//! Transport — the HTTP surface the tailing reader needs.
//!
//! [`FileTransport`] is implemented by [`super::live::LiveTransport`]
//! (reqwest) and by [`super::fake::FakeTransport`] for tests.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{LogError, Result};

pub type TransportFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = Result<T>> + Send + 'a>>;

/// A successful (2xx) GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResponse {
    /// The server honored the `Range` header.
    pub fn is_partial(&self) -> bool {
        self.status == 206
    }
}

pub trait FileTransport: Send + Sync {
    /// HEAD `url` with the given `Range` value and report the status code.
    /// Only failures to get any response at all are errors.
    fn probe<'a>(&'a self, url: &'a str, range: &'a str) -> TransportFuture<'a, u16>;

    /// GET `url`, with a `Range` header when one is given. Non-2xx statuses
    /// are errors classified by [`check_status`].
    fn fetch<'a>(&'a self, url: &'a str, range: Option<&'a str>) -> TransportFuture<'a, FetchResponse>;

    /// Read timeout shared by every request this transport sends.
    fn read_timeout(&self) -> &ReadTimeout;
}

/// Map a non-2xx fetch status to its error.
pub fn check_status(status: u16, description: &str) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(LogError::from_status(status, description))
    }
}

/// The transport-wide read timeout, widened temporarily for long polls.
///
/// The value is shared: a request issued by another caller while a
/// [`TimeoutOverride`] is alive sees the widened timeout too.
#[derive(Debug)]
pub struct ReadTimeout {
    default: Duration,
    current: RwLock<Duration>,
}

impl ReadTimeout {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            current: RwLock::new(default),
        }
    }

    pub fn current(&self) -> Duration {
        *self.current.read()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default
    }

    /// Use `timeout` until the returned guard drops.
    pub fn widen(&self, timeout: Duration) -> TimeoutOverride<'_> {
        *self.current.write() = timeout;
        TimeoutOverride { read_timeout: self }
    }
}

/// Restores the default read timeout when dropped.
#[must_use = "the widened timeout is reverted as soon as the guard drops"]
pub struct TimeoutOverride<'a> {
    read_timeout: &'a ReadTimeout,
}

impl Drop for TimeoutOverride<'_> {
    fn drop(&mut self) {
        *self.read_timeout.current.write() = self.read_timeout.default;
    }
}
