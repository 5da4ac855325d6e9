//! Fake — test double for the tailing transport.
//!
//! Provides a deterministic [`FakeTransport`] that implements
//! [`FileTransport`] over in-memory files. Every request is recorded along
//! with the read timeout in effect when it was issued.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex;

use super::transport::{check_status, FetchResponse, FileTransport, ReadTimeout, TransportFuture};
use crate::error::{LogError, Result};

// ── In-memory state ─────────────────────────────────────────────

/// What the fake serves for one URL.
#[derive(Clone, Debug)]
pub enum FakeResource {
    /// A file; `ranges` controls whether `Range` is honored.
    File {
        content: Bytes,
        content_type: Option<String>,
        ranges: bool,
    },
    /// Every request answers with this status and no body.
    Status(u16),
    /// Every request times out.
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FakeMethod {
    Head,
    Get,
}

/// One recorded request.
#[derive(Clone, Debug)]
pub struct FakeRequest {
    pub method: FakeMethod,
    pub url: String,
    pub range: Option<String>,
    pub read_timeout: Duration,
}

#[derive(Default)]
struct Inner {
    resources: HashMap<String, FakeResource>,
    requests: Vec<FakeRequest>,
}

/// A fake file server for deterministic testing. Unknown URLs answer 404.
pub struct FakeTransport {
    inner: Mutex<Inner>,
    read_timeout: ReadTimeout,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            read_timeout: ReadTimeout::new(Duration::from_secs(30)),
        }
    }

    /// Seed a file served with or without range support.
    pub async fn add_file(&self, url: &str, content: impl Into<Bytes>, ranges: bool) {
        self.add_resource(
            url,
            FakeResource::File {
                content: content.into(),
                content_type: None,
                ranges,
            },
        )
        .await;
    }

    /// Seed a body with an explicit content type (served without ranges).
    pub async fn add_typed(&self, url: &str, content_type: &str, content: impl Into<Bytes>) {
        self.add_resource(
            url,
            FakeResource::File {
                content: content.into(),
                content_type: Some(content_type.to_string()),
                ranges: false,
            },
        )
        .await;
    }

    pub async fn add_resource(&self, url: &str, resource: FakeResource) {
        self.inner.lock().await.resources.insert(url.to_string(), resource);
    }

    pub async fn requests(&self) -> Vec<FakeRequest> {
        self.inner.lock().await.requests.clone()
    }

    pub async fn count(&self, method: FakeMethod) -> usize {
        self.inner
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    async fn record(&self, method: FakeMethod, url: &str, range: Option<&str>) -> Option<FakeResource> {
        let mut inner = self.inner.lock().await;
        inner.requests.push(FakeRequest {
            method,
            url: url.to_string(),
            range: range.map(str::to_string),
            read_timeout: self.read_timeout.current(),
        });
        inner.resources.get(url).cloned()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `bytes=a-b`, `bytes=a-` or `bytes=-n` against `len`.
/// `None` means unsatisfiable.
fn resolve_range(range: &str, len: usize) -> Option<(usize, usize)> {
    let spec = range.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    if len == 0 {
        return None;
    }
    let last = len - 1;
    match (start.trim(), end.trim()) {
        ("", suffix) => {
            let n: usize = suffix.parse().ok()?;
            (n > 0).then(|| (len - n.min(len), last))
        }
        (start, "") => {
            let start: usize = start.parse().ok()?;
            (start <= last).then_some((start, last))
        }
        (start, end) => {
            let start: usize = start.parse().ok()?;
            let end: usize = end.parse().ok()?;
            (start <= last && start <= end).then(|| (start, end.min(last)))
        }
    }
}

fn timeout_error(url: &str) -> LogError {
    LogError::Timeout(format!("read of {} timed out", url))
}

// ── FileTransport implementation ────────────────────────────────

impl FileTransport for FakeTransport {
    fn probe<'a>(&'a self, url: &'a str, range: &'a str) -> TransportFuture<'a, u16> {
        Box::pin(async move {
            match self.record(FakeMethod::Head, url, Some(range)).await {
                None => Ok(404),
                Some(FakeResource::Status(status)) => Ok(status),
                Some(FakeResource::Timeout) => Err(timeout_error(url)),
                Some(FakeResource::File { ranges: false, .. }) => Ok(200),
                Some(FakeResource::File { content, .. }) => {
                    Ok(if resolve_range(range, content.len()).is_some() { 206 } else { 416 })
                }
            }
        })
    }

    fn fetch<'a>(&'a self, url: &'a str, range: Option<&'a str>) -> TransportFuture<'a, FetchResponse> {
        Box::pin(async move {
            let resource = match self.record(FakeMethod::Get, url, range).await {
                None => return Err(LogError::from_status(404, "Not Found")),
                Some(resource) => resource,
            };
            match resource {
                FakeResource::Status(status) => {
                    check_status(status, "Fake Status")?;
                    Ok(FetchResponse {
                        status,
                        content_type: None,
                        body: Bytes::new(),
                    })
                }
                FakeResource::Timeout => Err(timeout_error(url)),
                FakeResource::File {
                    content,
                    content_type,
                    ranges,
                } => match range.filter(|_| ranges) {
                    None => Ok(FetchResponse {
                        status: 200,
                        content_type,
                        body: content,
                    }),
                    Some(range) => match resolve_range(range, content.len()) {
                        Some((start, end)) => Ok(FetchResponse {
                            status: 206,
                            content_type,
                            body: content.slice(start..=end),
                        }),
                        None => Err(LogError::from_status(416, "Range Not Satisfiable")),
                    },
                },
            }
        })
    }

    fn read_timeout(&self) -> &ReadTimeout {
        &self.read_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_range() {
        assert_eq!(resolve_range("bytes=0-", 10), Some((0, 9)));
        assert_eq!(resolve_range("bytes=2-4", 10), Some((2, 4)));
        assert_eq!(resolve_range("bytes=2-40", 10), Some((2, 9)));
        assert_eq!(resolve_range("bytes=-3", 10), Some((7, 9)));
        assert_eq!(resolve_range("bytes=-30", 10), Some((0, 9)));
        assert_eq!(resolve_range("bytes=10-", 10), None);
        assert_eq!(resolve_range("bytes=0-", 0), None);
    }

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let fake = FakeTransport::new();
        assert_eq!(fake.probe("http://x/none", "bytes=0-").await.unwrap(), 404);
        assert!(matches!(
            fake.fetch("http://x/none", None).await,
            Err(LogError::ContentExpired)
        ));
        assert_eq!(fake.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_ranged_file() {
        let fake = FakeTransport::new();
        fake.add_file("http://x/f", "0123456789", true).await;

        assert_eq!(fake.probe("http://x/f", "bytes=0-").await.unwrap(), 206);
        let response = fake.fetch("http://x/f", Some("bytes=3-5")).await.unwrap();
        assert_eq!(response.status, 206);
        assert_eq!(&response.body[..], b"345");
    }

    #[tokio::test]
    async fn test_unranged_file_ignores_range() {
        let fake = FakeTransport::new();
        fake.add_file("http://x/f", "0123456789", false).await;

        assert_eq!(fake.probe("http://x/f", "bytes=0-").await.unwrap(), 200);
        let response = fake.fetch("http://x/f", Some("bytes=3-5")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(&response.body[..], b"0123456789");
    }

    #[tokio::test]
    async fn test_records_read_timeout() {
        let fake = FakeTransport::new();
        {
            let _widened = fake.read_timeout().widen(Duration::from_secs(300));
            let _ = fake.fetch("http://x/a", None).await;
        }
        let _ = fake.fetch("http://x/b", None).await;

        let requests = fake.requests().await;
        assert_eq!(requests[0].read_timeout, Duration::from_secs(300));
        assert_eq!(requests[1].read_timeout, Duration::from_secs(30));
    }
}
