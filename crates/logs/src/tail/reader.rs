//! Reader — byte-range reads of instance files: PROBE, FETCH, SLICE.
//!
//! Each call is independent. The probe is repeated on every read; a server
//! that answers 206 to `Range: bytes=0-` gets ranged fetches, anything else
//! gets a full fetch sliced locally. "Content gone" (404) and read timeouts
//! are reported as `Ok(None)`.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use super::transport::FileTransport;
use super::window::{AppInstance, TailWindow};
use crate::error::{LogError, Result};

const PROBE_RANGE: &str = "bytes=0-";
const LOGS_DIR: &str = "logs";

/// Polls used by the staging loop when the caller has no preference.
pub const DEFAULT_STAGING_POLLS: usize = 60;

/// Cut `[start, end]` out of a full (non-206) body.
///
/// With `start` unset, `end` is a suffix length. An `end` past the content is
/// clamped; a `start` past the content is an error unless the content is
/// empty.
pub fn slice_window(content: &[u8], start: Option<u64>, end: Option<u64>) -> Result<&[u8]> {
    let len = content.len() as u64;
    let Some(start) = start else {
        return Ok(match end {
            Some(suffix) => &content[(len - suffix.min(len)) as usize..],
            None => content,
        });
    };
    if start >= len {
        if len == 0 {
            return Ok(content);
        }
        return Err(LogError::RangeNotSatisfiable { start, length: len });
    }
    let end = end.map_or(len - 1, |end| end.min(len - 1));
    Ok(&content[start as usize..=end as usize])
}

fn absorb_terminal<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_terminal_signal() => {
            debug!("No further content: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

pub struct TailReader<T: FileTransport> {
    transport: T,
    controller_url: String,
    tail_timeout: Duration,
}

impl<T: FileTransport> TailReader<T> {
    /// `tail_timeout` is the read timeout used while long-polling.
    pub fn new(transport: T, controller_url: impl Into<String>, tail_timeout: Duration) -> Self {
        Self {
            transport,
            controller_url: controller_url.into().trim_end_matches('/').to_string(),
            tail_timeout,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn file_url(&self, target: &AppInstance, path: &str) -> String {
        format!(
            "{}/v2/apps/{}/instances/{}/files/{}",
            self.controller_url,
            target.app_id,
            target.instance,
            path.trim_start_matches('/')
        )
    }

    /// Read `window`; `Ok(None)` when the content is gone or the read timed out.
    pub async fn read(&self, window: &TailWindow) -> Result<Option<String>> {
        let url = self.file_url(window.target(), window.file_path());
        absorb_terminal(self.read_range(&url, window).await)
    }

    async fn read_range(&self, url: &str, window: &TailWindow) -> Result<String> {
        let supports_ranges = match self.transport.probe(url, PROBE_RANGE).await? {
            206 => true,
            416 => {
                debug!("Probe of {} reports an empty file", url);
                return Ok(String::new());
            }
            status => {
                debug!("Probe of {} answered {}, ranges unsupported", url, status);
                false
            }
        };

        let range = window.range_header();
        let response = self
            .transport
            .fetch(url, supports_ranges.then_some(range.as_str()))
            .await?;

        if response.is_partial() {
            return Ok(text(&response.body));
        }
        slice_window(&response.body, window.start(), window.end()).map(text)
    }

    async fn follow_bytes(&self, staging_url: &str, offset: u64) -> Result<Option<Bytes>> {
        let url = format!("{}&tail&tail_offset={}", staging_url, offset);
        let _widened = self.transport.read_timeout().widen(self.tail_timeout);
        let result = self.transport.fetch(&url, None).await.map(|r| r.body);
        absorb_terminal(result)
    }

    /// Long-poll the staging output from `offset` under the widened read
    /// timeout.
    pub async fn follow(&self, staging_url: &str, offset: u64) -> Result<Option<String>> {
        Ok(self.follow_bytes(staging_url, offset).await?.map(|b| text(&b)))
    }

    /// Poll staging output until it stops growing, at most `max_polls`
    /// times, and return it split into lines.
    ///
    /// `staging_url` is the percent-encoded location the controller reports
    /// for the staging file; it is decoded once before polling.
    pub async fn collect_staging_logs(&self, staging_url: &str, max_polls: usize) -> Result<Vec<String>> {
        let staging_url = urlencoding::decode(staging_url)
            .map_err(|e| LogError::Http(format!("invalid staging URL {}: {}", staging_url, e)))?;
        let staging_url = staging_url.as_ref();
        let mut offset = 0u64;
        let mut lines = Vec::new();

        for poll in 0..max_polls {
            match self.follow_bytes(staging_url, offset).await? {
                Some(chunk) if !chunk.is_empty() => {
                    offset += chunk.len() as u64;
                    lines.extend(text(&chunk).lines().map(str::to_string));
                }
                _ => {
                    debug!("Staging output finished after {} polls", poll + 1);
                    break;
                }
            }
        }

        info!("Collected {} staging log lines ({} bytes)", lines.len(), offset);
        Ok(lines)
    }

    /// Every file in the instance's `logs` directory, read in full.
    pub async fn list_logs(&self, target: &AppInstance) -> Result<BTreeMap<String, String>> {
        let mut logs = BTreeMap::new();
        let Some(listing) = self.read(&TailWindow::whole(target.clone(), LOGS_DIR)).await? else {
            return Ok(logs);
        };

        for name in listing.lines().filter_map(|line| line.split_whitespace().next()) {
            let path = format!("{}/{}", LOGS_DIR, name);
            if let Some(content) = self.read(&TailWindow::whole(target.clone(), path)).await? {
                logs.insert(name.to_string(), content);
            }
        }
        Ok(logs)
    }
}
