//! Window — which bytes of which instance file a tailing read wants.

use crate::error::{LogError, Result};

/// Opaque (application, instance) pair resolved upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppInstance {
    pub app_id: String,
    pub instance: u32,
}

impl AppInstance {
    pub fn new(app_id: impl Into<String>, instance: u32) -> Self {
        Self {
            app_id: app_id.into(),
            instance,
        }
    }
}

/// A byte window over one file of one instance.
///
/// `None` positions are unspecified. With `start` unset, `end` is a suffix
/// length ("the last `end` bytes"); otherwise both are inclusive offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailWindow {
    file_path: String,
    target: AppInstance,
    start: Option<u64>,
    end: Option<u64>,
}

impl TailWindow {
    pub fn new(
        target: AppInstance,
        file_path: impl Into<String>,
        start: Option<u64>,
        end: Option<u64>,
    ) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(LogError::InvalidWindow(format!(
                    "end position ({}) is less than start position ({})",
                    end, start
                )));
            }
        }
        Ok(Self {
            file_path: file_path.into(),
            target,
            start,
            end,
        })
    }

    /// The whole file.
    pub fn whole(target: AppInstance, file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            target,
            start: None,
            end: None,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn target(&self) -> &AppInstance {
        &self.target
    }

    pub fn start(&self) -> Option<u64> {
        self.start
    }

    pub fn end(&self) -> Option<u64> {
        self.end
    }

    /// `Range` header value for this window.
    pub fn range_header(&self) -> String {
        match (self.start, self.end) {
            (None, None) => "bytes=0-".to_string(),
            (None, Some(suffix)) => format!("bytes=-{}", suffix),
            (Some(start), None) => format!("bytes={}-", start),
            (Some(start), Some(end)) => format!("bytes={}-{}", start, end),
        }
    }
}
