//! Error taxonomy for log retrieval.
//!
//! Streaming and tailing share one [`LogError`] so callers can match on a
//! single type. Frame decoding has its own [`FrameError`], wrapped by
//! [`LogError::Protocol`] once both wire schemas have been tried.

use thiserror::Error;

/// Standard Result type for the log retrieval subsystem
pub type Result<T> = std::result::Result<T, LogError>;

/// A frame could not be decoded.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("binary frame decode failed: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("textual frame decode failed: {0}")]
    Text(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Malformed log frame: {0}")]
    Protocol(#[from] FrameError),

    #[error("Stream closed abnormally (code {code}): {reason}")]
    AbnormalClosure { code: u16, reason: String },

    #[error("The starting position {start} is past the end of the file content ({length} bytes)")]
    RangeNotSatisfiable { start: u64, length: u64 },

    #[error("Log content is no longer available")]
    ContentExpired,

    #[error("Read timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {description}")]
    Transport { status: u16, description: String },

    #[error("Invalid tail window: {0}")]
    InvalidWindow(String),

    #[error("Invalid multipart response: {0}")]
    InvalidMultipart(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl LogError {
    /// Classify a non-success HTTP status seen while tailing.
    ///
    /// 404 means the retained content is gone; everything else keeps its
    /// status and description.
    pub fn from_status(status: u16, description: impl Into<String>) -> Self {
        match status {
            404 => LogError::ContentExpired,
            _ => LogError::Transport {
                status,
                description: description.into(),
            },
        }
    }

    /// `true` for the errors that mean "no further content" on the tailing path.
    pub fn is_terminal_signal(&self) -> bool {
        matches!(self, LogError::ContentExpired | LogError::Timeout(_))
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LogError::Transport { status, .. } => Some(*status),
            LogError::ContentExpired => Some(404),
            LogError::RangeNotSatisfiable { .. } => Some(416),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LogError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            LogError::from_status(status.as_u16(), err.to_string())
        } else {
            LogError::Http(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for LogError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        LogError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_404_is_content_expired() {
        let err = LogError::from_status(404, "Not Found");
        assert!(matches!(err, LogError::ContentExpired));
        assert!(err.is_terminal_signal());
    }

    #[test]
    fn test_from_status_keeps_status_and_description() {
        let err = LogError::from_status(503, "Service Unavailable");
        match err {
            LogError::Transport { status, ref description } => {
                assert_eq!(status, 503);
                assert_eq!(description, "Service Unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_terminal_signal());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_timeout_is_terminal_signal() {
        assert!(LogError::Timeout("read".to_string()).is_terminal_signal());
        assert!(!LogError::Connection("refused".to_string()).is_terminal_signal());
    }

    #[test]
    fn test_range_not_satisfiable_message() {
        let err = LogError::RangeNotSatisfiable { start: 30, length: 20 };
        assert_eq!(err.status(), Some(416));
        assert!(err.to_string().contains("30"));
        assert!(err.to_string().contains("past the end"));
    }

    #[test]
    fn test_abnormal_closure_message() {
        let err = LogError::AbnormalClosure { code: 1011, reason: "boom".to_string() };
        assert_eq!(err.to_string(), "Stream closed abnormally (code 1011): boom");
    }
}
