//! Connect — WebSocket handshake against the logging endpoint.

use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue, AUTHORIZATION};
use tokio::sync::mpsc;
use tokio::time;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, info, warn};

use super::listener::{LogListener, SessionEvent};
use super::session::StreamingSession;
use crate::auth::{SharedCredentials, PROXY_USER_HEADER};
use crate::conf::LogsConfig;
use crate::error::{LogError, Result};
use crate::model::LogEntry;

/// Session callbacks as a stream of values.
pub type EventStream = UnboundedReceiverStream<SessionEvent>;

/// Which server-side feed to attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Live tail; the stream stays open until closed or cancelled.
    Tail,
    /// One-shot dump of the buffered recent output, then close.
    Dump,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Tail => "tail",
            StreamKind::Dump => "dump",
        }
    }
}

/// Opens streaming sessions. Cheap to clone; reuse it across sessions.
#[derive(Clone)]
pub struct LogStreamConnector {
    endpoint: String,
    credentials: SharedCredentials,
    tls: Arc<rustls::ClientConfig>,
    connect_timeout: Duration,
    keep_alive_interval: Duration,
}

impl LogStreamConnector {
    pub fn new(config: &LogsConfig, credentials: SharedCredentials) -> Result<Self> {
        Ok(Self {
            endpoint: config.logging_endpoint.trim_end_matches('/').to_string(),
            credentials,
            tls: config.build_client_tls()?,
            connect_timeout: config.connect_timeout(),
            keep_alive_interval: config.keep_alive_interval(),
        })
    }

    pub fn stream_url(&self, app_id: &str, kind: StreamKind) -> String {
        format!("{}/{}/?app={}", self.endpoint, kind.as_str(), app_id)
    }

    fn request(&self, url: &str) -> Result<Request> {
        let mut request = url
            .into_client_request()
            .map_err(|e| LogError::Connection(format!("invalid stream URL {}: {}", url, e)))?;

        if let Some(token) = self.credentials.authorization() {
            let value = HeaderValue::from_str(&token)
                .map_err(|e| LogError::Connection(format!("invalid Authorization header: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        if let Some(user) = self.credentials.proxy_user() {
            let name = HeaderName::from_bytes(PROXY_USER_HEADER.as_bytes())
                .map_err(|e| LogError::Connection(format!("invalid {} header name: {}", PROXY_USER_HEADER, e)))?;
            let value = HeaderValue::from_str(&user)
                .map_err(|e| LogError::Connection(format!("invalid {} header: {}", PROXY_USER_HEADER, e)))?;
            request.headers_mut().insert(name, value);
        }
        Ok(request)
    }

    /// Perform the handshake and bind `listener` to the new session.
    pub async fn connect<L: LogListener>(
        &self,
        app_id: &str,
        kind: StreamKind,
        listener: L,
    ) -> Result<StreamingSession> {
        let url = self.stream_url(app_id, kind);
        let request = self.request(&url)?;
        info!("Connecting to log stream: {}", url);

        let connector = Connector::Rustls(Arc::clone(&self.tls));
        let handshake = connect_async_tls_with_config(request, None, false, Some(connector));
        let (ws, response) = time::timeout(self.connect_timeout, handshake)
            .await
            .map_err(|_| {
                LogError::Connection(format!(
                    "handshake with {} timed out after {:?}",
                    url, self.connect_timeout
                ))
            })?
            .map_err(|e| {
                warn!("Log stream handshake failed: {}", e);
                LogError::from(e)
            })?;

        debug!("Handshake complete: HTTP {}", response.status());
        Ok(StreamingSession::start(ws, listener, self.keep_alive_interval))
    }

    /// Live tail of `app_id`.
    pub async fn stream<L: LogListener>(&self, app_id: &str, listener: L) -> Result<StreamingSession> {
        self.connect(app_id, StreamKind::Tail, listener).await
    }

    /// Open a session whose callbacks arrive on a stream. The stream ends
    /// after the terminal event.
    pub async fn events(&self, app_id: &str, kind: StreamKind) -> Result<(StreamingSession, EventStream)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = self.connect(app_id, kind, tx).await?;
        Ok((session, UnboundedReceiverStream::new(rx)))
    }

    /// Buffered recent output of `app_id`, oldest first.
    ///
    /// Malformed frames are skipped; any terminal error fails the call.
    pub async fn recent(&self, app_id: &str) -> Result<Vec<LogEntry>> {
        let (session, mut events) = self.events(app_id, StreamKind::Dump).await?;

        let mut entries = Vec::new();
        while let Some(event) = events.next().await {
            match event {
                SessionEvent::Message(entry) => entries.push(entry),
                SessionEvent::Error(LogError::Protocol(e)) => {
                    warn!("Skipping malformed frame in recent dump: {}", e);
                }
                SessionEvent::Error(e) => return Err(e),
                SessionEvent::Complete => break,
            }
        }
        session.cancel();

        entries.sort();
        debug!("Recent dump for {}: {} entries", app_id, entries.len());
        Ok(entries)
    }
}
