//! Recent — one-shot recent-logs read over HTTP (multipart batch).

use tracing::debug;

use super::transport::FileTransport;
use crate::error::{LogError, Result};
use crate::frame::parse_multipart;
use crate::model::LogEntry;

pub struct RecentLogsClient<T: FileTransport> {
    transport: T,
    endpoint: String,
}

impl<T: FileTransport> RecentLogsClient<T> {
    /// `endpoint` is the HTTP(S) base of the log aggregator.
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn recent_url(&self, app_id: &str) -> String {
        format!("{}/recent?app={}", self.endpoint, app_id)
    }

    /// Buffered recent entries for `app_id`, oldest first. One malformed part
    /// fails the whole call.
    pub async fn recent(&self, app_id: &str) -> Result<Vec<LogEntry>> {
        let url = self.recent_url(app_id);
        let response = self.transport.fetch(&url, None).await?;
        let content_type = response.content_type.as_deref().ok_or_else(|| {
            LogError::InvalidMultipart("response carries no Content-Type".to_string())
        })?;

        let mut entries = parse_multipart(content_type, &response.body)?;
        entries.sort();
        debug!("Recent logs for {}: {} entries", app_id, entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;
    use crate::model::MessageType;
    use crate::tail::fake::FakeTransport;

    const ENDPOINT: &str = "https://doppler.example.com:443";
    const BOUNDARY: &str = "90ad9060c87222ee30ddcffe751393a7c5734c48e070a623121abf82eb3c";

    fn entry(ts: u64, text: &str) -> LogEntry {
        LogEntry::new("app-1", text.to_string(), ts, MessageType::Stdout, "APP", "0")
    }

    fn batch(entries: &[LogEntry]) -> Vec<u8> {
        let mut body = Vec::new();
        for e in entries {
            body.extend_from_slice(format!("--{}\r\n\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(&encode_frame(e));
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn client() -> RecentLogsClient<FakeTransport> {
        RecentLogsClient::new(FakeTransport::new(), format!("{}/", ENDPOINT))
    }

    #[test]
    fn test_recent_url() {
        assert_eq!(
            client().recent_url("app-1"),
            "https://doppler.example.com:443/recent?app=app-1"
        );
    }

    #[tokio::test]
    async fn test_recent_sorted_by_timestamp() {
        let c = client();
        let content_type = format!("multipart/x-protobuf; boundary={}", BOUNDARY);
        let body = batch(&[entry(30, "c"), entry(10, "a"), entry(20, "b")]);
        c.transport().add_typed(&c.recent_url("app-1"), &content_type, body).await;

        let texts: Vec<String> = c
            .recent("app-1")
            .await
            .unwrap()
            .iter()
            .map(|e| e.message_text())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_recent_without_boundary_fails() {
        let c = client();
        c.transport().add_typed(&c.recent_url("app-1"), "multipart/x-protobuf", Vec::new()).await;

        let err = c.recent("app-1").await.unwrap_err();
        assert!(matches!(err, LogError::InvalidMultipart(_)));
    }

    #[tokio::test]
    async fn test_recent_without_content_type_fails() {
        let c = client();
        c.transport().add_file(&c.recent_url("app-1"), Vec::new(), false).await;

        let err = c.recent("app-1").await.unwrap_err();
        assert!(matches!(err, LogError::InvalidMultipart(_)));
    }
}
