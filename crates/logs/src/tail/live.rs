//! Live — implements `FileTransport` over reqwest.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, RANGE};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use super::transport::{check_status, FetchResponse, FileTransport, ReadTimeout, TransportFuture};
use crate::auth::{SharedCredentials, PROXY_USER_HEADER};
use crate::conf::LogsConfig;
use crate::error::{LogError, Result};

pub struct LiveTransport {
    client: Client,
    credentials: SharedCredentials,
    read_timeout: ReadTimeout,
}

impl LiveTransport {
    pub fn new(config: &LogsConfig, credentials: SharedCredentials) -> Result<Self> {
        if config.trust_self_signed_certs {
            warn!("Certificate validation is DISABLED for file tailing");
        }
        let client = Client::builder()
            .use_rustls_tls()
            .connect_timeout(config.connect_timeout())
            .danger_accept_invalid_certs(config.trust_self_signed_certs)
            .build()
            .map_err(|e| LogError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            read_timeout: ReadTimeout::new(config.read_timeout()),
        })
    }

    fn authorize(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.credentials.authorization() {
            builder = builder.header(AUTHORIZATION, token);
        }
        if let Some(user) = self.credentials.proxy_user() {
            builder = builder.header(PROXY_USER_HEADER, user);
        }
        builder.timeout(self.read_timeout.current())
    }

    async fn head(&self, url: &str, range: &str) -> Result<u16> {
        debug!("Probing url={} range={}", url, range);
        let response = self
            .authorize(self.client.head(url).header(RANGE, range))
            .send()
            .await
            .map_err(|e| {
                warn!("HEAD request failed for url={}: {}", url, e);
                LogError::from(e)
            })?;

        let status = response.status().as_u16();
        debug!("Probe response for url={}: status={}", url, status);
        Ok(status)
    }

    async fn get(&self, url: &str, range: Option<&str>) -> Result<FetchResponse> {
        let mut builder = self.client.get(url);
        if let Some(range) = range {
            builder = builder.header(RANGE, range);
        }
        debug!("Fetching url={} range={:?}", url, range);

        let response = self.authorize(builder).send().await.map_err(|e| {
            warn!("GET request failed for url={}: {}", url, e);
            LogError::from(e)
        })?;

        let status = response.status();
        check_status(status.as_u16(), status.canonical_reason().unwrap_or("Unknown"))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response.bytes().await?;
        debug!("Fetched url={}: status={}, {} bytes", url, status, body.len());

        Ok(FetchResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

impl FileTransport for LiveTransport {
    fn probe<'a>(&'a self, url: &'a str, range: &'a str) -> TransportFuture<'a, u16> {
        Box::pin(self.head(url, range))
    }

    fn fetch<'a>(&'a self, url: &'a str, range: Option<&'a str>) -> TransportFuture<'a, FetchResponse> {
        Box::pin(self.get(url, range))
    }

    fn read_timeout(&self) -> &ReadTimeout {
        &self.read_timeout
    }
}
