use std::time::Duration;

use futures::StreamExt as _;
use tracing::debug;

use crate::errors::{SourceError, VerifyError};
use crate::source::{ByteStream, EventSource, SourceHandle, VerifyRequest};

/// Configuration for the HTTP event source.
#[derive(Clone, Debug)]
pub struct HttpSourceConfig {
    /// Base URL of the verification service.
    pub base_url: String,
    /// HTTP timeout covering the whole streamed response.
    ///
    /// Generous by default; verification sessions routinely run for minutes.
    pub timeout: Duration,
}

impl HttpSourceConfig {
    /// Creates a config with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Overrides the streaming timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn stream_url(&self) -> String {
        format!("{}/api/verify/stream", self.base_url.trim_end_matches('/'))
    }
}

/// Production transport: posts the request to the verification service and
/// exposes the server-sent-event response body as a chunked byte stream.
#[derive(Debug)]
pub struct HttpEventSource {
    client: reqwest::Client,
    config: HttpSourceConfig,
}

impl HttpEventSource {
    /// Builds a source over the given endpoint configuration.
    pub fn new(config: HttpSourceConfig) -> Result<Self, VerifyError> {
        if config.base_url.trim().is_empty() {
            return Err(VerifyError::Config("base_url must not be empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VerifyError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl EventSource for HttpEventSource {
    async fn open(&self, request: &VerifyRequest) -> Result<SourceHandle, SourceError> {
        let url = self.config.stream_url();
        debug!(url = %url, "opening verification stream");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| SourceError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::http(status.as_u16(), body));
        }

        let stream: ByteStream = Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| SourceError::transport(format!("streaming read failed: {e}")))
        }));
        Ok(SourceHandle { stream })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_joins_without_doubled_slash() {
        let config = HttpSourceConfig::new("http://localhost:8000/");
        assert_eq!(config.stream_url(), "http://localhost:8000/api/verify/stream");
        let config = HttpSourceConfig::new("http://localhost:8000");
        assert_eq!(config.stream_url(), "http://localhost:8000/api/verify/stream");
    }

    #[test]
    fn empty_base_url_is_a_config_error() {
        let err = HttpEventSource::new(HttpSourceConfig::new("  ")).expect_err("config");
        assert!(matches!(err, VerifyError::Config(_)));
    }

    #[test]
    fn timeout_override_is_applied() {
        let config = HttpSourceConfig::new("http://localhost:8000")
            .timeout(Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
