use std::pin::Pin;

use crate::errors::SourceError;

/// Request submitted to start one verification session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VerifyRequest {
    /// The content to verify. Must not be blank after trimming.
    pub content: String,
    /// Optional image attachment referenced by URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl VerifyRequest {
    /// Creates a text-only request.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            image_url: None,
        }
    }

    /// Attaches an image URL to the request.
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Raw chunked byte stream delivered by a transport.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, SourceError>> + Send + 'static>>;

/// Handle to one opened verification stream.
pub struct SourceHandle {
    /// Physical delivery units; a chunk may hold any number of records or a
    /// fragment of one.
    pub stream: ByteStream,
}

/// Transport seam: anything that can open a verification request and deliver
/// its event records as a chunked byte stream.
///
/// The production implementation is [`crate::http::HttpEventSource`]; tests
/// drive the pipeline with scripted in-memory sources.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// Opens a stream for the given request.
    async fn open(&self, request: &VerifyRequest) -> Result<SourceHandle, SourceError>;
}
