use crate::error::{Result, TransportError};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use reqwest::Client;
use url::Url;

/// One outbound push attempt.
#[derive(Clone, Debug)]
pub struct PushRequest {
    /// Subscriber webhook.
    pub url: Url,

    /// Request headers, content type included.
    pub headers: HeaderMap,

    /// JSON encoded event batch.
    pub body: Bytes,
}

/// Sends push requests to subscribers.
#[async_trait]
pub trait PushTransport: Clone + Send + Sync + 'static {
    /// POSTs `request` and returns the response status. The response body is
    /// ignored.
    async fn send(&self, request: PushRequest) -> std::result::Result<StatusCode, TransportError>;
}

/// [`PushTransport`] over HTTP.
///
/// Trusts any certificate, so subscribers can use development certificates.
/// There is no client-wide timeout; attempts are bounded by the dispatcher.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the underlying client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PushTransport for HttpTransport {
    async fn send(&self, request: PushRequest) -> std::result::Result<StatusCode, TransportError> {
        let response = self
            .client
            .post(request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        Ok(response.status())
    }
}
