//! HTTP transport boundary
//!
//! The cached fetcher only needs "GET this URL with these query parameters and
//! hand back status and body". [`Transport`] captures that, and
//! [`HttpTransport`] implements it on top of `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::cache::RequestOptions;
use crate::config::FetcherConfig;

/// A response as seen by the fetcher, before any decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase for the status (e.g. "Too Many Requests")
    pub status_text: String,
    /// Raw response body
    pub body: String,
}

impl TransportResponse {
    /// Creates a response with the canonical reason phrase for `status`
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures that happen before a response exists
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Request was sent but no response arrived
    #[error("no response: {0}")]
    NoResponse(String),

    /// Request could not be built or dispatched
    #[error("request setup failed: {0}")]
    Setup(String),
}

/// Something that can perform a GET with query parameters
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around a preconfigured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client carrying the configured user agent and timeout
    pub fn from_config(config: &FetcherConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map(Self::with_client)
            .map_err(|e| TransportError::Setup(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url).query(&options.params);
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.map_err(classify)?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}

/// Splits reqwest failures into "never left" and "left but nothing came back"
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::Setup(err.to_string())
    } else {
        TransportError::NoResponse(err.to_string())
    }
}
