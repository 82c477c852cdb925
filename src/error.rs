//! Normalized request failures
//!
//! Every failure the request layer can produce is one of the variants of
//! [`FetchError`]. The variants carry enough of the original status, body and
//! message for a caller to render a specific message, and [`FetchError::kind`]
//! gives a flat classification to branch on.

use thiserror::Error;
use tracing::{error, warn};

use crate::transport::TransportError;

/// HTTP status upstreams use to signal throttling
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Flat classification of a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server answered with a non-2xx status other than 429
    UpstreamStatus,
    /// Server answered with 429
    RateLimited,
    /// Request was sent but nothing came back (timeout, refused, unreachable)
    NoResponse,
    /// Request could not be built or sent
    Setup,
    /// A required credential is absent or empty
    MissingCredential,
    /// 2xx response whose body is not the expected JSON
    Decode,
}

/// Errors surfaced by the cached fetcher and the services built on it
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server responded with an error status
    #[error("{}", upstream_message(.url, .status, .status_text))]
    Upstream {
        url: String,
        status: u16,
        status_text: String,
        body: String,
    },

    /// The request went out but no response arrived
    #[error("no response from {url}: {message}")]
    NoResponse { url: String, message: String },

    /// The request could not be constructed or sent
    #[error("could not send request to {url}: {message}")]
    Setup { url: String, message: String },

    /// A credential needed for the request is not configured
    #[error("missing credential: set {name} in the environment or a .env file")]
    MissingCredential { name: String },

    /// The response body could not be decoded into the expected shape
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

fn upstream_message(url: &str, status: &u16, status_text: &str) -> String {
    if *status == RATE_LIMIT_STATUS {
        format!("rate limit exceeded for {url} ({status} {status_text})")
    } else {
        format!("{url} responded with {status} {status_text}")
    }
}

impl FetchError {
    /// Builds the error for a response that arrived with a non-2xx status
    pub fn upstream(
        url: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            url: url.into(),
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn setup(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Setup {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential { name: name.into() }
    }

    pub(crate) fn from_transport(url: &str, err: TransportError) -> Self {
        match err {
            TransportError::NoResponse(message) => Self::NoResponse {
                url: url.to_string(),
                message,
            },
            TransportError::Setup(message) => Self::setup(url, message),
        }
    }

    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Upstream { status, .. } if *status == RATE_LIMIT_STATUS => ErrorKind::RateLimited,
            Self::Upstream { .. } => ErrorKind::UpstreamStatus,
            Self::NoResponse { .. } => ErrorKind::NoResponse,
            Self::Setup { .. } => ErrorKind::Setup,
            Self::MissingCredential { .. } => ErrorKind::MissingCredential,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Status code returned by the server, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }

    /// Logs the failure at a level matching its class.
    ///
    /// Purely diagnostic: the error is still returned to the caller.
    pub(crate) fn report(&self) {
        match self {
            Self::Upstream {
                url,
                status,
                status_text,
                body,
            } => {
                if *status == RATE_LIMIT_STATUS {
                    warn!(url = %url, status = *status, status_text = %status_text, body = %body, "rate limit exceeded");
                } else {
                    warn!(url = %url, status = *status, status_text = %status_text, body = %body, "upstream returned an error status");
                }
            }
            Self::NoResponse { url, message } => {
                error!(url = %url, message = %message, "no response received");
            }
            Self::Setup { url, message } => {
                error!(url = %url, message = %message, "request setup failed");
            }
            Self::MissingCredential { name } => {
                warn!(credential = %name, "credential not configured");
            }
            Self::Decode { url, message } => {
                warn!(url = %url, message = %message, "response body could not be decoded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_classified_separately() {
        let err = FetchError::upstream("https://api.example/x", 429, "Too Many Requests", "slow down");
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().contains("rate limit exceeded"));
    }

    #[test]
    fn test_other_status_is_upstream_status() {
        let err = FetchError::upstream("https://api.example/x", 503, "Service Unavailable", "");
        assert_eq!(err.kind(), ErrorKind::UpstreamStatus);
        assert!(!err.is_rate_limited());
        assert_eq!(
            err.to_string(),
            "https://api.example/x responded with 503 Service Unavailable"
        );
    }

    #[test]
    fn test_transport_failures_map_to_distinct_kinds() {
        let no_response = FetchError::from_transport(
            "https://api.example/x",
            TransportError::NoResponse("operation timed out".to_string()),
        );
        assert_eq!(no_response.kind(), ErrorKind::NoResponse);
        assert!(no_response.status().is_none());
        assert!(no_response.to_string().contains("operation timed out"));

        let setup = FetchError::from_transport(
            "not a url",
            TransportError::Setup("relative URL without a base".to_string()),
        );
        assert_eq!(setup.kind(), ErrorKind::Setup);
        assert!(setup.to_string().contains("not a url"));
    }

    #[test]
    fn test_missing_credential_names_the_variable() {
        let err = FetchError::missing_credential("NEWS_API_KEY");
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        assert!(err.to_string().contains("NEWS_API_KEY"));
    }
}
