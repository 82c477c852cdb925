//! dashfetch library
//!
//! Shared request layer for dashboard data panels: a [`cache::CachedFetcher`]
//! that serves JSON GET responses from a time-boxed in-memory cache, the
//! normalized [`error::FetchError`] it fails with, and thin provider services
//! built on top of it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod refresh;
pub mod services;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;

pub use cache::{CacheKey, CachedFetcher, Params, RequestOptions, DEFAULT_FRESHNESS};
pub use config::{get_configured_credential, Credentials, FetcherConfig};
pub use error::{ErrorKind, FetchError};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
