//! The cached fetcher: GET with a time-boxed in-memory response cache

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::key::{CacheKey, Params};
use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::transport::{HttpTransport, Transport, TransportError};

/// Freshness window used when a call site does not pass its own
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5 * 60);

/// Per-request settings handed to the transport
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters appended to the URL; part of the cache key
    pub params: Params,
    /// Transport timeout for this request only; not part of the cache key
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl From<Params> for RequestOptions {
    fn from(params: Params) -> Self {
        Self {
            params,
            timeout: None,
        }
    }
}

/// A decoded response body and when it was stored
#[derive(Debug)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, window: Duration) -> bool {
        self.stored_at.elapsed() < window
    }
}

/// Issues GET requests and caches successful JSON payloads per request identity
///
/// Construct one per process and share it behind an `Arc`. Entries are only
/// checked for freshness when read; a stale entry stays in memory until the
/// same request succeeds again or the cache is cleared.
///
/// There is no single-flight: concurrent misses for one key each hit the
/// transport, and whichever completes last is the one left in the cache.
pub struct CachedFetcher {
    transport: Arc<dyn Transport>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    default_freshness: Duration,
}

impl fmt::Debug for CachedFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFetcher")
            .field("entries", &self.entries.lock().len())
            .field("default_freshness", &self.default_freshness)
            .finish_non_exhaustive()
    }
}

impl Default for CachedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CachedFetcher {
    /// Creates a fetcher over a plain `reqwest` client with the default window
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }

    /// Creates a fetcher over a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(Arc::new(transport))
    }

    pub fn with_shared_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            entries: Mutex::new(HashMap::new()),
            default_freshness: DEFAULT_FRESHNESS,
        }
    }

    /// Creates an HTTP-backed fetcher honouring the configured timeout,
    /// user agent and default window
    pub fn from_config(config: &FetcherConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::with_transport(transport).with_default_freshness(config.default_freshness))
    }

    pub fn with_default_freshness(mut self, window: Duration) -> Self {
        self.default_freshness = window;
        self
    }

    pub fn default_freshness(&self) -> Duration {
        self.default_freshness
    }

    /// Fetches `url` with the default freshness window
    pub async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<T, FetchError> {
        self.request_within(url, options, self.default_freshness)
            .await
    }

    /// Fetches `url`, serving a cached payload younger than `freshness`
    ///
    /// # Returns
    /// * `Ok(T)` - the cached payload, or the freshly fetched one (now cached)
    /// * `Err(FetchError)` - the classified failure; the cache is left as it was
    pub async fn request_within<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
        freshness: Duration,
    ) -> Result<T, FetchError> {
        let result = self.fetch(url, options, freshness).await;
        if let Err(ref err) = result {
            err.report();
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
        freshness: Duration,
    ) -> Result<T, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::setup(url, "empty URL"));
        }

        let key = CacheKey::new(url, &options.params);

        let cached = {
            let entries = self.entries.lock();
            entries
                .get(&key)
                .filter(|entry| entry.is_fresh(freshness))
                .map(|entry| T::deserialize(&entry.payload))
        };
        if let Some(decoded) = cached {
            debug!(key = %key, "cache hit");
            return decoded.map_err(|e| FetchError::decode(url, e));
        }

        debug!(key = %key, "cache miss, fetching");
        let response = self
            .transport
            .get(url, options)
            .await
            .map_err(|e| FetchError::from_transport(url, e))?;

        if !response.is_success() {
            return Err(FetchError::upstream(
                url,
                response.status,
                response.status_text,
                response.body,
            ));
        }

        let payload: Value =
            serde_json::from_str(&response.body).map_err(|e| FetchError::decode(url, e))?;
        let decoded = T::deserialize(&payload).map_err(|e| FetchError::decode(url, e))?;

        self.entries.lock().insert(
            key.clone(),
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
        debug!(key = %key, "stored response");

        Ok(decoded)
    }

    /// Removes every cached entry
    pub fn clear_all(&self) {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        debug!(removed, "cleared response cache");
    }

    /// Removes the entry `request` would use for `url` and `params`, if any
    pub fn clear_one(&self, url: &str, params: &Params) {
        let key = CacheKey::new(url, params);
        if self.entries.lock().remove(&key).is_some() {
            debug!(key = %key, "cleared cache entry");
        }
    }
}
