//! Time-boxed in-memory response cache in front of the HTTP transport
//!
//! Every data-fetching call site goes through [`CachedFetcher`]. A response is
//! cached under a [`CacheKey`] derived from its URL and query [`Params`] and is
//! served again, without network I/O, while it is younger than the caller's
//! freshness window. Failures are never cached and never replaced by
//! placeholder data.

mod fetcher;
mod key;

pub use fetcher::{CachedFetcher, RequestOptions, DEFAULT_FRESHNESS};
pub use key::{CacheKey, Params};
