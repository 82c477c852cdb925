//! Data services behind the dashboard panels
//!
//! Each service is a thin caller of the shared [`CachedFetcher`]: it checks
//! its credential, builds query parameters, picks a freshness window and
//! decodes the provider's payload into typed structs.
//!
//! [`CachedFetcher`]: crate::cache::CachedFetcher

pub mod air_quality;
pub mod crypto;
pub mod epidemic;
pub mod news;
pub mod stocks;
pub mod weather;

use std::time::Duration;

pub use air_quality::{AirQuality, AirQualityService};
pub use crypto::{CoinPrice, CryptoService};
pub use epidemic::{EpidemicService, EpidemicTotals};
pub use news::{Article, Headlines, NewsService};
pub use stocks::{StockQuote, StockService};
pub use weather::{CurrentWeather, WeatherService};

/// Window for data that changes slowly (news, air quality, case counts)
pub const SLOW_CHANGING: Duration = Duration::from_secs(30 * 60);
