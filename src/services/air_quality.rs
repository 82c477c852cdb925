//! OpenWeatherMap air pollution client
//!
//! Fetches the current air quality index and pollutant concentrations for a
//! coordinate pair and maps the 1-5 index to a label.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SLOW_CHANGING;
use crate::cache::{CachedFetcher, RequestOptions};
use crate::config::{Credentials, OPENWEATHER_API_KEY};
use crate::error::FetchError;

/// Base URL for the OpenWeatherMap air pollution endpoint
const AIR_POLLUTION_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/air_pollution";

/// Pollutant concentrations in μg/m³
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Components {
    pub co: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
}

/// Air quality at a location
#[derive(Debug, Clone, Serialize)]
pub struct AirQuality {
    /// Air quality index, 1 (good) to 5 (very poor)
    pub aqi: u8,
    /// Label for the index
    pub label: &'static str,
    pub components: Components,
    /// When the measurement was taken
    pub measured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PollutionResponse {
    list: Vec<PollutionRecord>,
}

#[derive(Debug, Deserialize)]
struct PollutionRecord {
    main: IndexReading,
    components: Components,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct IndexReading {
    aqi: u8,
}

/// Maps the OpenWeatherMap air quality index to its label
///
/// - 1: Good
/// - 2: Fair
/// - 3: Moderate
/// - 4: Poor
/// - 5: Very Poor
pub fn aqi_label(aqi: u8) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

/// Client for air quality readings
#[derive(Debug, Clone)]
pub struct AirQualityService {
    fetcher: Arc<CachedFetcher>,
    credentials: Credentials,
    base_url: String,
}

impl AirQualityService {
    pub fn new(fetcher: Arc<CachedFetcher>, credentials: Credentials) -> Self {
        Self {
            fetcher,
            credentials,
            base_url: AIR_POLLUTION_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches current air quality at `lat`/`lon`, cached for 30 minutes
    pub async fn current(&self, lat: f64, lon: f64) -> Result<AirQuality, FetchError> {
        let api_key = self.credentials.require(OPENWEATHER_API_KEY)?;
        let options = RequestOptions::new()
            .param("lat", lat)
            .param("lon", lon)
            .param("appid", api_key);

        let response: PollutionResponse = self
            .fetcher
            .request_within(&self.base_url, &options, SLOW_CHANGING)
            .await?;

        let Some(record) = response.list.into_iter().next() else {
            self.fetcher.clear_one(&self.base_url, &options.params);
            let err = FetchError::decode(&self.base_url, "no air quality readings in response");
            err.report();
            return Err(err);
        };

        Ok(AirQuality {
            aqi: record.main.aqi,
            label: aqi_label(record.main.aqi),
            components: record.components,
            measured_at: DateTime::from_timestamp(record.dt, 0),
        })
    }
}
