//! OpenWeatherMap current weather client
//!
//! Fetches current conditions for a city through the shared fetcher.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CachedFetcher, RequestOptions};
use crate::config::{Credentials, OPENWEATHER_API_KEY};
use crate::error::FetchError;

/// Base URL for the OpenWeatherMap current weather endpoint
const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current weather at a location, as reported by OpenWeatherMap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// City name resolved by the provider
    pub name: String,
    /// Coordinates of the resolved location
    pub coord: Coord,
    /// Temperature, pressure and humidity readings
    pub main: Readings,
    /// Condition descriptions, most significant first
    pub weather: Vec<Condition>,
    /// Wind readings
    pub wind: Wind,
    /// Observation time as a unix timestamp
    pub dt: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// Core readings in metric units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readings {
    /// Temperature in Celsius
    pub temp: f64,
    /// Feels-like temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Condition group (e.g. "Rain")
    pub main: String,
    /// Human-readable description (e.g. "light rain")
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wind {
    /// Wind speed in m/s
    pub speed: f64,
    /// Wind direction in degrees
    #[serde(default)]
    pub deg: f64,
}

impl CurrentWeather {
    /// Description of the primary condition, if the provider sent one
    pub fn summary(&self) -> Option<&str> {
        self.weather.first().map(|c| c.description.as_str())
    }

    /// Observation time
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.dt, 0)
    }
}

/// Client for current weather conditions
#[derive(Debug, Clone)]
pub struct WeatherService {
    fetcher: Arc<CachedFetcher>,
    credentials: Credentials,
    base_url: String,
}

impl WeatherService {
    pub fn new(fetcher: Arc<CachedFetcher>, credentials: Credentials) -> Self {
        Self {
            fetcher,
            credentials,
            base_url: OPENWEATHER_BASE_URL.to_string(),
        }
    }

    /// Points the service at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches current weather for `city` in metric units
    ///
    /// # Returns
    /// * `Ok(CurrentWeather)` - conditions, possibly from cache (5 minute window)
    /// * `Err(FetchError::MissingCredential)` - `OPENWEATHER_API_KEY` is unset; no request is made
    /// * `Err(FetchError)` - any other request failure
    pub async fn current(&self, city: &str) -> Result<CurrentWeather, FetchError> {
        let api_key = self.credentials.require(OPENWEATHER_API_KEY)?;
        let options = RequestOptions::new()
            .param("q", city.trim())
            .param("units", "metric")
            .param("appid", api_key);

        self.fetcher.request(&self.base_url, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::StubTransport;

    const URL: &str = "http://weather.test/data/2.5/weather";

    const VALID_RESPONSE: &str = r#"{
        "coord": {"lon": -123.12, "lat": 49.25},
        "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
        "main": {"temp": 11.4, "feels_like": 10.6, "temp_min": 9.9, "temp_max": 12.8, "pressure": 1012, "humidity": 82},
        "wind": {"speed": 4.1, "deg": 230},
        "dt": 1721052000,
        "name": "Vancouver"
    }"#;

    fn service(stub: StubTransport, credentials: Credentials) -> (WeatherService, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let fetcher = Arc::new(CachedFetcher::with_shared_transport(stub.clone()));
        (WeatherService::new(fetcher, credentials).with_base_url(URL), stub)
    }

    #[tokio::test]
    async fn test_current_weather_parses_response() {
        let stub = StubTransport::new();
        stub.respond(URL, 200, VALID_RESPONSE);
        let (service, stub) = service(stub, Credentials::fixed([(OPENWEATHER_API_KEY, "key")]));

        let weather = service.current("Vancouver").await.expect("should parse");

        assert_eq!(weather.name, "Vancouver");
        assert!((weather.main.temp - 11.4).abs() < 0.01);
        assert!((weather.main.humidity - 82.0).abs() < 0.01);
        assert_eq!(weather.summary(), Some("light rain"));
        assert!((weather.coord.lat - 49.25).abs() < 0.001);
        assert!(weather.observed_at().is_some());

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        let (_, params) = &requests[0];
        assert_eq!(params.get("q"), Some("Vancouver"));
        assert_eq!(params.get("units"), Some("metric"));
        assert_eq!(params.get("appid"), Some("key"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let (service, stub) = service(StubTransport::new(), Credentials::Fixed(Default::default()));

        let err = service.current("Vancouver").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_city_surfaces_upstream_error() {
        let stub = StubTransport::new();
        stub.respond(URL, 404, r#"{"cod":"404","message":"city not found"}"#);
        let (service, _stub) = service(stub, Credentials::fixed([(OPENWEATHER_API_KEY, "key")]));

        let err = service.current("Atlantis").await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert!(matches!(err, FetchError::Upstream { ref body, .. } if body.contains("city not found")));
    }

    #[tokio::test]
    async fn test_repeat_lookup_is_served_from_cache() {
        let stub = StubTransport::new();
        stub.respond(URL, 200, VALID_RESPONSE);
        let (service, stub) = service(stub, Credentials::fixed([(OPENWEATHER_API_KEY, "key")]));

        service.current("Vancouver").await.unwrap();
        service.current(" Vancouver ").await.unwrap();

        assert_eq!(stub.calls(), 1);
    }
}
