//! disease.sh COVID-19 statistics client

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::SLOW_CHANGING;
use crate::cache::{CachedFetcher, RequestOptions};
use crate::error::FetchError;

/// Base URL for the disease.sh COVID-19 endpoints
const DISEASE_SH_BASE_URL: &str = "https://disease.sh/v3/covid-19";

/// Cumulative and same-day case counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpidemicTotals {
    /// Country name, absent for global totals
    #[serde(default)]
    pub country: Option<String>,
    pub cases: u64,
    pub today_cases: u64,
    pub deaths: u64,
    pub today_deaths: u64,
    pub recovered: u64,
    pub active: u64,
    /// Last update as unix milliseconds
    pub updated: i64,
}

impl EpidemicTotals {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.updated)
    }
}

/// Client for epidemiological statistics. No credential needed.
#[derive(Debug, Clone)]
pub struct EpidemicService {
    fetcher: Arc<CachedFetcher>,
    base_url: String,
}

impl EpidemicService {
    pub fn new(fetcher: Arc<CachedFetcher>) -> Self {
        Self {
            fetcher,
            base_url: DISEASE_SH_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Global totals, cached for 30 minutes
    pub async fn global(&self) -> Result<EpidemicTotals, FetchError> {
        let url = self.endpoint(&["all"])?;
        self.fetcher
            .request_within(&url, &RequestOptions::new(), SLOW_CHANGING)
            .await
    }

    /// Totals for one country (name or ISO code), cached for 30 minutes
    pub async fn country(&self, country: &str) -> Result<EpidemicTotals, FetchError> {
        let url = self.endpoint(&["countries", country.trim()])?;
        self.fetcher
            .request_within(&url, &RequestOptions::new(), SLOW_CHANGING)
            .await
    }

    /// Appends percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<String, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| FetchError::setup(&self.base_url, e))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::setup(&self.base_url, "base URL cannot have a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::StubTransport;

    const BASE: &str = "http://disease.test/v3/covid-19";

    const GLOBAL_RESPONSE: &str = r#"{
        "updated": 1721052000000,
        "cases": 704753890,
        "todayCases": 0,
        "deaths": 7010681,
        "todayDeaths": 0,
        "recovered": 675619811,
        "todayRecovered": 0,
        "active": 22123398,
        "affectedCountries": 231
    }"#;

    const COUNTRY_RESPONSE: &str = r#"{
        "updated": 1721052000000,
        "country": "New Zealand",
        "countryInfo": {"iso2": "NZ"},
        "cases": 2590000,
        "todayCases": 12,
        "deaths": 4200,
        "todayDeaths": 0,
        "recovered": 2570000,
        "active": 15800
    }"#;

    fn service(stub: StubTransport) -> (EpidemicService, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let fetcher = Arc::new(CachedFetcher::with_shared_transport(stub.clone()));
        (EpidemicService::new(fetcher).with_base_url(BASE), stub)
    }

    #[tokio::test]
    async fn test_global_totals() {
        let stub = StubTransport::new();
        stub.respond("http://disease.test/v3/covid-19/all", 200, GLOBAL_RESPONSE);
        let (service, _stub) = service(stub);

        let totals = service.global().await.expect("should parse");

        assert!(totals.country.is_none());
        assert_eq!(totals.cases, 704_753_890);
        assert_eq!(totals.active, 22_123_398);
        assert!(totals.updated_at().is_some());
    }

    #[tokio::test]
    async fn test_country_name_is_path_encoded() {
        let url = "http://disease.test/v3/covid-19/countries/New%20Zealand";
        let stub = StubTransport::new();
        stub.respond(url, 200, COUNTRY_RESPONSE);
        let (service, stub) = service(stub);

        let totals = service.country("New Zealand").await.expect("should parse");

        assert_eq!(totals.country.as_deref(), Some("New Zealand"));
        assert_eq!(totals.today_cases, 12);
        assert_eq!(stub.calls_to(url), 1);
    }

    #[tokio::test]
    async fn test_unknown_country_is_upstream_error() {
        let url = "http://disease.test/v3/covid-19/countries/Narnia";
        let stub = StubTransport::new();
        stub.respond(
            url,
            404,
            r#"{"message":"Country not found or doesn't have any cases"}"#,
        );
        let (service, _stub) = service(stub);

        let err = service.country("Narnia").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamStatus);
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_setup_error() {
        let (service, stub) = service(StubTransport::new());
        let service = service.with_base_url("not a url");

        let err = service.global().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Setup);
        assert_eq!(stub.calls(), 0);
    }
}
