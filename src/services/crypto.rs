//! CoinGecko simple price client

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CachedFetcher, RequestOptions};
use crate::error::FetchError;

/// Base URL for the CoinGecko simple price endpoint
const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Price of one coin in one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinPrice {
    /// CoinGecko coin id (e.g. "bitcoin")
    pub id: String,
    /// Quote currency (e.g. "usd")
    pub currency: String,
    pub price: f64,
    /// Percent change over the last 24 hours, when reported
    pub change_24h: Option<f64>,
}

/// Client for cryptocurrency prices. CoinGecko's public tier needs no key.
#[derive(Debug, Clone)]
pub struct CryptoService {
    fetcher: Arc<CachedFetcher>,
    base_url: String,
}

impl CryptoService {
    pub fn new(fetcher: Arc<CachedFetcher>) -> Self {
        Self {
            fetcher,
            base_url: COINGECKO_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches prices for `ids` quoted in `currency`
    ///
    /// Ids are trimmed, lower-cased, de-duplicated and sorted so that the same
    /// set of coins always maps to the same cache entry. Coins the provider does
    /// not know are left out of the result; if none are known the call fails.
    pub async fn prices(&self, ids: &[&str], currency: &str) -> Result<Vec<CoinPrice>, FetchError> {
        let ids = normalize_ids(ids);
        if ids.is_empty() {
            return Err(FetchError::setup(&self.base_url, "no coin ids given"));
        }
        let currency = currency.trim().to_lowercase();
        let options = RequestOptions::new()
            .param("ids", ids.join(","))
            .param("vs_currencies", &currency)
            .param("include_24hr_change", "true");

        // Values are nullable: CoinGecko sends `null` for a change it cannot compute.
        let response: HashMap<String, HashMap<String, Option<f64>>> =
            self.fetcher.request(&self.base_url, &options).await?;

        let change_key = format!("{currency}_24h_change");
        let prices: Vec<CoinPrice> = ids
            .into_iter()
            .filter_map(|id| {
                let quotes = response.get(&id)?;
                let price = (*quotes.get(&currency)?)?;
                Some(CoinPrice {
                    change_24h: quotes.get(&change_key).copied().flatten(),
                    currency: currency.clone(),
                    price,
                    id,
                })
            })
            .collect();

        if prices.is_empty() {
            self.fetcher.clear_one(&self.base_url, &options.params);
            let err = FetchError::decode(
                &self.base_url,
                format!("no prices in {currency} for the requested coins"),
            );
            err.report();
            return Err(err);
        }
        Ok(prices)
    }
}

fn normalize_ids(ids: &[&str]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim().to_lowercase())
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::StubTransport;

    const URL: &str = "http://crypto.test/simple/price";

    const VALID_RESPONSE: &str = r#"{
        "bitcoin": {"usd": 64123.5, "usd_24h_change": -1.25},
        "ethereum": {"usd": 3401.2}
    }"#;

    fn service(stub: StubTransport) -> (CryptoService, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let fetcher = Arc::new(CachedFetcher::with_shared_transport(stub.clone()));
        (CryptoService::new(fetcher).with_base_url(URL), stub)
    }

    #[test]
    fn test_normalize_ids() {
        assert_eq!(
            normalize_ids(&[" Ethereum", "bitcoin", "ETHEREUM", ""]),
            vec!["bitcoin".to_string(), "ethereum".to_string()]
        );
    }

    #[tokio::test]
    async fn test_prices_in_id_order() {
        let stub = StubTransport::new();
        stub.respond(URL, 200, VALID_RESPONSE);
        let (service, stub) = service(stub);

        let prices = service
            .prices(&["ethereum", "bitcoin", "dogecoin"], "USD")
            .await
            .expect("should parse");

        assert_eq!(prices.len(), 2, "unknown coins are skipped");
        assert_eq!(prices[0].id, "bitcoin");
        assert_eq!(prices[0].change_24h, Some(-1.25));
        assert_eq!(prices[1].id, "ethereum");
        assert_eq!(prices[1].currency, "usd");
        assert_eq!(prices[1].change_24h, None);

        let (_, params) = &stub.requests()[0];
        assert_eq!(params.get("ids"), Some("bitcoin,dogecoin,ethereum"));
        assert_eq!(params.get("vs_currencies"), Some("usd"));
    }

    #[tokio::test]
    async fn test_reordered_ids_share_cache_entry() {
        let stub = StubTransport::new();
        stub.respond(URL, 200, VALID_RESPONSE);
        let (service, stub) = service(stub);

        service.prices(&["bitcoin", "ethereum"], "usd").await.unwrap();
        service.prices(&["ethereum", "bitcoin"], "usd").await.unwrap();

        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_null_change_is_tolerated() {
        let stub = StubTransport::new();
        stub.respond(URL, 200, r#"{"bitcoin": {"usd": 64123.5, "usd_24h_change": null}}"#);
        let (service, _stub) = service(stub);

        let prices = service.prices(&["bitcoin"], "usd").await.expect("should parse");

        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].change_24h, None);
    }

    #[tokio::test]
    async fn test_no_known_coins_is_decode_error_and_not_cached() {
        let stub = StubTransport::new();
        stub.respond(URL, 200, "{}");
        stub.respond(URL, 200, VALID_RESPONSE);
        let (service, stub) = service(stub);

        let err = service.prices(&["bitcoin"], "usd").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let prices = service.prices(&["bitcoin"], "usd").await.expect("retry should refetch");
        assert_eq!(prices[0].id, "bitcoin");
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_ids_is_setup_error() {
        let (service, stub) = service(StubTransport::new());

        let err = service.prices(&[" "], "usd").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Setup);
        assert_eq!(stub.calls(), 0);
    }
}
