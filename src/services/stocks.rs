//! Alpha Vantage stock quote client
//!
//! Alpha Vantage reports every number as a string and signals throttling with
//! a 200 response carrying a `Note` or `Information` message instead of a
//! quote. Those bodies, and quotes whose numbers do not parse, are dropped
//! from the cache before the error is returned.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::{CachedFetcher, RequestOptions};
use crate::config::{Credentials, ALPHA_VANTAGE_API_KEY};
use crate::error::{FetchError, RATE_LIMIT_STATUS};

/// Base URL for the Alpha Vantage query endpoint
const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Latest daily quote for a ticker symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockQuote {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: u64,
    pub latest_trading_day: NaiveDate,
    pub previous_close: f64,
    pub change: f64,
    /// Change in percent (e.g. `0.52` for "0.5200%")
    pub change_percent: f64,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: Option<RawQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "01. symbol")]
    symbol: String,
    #[serde(rename = "02. open")]
    open: String,
    #[serde(rename = "03. high")]
    high: String,
    #[serde(rename = "04. low")]
    low: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: String,
    #[serde(rename = "08. previous close")]
    previous_close: String,
    #[serde(rename = "09. change")]
    change: String,
    #[serde(rename = "10. change percent")]
    change_percent: String,
}

/// Client for stock quotes
#[derive(Debug, Clone)]
pub struct StockService {
    fetcher: Arc<CachedFetcher>,
    credentials: Credentials,
    base_url: String,
}

impl StockService {
    pub fn new(fetcher: Arc<CachedFetcher>, credentials: Credentials) -> Self {
        Self {
            fetcher,
            credentials,
            base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the latest quote for `symbol` (upper-cased), cached for 5 minutes
    pub async fn quote(&self, symbol: &str) -> Result<StockQuote, FetchError> {
        let api_key = self.credentials.require(ALPHA_VANTAGE_API_KEY)?;
        let options = RequestOptions::new()
            .param("function", "GLOBAL_QUOTE")
            .param("symbol", symbol.trim().to_uppercase())
            .param("apikey", api_key);

        let response: QuoteResponse = self.fetcher.request(&self.base_url, &options).await?;

        let result = match response {
            QuoteResponse {
                quote: Some(raw), ..
            } if !raw.symbol.is_empty() => parse_quote(&self.base_url, raw),
            QuoteResponse { note, information, error_message, .. } => Err(match note.or(information) {
                Some(message) => {
                    FetchError::upstream(&self.base_url, RATE_LIMIT_STATUS, "Too Many Requests", message)
                }
                None => FetchError::decode(
                    &self.base_url,
                    error_message.unwrap_or_else(|| format!("no quote for symbol {symbol}")),
                ),
            }),
        };

        // The provider answered 200 without a usable quote; that body must not be served again.
        if let Err(ref err) = result {
            self.fetcher.clear_one(&self.base_url, &options.params);
            err.report();
        }
        result
    }
}

fn parse_quote(url: &str, raw: RawQuote) -> Result<StockQuote, FetchError> {
    let number = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| FetchError::decode(url, format!("invalid {field}: '{value}'")))
    };

    Ok(StockQuote {
        open: number("open", &raw.open)?,
        high: number("high", &raw.high)?,
        low: number("low", &raw.low)?,
        price: number("price", &raw.price)?,
        volume: raw
            .volume
            .trim()
            .parse()
            .map_err(|_| FetchError::decode(url, format!("invalid volume: '{}'", raw.volume)))?,
        latest_trading_day: NaiveDate::parse_from_str(raw.latest_trading_day.trim(), "%Y-%m-%d")
            .map_err(|_| {
                FetchError::decode(
                    url,
                    format!("invalid latest trading day: '{}'", raw.latest_trading_day),
                )
            })?,
        previous_close: number("previous close", &raw.previous_close)?,
        change: number("change", &raw.change)?,
        change_percent: number("change percent", raw.change_percent.trim_end_matches('%'))?,
        symbol: raw.symbol,
    })
}
