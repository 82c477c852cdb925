//! Command-line interface parsing for dashfetch
//!
//! This module handles parsing of CLI arguments using clap: one subcommand per
//! data panel, plus raw `get` and `watch` commands for arbitrary JSON endpoints.

use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::{Params, RequestOptions};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--param` value is not of the form `name=value`
    #[error("Invalid parameter: '{0}'. Expected name=value")]
    InvalidParam(String),
}

/// dashfetch - fetch dashboard data through a shared response cache
#[derive(Parser, Debug)]
#[command(name = "dashfetch")]
#[command(about = "Fetch dashboard panel data (weather, markets, air quality, news) through a shared cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// GET a JSON endpoint through the cache
    Get {
        /// Target URL
        url: String,
        /// Query parameter as name=value; repeatable
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Freshness window in seconds (defaults to the configured window)
        #[arg(long, value_name = "SECS")]
        ttl: Option<u64>,
        /// Issue the same request this many times (repeats are served from cache)
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Re-issue a GET on a fixed interval
    Watch {
        /// Target URL
        url: String,
        /// Query parameter as name=value; repeatable
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Seconds between requests
        #[arg(long, default_value_t = 60)]
        every: u64,
        /// Stop after this many requests
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// Current weather for a city
    Weather {
        city: String,
    },
    /// Air quality at a coordinate pair
    Air {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Latest quote for a ticker symbol
    Stock {
        symbol: String,
    },
    /// Cryptocurrency prices
    Crypto {
        /// Comma-separated CoinGecko ids (e.g. bitcoin,ethereum)
        #[arg(value_delimiter = ',')]
        ids: Vec<String>,
        /// Quote currency
        #[arg(long = "vs", default_value = "usd")]
        vs: String,
    },
    /// Top news headlines
    News {
        /// Two-letter country code
        #[arg(long, default_value = "us")]
        country: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// COVID-19 totals, global or for one country
    Covid {
        #[arg(long)]
        country: Option<String>,
    },
    /// Load every panel concurrently
    Dashboard {
        #[arg(long, default_value = "London")]
        city: String,
        #[arg(long, default_value = "IBM")]
        symbol: String,
    },
}

/// Parses a `name=value` argument.
///
/// Only the first `=` splits, so values may contain `=`.
pub fn parse_param(s: &str) -> Result<(String, String), CliError> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidParam(s.to_string())),
    }
}

/// Builds request options from parsed `--param` pairs
pub fn request_options(params: &[(String, String)]) -> RequestOptions {
    RequestOptions::from(params.iter().cloned().collect::<Params>())
}

/// Converts an optional `--ttl` into a freshness window
pub fn ttl_window(ttl: Option<u64>) -> Option<Duration> {
    ttl.map(Duration::from_secs)
}
