//! Runtime configuration and credential lookup
//!
//! Fetcher settings come from `DASHFETCH_*` environment variables with sane
//! defaults. Provider credentials are looked up by name every time a service
//! needs one; an absent or empty value is reported, never papered over.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::cache::DEFAULT_FRESHNESS;
use crate::error::FetchError;

/// Credential for the Alpha Vantage market data API
pub const ALPHA_VANTAGE_API_KEY: &str = "ALPHA_VANTAGE_API_KEY";
/// Credential for the OpenWeatherMap weather and air pollution APIs
pub const OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";
/// Credential for the NewsAPI headlines API
pub const NEWS_API_KEY: &str = "NEWS_API_KEY";

/// Errors in fetcher configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Settings for the shared fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Freshness window for call sites that do not pass their own
    pub default_freshness: Duration,
    /// Transport timeout applied to every request, if any
    pub request_timeout: Option<Duration>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            default_freshness: DEFAULT_FRESHNESS,
            request_timeout: None,
            user_agent: format!("dashfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetcherConfig {
    pub const CACHE_TTL_VAR: &'static str = "DASHFETCH_CACHE_TTL_SECS";
    pub const TIMEOUT_VAR: &'static str = "DASHFETCH_TIMEOUT_SECS";

    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary name → value lookup
    ///
    /// Unset variables keep their defaults; set but unparsable ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(Self::CACHE_TTL_VAR) {
            config.default_freshness = parse_positive_secs(Self::CACHE_TTL_VAR, &raw)?;
        }
        if let Some(raw) = lookup(Self::TIMEOUT_VAR) {
            config.request_timeout = Some(parse_positive_secs(Self::TIMEOUT_VAR, &raw)?);
        }

        Ok(config)
    }
}

fn parse_positive_secs(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason,
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid("must be greater than zero")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(invalid("expected a whole number of seconds")),
    }
}

/// Where provider credentials come from
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    /// Read from the process environment at lookup time
    #[default]
    Environment,
    /// A fixed set of values
    Fixed(HashMap<String, String>),
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::Environment
    }

    /// A fixed credential set
    pub fn fixed<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Looks up a named credential.
    ///
    /// Returns `None` for absent or blank values and logs the omission; no
    /// default is ever substituted.
    pub fn get(&self, name: &str) -> Option<String> {
        let value = match self {
            Self::Environment => std::env::var(name).ok(),
            Self::Fixed(values) => values.get(name).cloned(),
        };
        match value {
            Some(value) if !value.trim().is_empty() => Some(value),
            _ => {
                warn!(credential = name, "credential is not configured");
                None
            }
        }
    }

    /// Like [`Credentials::get`], but turns absence into a failure
    pub fn require(&self, name: &str) -> Result<String, FetchError> {
        self.get(name)
            .ok_or_else(|| FetchError::missing_credential(name))
    }
}

/// Looks up a named credential from the process environment
pub fn get_configured_credential(name: &str) -> Option<String> {
    Credentials::Environment.get(name)
}
