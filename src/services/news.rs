//! NewsAPI top headlines client

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SLOW_CHANGING;
use crate::cache::{CachedFetcher, RequestOptions};
use crate::config::{Credentials, NEWS_API_KEY};
use crate::error::FetchError;

/// Base URL for the NewsAPI top headlines endpoint
const NEWS_API_BASE_URL: &str = "https://newsapi.org/v2/top-headlines";

/// A page of headlines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headlines {
    /// Total matches on the provider side, not just this page
    pub total_results: u32,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Source,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Option<String>,
    pub name: String,
}

/// Client for news headlines
#[derive(Debug, Clone)]
pub struct NewsService {
    fetcher: Arc<CachedFetcher>,
    credentials: Credentials,
    base_url: String,
}

impl NewsService {
    pub fn new(fetcher: Arc<CachedFetcher>, credentials: Credentials) -> Self {
        Self {
            fetcher,
            credentials,
            base_url: NEWS_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches top headlines for a country, optionally narrowed to a category.
    /// Cached for 30 minutes.
    pub async fn top_headlines(
        &self,
        country: &str,
        category: Option<&str>,
    ) -> Result<Headlines, FetchError> {
        let api_key = self.credentials.require(NEWS_API_KEY)?;
        let mut options = RequestOptions::new()
            .param("country", country.trim().to_lowercase())
            .param("apiKey", api_key);
        if let Some(category) = category {
            options = options.param("category", category.trim().to_lowercase());
        }

        self.fetcher
            .request_within(&self.base_url, &options, SLOW_CHANGING)
            .await
    }
}
