//! dashfetch - fetch dashboard panel data through a shared response cache
//!
//! Each subcommand calls one data service (or a raw endpoint) and prints the
//! decoded payload as JSON. Logs go to stderr and are controlled by `RUST_LOG`.

use std::error::Error;
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::future::{join_all, FutureExt, LocalBoxFuture};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dashfetch::cache::CachedFetcher;
use dashfetch::cli::{request_options, ttl_window, Cli, Command};
use dashfetch::config::{Credentials, FetcherConfig};
use dashfetch::error::FetchError;
use dashfetch::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use dashfetch::services::{
    AirQualityService, CryptoService, EpidemicService, NewsService, StockService, WeatherService,
};

type BoxError = Box<dyn Error>;

/// Sets up log output on stderr, filtered by `RUST_LOG` (default `dashfetch=info`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dashfetch=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Wraps one panel fetch so every panel yields the same output type
fn panel<'a, T, F>(name: &'static str, fetch: F) -> LocalBoxFuture<'a, (&'static str, Value)>
where
    T: Serialize,
    F: Future<Output = Result<T, FetchError>> + 'a,
{
    async move {
        let value = match fetch.await {
            Ok(payload) => serde_json::to_value(payload)
                .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() })),
            Err(err) => serde_json::json!({ "error": err.to_string() }),
        };
        (name, value)
    }
    .boxed_local()
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let config = FetcherConfig::from_env()?;
    let fetcher = Arc::new(CachedFetcher::from_config(&config)?);
    let credentials = Credentials::from_env();

    match cli.command {
        Command::Get {
            url,
            params,
            ttl,
            repeat,
        } => {
            let options = request_options(&params);
            let window = ttl_window(ttl).unwrap_or(fetcher.default_freshness());
            for attempt in 1..=repeat.max(1) {
                let payload: Value = fetcher.request_within(&url, &options, window).await?;
                debug!(attempt, "request completed");
                print_json(&payload)?;
            }
        }
        Command::Watch {
            url,
            params,
            every,
            count,
        } => {
            let refresh = RefreshConfig {
                interval: Duration::from_secs(every.max(1)),
                freshness: fetcher.default_freshness(),
                max_ticks: Some(count),
            };
            let mut handle = RefreshHandle::spawn(fetcher.clone(), url, request_options(&params), refresh);
            while let Some(message) = handle.next().await {
                match message {
                    RefreshMessage::Updated(payload) => print_json(&payload)?,
                    RefreshMessage::Failed(message) => eprintln!("Error: {message}"),
                    RefreshMessage::Finished => break,
                }
            }
        }
        Command::Weather { city } => {
            let weather = WeatherService::new(fetcher, credentials).current(&city).await?;
            print_json(&weather)?;
        }
        Command::Air { lat, lon } => {
            let air = AirQualityService::new(fetcher, credentials).current(lat, lon).await?;
            print_json(&air)?;
        }
        Command::Stock { symbol } => {
            let quote = StockService::new(fetcher, credentials).quote(&symbol).await?;
            print_json(&quote)?;
        }
        Command::Crypto { ids, vs } => {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            let prices = CryptoService::new(fetcher).prices(&ids, &vs).await?;
            print_json(&prices)?;
        }
        Command::News { country, category } => {
            let headlines = NewsService::new(fetcher, credentials)
                .top_headlines(&country, category.as_deref())
                .await?;
            print_json(&headlines)?;
        }
        Command::Covid { country } => {
            let service = EpidemicService::new(fetcher);
            let totals = match country {
                Some(country) => service.country(&country).await?,
                None => service.global().await?,
            };
            print_json(&totals)?;
        }
        Command::Dashboard { city, symbol } => {
            let weather = WeatherService::new(fetcher.clone(), credentials.clone());
            let air = AirQualityService::new(fetcher.clone(), credentials.clone());
            let stocks = StockService::new(fetcher.clone(), credentials.clone());
            let crypto = CryptoService::new(fetcher.clone());
            let news = NewsService::new(fetcher.clone(), credentials);
            let epidemic = EpidemicService::new(fetcher);

            let weather_and_air = async {
                let current = weather.current(&city).await?;
                let quality = air.current(current.coord.lat, current.coord.lon).await?;
                Ok::<_, FetchError>(serde_json::json!({ "current": current, "air_quality": quality }))
            };

            let panels = join_all(vec![
                panel("weather", weather_and_air),
                panel("stock", stocks.quote(&symbol)),
                panel("crypto", crypto.prices(&["bitcoin", "ethereum"], "usd")),
                panel("news", news.top_headlines("us", None)),
                panel("covid", epidemic.global()),
            ])
            .await;

            let failed = panels.iter().filter(|(_, value)| value.get("error").is_some()).count();
            info!(panels = panels.len(), failed, "dashboard loaded");

            let output: Map<String, Value> = panels
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            print_json(&output)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment from .env"),
        Err(_) => debug!("no .env file found, using process environment"),
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
