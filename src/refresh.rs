//! Background polling on top of the cached fetcher
//!
//! Re-issues one request on a fixed interval and forwards each outcome over a
//! tokio channel. Whether a tick reaches the network is decided by the
//! fetcher's freshness window, not by the poller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::{CachedFetcher, RequestOptions};

/// Messages sent from the polling task
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A tick produced a payload
    Updated(Value),
    /// A tick failed; carries the error's message
    Failed(String),
    /// The task stopped after its last tick
    Finished,
}

/// Configuration for a polling task
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between ticks; the first tick fires immediately
    pub interval: Duration,
    /// Freshness window passed to the fetcher on every tick
    pub freshness: Duration,
    /// Stop after this many ticks; `None` polls until shut down
    pub max_ticks: Option<u32>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),  // 5 minutes
            freshness: crate::cache::DEFAULT_FRESHNESS,
            max_ticks: None,
        }
    }
}

/// Handle for controlling a polling task
pub struct RefreshHandle {
    /// Channel for receiving poll outcomes
    pub receiver: mpsc::Receiver<RefreshMessage>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns a task that polls `url` with `options` until shut down or out of ticks
    pub fn spawn(
        fetcher: Arc<CachedFetcher>,
        url: impl Into<String>,
        options: RequestOptions,
        config: RefreshConfig,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let url = url.into();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            let mut ticks = 0u32;

            loop {
                if config.max_ticks.is_some_and(|max| ticks >= max) {
                    break;
                }

                tokio::select! {
                    _ = interval.tick() => {
                        ticks += 1;
                        debug!(url = %url, tick = ticks, "polling");
                        let message = match fetcher
                            .request_within::<Value>(&url, &options, config.freshness)
                            .await
                        {
                            Ok(payload) => RefreshMessage::Updated(payload),
                            Err(err) => RefreshMessage::Failed(err.to_string()),
                        };
                        if msg_tx.send(message).await.is_err() {
                            // Receiver dropped, nobody is listening.
                            return;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            let _ = msg_tx.send(RefreshMessage::Finished).await;
        });

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next message; `None` once the task has exited
    pub async fn next(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Stops the polling task
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
