//! Helpers for exercising the fetcher without a network

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cache::{Params, RequestOptions};
use crate::transport::{Transport, TransportError, TransportResponse};

/// Macro to initialize tracing for tests
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(INFO)` - uses specified level
#[macro_export]
macro_rules! init_test_tracing {
    () => {
        $crate::init_test_tracing!(DEBUG);
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

pub use crate::init_test_tracing;

type Outcome = Result<TransportResponse, TransportError>;

struct Route {
    url: String,
    params: Option<Params>,
    outcomes: VecDeque<Outcome>,
}

/// In-memory transport with canned outcomes and a call log
///
/// Outcomes queued for a route are handed out in order; the last one keeps
/// being returned once the queue is down to it. Requests with no matching
/// route fail with [`TransportError::NoResponse`].
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response for every request to `url`
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.push(url, None, Ok(TransportResponse::new(status, body)));
    }

    /// Queue a JSON response for requests to `url` carrying exactly `params`
    pub fn respond_to(&self, url: &str, params: Params, status: u16, body: &str) {
        self.push(url, Some(params), Ok(TransportResponse::new(status, body)));
    }

    /// Queue a transport failure for every request to `url`
    pub fn fail(&self, url: &str, err: TransportError) {
        self.push(url, None, Err(err));
    }

    fn push(&self, url: &str, params: Option<Params>, outcome: Outcome) {
        let mut routes = self.routes.lock();
        if let Some(route) = routes
            .iter_mut()
            .find(|route| route.url == url && route.params == params)
        {
            route.outcomes.push_back(outcome);
            return;
        }
        routes.push(Route {
            url: url.to_string(),
            params,
            outcomes: VecDeque::from([outcome]),
        });
    }

    /// Total number of requests that reached the transport
    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of requests to `url`, any parameters
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|(u, _)| u == url).count()
    }

    /// Every request seen so far, in arrival order
    pub fn requests(&self) -> Vec<(String, Params)> {
        self.calls.lock().clone()
    }

    fn next_outcome(&self, url: &str, params: &Params) -> Outcome {
        let mut routes = self.routes.lock();
        // Routes bound to exact params win over catch-all routes for the URL.
        let index = routes
            .iter()
            .position(|route| route.url == url && route.params.as_ref() == Some(params))
            .or_else(|| {
                routes
                    .iter()
                    .position(|route| route.url == url && route.params.is_none())
            });

        match index.map(|i| &mut routes[i]) {
            Some(route) if route.outcomes.len() > 1 => route
                .outcomes
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::NoResponse("stub exhausted".to_string()))),
            Some(route) => route
                .outcomes
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::NoResponse("stub exhausted".to_string()))),
            None => Err(TransportError::NoResponse(format!("no stub for {url}"))),
        }
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &str, options: &RequestOptions) -> Outcome {
        self.calls
            .lock()
            .push((url.to_string(), options.params.clone()));
        // Give concurrent callers a chance to interleave, like a real socket would.
        tokio::task::yield_now().await;
        self.next_outcome(url, &options.params)
    }
}
