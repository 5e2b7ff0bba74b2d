//! Prometheus metrics for the storefront.
//!
//! The registry lives in application state instead of a process global, so
//! every router (and every test) observes its own counters. [`track`] is the
//! single place where per-request metrics and the access log line are emitted.

use std::{fmt, time::Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use prometheus_client::{
    encoding::{EncodeLabelSet, text::encode},
    metrics::{
        counter::Counter,
        family::Family,
        histogram::{Histogram, exponential_buckets},
    },
    registry::Registry,
};

use crate::state::AppState;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub endpoint: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EndpointLabels {
    pub method: String,
    pub endpoint: String,
}

#[derive(Debug)]
pub struct HttpMetrics {
    registry: Registry,
    pub http_requests_total: Family<RequestLabels, Counter>,
    pub http_request_duration_seconds: Family<EndpointLabels, Histogram>,
    pub orders_created_total: Counter,
}

impl HttpMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Counters get their `_total` suffix from the encoder.
        let http_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total HTTP requests",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds =
            Family::<EndpointLabels, Histogram>::new_with_constructor(|| {
                // 5ms .. ~10s
                Histogram::new(exponential_buckets(0.005, 2.0, 12))
            });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration",
            http_request_duration_seconds.clone(),
        );

        let orders_created_total = Counter::default();
        registry.register(
            "orders_created",
            "Total orders created",
            orders_created_total.clone(),
        );

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            orders_created_total,
        }
    }

    pub fn observe_request(&self, method: &str, endpoint: &str, status: u16, seconds: f64) {
        self.http_requests_total
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                status: status.to_string(),
            })
            .inc();
        self.http_request_duration_seconds
            .get_or_create(&EndpointLabels {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
            })
            .observe(seconds);
    }

    /// Current value of one `http_requests_total` series, 0 when it has never
    /// been recorded. Reads the exposition so the lookup creates no series.
    pub fn request_count(&self, method: &str, endpoint: &str, status: u16) -> u64 {
        let Ok(text) = self.encode() else {
            return 0;
        };
        let series = format!(
            "http_requests_total{{method=\"{method}\",endpoint=\"{endpoint}\",status=\"{status}\"}} "
        );
        text.lines()
            .find_map(|line| line.strip_prefix(&series))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Encode the registry in the OpenMetrics text format.
    pub fn encode(&self) -> Result<String, fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for HttpMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Record one counter increment, one duration observation and one log line
/// for every request passing through, whatever status the inner service
/// produced.
pub async fn track(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    state
        .metrics
        .observe_request(&method, &endpoint, status, elapsed.as_secs_f64());
    tracing::info!(
        method = %method,
        path = %path,
        status,
        duration_ms = elapsed.as_secs_f64() * 1000.0,
        "request completed"
    );

    response
}
