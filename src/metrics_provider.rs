use std::sync::atomic::AtomicU64;
use std::sync::LazyLock;

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_with_registry,
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Registry as PrometheusRegistry, TextEncoder,
};
use tracing::error;

use crate::command::server::Error;

pub static IN_FLIGHT_REQUESTS: AtomicU64 = AtomicU64::new(0);

pub static METRICS_PROVIDER: LazyLock<MetricsProvider> =
    LazyLock::new(|| MetricsProvider::new().expect("Unable to create metrics provider"));

pub struct MetricsProvider {
    registry: PrometheusRegistry,
    pub metric_http_request_total: IntCounterVec,
    pub metric_http_request_duration: HistogramVec,
    pub metric_http_request_in_flight: IntGauge,
    pub metric_cache_lookups_total: IntCounterVec,
    pub metric_upstream_requests_total: IntCounterVec,
}

fn registration_error(name: &str, error: &prometheus::Error) -> Error {
    error!("Unable to create {name} metric: {error}");
    Error::Initialization(format!("Unable to create {name} metric"))
}

impl MetricsProvider {
    pub fn new() -> Result<Self, Error> {
        let registry = PrometheusRegistry::new();

        let metric_http_request_total = register_int_counter_vec_with_registry!(
            "http_requests_total",
            "Total number of HTTP requests made.",
            &["method", "route", "status"],
            &registry
        )
        .map_err(|error| registration_error("http_requests_total", &error))?;

        let metric_http_request_duration = register_histogram_vec_with_registry!(
            "http_request_duration_ms",
            "The HTTP request latencies in milliseconds.",
            &["method", "route"],
            &registry
        )
        .map_err(|error| registration_error("http_request_duration_ms", &error))?;

        let metric_http_request_in_flight = register_int_gauge_with_registry!(
            "http_requests_in_flight",
            "The current number of in-flight HTTP requests.",
            &registry
        )
        .map_err(|error| registration_error("http_requests_in_flight", &error))?;

        let metric_cache_lookups_total = register_int_counter_vec_with_registry!(
            "cache_lookups_total",
            "Total number of cache lookups, by result.",
            &["result"],
            &registry
        )
        .map_err(|error| registration_error("cache_lookups_total", &error))?;

        let metric_upstream_requests_total = register_int_counter_vec_with_registry!(
            "upstream_requests_total",
            "Total number of requests sent to the character API, by outcome.",
            &["outcome"],
            &registry
        )
        .map_err(|error| registration_error("upstream_requests_total", &error))?;

        Ok(Self {
            registry,
            metric_http_request_total,
            metric_http_request_duration,
            metric_http_request_in_flight,
            metric_cache_lookups_total,
            metric_upstream_requests_total,
        })
    }

    pub fn gather(&self) -> Result<(String, Vec<u8>), Error> {
        let mut buffer = vec![];
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|error| Error::Internal(format!("Unable to encode metrics: {error}")))?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}
