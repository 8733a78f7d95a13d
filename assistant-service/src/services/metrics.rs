//! Prometheus metrics for assistant-service.
//!
//! Counts HTTP traffic, chat-provider calls, enrichment decisions and `/ask`
//! routing outcomes.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Provider metrics
pub static PROVIDER_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Pipeline metrics
pub static IMAGES_ANALYZED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ENRICHMENT_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ASK_ROUTED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT: Once = Once::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests = IntCounterVec::new(
        Opts::new("assistant_http_requests_total", "Total HTTP requests"),
        &["route", "status"],
    )
    .expect("Failed to create assistant_http_requests_total metric");

    // outcome: ok, timeout, rate_limited, api_error, ...
    let provider_requests = IntCounterVec::new(
        Opts::new(
            "assistant_provider_requests_total",
            "Total chat-completion calls",
        ),
        &["provider", "call", "outcome"],
    )
    .expect("Failed to create assistant_provider_requests_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "assistant_provider_latency_seconds",
            "Chat-completion API latency in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 45.0, 60.0, 110.0]),
        &["provider", "call"],
    )
    .expect("Failed to create assistant_provider_latency_seconds metric");

    let images_analyzed = IntCounterVec::new(
        Opts::new("assistant_images_analyzed_total", "Total analyzed images"),
        &["outcome"],
    )
    .expect("Failed to create assistant_images_analyzed_total metric");

    let enrichment = IntCounterVec::new(
        Opts::new("assistant_enrichment_total", "Total enrichment calls"),
        &["outcome"],
    )
    .expect("Failed to create assistant_enrichment_total metric");

    let ask_routed = IntCounterVec::new(
        Opts::new("assistant_ask_routed_total", "Total /ask routing decisions"),
        &["route"],
    )
    .expect("Failed to create assistant_ask_routed_total metric");

    registry
        .register(Box::new(http_requests.clone()))
        .expect("Failed to register assistant_http_requests_total");
    registry
        .register(Box::new(provider_requests.clone()))
        .expect("Failed to register assistant_provider_requests_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register assistant_provider_latency_seconds");
    registry
        .register(Box::new(images_analyzed.clone()))
        .expect("Failed to register assistant_images_analyzed_total");
    registry
        .register(Box::new(enrichment.clone()))
        .expect("Failed to register assistant_enrichment_total");
    registry
        .register(Box::new(ask_routed.clone()))
        .expect("Failed to register assistant_ask_routed_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests);
    let _ = PROVIDER_REQUESTS_TOTAL.set(provider_requests);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = IMAGES_ANALYZED_TOTAL.set(images_analyzed);
    let _ = ENRICHMENT_TOTAL.set(enrichment);
    let _ = ASK_ROUTED_TOTAL.set(ask_routed);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(route: &str, status: u16) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        let status = status.to_string();
        counter.with_label_values(&[route, status.as_str()]).inc();
    }
}

/// Record a finished provider call and its latency.
pub fn record_provider_call(provider: &str, call: &str, outcome: &str, duration_secs: f64) {
    if let Some(counter) = PROVIDER_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[provider, call, outcome]).inc();
    }
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, call])
            .observe(duration_secs);
    }
}

/// Record whether an image produced an analysis or the error placeholder.
pub fn record_image_analyzed(outcome: &str) {
    if let Some(counter) = IMAGES_ANALYZED_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record the outcome of an enrichment call (applied, unparsed, failed).
pub fn record_enrichment(outcome: &str) {
    if let Some(counter) = ENRICHMENT_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record how `/ask` answered (category, model, fallback).
pub fn record_ask_route(route: &str) {
    if let Some(counter) = ASK_ROUTED_TOTAL.get() {
        counter.with_label_values(&[route]).inc();
    }
}
