use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, TextEncoder,
};

use crate::services::EngineStats;

static ACTIONS_RECEIVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "similarity_actions_received_total",
        "User action messages received from Kafka",
    )
    .expect("failed to create similarity_actions_received_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register similarity_actions_received_total");
    counter
});

static ACTIONS_SKIPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "similarity_actions_skipped_total",
            "User action messages skipped before reaching the engine",
        ),
        &["reason"],
    )
    .expect("failed to create similarity_actions_skipped_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register similarity_actions_skipped_total");
    counter
});

static SCORES_EMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "similarity_scores_emitted_total",
        "Similarity scores handed to the publisher",
    )
    .expect("failed to create similarity_scores_emitted_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register similarity_scores_emitted_total");
    counter
});

static PUBLISH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "similarity_publish_failures_total",
        "Similarity scores dropped because publishing failed",
    )
    .expect("failed to create similarity_publish_failures_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register similarity_publish_failures_total");
    counter
});

static TRACKED_EVENTS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "similarity_tracked_events",
        "Events with at least one recorded interaction",
    )
    .expect("failed to create similarity_tracked_events");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register similarity_tracked_events");
    gauge
});

static TRACKED_PAIRS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "similarity_tracked_pairs",
        "Event pairs with a recorded min-sum",
    )
    .expect("failed to create similarity_tracked_pairs");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register similarity_tracked_pairs");
    gauge
});

static APPLY_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "similarity_apply_duration_seconds",
            "Time spent applying one action to the engine",
        )
        .buckets(vec![0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
    )
    .expect("failed to create similarity_apply_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register similarity_apply_duration_seconds");
    histogram
});

pub fn record_action_received() {
    ACTIONS_RECEIVED_TOTAL.inc();
}

pub fn record_action_skipped(reason: &str) {
    ACTIONS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_scores_emitted(count: usize) {
    SCORES_EMITTED_TOTAL.inc_by(count as u64);
}

pub fn record_publish_failure() {
    PUBLISH_FAILURES_TOTAL.inc();
}

pub fn observe_apply(seconds: f64) {
    APPLY_DURATION_SECONDS.observe(seconds);
}

pub fn record_engine_size(stats: &EngineStats) {
    TRACKED_EVENTS.set(stats.events as i64);
    TRACKED_PAIRS.set(stats.pairs as i64);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
