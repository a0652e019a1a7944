//! Prometheus metrics for the scheduler and the grading queue

use std::sync::LazyLock;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Applied lifecycle transitions by kind
pub static COMPETITION_TRANSITIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "competition_transitions_total",
        "Competition status transitions applied by the scheduler",
    );
    IntCounterVec::new(opts, &["transition"]).expect("Failed to create counter")
});

/// Failed scheduler cycles
pub static SCHEDULER_CYCLE_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "scheduler_cycle_failures_total",
        "Scheduler cycles aborted by a store error",
    )
    .expect("Failed to create counter")
});

/// Items sitting in the dispatch channel
pub static QUEUE_DEPTH: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new("submission_queue_depth", "Submissions waiting for a worker")
        .expect("Failed to create gauge")
});

/// Graded submissions by verdict
pub static SUBMISSIONS_GRADED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let opts = Opts::new("submissions_graded_total", "Graded submissions by verdict");
    IntCounterVec::new(opts, &["verdict"]).expect("Failed to create counter")
});

/// Submissions dropped after a grading failure
pub static SUBMISSIONS_FAILED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "submissions_failed_total",
        "Submissions that could not be graded",
    )
    .expect("Failed to create counter")
});

/// Gradings currently in flight
pub static ACTIVE_GRADINGS: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new("active_gradings", "Grading calls currently in flight")
        .expect("Failed to create gauge")
});

/// Register all metrics with the global registry
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(COMPETITION_TRANSITIONS.clone()),
        Box::new(SCHEDULER_CYCLE_FAILURES.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(SUBMISSIONS_GRADED.clone()),
        Box::new(SUBMISSIONS_FAILED.clone()),
        Box::new(ACTIVE_GRADINGS.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            tracing::warn!("Failed to register metric: {}", e);
        }
    }
}

/// Record an applied transition
pub fn record_transition(transition: &str) {
    COMPETITION_TRANSITIONS
        .with_label_values(&[transition])
        .inc();
}

/// Record a verdict
pub fn record_verdict(verdict: &str) {
    SUBMISSIONS_GRADED.with_label_values(&[verdict]).inc();
}

/// Encode the registry in the Prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
