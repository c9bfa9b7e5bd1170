//! # Host Metrics
//!
//! Prometheus metrics for the initialization queue and the ambient overlay.
//!
//! ## Usage
//!
//! Enabled by the default `metrics` feature:
//! ```toml
//! prerender-host = { path = "...", default-features = false }  # disables metrics
//! ```
//!
//! ## Metrics Exported
//!
//! - `prerender_init_requests_total` - Counter of init requests entering the queue
//! - `prerender_init_completed_total` - Counter of finished inits (by outcome)
//! - `prerender_init_queue_depth` - Gauge of requests waiting behind an active init, summed over host contexts
//! - `prerender_overlay_bindings` - Gauge of ambient bindings currently held, summed over overlays
//! - `prerender_init_duration_seconds` - Histogram of admitted pipeline durations

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    exponential_buckets, register_counter_vec, register_gauge, register_histogram,
    register_int_counter, CounterVec, Gauge, Histogram, IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Init requests entering the queue
    pub static ref INIT_REQUESTS: IntCounter = register_int_counter!(
        "prerender_init_requests_total",
        "Total number of app instance init requests"
    )
    .expect("Failed to create INIT_REQUESTS metric");

    /// Finished inits, labeled by outcome
    pub static ref INIT_COMPLETED: CounterVec = register_counter_vec!(
        "prerender_init_completed_total",
        "Total number of finished app instance inits",
        &["outcome"]
    )
    .expect("Failed to create INIT_COMPLETED metric");

    /// Requests waiting behind the active init
    pub static ref INIT_QUEUE_DEPTH: Gauge = register_gauge!(
        "prerender_init_queue_depth",
        "Number of init requests waiting for the active slot"
    )
    .expect("Failed to create INIT_QUEUE_DEPTH metric");

    /// Ambient bindings currently held
    pub static ref OVERLAY_BINDINGS: Gauge = register_gauge!(
        "prerender_overlay_bindings",
        "Number of ambient bindings currently installed"
    )
    .expect("Failed to create OVERLAY_BINDINGS metric");

    /// Time from admission to completion
    pub static ref INIT_DURATION: Histogram = register_histogram!(
        "prerender_init_duration_seconds",
        "Time spent in the admitted part of the init pipeline",
        exponential_buckets(0.001, 2.0, 14).unwrap_or_default()
    )
    .expect("Failed to create INIT_DURATION metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record an init request
#[cfg(feature = "metrics")]
pub fn record_init_requested() {
    INIT_REQUESTS.inc();
}

/// Record a finished init with its outcome label and duration
#[cfg(feature = "metrics")]
pub fn record_init_completed(outcome: &str, seconds: f64) {
    INIT_COMPLETED.with_label_values(&[outcome]).inc();
    INIT_DURATION.observe(seconds);
}

/// Shift the queue depth gauge by `delta` waiting requests.
///
/// Every serializer reports its own changes, so the gauge sums all host
/// contexts in the process.
#[cfg(feature = "metrics")]
pub fn adjust_queue_depth(delta: i64) {
    INIT_QUEUE_DEPTH.add(delta as f64);
}

/// Shift the held bindings gauge by `delta` slots, summed across overlays.
#[cfg(feature = "metrics")]
pub fn adjust_overlay_bindings(delta: i64) {
    OVERLAY_BINDINGS.add(delta as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_init_requested() {}

#[cfg(not(feature = "metrics"))]
pub fn record_init_completed(_outcome: &str, _seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn adjust_queue_depth(_delta: i64) {}

#[cfg(not(feature = "metrics"))]
pub fn adjust_overlay_bindings(_delta: i64) {}
