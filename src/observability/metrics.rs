//! Metrics collection.
//!
//! # Metrics
//! - `deeplink_dispatch_total` (counter): dispatches by scheme, outcome
//! - `deeplink_declines_total` (counter): handler declines by scheme
//! - `deeplink_routes_registered` (gauge): routes per scheme
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the embedding application installs
//!   an exporter, without one every call is a no-op

use ::metrics::{counter, gauge};

/// Outcome of a `route_url` call: `handled`, `unmatched` or `invalid_url`.
pub fn record_dispatch(scheme: &str, outcome: &'static str) {
    counter!(
        "deeplink_dispatch_total",
        "scheme" => scheme.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_decline(scheme: &str) {
    counter!("deeplink_declines_total", "scheme" => scheme.to_string()).increment(1);
}

pub fn record_route_count(scheme: &str, count: usize) {
    gauge!("deeplink_routes_registered", "scheme" => scheme.to_string()).set(count as f64);
}
