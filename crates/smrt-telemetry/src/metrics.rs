//! Metric descriptions.
//!
//! The request pipeline records through the `metrics` facade; whichever
//! recorder the application installs receives the values. Calling
//! [`describe_metrics`] once attaches units and help text.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `smrt_requests_total` | Counter | `bucket` |
//! | `smrt_request_duration_seconds` | Histogram | `bucket` |
//! | `smrt_broadcasts_total` | Counter | - |

use metrics::{describe_counter, describe_histogram, Unit};
pub use smrt_broadcast::BROADCASTS_TOTAL;
use smrt_middleware::stages::outcome::{REQUESTS_TOTAL, REQUEST_DURATION};

/// Registers descriptions for every metric the framework emits.
pub fn describe_metrics() {
    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "Completed requests by outcome bucket"
    );
    describe_histogram!(
        REQUEST_DURATION,
        Unit::Seconds,
        "Time from request arrival to response"
    );
    describe_counter!(BROADCASTS_TOTAL, Unit::Count, "Service broadcasts sent");
}

/// Names of every metric the framework emits.
pub fn metric_names() -> [&'static str; 3] {
    [REQUESTS_TOTAL, REQUEST_DURATION, BROADCASTS_TOTAL]
}
