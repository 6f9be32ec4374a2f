//! Metric names and registration.
//!
//! All counters use the `metrics` facade; the embedding application decides
//! which recorder (if any) to install.

use metrics::describe_counter;

/// Envelopes accepted by the bus transport.
pub const EVENTS_PUBLISHED: &str = "formbridge_events_published_total";
/// Entries the bus transport rejected.
pub const PUBLISH_FAILURES: &str = "formbridge_publish_failures_total";
/// Envelopes no routing rule matched.
pub const UNMATCHED_EVENTS: &str = "formbridge_unmatched_events_total";
/// Handler invocations that failed.
pub const HANDLER_FAILURES: &str = "formbridge_handler_failures_total";
/// Pipeline executions that hit their deadline.
pub const PIPELINE_TIMEOUTS: &str = "formbridge_pipeline_timeouts_total";

/// Registers descriptions for every counter this crate emits.
///
/// Call once at startup, after installing a metrics recorder.
pub fn describe_metrics() {
    describe_counter!(
        EVENTS_PUBLISHED,
        "Total envelopes accepted by the bus transport"
    );
    describe_counter!(PUBLISH_FAILURES, "Total entries the bus transport rejected");
    describe_counter!(
        UNMATCHED_EVENTS,
        "Total envelopes that matched no routing rule"
    );
    describe_counter!(HANDLER_FAILURES, "Total handler invocations that failed");
    describe_counter!(
        PIPELINE_TIMEOUTS,
        "Total pipeline executions that hit their deadline"
    );
}
