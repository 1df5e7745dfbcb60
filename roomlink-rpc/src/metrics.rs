//! Request caller metrics
//!
//! - **calls_total**: calls by group, action and outcome (counter)
//! - **call_duration**: round-trip time in seconds (histogram)
//! - **errors_total**: failed calls by error kind (counter)

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

/// Request caller metrics for monitoring
pub struct RpcMetrics {
    /// Calls issued
    pub calls_total: Counter<u64>,
    /// Call round-trip time
    pub call_duration: Histogram<f64>,
    /// Failed calls
    pub errors_total: Counter<u64>,
}

impl RpcMetrics {
    /// Create metrics on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("roomlink.rpc.calls.total")
                .with_description("Calls issued")
                .build(),
            call_duration: meter
                .f64_histogram("roomlink.rpc.call.duration")
                .with_description("Call round-trip time")
                .with_unit("s")
                .build(),
            errors_total: meter
                .u64_counter("roomlink.rpc.errors.total")
                .with_description("Failed calls")
                .build(),
        }
    }

    /// Record one finished call
    pub fn record_call(&self, group: &str, action: &str, duration: Duration, error: Option<&str>) {
        let attributes = [
            KeyValue::new("group", group.to_string()),
            KeyValue::new("action", action.to_string()),
            KeyValue::new("outcome", if error.is_some() { "error" } else { "ok" }),
        ];
        self.calls_total.add(1, &attributes);
        self.call_duration.record(duration.as_secs_f64(), &attributes);

        if let Some(kind) = error {
            self.errors_total
                .add(1, &[KeyValue::new("error_type", kind.to_string())]);
        }
    }
}
