//! Realtime client metrics
//!
//! OpenTelemetry instruments recorded by `RealtimeClient` when observability
//! is enabled through `ClientBuilder::with_observability()`.
//!
//! - **connection_state**: 0=disconnected, 1=connecting, 2=open, 3=closed (gauge)
//! - **reconnection_attempts** / **reconnection_success** (counters)
//! - **frames_sent** / **frames_dropped**: outbound join/leave frames (counters)
//! - **messages_dispatched**: addressed messages delivered to listeners (counter)
//! - **unaddressed_frames**: inbound frames without room/event/data (counter)
//! - **listener_failures**: listeners that panicked (counter)
//! - **errors_total**: transport errors by kind (counter)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state gauge
    pub connection_state: Gauge<i64>,
    /// Reconnection attempts issued by the retry loop
    pub reconnection_attempts: Counter<u64>,
    /// Connections opened by the retry loop
    pub reconnection_success: Counter<u64>,
    /// Outbound frames written to the socket
    pub frames_sent: Counter<u64>,
    /// Outbound frames dropped because no connection was open
    pub frames_dropped: Counter<u64>,
    /// Addressed messages dispatched to message listeners
    pub messages_dispatched: Counter<u64>,
    /// Inbound frames that were not dispatched
    pub unaddressed_frames: Counter<u64>,
    /// Listeners that panicked
    pub listener_failures: Counter<u64>,
    /// Transport errors
    pub errors_total: Counter<u64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("roomlink.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=open, 3=closed)")
                .build(),
            reconnection_attempts: meter
                .u64_counter("roomlink.client.reconnection.attempts")
                .with_description("Reconnection attempts issued by the retry loop")
                .build(),
            reconnection_success: meter
                .u64_counter("roomlink.client.reconnection.success")
                .with_description("Connections opened after a retry")
                .build(),
            frames_sent: meter
                .u64_counter("roomlink.client.frames.sent")
                .with_description("Join/leave frames written to the socket")
                .build(),
            frames_dropped: meter
                .u64_counter("roomlink.client.frames.dropped")
                .with_description("Join/leave frames dropped while not open")
                .build(),
            messages_dispatched: meter
                .u64_counter("roomlink.client.messages.dispatched")
                .with_description("Addressed messages delivered to listeners")
                .build(),
            unaddressed_frames: meter
                .u64_counter("roomlink.client.frames.unaddressed")
                .with_description("Inbound frames without room, event and data")
                .build(),
            listener_failures: meter
                .u64_counter("roomlink.client.listener.failures")
                .with_description("Listeners that panicked during dispatch")
                .build(),
            errors_total: meter
                .u64_counter("roomlink.client.errors.total")
                .with_description("Transport errors")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: crate::ConnectionState) {
        self.connection_state.record(state.as_gauge(), &[]);
    }

    /// Record an outbound frame
    pub fn record_frame(&self, kind: roomlink_core::FrameKind, sent: bool) {
        let attributes = &[KeyValue::new("type", kind.to_string())];
        if sent {
            self.frames_sent.add(1, attributes);
        } else {
            self.frames_dropped.add(1, attributes);
        }
    }

    /// Record a dispatched message
    pub fn record_message(&self, room: &str) {
        self.messages_dispatched
            .add(1, &[KeyValue::new("room", room.to_string())]);
    }

    /// Record an inbound frame that was not dispatched
    pub fn record_unaddressed(&self) {
        self.unaddressed_frames.add(1, &[]);
    }

    /// Record listener panics
    pub fn record_listener_failures(&self, count: usize) {
        if count > 0 {
            self.listener_failures.add(count as u64, &[]);
        }
    }

    /// Record a reconnection attempt
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a successful reconnection
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        self.errors_total
            .add(1, &[KeyValue::new("error_type", error_type.to_string())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionState;
    use roomlink_core::FrameKind;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");

        metrics.update_connection_state(ConnectionState::Open);
        metrics.record_frame(FrameKind::Join, true);
        metrics.record_frame(FrameKind::Leave, false);
        metrics.record_message("orders");
        metrics.record_unaddressed();
        metrics.record_listener_failures(0);
        metrics.record_listener_failures(2);
        metrics.record_reconnection_attempt();
        metrics.record_reconnection_success();
        metrics.record_error("handshake");
    }

    #[test]
    fn test_connection_state_gauge_values() {
        assert_eq!(ConnectionState::Disconnected.as_gauge(), 0);
        assert_eq!(ConnectionState::Connecting.as_gauge(), 1);
        assert_eq!(ConnectionState::Open.as_gauge(), 2);
        assert_eq!(ConnectionState::Closed.as_gauge(), 3);
    }
}
