//! Request caller builder
//!
//! ```rust
//! use roomlink_rpc::{Notification, RequestCaller};
//! use std::time::Duration;
//!
//! let api = RequestCaller::builder()
//!     .host("https://app.example.com/api")
//!     .timeout(Duration::from_secs(10))
//!     .notifier(|n: &Notification| eprintln!("{}: {}", n.title, n.message_text()))
//!     .navigator(|location: &str| println!("go to {}", location))
//!     .build()
//!     .unwrap();
//! assert_eq!(api.host(), "https://app.example.com/api");
//! ```

use crate::navigator::{LogNavigator, Navigator};
use crate::notification::{LogNotifier, Notifier};
use crate::{RequestCaller, RpcMetrics};
use roomlink_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Endpoint used when no host is configured
pub const DEFAULT_HOST: &str = "http://localhost/api";

/// Builder for configuring and creating a `RequestCaller`
pub struct RequestCallerBuilder {
    host: String,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    timeout: Option<Duration>,
    observability_config: Option<roomlink_core::ObservabilityConfig>,
    service_name: Option<String>,
}

impl Default for RequestCallerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCallerBuilder {
    /// Create a builder with the default host, notifier and navigator
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            notifier: Arc::new(LogNotifier),
            navigator: Arc::new(LogNavigator),
            timeout: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Endpoint every call is posted to
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Receiver for failure notifications
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Handler for redirect responses
    pub fn navigator(mut self, navigator: impl Navigator + 'static) -> Self {
        self.navigator = Arc::new(navigator);
        self
    }

    /// Per-request timeout; elapsed requests count as network errors
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: roomlink_core::ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(roomlink_core::ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the caller
    pub fn build(self) -> Result<RequestCaller> {
        reqwest::Url::parse(&self.host)
            .map_err(|e| Error::InvalidEndpoint(format!("{}: {}", self.host, e)))?;

        let mut http = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let metrics = self.observability_config.map(|mut config| {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            if let Err(e) = roomlink_core::init_observability(config.clone()) {
                tracing::warn!(error = %e, "Observability already initialized");
            }

            Arc::new(RpcMetrics::new(config.service_name))
        });

        Ok(RequestCaller {
            http,
            host: self.host,
            notifier: self.notifier,
            navigator: self.navigator,
            metrics,
        })
    }
}
