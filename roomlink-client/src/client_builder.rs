//! Client builder for configuring the endpoint, reconnection and observability
//!
//! The `ClientBuilder` provides a fluent API for configuring client behavior
//! before connecting. It allows you to:
//! - Point the client at a host, or derive the endpoint from a page URL
//! - Supply the auth token up front
//! - Pick a reconnection strategy (fixed 1s interval, 1000 attempts by default)
//! - Configure observability (OpenTelemetry)
//!
//! # Examples
//!
//! ```rust,no_run
//! use roomlink_client::{ClientBuilder, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example() -> roomlink_core::Result<()> {
//! // Derive ws/wss from the page URL and connect
//! let client = ClientBuilder::for_page("https://app.example.com/dashboard")?
//!     .auth_token("secret")
//!     .connect()
//!     .await?;
//!
//! // Custom backoff with observability
//! let client2 = ClientBuilder::new("localhost:8080")
//!     .with_reconnect(Box::new(ExponentialBackoff::new(
//!         Duration::from_millis(100),
//!         Duration::from_secs(30),
//!     )))
//!     .with_default_observability()
//!     .service_name("dashboard")
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::{RealtimeClient, Shared};
use crate::connection_state::ConnectionManager;
use crate::listener::ListenerRegistry;
use crate::reconnect::{FixedInterval, NoReconnect, ReconnectionStrategy};
use crate::subscription::Subscriptions;
use crate::{ClientMetrics, Endpoint};
use roomlink_core::Result;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, RwLock};

/// Builder for configuring and creating a `RealtimeClient`
pub struct ClientBuilder {
    endpoint: Endpoint,
    auth_token: Option<String>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    observability_config: Option<roomlink_core::ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a builder for `host` (with optional port), plain `ws` scheme
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_endpoint(Endpoint::new(host))
    }

    /// Create a builder whose endpoint mirrors the page URL's host and security
    pub fn for_page(page_url: &str) -> Result<Self> {
        Ok(Self::from_endpoint(Endpoint::for_page(page_url)?))
    }

    /// Create a builder from a prepared endpoint
    pub fn from_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            auth_token: None,
            reconnect_strategy: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Use `wss` instead of `ws`
    pub fn secure(mut self, secure: bool) -> Self {
        self.endpoint = self.endpoint.with_secure(secure);
        self
    }

    /// Override the socket path (`/ws` by default)
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.with_path(path);
        self
    }

    /// Auth token sent on every connection attempt
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Reconnect with the given strategy
    pub fn with_reconnect(mut self, strategy: Box<dyn ReconnectionStrategy>) -> Self {
        self.reconnect_strategy = Some(strategy);
        self
    }

    /// Reconnect every second, up to 1000 attempts (default)
    pub fn with_default_reconnect(mut self) -> Self {
        self.reconnect_strategy = Some(Box::new(FixedInterval::default()));
        self
    }

    /// Never reconnect after a close
    pub fn without_reconnect(mut self) -> Self {
        self.reconnect_strategy = Some(Box::new(NoReconnect));
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

    /// Build the client without connecting
    ///
    /// Fails if the endpoint cannot form a valid socket URL.
    pub fn build(self) -> Result<RealtimeClient> {
        self.endpoint.url(self.auth_token.as_deref())?;

        let metrics = self.observability_config.map(|mut config| {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            // A process-wide subscriber may already be installed by another client
            if let Err(e) = roomlink_core::init_observability(config.clone()) {
                tracing::warn!(error = %e, "Observability already initialized");
            }

            Arc::new(ClientMetrics::new(config.service_name))
        });

        let strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(FixedInterval::default()));

        let shared = Shared {
            endpoint: self.endpoint,
            auth_token: RwLock::new(self.auth_token),
            manager: ConnectionManager::new(strategy),
            sender: Mutex::new(None),
            subscriptions: Mutex::new(Subscriptions::new()),
            message_listeners: ListenerRegistry::new(),
            status_listeners: ListenerRegistry::new(),
            connection_task: StdMutex::new(None),
            reconnect_task: StdMutex::new(None),
            retry_generation: AtomicU64::new(0),
            replayed: AtomicU64::new(0),
            metrics,
        };

        Ok(RealtimeClient {
            shared: Arc::new(shared),
        })
    }

    /// Build the client and start connecting
    pub async fn connect(self) -> Result<RealtimeClient> {
        let client = self.build()?;
        client.connect(None).await?;
        Ok(client)
    }
}
