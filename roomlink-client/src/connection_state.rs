//! Connection state management
//!
//! Tracks the lifecycle of the single physical connection owned by a
//! `RealtimeClient` and the bookkeeping the retry loop needs.
//!
//! # Connection States
//!
//! ```text
//! Disconnected → Connecting → Open → Closed
//!                    ↑                  │
//!                    └──── retry ───────┘
//! ```
//!
//! `Disconnected` only exists before the first `connect()`. Transport
//! errors are reported to status listeners as [`ConnectionStatus::Error`]
//! but do not move the state machine by themselves.
//!
//! # Generations
//!
//! Every connection attempt gets a fresh generation number. A task driving
//! an older attempt checks its generation before touching shared state, so
//! a replaced attempt can never overwrite the state of its successor.

use crate::reconnect::ReconnectionStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Connection state of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `connect()` was never called
    Disconnected,
    /// A handshake is in flight
    Connecting,
    /// The connection is open and frames can be sent
    Open,
    /// The last connection closed
    Closed,
}

impl ConnectionState {
    /// Gauge value used for metrics
    pub fn as_gauge(self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Open => 2,
            ConnectionState::Closed => 3,
        }
    }
}

/// Status change reported to status listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// A connection attempt started
    Connecting,
    /// The connection opened
    Open,
    /// The connection closed
    Closed,
    /// The transport reported an error
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Open => "open",
            ConnectionStatus::Closed => "closed",
            ConnectionStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Manages connection state and reconnection bookkeeping
pub struct ConnectionManager {
    state: RwLock<ConnectionState>,
    strategy: Mutex<Box<dyn ReconnectionStrategy>>,
    attempts: AtomicU32,
    manual_close: AtomicBool,
    generation: AtomicU64,
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new(strategy: Box<dyn ReconnectionStrategy>) -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            strategy: Mutex::new(strategy),
            attempts: AtomicU32::new(0),
            manual_close: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Set the connection state
    pub async fn set_state(&self, new_state: ConnectionState) {
        *self.state.write().await = new_state;
    }

    /// Transition to open, resetting the retry budget
    pub async fn opened(&self) {
        self.set_state(ConnectionState::Open).await;
        self.reset_attempts().await;
    }

    /// Reset the attempt counter and the strategy
    pub async fn reset_attempts(&self) {
        self.attempts.store(0, Ordering::SeqCst);
        self.strategy.lock().await.reset();
    }

    /// Start a new connection attempt and return its generation
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Check whether `generation` is still the newest attempt
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Record whether the next close was requested by `disconnect()`
    pub fn set_manual_close(&self, manual: bool) {
        self.manual_close.store(manual, Ordering::SeqCst);
    }

    /// True after `disconnect()` until the next `connect()`
    pub fn is_manual_close(&self) -> bool {
        self.manual_close.load(Ordering::SeqCst)
    }

    /// Number of reconnection attempts issued since the last open
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Count one reconnection attempt, returning the new total
    pub fn record_attempt(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Delay before the next retry tick, or `None` once the strategy gives up
    pub async fn next_reconnect_delay(&self) -> Option<Duration> {
        let attempt = self.attempts();
        self.strategy.lock().await.next_delay(attempt)
    }
}
