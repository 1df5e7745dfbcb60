//! Listener registries for inbound messages and status changes
//!
//! Listeners are async callbacks wrapped in a cloneable handle. The handle
//! gives the callback an identity: registering the same handle twice is a
//! no-op, and removing a handle that was never registered is a no-op.
//!
//! Dispatch runs listeners one after another in registration order. A
//! listener that panics is logged and skipped; the remaining listeners
//! still receive the value.
//!
//! # Examples
//!
//! ```rust,no_run
//! use roomlink_client::{MessageListener, RealtimeClient};
//!
//! # async fn example(client: &RealtimeClient) {
//! let listener = MessageListener::new(|msg| async move {
//!     println!("{}/{}: {}", msg.room, msg.event, msg.data);
//! });
//!
//! client.on_message(&listener).await;
//! client.on_message(&listener).await; // still registered once
//! client.remove_message_listener(&listener).await;
//! # }
//! ```

use crate::ConnectionStatus;
use futures::FutureExt;
use roomlink_core::InboundMessage;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Type for listener functions
pub type ListenerFn<T> = Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Handle to an async callback
pub struct Listener<T> {
    handler: ListenerFn<T>,
}

/// Listener for addressed room messages
pub type MessageListener = Listener<InboundMessage>;

/// Listener for connection status changes
pub type StatusListener = Listener<ConnectionStatus>;

impl<T: 'static> Listener<T> {
    /// Wrap an async callback
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |value| -> Pin<Box<dyn Future<Output = ()> + Send>> {
                Box::pin(handler(value))
            }),
        }
    }
}

impl<T> Listener<T> {
    /// Check whether two handles refer to the same callback
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.handler) as *const (),
            Arc::as_ptr(&other.handler) as *const (),
        )
    }

    async fn call(&self, value: T) -> bool {
        let handler = Arc::clone(&self.handler);
        AssertUnwindSafe(async move { handler(value).await })
            .catch_unwind()
            .await
            .is_ok()
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("handler", &Arc::as_ptr(&self.handler))
            .finish()
    }
}

/// Ordered, duplicate-free set of listeners
pub struct ListenerRegistry<T> {
    listeners: Arc<Mutex<Vec<Listener<T>>>>,
}

impl<T> Clone for ListenerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListenerRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a listener; returns `false` if it was already registered
    pub async fn add(&self, listener: &Listener<T>) -> bool {
        let mut listeners = self.listeners.lock().await;
        if listeners.iter().any(|l| l.same_as(listener)) {
            return false;
        }
        listeners.push(listener.clone());
        true
    }

    /// Unregister a listener; returns `false` if it was not registered
    pub async fn remove(&self, listener: &Listener<T>) -> bool {
        let mut listeners = self.listeners.lock().await;
        let before = listeners.len();
        listeners.retain(|l| !l.same_as(listener));
        listeners.len() != before
    }

    /// Check whether a listener is registered
    pub async fn contains(&self, listener: &Listener<T>) -> bool {
        self.listeners.lock().await.iter().any(|l| l.same_as(listener))
    }

    /// Number of registered listeners
    pub async fn len(&self) -> usize {
        self.listeners.lock().await.len()
    }

    /// True when nothing is registered
    pub async fn is_empty(&self) -> bool {
        self.listeners.lock().await.is_empty()
    }
}

impl<T: Clone + Send + 'static> ListenerRegistry<T> {
    /// Invoke every listener in registration order
    ///
    /// Returns the number of listeners that panicked.
    pub async fn dispatch(&self, value: T) -> usize {
        // Snapshot so listeners may register or remove listeners themselves
        let snapshot: Vec<Listener<T>> = self.listeners.lock().await.clone();

        let mut failures = 0;
        for listener in snapshot {
            if !listener.call(value.clone()).await {
                tracing::error!("Listener panicked during dispatch");
                failures += 1;
            }
        }
        failures
    }
}
