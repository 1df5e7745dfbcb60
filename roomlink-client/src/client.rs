//! Realtime client over WebSocket
//!
//! `RealtimeClient` owns one physical connection at a time, the
//! desired-subscription set, the retry loop and the listener registries.
//!
//! # Client Lifecycle
//!
//! 1. **Connect**: `connect()` starts a handshake and reports `connecting`
//! 2. **Open**: the client reports `open`, replays every desired
//!    subscription, and only then starts reading inbound frames
//! 3. **Close**: the client reports `closed`; unless the close came from
//!    `disconnect()`, a single retry loop reconnects at the strategy's pace
//! 4. **Disconnect**: `disconnect()` closes the socket and suppresses retries;
//!    subscriptions are kept for the next `connect()`
//!
//! # Cloning
//!
//! `RealtimeClient` is cheaply cloneable. All clones share the same
//! connection, subscriptions and listeners.
//!
//! # Concurrency
//!
//! The public API and the connection task both touch the subscription set
//! and the listener registries, so each sits behind its own async mutex.
//! Every connection attempt runs in one spawned task; starting a new
//! attempt aborts the previous one. The retry loop is a single owned task
//! as well: `connect()` and `disconnect()` cancel it.

use crate::connection_state::{ConnectionManager, ConnectionState, ConnectionStatus};
use crate::listener::{ListenerRegistry, MessageListener, StatusListener};
use crate::subscription::Subscriptions;
use crate::{ClientBuilder, ClientMetrics, Endpoint};
use futures::{SinkExt, StreamExt};
use roomlink_core::{codec, Error, FrameKind, Inbound, OutboundFrame, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures::stream::SplitSink<WsStream, Message>;

tokio::task_local! {
    /// Set inside the retry loop task
    static IN_RETRY_LOOP: ();
}

/// State shared between the client handles and the background tasks
pub(crate) struct Shared {
    pub(crate) endpoint: Endpoint,
    pub(crate) auth_token: RwLock<Option<String>>,
    pub(crate) manager: ConnectionManager,
    /// Write half of the open connection; `None` whenever not open
    pub(crate) sender: Mutex<Option<WsSink>>,
    pub(crate) subscriptions: Mutex<Subscriptions>,
    pub(crate) message_listeners: ListenerRegistry<roomlink_core::InboundMessage>,
    pub(crate) status_listeners: ListenerRegistry<ConnectionStatus>,
    pub(crate) connection_task: StdMutex<Option<JoinHandle<()>>>,
    pub(crate) reconnect_task: StdMutex<Option<JoinHandle<()>>>,
    /// Bumped whenever the retry loop is cancelled
    pub(crate) retry_generation: AtomicU64,
    /// Connection generation whose replay has started
    pub(crate) replayed: AtomicU64,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

/// Realtime room subscription client
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) shared: Arc<Shared>,
}

impl RealtimeClient {
    /// Start configuring a client for `host`
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Open a connection
    ///
    /// A supplied token replaces any stored one and is remembered for
    /// every later attempt. Any previous connection attempt and any running
    /// retry loop are cancelled first. The handshake continues in the
    /// background; watch status listeners or [`is_connected`](Self::is_connected)
    /// for the outcome.
    #[tracing::instrument(skip(self, auth_token), fields(host = %self.shared.endpoint.host()))]
    pub async fn connect(&self, auth_token: Option<&str>) -> Result<()> {
        if let Some(token) = auth_token {
            *self.shared.auth_token.write().await = Some(token.to_string());
        }

        let url = self.shared.url().await?;
        self.shared.cancel_reconnect();
        self.shared.manager.reset_attempts().await;
        self.shared.manager.set_manual_close(false);
        self.shared.open(url).await;
        Ok(())
    }

    /// Close the connection without reconnecting
    ///
    /// The desired subscriptions are kept.
    pub async fn disconnect(&self) {
        tracing::info!("Disconnecting");
        self.shared.manager.set_manual_close(true);
        self.shared.cancel_reconnect();

        let sink = self.shared.sender.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "Error while closing socket");
            }
        }
    }

    /// Add a room (or one event of a room) to the desired subscriptions
    ///
    /// A `join` frame is sent every time this is called while open, even if
    /// the subscription already existed. Returns whether a frame was sent.
    pub async fn join(&self, room: &str, event: Option<&str>) -> bool {
        self.shared.apply(&OutboundFrame::join(room, event)).await
    }

    /// Remove an event, or the whole room when `event` is `None`
    ///
    /// A `leave` frame is sent every time this is called while open.
    /// Returns whether a frame was sent.
    pub async fn leave(&self, room: &str, event: Option<&str>) -> bool {
        self.shared.apply(&OutboundFrame::leave(room, event)).await
    }

    /// Snapshot of the desired subscriptions
    pub async fn subscriptions(&self) -> Subscriptions {
        self.shared.subscriptions.lock().await.clone()
    }

    /// Register a message listener; returns `false` if already registered
    pub async fn on_message(&self, listener: &MessageListener) -> bool {
        self.shared.message_listeners.add(listener).await
    }

    /// Unregister a message listener; returns `false` if it was not registered
    pub async fn remove_message_listener(&self, listener: &MessageListener) -> bool {
        self.shared.message_listeners.remove(listener).await
    }

    /// Register a status listener; returns `false` if already registered
    pub async fn on_status_change(&self, listener: &StatusListener) -> bool {
        self.shared.status_listeners.add(listener).await
    }

    /// Unregister a status listener; returns `false` if it was not registered
    pub async fn remove_status_listener(&self, listener: &StatusListener) -> bool {
        self.shared.status_listeners.remove(listener).await
    }

    /// Current connection state
    pub async fn state(&self) -> ConnectionState {
        self.shared.manager.state().await
    }

    /// True while the connection is open
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Open
    }

    /// True while a handshake is in flight
    pub async fn is_connecting(&self) -> bool {
        self.state().await == ConnectionState::Connecting
    }

    /// True once a connection has closed and no new attempt has started
    pub async fn is_closed(&self) -> bool {
        self.state().await == ConnectionState::Closed
    }

    /// Reconnection attempts issued since the connection was last open
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.manager.attempts()
    }

    /// The configured endpoint
    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }
}

impl Shared {
    async fn url(&self) -> Result<String> {
        let token = self.auth_token.read().await;
        self.endpoint.url(token.as_deref())
    }

    /// Start a new physical connection attempt, replacing any previous one
    async fn open(self: &Arc<Self>, url: String) {
        let generation = self.manager.next_generation();

        if let Some(previous) = lock(&self.connection_task).take() {
            previous.abort();
        }
        if let Some(mut previous) = self.sender.lock().await.take() {
            let _ = previous.close().await;
        }

        self.set_state(ConnectionState::Connecting).await;
        self.notify_status(ConnectionStatus::Connecting).await;

        if self.manager.is_manual_close() {
            // disconnect() from a `connecting` listener
            self.closed().await;
            return;
        }

        let shared = Arc::clone(self);
        let task = tokio::spawn(async move { shared.run_connection(url, generation).await });
        *lock(&self.connection_task) = Some(task);
    }

    /// Drive one physical connection from handshake to close
    async fn run_connection(self: Arc<Self>, url: String, generation: u64) {
        tracing::debug!(generation, "Connecting to realtime endpoint");

        let ws_stream = match connect_async(url.as_str()).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                if !self.manager.is_current(generation) {
                    return;
                }
                let error = Error::WebSocket(e.to_string());
                tracing::warn!(error = %error, "Connection attempt failed");
                self.record_error("handshake");
                self.notify_status(ConnectionStatus::Error).await;
                self.closed().await;
                return;
            }
        };

        if !self.manager.is_current(generation) {
            return;
        }

        let (sink, mut stream) = ws_stream.split();
        *self.sender.lock().await = Some(sink);

        if self.manager.is_manual_close() {
            // disconnect() raced the handshake
            if let Some(mut sink) = self.sender.lock().await.take() {
                let _ = sink.close().await;
            }
            self.closed().await;
            return;
        }

        let retried = self.manager.attempts() > 0;
        self.manager.opened().await;
        if let Some(ref m) = self.metrics {
            m.update_connection_state(ConnectionState::Open);
            if retried {
                m.record_reconnection_success();
            }
        }
        tracing::info!("Connected");

        self.notify_status(ConnectionStatus::Open).await;
        self.replay(generation).await;

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => self.dispatch(&text).await,
                Ok(Message::Close(frame)) => {
                    tracing::info!(frame = ?frame, "Connection closed by peer");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    if !self.manager.is_current(generation) {
                        return;
                    }
                    let error = Error::WebSocket(e.to_string());
                    tracing::warn!(error = %error, "Connection failed");
                    self.record_error("websocket");
                    self.notify_status(ConnectionStatus::Error).await;
                    break;
                }
            }
        }

        if !self.manager.is_current(generation) {
            return;
        }
        self.sender.lock().await.take();
        self.closed().await;
    }

    /// Report a close and decide whether to retry
    async fn closed(self: &Arc<Self>) {
        self.set_state(ConnectionState::Closed).await;
        self.notify_status(ConnectionStatus::Closed).await;

        if self.manager.is_manual_close() {
            tracing::info!("Connection closed by disconnect");
            return;
        }
        self.ensure_reconnecting();
    }

    /// Start the retry loop unless one is already running
    fn ensure_reconnecting(self: &Arc<Self>) {
        let mut slot = lock(&self.reconnect_task);
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let shared = Arc::clone(self);
        let retry_generation = self.retry_generation.load(Ordering::SeqCst);
        *slot = Some(tokio::spawn(IN_RETRY_LOOP.scope(
            (),
            async move { shared.reconnect_loop(retry_generation).await },
        )));
    }

    /// Stop the retry loop
    ///
    /// Called from inside the loop (through a status listener), the loop is
    /// not aborted mid-step; it notices the new generation and returns.
    fn cancel_reconnect(&self) {
        self.retry_generation.fetch_add(1, Ordering::SeqCst);
        let in_retry_loop = IN_RETRY_LOOP.try_with(|_| ()).is_ok();

        if let Some(task) = lock(&self.reconnect_task).take() {
            if !in_retry_loop {
                task.abort();
            }
        }
    }

    fn retry_cancelled(&self, retry_generation: u64) -> bool {
        self.retry_generation.load(Ordering::SeqCst) != retry_generation
    }

    async fn reconnect_loop(self: Arc<Self>, retry_generation: u64) {
        loop {
            if self.retry_cancelled(retry_generation) {
                return;
            }

            let Some(delay) = self.manager.next_reconnect_delay().await else {
                tracing::warn!(
                    attempts = self.manager.attempts(),
                    "Reconnection abandoned (max attempts reached)"
                );
                return;
            };

            tokio::time::sleep(delay).await;

            if self.retry_cancelled(retry_generation) || self.manager.is_manual_close() {
                return;
            }

            match self.manager.state().await {
                ConnectionState::Open => {
                    tracing::debug!("Reconnected, retry loop finished");
                    return;
                }
                ConnectionState::Closed => {
                    let attempt = self.manager.record_attempt();
                    tracing::info!(attempt, delay_secs = delay.as_secs_f64(), "Reconnecting");
                    if let Some(ref m) = self.metrics {
                        m.record_reconnection_attempt();
                    }

                    match self.url().await {
                        Ok(url) => self.open(url).await,
                        Err(e) => {
                            tracing::error!(error = %e, "Cannot build endpoint, giving up");
                            return;
                        }
                    }
                }
                ConnectionState::Connecting | ConnectionState::Disconnected => {}
            }
        }
    }

    /// Update the desired subscriptions and send the frame if open
    ///
    /// Until the replay for the current connection has run, the change is
    /// only recorded: the replay sends the live set.
    async fn apply(&self, frame: &OutboundFrame) -> bool {
        let live = {
            let mut subscriptions = self.subscriptions.lock().await;
            match frame.kind {
                FrameKind::Join => subscriptions.join(&frame.room, frame.event.as_deref()),
                FrameKind::Leave => subscriptions.leave(&frame.room, frame.event.as_deref()),
            };
            self.manager.state().await == ConnectionState::Open
                && self.manager.is_current(self.replayed.load(Ordering::SeqCst))
        };

        if !live {
            self.drop_frame(frame);
            return false;
        }
        self.send_frame(frame).await
    }

    /// Send the live subscription set on a freshly opened connection
    ///
    /// The subscription lock is held across the sends, so `apply` either
    /// changes the set before it is read or sends after the replay.
    async fn replay(&self, generation: u64) {
        let subscriptions = self.subscriptions.lock().await;
        self.replayed.store(generation, Ordering::SeqCst);
        let frames = subscriptions.replay_frames();

        if !frames.is_empty() {
            tracing::debug!(frames = frames.len(), "Replaying subscriptions");
        }
        for frame in &frames {
            self.send_frame(frame).await;
        }
    }

    /// Write one frame if a connection is open; otherwise drop it
    async fn send_frame(&self, frame: &OutboundFrame) -> bool {
        if self.manager.state().await != ConnectionState::Open {
            self.drop_frame(frame);
            return false;
        }

        let sent = self.write_frame(frame).await;
        if let Some(ref m) = self.metrics {
            m.record_frame(frame.kind, sent);
        }
        sent
    }

    fn drop_frame(&self, frame: &OutboundFrame) {
        tracing::debug!(kind = %frame.kind, room = %frame.room, "Not open, frame dropped");
        if let Some(ref m) = self.metrics {
            m.record_frame(frame.kind, false);
        }
    }

    async fn write_frame(&self, frame: &OutboundFrame) -> bool {
        let text = match codec::encode_frame(frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode frame");
                return false;
            }
        };

        let mut sender = self.sender.lock().await;
        let Some(sink) = sender.as_mut() else {
            return false;
        };

        match sink.send(Message::Text(text)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, kind = %frame.kind, room = %frame.room, "Failed to send frame");
                false
            }
        }
    }

    /// Decode one inbound frame and deliver it to message listeners
    async fn dispatch(&self, text: &str) {
        match codec::decode_inbound(text) {
            Inbound::Addressed(message) => {
                tracing::trace!(room = %message.room, event = %message.event, "Message received");
                if let Some(ref m) = self.metrics {
                    m.record_message(&message.room);
                }
                let failures = self.message_listeners.dispatch(message).await;
                if let Some(ref m) = self.metrics {
                    m.record_listener_failures(failures);
                }
            }
            Inbound::Unaddressed(value) => {
                tracing::debug!(payload = %value, "Ignoring unaddressed frame");
                if let Some(ref m) = self.metrics {
                    m.record_unaddressed();
                }
            }
        }
    }

    async fn notify_status(&self, status: ConnectionStatus) {
        tracing::debug!(%status, "Status change");
        let failures = self.status_listeners.dispatch(status).await;
        if let Some(ref m) = self.metrics {
            m.record_listener_failures(failures);
        }
    }

    async fn set_state(&self, state: ConnectionState) {
        self.manager.set_state(state).await;
        if let Some(ref m) = self.metrics {
            m.update_connection_state(state);
        }
    }

    fn record_error(&self, error_type: &str) {
        if let Some(ref m) = self.metrics {
            m.record_error(error_type);
        }
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
