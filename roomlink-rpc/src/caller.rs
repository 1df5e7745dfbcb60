//! Group/action request caller
//!
//! Every call is a `POST <host>?group=<group>&action=<action>` with the
//! payload as a JSON body. A success response resolves to its JSON body.
//! Anything else becomes a [`Notification`] for the notifier:
//!
//! - no response at all: title `Network Error`
//! - a non-success status: title `API Error - <status>`, the body as message
//! - a redirect: no notification, the navigator is sent to `Location`
//! - `401` on the `auth`/`authCheck` probe: nothing, a missing session is expected
//!
//! [`RequestCaller::call`] then resolves to an empty object, so UI code can
//! await calls without handling failures. [`RequestCaller::try_call`] reports
//! the same way and also returns the typed [`CallError`].

use crate::navigator::{Navigator, DEFAULT_LOCATION};
use crate::notification::{Notification, Notifier};
use crate::{CallError, CallResult, RequestCallerBuilder, RpcMetrics};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Group of the session probe
pub const AUTH_GROUP: &str = "auth";

/// Action of the session probe
pub const AUTH_CHECK_ACTION: &str = "authCheck";

/// Request/response caller with a notification side channel
#[derive(Clone)]
pub struct RequestCaller {
    pub(crate) http: reqwest::Client,
    pub(crate) host: String,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) metrics: Option<Arc<RpcMetrics>>,
}

impl RequestCaller {
    /// Start configuring a caller
    pub fn builder() -> RequestCallerBuilder {
        RequestCallerBuilder::new()
    }

    /// The endpoint every call is posted to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Call `group`/`action`, resolving to `{}` on any failure
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use roomlink_rpc::RequestCaller;
    /// use serde_json::json;
    ///
    /// # async fn example() -> roomlink_core::Result<()> {
    /// let api = RequestCaller::builder().host("https://app.example.com/api").build()?;
    ///
    /// let users = api.call("users", "list", Some(json!({"page": 1}))).await;
    /// let session = api.call("auth", "authCheck", None::<()>).await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<T: Serialize>(&self, group: &str, action: &str, payload: Option<T>) -> Value {
        self.try_call(group, action, payload)
            .await
            .unwrap_or_else(|_| empty_object())
    }

    /// Call `group`/`action`, returning the failure as well as reporting it
    #[tracing::instrument(skip(self, payload), fields(host = %self.host))]
    pub async fn try_call<T: Serialize>(
        &self,
        group: &str,
        action: &str,
        payload: Option<T>,
    ) -> CallResult<Value> {
        let started = Instant::now();
        let result = self.execute(group, action, payload).await;

        if let Some(ref m) = self.metrics {
            let error = result.as_ref().err().map(CallError::kind);
            m.record_call(group, action, started.elapsed(), error);
        }

        if let Err(ref e) = result {
            self.report(e);
        }
        result
    }

    async fn execute<T: Serialize>(
        &self,
        group: &str,
        action: &str,
        payload: Option<T>,
    ) -> CallResult<Value> {
        let mut request = self
            .http
            .post(&self.host)
            .query(&[("group", group), ("action", action)])
            .header(CONTENT_TYPE, "application/json");
        if let Some(payload) = payload {
            let body = serde_json::to_vec(&payload).map_err(|e| CallError::Decode(e.to_string()))?;
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CallError::Network(e.to_string()))?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or(DEFAULT_LOCATION)
                .to_string();
            self.navigator.navigate(&location);
            return Err(CallError::Redirect { location });
        }

        let content = response
            .text()
            .await
            .map_err(|e| CallError::Network(e.to_string()))?;

        if status.is_success() {
            if content.trim().is_empty() {
                return Ok(empty_object());
            }
            return serde_json::from_str(&content).map_err(|e| CallError::Decode(e.to_string()));
        }

        if status == StatusCode::UNAUTHORIZED && group == AUTH_GROUP && action == AUTH_CHECK_ACTION {
            return Err(CallError::Unauthenticated);
        }

        let notification = Notification::api(status.as_u16(), parse_error_content(&content));
        Err(CallError::Status {
            status: status.as_u16(),
            title: notification.title,
            message: notification.message,
        })
    }

    fn report(&self, error: &CallError) {
        let notification = match error {
            CallError::Network(message) => Notification::network(message.clone()),
            CallError::Status { title, message, .. } => Notification::error(title.clone(), message.clone()),
            CallError::Decode(message) => {
                Notification::error("Invalid Response", Value::String(message.clone()))
            }
            CallError::Unauthenticated => {
                tracing::debug!("No active session");
                return;
            }
            CallError::Redirect { location } => {
                tracing::debug!(location = %location, "Call redirected");
                return;
            }
        };

        tracing::warn!(kind = error.kind(), title = %notification.title, "Call failed");
        self.notifier.notify(&notification);
    }
}

impl std::fmt::Debug for RequestCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCaller")
            .field("host", &self.host)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Error body as JSON when it parses, otherwise as a string
fn parse_error_content(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.to_string()))
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
