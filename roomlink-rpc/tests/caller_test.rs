//! Request caller tests against a mock HTTP server

use roomlink_rpc::{CallError, Notification, RequestCaller};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    caller: RequestCaller,
    notifications: Arc<Mutex<Vec<Notification>>>,
    navigations: Arc<Mutex<Vec<String>>>,
}

fn harness(host: String) -> Harness {
    let notifications = Arc::new(Mutex::new(Vec::new()));
    let navigations = Arc::new(Mutex::new(Vec::new()));

    let caller = {
        let notifications = Arc::clone(&notifications);
        let navigations = Arc::clone(&navigations);
        RequestCaller::builder()
            .host(host)
            .notifier(move |n: &Notification| notifications.lock().unwrap().push(n.clone()))
            .navigator(move |location: &str| navigations.lock().unwrap().push(location.to_string()))
            .build()
            .unwrap()
    };

    Harness {
        caller,
        notifications,
        navigations,
    }
}

async fn mock(server: &MockServer, group: &str, action: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(query_param("group", group))
        .and(query_param("action", action))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(query_param("group", "users"))
        .and(query_param("action", "list"))
        .and(body_json(json!({"page": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(format!("{}/api", server.uri()));
    let result = h.caller.call("users", "list", Some(json!({"page": 2}))).await;

    assert_eq!(result, json!([{"id": 1}]));
    assert!(h.notifications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_success_body_is_empty_object() {
    let server = MockServer::start().await;
    mock(&server, "users", "touch", ResponseTemplate::new(204)).await;

    let h = harness(format!("{}/api", server.uri()));
    assert_eq!(h.caller.call("users", "touch", None::<Value>).await, json!({}));
}

#[tokio::test]
async fn test_server_error_notifies_and_resolves_empty() {
    let server = MockServer::start().await;
    mock(
        &server,
        "users",
        "save",
        ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})),
    )
    .await;

    let h = harness(format!("{}/api", server.uri()));
    let result = h.caller.call("users", "save", Some(json!({"name": "x"}))).await;

    assert_eq!(result, json!({}));
    assert_eq!(
        *h.notifications.lock().unwrap(),
        vec![Notification::error("API Error - 500", json!({"error": "boom"}))]
    );
}

#[tokio::test]
async fn test_plain_text_error_body_is_kept_as_string() {
    let server = MockServer::start().await;
    mock(
        &server,
        "users",
        "get",
        ResponseTemplate::new(404).set_body_string("no such user"),
    )
    .await;

    let h = harness(format!("{}/api", server.uri()));
    let error = h
        .caller
        .try_call("users", "get", Some(json!({"id": 7})))
        .await
        .unwrap_err();

    match error {
        CallError::Status { status, title, message } => {
            assert_eq!(status, 404);
            assert_eq!(title, "API Error - 404");
            assert_eq!(message, json!("no such user"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.notifications.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_auth_check_401_is_swallowed() {
    let server = MockServer::start().await;
    mock(&server, "auth", "authCheck", ResponseTemplate::new(401)).await;

    let h = harness(format!("{}/api", server.uri()));
    assert_eq!(h.caller.call("auth", "authCheck", None::<Value>).await, json!({}));
    assert!(h.notifications.lock().unwrap().is_empty());

    let error = h
        .caller
        .try_call("auth", "authCheck", None::<Value>)
        .await
        .unwrap_err();
    assert!(matches!(error, CallError::Unauthenticated));
}

#[tokio::test]
async fn test_401_elsewhere_notifies() {
    let server = MockServer::start().await;
    mock(&server, "auth", "logout", ResponseTemplate::new(401)).await;
    mock(&server, "users", "authCheck", ResponseTemplate::new(401)).await;

    let h = harness(format!("{}/api", server.uri()));
    h.caller.call("auth", "logout", None::<Value>).await;
    h.caller.call("users", "authCheck", None::<Value>).await;

    let titles: Vec<String> = h
        .notifications
        .lock()
        .unwrap()
        .iter()
        .map(|n| n.title.clone())
        .collect();
    assert_eq!(titles, vec!["API Error - 401", "API Error - 401"]);
}

#[tokio::test]
async fn test_redirect_navigates() {
    let server = MockServer::start().await;
    mock(
        &server,
        "users",
        "list",
        ResponseTemplate::new(302).insert_header("Location", "/login"),
    )
    .await;
    mock(&server, "users", "other", ResponseTemplate::new(302)).await;

    let h = harness(format!("{}/api", server.uri()));
    assert_eq!(h.caller.call("users", "list", None::<Value>).await, json!({}));
    assert_eq!(h.caller.call("users", "other", None::<Value>).await, json!({}));

    assert_eq!(*h.navigations.lock().unwrap(), vec!["/login", "/"]);
    assert!(h.notifications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_network_failure_notifies_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = harness(format!("http://{}/api", addr));
    let result = h.caller.call("users", "list", None::<Value>).await;

    assert_eq!(result, json!({}));
    let notifications = h.notifications.lock().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Network Error");
    assert!(!notifications[0].message_text().is_empty());
}

#[tokio::test]
async fn test_invalid_success_body_notifies() {
    let server = MockServer::start().await;
    mock(
        &server,
        "users",
        "list",
        ResponseTemplate::new(200).set_body_string("<html>"),
    )
    .await;

    let h = harness(format!("{}/api", server.uri()));
    let error = h
        .caller
        .try_call("users", "list", None::<Value>)
        .await
        .unwrap_err();

    assert!(matches!(error, CallError::Decode(_)));
    assert_eq!(h.notifications.lock().unwrap()[0].title, "Invalid Response");
}
