//! RestHub against an in-process fake of the hub REST API

use axum::extract::{Path, State as AxumState};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use ench_core::{Context, ServiceCall};
use ench_hub::{Hub, HubError, RestHub};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
struct RecordedCall {
    domain: String,
    service: String,
    body: Value,
    authorization: Option<String>,
}

#[derive(Clone, Default)]
struct FakeHub {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

fn states_payload() -> Value {
    json!([
        {
            "entity_id": "sensor.kitchen_battery",
            "state": "15",
            "attributes": {"friendly_name": "Kitchen battery", "unit_of_measurement": "%"},
            "last_changed": "2024-03-01T10:00:00.000000+00:00",
            "last_updated": "2024-03-01T10:00:00.000000+00:00",
            "last_reported": "2024-03-01T10:00:00.000000+00:00",
            "context": {"id": "01HQ0000000000000000000000", "parent_id": null, "user_id": null}
        },
        {
            "entity_id": "light.hall",
            "state": "unavailable",
            "attributes": {},
            "last_changed": "2024-03-01T09:00:00+00:00",
            "last_updated": "2024-03-01T09:00:00+00:00"
        },
        {
            "entity_id": "broken entry",
            "state": "on"
        }
    ])
}

async fn list_states(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false);
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(states_payload()))
}

async fn call_service(
    AxumState(fake): AxumState<FakeHub>,
    Path((domain, service)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    if service == "broken" {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    fake.calls.lock().await.push(RecordedCall {
        domain,
        service,
        body,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    });
    StatusCode::OK
}

async fn spawn_fake_hub() -> (String, FakeHub) {
    let fake = FakeHub::default();
    let app = Router::new()
        .route("/api/states", get(list_states))
        .route("/api/services/:domain/:service", post(call_service))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), fake)
}

fn client(url: &str, token: Option<&str>) -> RestHub {
    RestHub::new(url, token.map(String::from), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_states_are_decoded_and_bad_entries_skipped() {
    let (url, _) = spawn_fake_hub().await;
    let hub = client(&url, Some(TOKEN));

    let states = hub.states().await.unwrap();
    let ids: Vec<&str> = states.iter().map(|s| s.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["sensor.kitchen_battery", "light.hall"]);
    assert_eq!(states[0].friendly_name(), Some("Kitchen battery"));
    assert!(states[1].is_unavailable());
}

#[tokio::test]
async fn test_missing_token_maps_to_status_error() {
    let (url, _) = spawn_fake_hub().await;
    let hub = client(&url, None);

    let err = hub.states().await.unwrap_err();
    assert!(matches!(err, HubError::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_service_call_posts_data() {
    let (url, fake) = spawn_fake_hub().await;
    let hub = client(&url, Some(TOKEN));

    let call = ServiceCall::for_target(
        "notify.me",
        json!({"message": "🔋 Battery low (1): sensor.a", "title": "EnCh"}),
        Context::new(),
    )
    .unwrap();
    hub.call_service(call).await.unwrap();

    let calls = fake.calls.lock().await.clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].domain, "notify");
    assert_eq!(calls[0].service, "me");
    assert_eq!(calls[0].body["message"], "🔋 Battery low (1): sensor.a");
    assert_eq!(
        calls[0].authorization.as_deref(),
        Some("Bearer test-token")
    );
}

#[tokio::test]
async fn test_failed_service_call() {
    let (url, _) = spawn_fake_hub().await;
    let hub = client(&url, Some(TOKEN));

    let call = ServiceCall::for_target("notify.broken", json!({}), Context::new()).unwrap();
    let err = hub.call_service(call).await.unwrap_err();
    assert!(matches!(
        err,
        HubError::Status { status: 500, ref path } if path == "/api/services/notify/broken"
    ));
}

#[tokio::test]
async fn test_unreachable_hub_is_transport_error() {
    // Bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let hub = client(&format!("http://{}", addr), Some(TOKEN));
    assert!(matches!(
        hub.states().await,
        Err(HubError::Transport(_))
    ));
}
