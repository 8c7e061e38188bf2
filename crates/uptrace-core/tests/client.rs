#![cfg(feature = "client")]

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uptrace_core::client::{ClientConfig, RetryPolicy, UptraceClient};
use uptrace_core::types::{MonitorStatus, MonitorType};
use uptrace_core::{Error, ErrorKind, MetricData, MonitorData, MonitorReconciler, MonitorTransport, ReadOutcome, Value};

const MONITORS: &str = "/internal/v1/projects/3255/monitors";
const MONITOR: &str = "/internal/v1/projects/3255/monitors/3592";

fn client(server: &MockServer) -> UptraceClient {
    let config = ClientConfig::new("3255", "test-token")
        .with_base_url(server.uri())
        .with_retry(RetryPolicy::none());
    UptraceClient::new(config).unwrap()
}

fn retrying_client(server: &MockServer) -> UptraceClient {
    let retry = RetryPolicy {
        max_retries: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    };
    let config = ClientConfig::new("3255", "test-token")
        .with_base_url(server.uri())
        .with_retry(retry);
    UptraceClient::new(config).unwrap()
}

fn stored_monitor() -> serde_json::Value {
    json!({
        "monitor": {
            "id": 3592,
            "projectId": 3255,
            "name": "tts_p90",
            "type": "metric",
            "notifyEveryoneByEmail": false,
            "teamIds": [],
            "channelIds": [],
            "repeatInterval": { "strategy": "default" },
            "status": "active",
            "error": "",
            "createdAt": 1718000000000u64,
            "updatedAt": 1718000000000u64,
            "params": {
                "query": "p90($spans) as p90 | where _name = 'stt:finalize'",
                "metrics": [{ "name": "uptrace_tracing_spans", "alias": "$spans" }],
                "columnUnit": "1",
                "boundsSource": "manual",
                "groupingInterval": 60000,
                "checkNumPoint": 5,
                "nullsMode": "allow",
                "minDevFraction": 0.2,
                "maxAllowedValue": 10000,
                "tolerance": "medium",
                "trainingPeriod": 86400000
            }
        }
    })
}

fn plan() -> MonitorData {
    MonitorData {
        name: Value::Known("tts_p90".into()),
        monitor_type: Value::Known(MonitorType::Metric),
        query: Value::Known("p90($spans) as p90 | where _name = 'stt:finalize'".into()),
        metrics: Value::Known(vec![Value::Known(MetricData::new(
            "uptrace_tracing_spans",
            "$spans",
        ))]),
        min_allowed_value: Value::Null,
        max_allowed_value: Value::Known(10000.0),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_fetch_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_monitor()))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = client(&server).fetch(3592).await.unwrap().unwrap();
    assert_eq!(monitor.id, Some(3592));
    assert_eq!(monitor.status, Some(MonitorStatus::Active));
    assert_eq!(monitor.params.max_allowed_value, Some(10000.0));
}

#[tokio::test]
async fn test_fetch_missing_monitor_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client(&server).fetch(3592).await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MONITORS))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server).list().await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 500, ref body } if body == "boom"));
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}

#[tokio::test]
async fn test_malformed_body_is_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"monitor\": [1, 2]"))
        .mount(&server)
        .await;

    let err = client(&server).fetch(3592).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
}

#[tokio::test]
async fn test_create_posts_payload_then_reads_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MONITORS))
        .and(body_partial_json(json!({
            "name": "tts_p90",
            "type": "metric",
            "params": { "maxAllowedValue": 10000.0, "tolerance": "medium" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "monitor": { "id": "3592" } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_monitor()))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = MonitorReconciler::new(client(&server));
    let state = reconciler.create(&plan(), &CancellationToken::new()).await.unwrap();

    assert_eq!(state.id, Value::Known("3592".into()));
    assert_eq!(state.status, Value::Known(MonitorStatus::Active));
    assert_eq!(state.max_allowed_value, Value::Known(10000.0));
    assert_eq!(state.min_allowed_value, Value::Null);
}

#[tokio::test]
async fn test_update_puts_to_monitor_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(MONITOR))
        .and(body_partial_json(json!({ "name": "tts_p90" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "monitor": { "id": 3592 } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_monitor()))
        .mount(&server)
        .await;

    let client = client(&server);
    let current = client.fetch(3592).await.unwrap().unwrap();
    let updated = client.update(3592, &current).await.unwrap();
    assert_eq!(updated.id, Some(3592));
}

#[tokio::test]
async fn test_read_of_deleted_monitor_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let state = MonitorData {
        id: Value::Known("3592".into()),
        ..plan()
    };
    let reconciler = MonitorReconciler::new(client(&server));
    let outcome = reconciler.read(&state, &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome, ReadOutcome::Absent);
}

#[tokio::test]
async fn test_delete_tolerates_missing_monitor() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let state = MonitorData {
        id: Value::Known("3592".into()),
        ..plan()
    };
    let reconciler = MonitorReconciler::new(client(&server));
    reconciler.delete(&state, &CancellationToken::new()).await.unwrap();
}

#[tokio::test]
async fn test_list_monitors() {
    let server = MockServer::start().await;
    let body = json!({
        "count": 1,
        "monitors": [stored_monitor()["monitor"].clone()]
    });
    Mock::given(method("GET"))
        .and(path(MONITORS))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let reconciler = MonitorReconciler::new(client(&server));
    let all = reconciler.list(&CancellationToken::new()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, Value::Known("tts_p90".into()));
}

#[tokio::test]
async fn test_create_post_is_sent_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MONITORS))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = MonitorReconciler::new(retrying_client(&server));
    let err = reconciler.create(&plan(), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_fetch_retries_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored_monitor()))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = retrying_client(&server).fetch(3592).await.unwrap().unwrap();
    assert_eq!(monitor.id, Some(3592));
}

#[tokio::test]
async fn test_create_keeps_id_when_read_back_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MONITORS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "monitor": { "id": 3592 } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let reconciler = MonitorReconciler::new(client(&server));
    let err = reconciler.create(&plan(), &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.created_id(), Some(3592));
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_fractional_timestamps_decode() {
    let server = MockServer::start().await;
    let mut body = stored_monitor();
    body["monitor"]["updatedAt"] = json!(1718000000000.7);
    Mock::given(method("GET"))
        .and(path(MONITOR))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let monitor = client(&server).fetch(3592).await.unwrap().unwrap();
    assert_eq!(monitor.updated_at, Some(1_718_000_000_000));
}
