//! REST backends against a mock server.

use futures::StreamExt;
use revnet_core::{
    ChangeKind, CollectionQuery, FirebaseConfig, RealtimeStore, ServiceConnector, ServiceError,
    ServiceHandles,
};
use revnet_firebase::{FirebaseConnector, FirebaseEndpoints, RealtimeDatabaseClient};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENTS: &str = "/firestore/v1/projects/demo/databases/(default)/documents";

fn config() -> FirebaseConfig {
    FirebaseConfig::from_lookup(|name| match name {
        "FIREBASE_API_KEY" => Some("test-key".to_string()),
        "FIREBASE_PROJECT_ID" => Some("demo".to_string()),
        "FIREBASE_APP_ID" => Some("1:42:web:abc".to_string()),
        _ => None,
    })
}

async fn handles(server: &MockServer) -> ServiceHandles {
    FirebaseConnector::with_http_client(reqwest::Client::new())
        .with_endpoints(FirebaseEndpoints::single_host(&server.uri()))
        .with_poll_interval(Duration::from_millis(50))
        .connect(&config())
        .await
        .unwrap()
}

fn document(id: &str, status: &str, update_time: &str) -> Value {
    json!({
        "document": {
            "name": format!("projects/demo/databases/(default)/documents/agent_logs/{}", id),
            "fields": { "status": { "stringValue": status } },
            "updateTime": update_time
        },
        "readTime": "2026-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn add_document_posts_typed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/agent_logs", DOCUMENTS)))
        .and(query_param("key", "test-key"))
        .and(body_json(json!({ "fields": {
            "status": { "stringValue": "online" },
            "limit": { "integerValue": "10" }
        } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo/databases/(default)/documents/agent_logs/doc-1",
            "fields": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handles = handles(&server).await;
    let id = handles
        .documents
        .add_document("agent_logs", json!({ "status": "online", "limit": 10 }))
        .await
        .unwrap();
    assert_eq!(id.as_str(), "doc-1");
}

#[tokio::test]
async fn rejected_write_is_a_write_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/agent_logs", DOCUMENTS)))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let handles = handles(&server).await;
    let error = handles
        .documents
        .add_document("agent_logs", json!({ "status": "online" }))
        .await
        .unwrap_err();

    match error {
        ServiceError::WriteFailed { target, reason } => {
            assert_eq!(target, "agent_logs");
            assert!(reason.contains("403"));
            assert!(reason.contains("PERMISSION_DENIED"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn collection_watch_reports_initial_rows_then_additions() {
    let server = MockServer::start().await;
    let run_query = format!("{}:runQuery", DOCUMENTS);

    Mock::given(method("POST"))
        .and(path(run_query.clone()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([document("a", "online", "t1")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(run_query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            document("b", "busy", "t2"),
            document("a", "online", "t1")
        ])))
        .mount(&server)
        .await;

    let handles = handles(&server).await;
    let mut stream = handles
        .documents
        .watch_collection(CollectionQuery::latest("agent_logs", "timestamp", 10))
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.kind, ChangeKind::Added);
    assert_eq!(first.id.as_str(), "a");

    let second = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(second.kind, ChangeKind::Added);
    assert_eq!(second.id.as_str(), "b");
    assert_eq!(second.data, json!({ "status": "busy" }));
}

#[tokio::test]
async fn collection_watch_fails_when_query_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCUMENTS)))
        .respond_with(ResponseTemplate::new(400).set_body_string("FAILED_PRECONDITION"))
        .mount(&server)
        .await;

    let handles = handles(&server).await;
    let result = handles
        .documents
        .watch_collection(CollectionQuery::latest("agent_logs", "timestamp", 10))
        .await;
    assert!(matches!(result, Err(ServiceError::SubscribeFailed { .. })));
}

#[tokio::test]
async fn realtime_set_and_watch() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rtdb/status/web.json"))
        .and(body_json(json!({ "status": "online" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "online" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rtdb/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rtdb/status.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "web": { "status": "online" } })),
        )
        .mount(&server)
        .await;

    let handles = handles(&server).await;
    handles
        .realtime
        .set("status/web", json!({ "status": "online" }))
        .await
        .unwrap();

    let mut stream = handles.realtime.watch_value("status").await.unwrap();
    let initial = stream.next().await.unwrap().unwrap();
    assert_eq!(initial.path, "status");
    assert_eq!(initial.value, Value::Null);

    let changed = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(changed.value["web"]["status"], "online");
}

#[tokio::test]
async fn realtime_watch_with_zero_interval_keeps_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rtdb/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("booting")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rtdb/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("ready")))
        .mount(&server)
        .await;

    let database_url = reqwest::Url::parse(&format!("{}/rtdb/", server.uri())).unwrap();
    let client = RealtimeDatabaseClient::new(reqwest::Client::new(), database_url, Duration::ZERO);

    let mut stream = client.watch_value("status").await.unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap().value, json!("booting"));
    let changed = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("poll task should still be running")
        .unwrap()
        .unwrap();
    assert_eq!(changed.value, json!("ready"));
}

#[tokio::test]
async fn remote_config_registers_once_and_honours_interval() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/installations/v1/projects/demo/installations"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/42/installations/fid-1",
            "fid": "fid-1",
            "refreshToken": "refresh",
            "authToken": { "token": "fis-token", "expiresIn": "604800s" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/remoteconfig/v1/projects/demo/namespaces/firebase:fetch"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": { "agent_mode": "ACTIVE", "gemini_command": "test_data" },
            "state": "UPDATE",
            "templateVersion": "3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handles = handles(&server).await;
    let rc = &handles.remote_config;
    rc.set_defaults(BTreeMap::from([
        ("welcome_message".to_string(), "Revolskyynet online".to_string()),
        ("agent_mode".to_string(), "IDLE".to_string()),
    ]));
    assert_eq!(rc.get_string("agent_mode"), "IDLE");

    assert!(rc.fetch_and_activate().await.unwrap());
    assert_eq!(rc.get_string("agent_mode"), "ACTIVE");
    assert_eq!(rc.get_string("gemini_command"), "test_data");
    assert_eq!(rc.get_string("welcome_message"), "Revolskyynet online");

    // Inside the default 60 s interval: no request, nothing new
    assert!(!rc.fetch_and_activate().await.unwrap());

    let requests = server.received_requests().await.unwrap();
    let fetch = requests
        .iter()
        .find(|r| r.url.path().ends_with("firebase:fetch"))
        .unwrap();
    let body: Value = fetch.body_json().unwrap();
    assert_eq!(body["app_instance_id"], "fid-1");
    assert_eq!(body["app_instance_id_token"], "fis-token");
    assert_eq!(body["app_id"], "1:42:web:abc");
}

#[tokio::test]
async fn remote_config_fetch_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/installations/v1/projects/demo/installations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fid": "fid-1",
            "authToken": { "token": "fis-token" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/remoteconfig/v1/projects/demo/namespaces/firebase:fetch"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let handles = handles(&server).await;
    let error = handles.remote_config.fetch_and_activate().await.unwrap_err();
    assert!(matches!(error, ServiceError::FetchFailed(_)));
    assert_eq!(handles.remote_config.get_string("agent_mode"), "");
}
