//! End-to-end command runs against a mock backend
//!
//! Each test drives `agentcore_cli::run` with a parsed command line, a
//! buffered console and a temp config directory, then checks what the user
//! would see and what ended up on disk.

use std::sync::Arc;
use std::time::Duration;

use agentcore_cli::{run, Cli, Console};
use agentcore_domain::{AgentCoreError, ApiErrorKind, Session, LOGIN_TIMESTAMP_FORMAT};
use agentcore_infra::testing::ScriptedTransport;
use agentcore_infra::{ConfigStore, HttpTransport, ReqwestTransport, TransportError};
use chrono::{NaiveDateTime, Utc};
use clap::Parser;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cli(dir: &TempDir, args: &[&str]) -> Cli {
    let config_dir = dir.path().to_string_lossy().to_string();
    let mut argv = vec!["agentcore".to_string(), "--config-dir".to_string(), config_dir];
    argv.extend(args.iter().map(ToString::to_string));
    Cli::parse_from(argv)
}

fn reqwest_transport() -> Arc<dyn HttpTransport> {
    Arc::new(ReqwestTransport::new().expect("transport"))
}

fn configured(base_url: &str, session: Option<Session>) -> (TempDir, ConfigStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = ConfigStore::in_dir(dir.path());
    store.set_base_url(base_url).expect("base url");
    if let Some(session) = session {
        store.save_session(&session).expect("session");
    }
    (dir, store)
}

#[tokio::test]
async fn test_failed_refresh_reports_and_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "invalid"})))
        .expect(1)
        .mount(&server)
        .await;

    let (dir, store) = configured(&server.uri(), Some(Session::new("A1", "R1", "u1", "u@x")));
    let (console, buffer) = Console::buffered();

    let reported =
        run(cli(&dir, &["project", "list"]), console, reqwest_transport()).await.unwrap_err();

    match reported.error() {
        AgentCoreError::Api(err) => {
            assert_eq!(err.kind, ApiErrorKind::Unauthenticated);
            assert_eq!(err.status_code, Some(401));
        }
        other => panic!("expected API error, got {other:?}"),
    }
    let output = buffer.contents();
    assert!(output.contains("API error"), "{output}");
    assert!(output.contains("agentcore login"), "{output}");

    assert!(store.session().unwrap().is_none());
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.base_url().unwrap().as_deref(), Some(server.uri().as_str()));
}

#[tokio::test]
async fn test_dns_failure_is_a_rendered_network_error() {
    let (dir, _store) =
        configured("https://mlops.invalid", Some(Session::new("A1", "R1", "u1", "u@x")));
    let transport = ScriptedTransport::new();
    transport.push_error(TransportError::Connect(
        "dns error: failed to lookup address information".into(),
    ));
    let (console, buffer) = Console::buffered();

    let reported = run(cli(&dir, &["project", "list"]), console, Arc::new(transport.clone()))
        .await
        .unwrap_err();

    match reported.error() {
        AgentCoreError::Api(err) => {
            assert_eq!(err.kind, ApiErrorKind::Network);
            assert_eq!(err.status_code, None);
        }
        other => panic!("expected API error, got {other:?}"),
    }
    let output = buffer.contents();
    assert!(output.contains("failed to lookup address"), "{output}");
    assert!(output.contains("Status: n/a"), "{output}");
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_login_persists_tokens_and_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .and(body_json(json!({"email": "u@x", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A1", "refresh": "R1", "user_id": 42})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (dir, store) = configured(&server.uri(), None);
    let (console, buffer) = Console::buffered();
    let before = Utc::now();

    run(
        cli(&dir, &["login", "--email", "u@x", "--password", "pw"]),
        console,
        reqwest_transport(),
    )
    .await
    .unwrap();

    let session = store.session().unwrap().expect("session stored");
    assert_eq!(session.access_token, "A1");
    assert_eq!(session.refresh_token, "R1");
    assert_eq!(session.user_id, "42");
    assert_eq!(session.email.as_deref(), Some("u@x"));
    assert_eq!(store.remembered_login_email().unwrap().as_deref(), Some("u@x"));

    let stamped = NaiveDateTime::parse_from_str(
        session.logged_in_at.as_deref().expect("timestamp"),
        LOGIN_TIMESTAMP_FORMAT,
    )
    .unwrap()
    .and_utc();
    assert!((stamped - before).num_seconds().abs() <= 5);

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(!raw.contains("pw"), "password must not be persisted: {raw}");
    assert!(buffer.contents().contains("Logged in as u@x"));
}

#[tokio::test]
async fn test_project_list_prints_table_after_spinner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "name": "churn", "description": "weekly"}]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (dir, _store) = configured(&server.uri(), Some(Session::new("A1", "R1", "u1", "u@x")));
    let (console, buffer) = Console::buffered_terminal();

    run(cli(&dir, &["project", "list"]), console, reqwest_transport()).await.unwrap();

    let output = buffer.contents();
    let last_frame = output.rfind("Fetching projects").expect("spinner drew");
    let cleared = output.rfind("\r\x1b[2K").expect("spinner cleared");
    let table = output.find("churn").expect("table printed");
    assert!(last_frame < cleared, "{output:?}");
    assert!(cleared < table, "{output:?}");
}

#[tokio::test]
async fn test_preview_sends_columns_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data-versions/v1/preview/"))
        .and(query_param("columns", "age,income"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "columns": ["age", "income"],
            "rows": [[31, 5200], [45, null]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (dir, _store) = configured(&server.uri(), Some(Session::new("A1", "R1", "u1", "u@x")));
    let (console, buffer) = Console::buffered();

    run(
        cli(&dir, &["data-version", "preview", "v1", "--columns", "age,income", "--limit", "5"]),
        console,
        reqwest_transport(),
    )
    .await
    .unwrap();

    let output = buffer.contents();
    assert!(output.contains("AGE"), "{output}");
    assert!(output.contains("5200"), "{output}");
    assert!(output.contains('-'), "{output}");
}

#[tokio::test]
async fn test_validation_error_with_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/projects/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"name": ["This field is required."]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (dir, _store) = configured(&server.uri(), Some(Session::new("A1", "R1", "u1", "u@x")));
    let (console, buffer) = Console::buffered();

    let reported = run(
        cli(&dir, &["project", "create", "", "--details"]),
        console,
        reqwest_transport(),
    )
    .await
    .unwrap_err();

    assert!(matches!(reported.error(), AgentCoreError::Api(err) if err.status_code == Some(400)));
    let output = buffer.contents();
    assert!(output.contains("Status: 400"), "{output}");
    assert!(output.contains("Request: POST /api/projects/"), "{output}");
    assert!(output.contains("This field is required."), "{output}");
}

#[tokio::test]
async fn test_logout_keeps_server_binding() {
    let (dir, store) =
        configured("https://mlops.example.com", Some(Session::new("A1", "R1", "u1", "u@x")));
    let (console, buffer) = Console::buffered();

    run(cli(&dir, &["logout"]), console, Arc::new(ScriptedTransport::new())).await.unwrap();

    assert!(buffer.contents().contains("Logged out"));
    assert!(store.session().unwrap().is_none());
    assert_eq!(store.base_url().unwrap().as_deref(), Some("https://mlops.example.com"));
}

#[tokio::test]
async fn test_json_output_stays_clean_when_a_call_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/deployments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3, "name": "api"}])))
        .expect(1)
        .mount(&server)
        .await;

    let (dir, _store) = configured(&server.uri(), Some(Session::new("A1", "R1", "u1", "u@x")));

    let (console, out, err) = Console::buffered_split();
    run(cli(&dir, &["project", "list", "--format", "json"]), console, reqwest_transport())
        .await
        .unwrap_err();
    assert_eq!(out.contents(), "");
    assert!(err.contents().contains("boom"), "{}", err.contents());

    let (console, out, err) = Console::buffered_split();
    run(cli(&dir, &["deploy", "list", "--format", "json"]), console, reqwest_transport())
        .await
        .unwrap();
    let listed: serde_json::Value = serde_json::from_str(out.contents().trim()).unwrap();
    assert_eq!(listed[0]["name"], "api");
    assert_eq!(err.contents(), "");
}
