#![allow(clippy::unwrap_used)]
// Integration tests for `Console` against a wiremock host.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ccnexus_core::{
    Command, CommandResult, ConnectionState, Console, ConsoleConfig, CoreError, DisplayBody,
    EndpointForm, EndpointSelector, Position, TogglePhase,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn two_endpoints() -> Value {
    json!({
        "port": 3000,
        "endpoints": [
            { "name": "A", "apiUrl": "https://a.example", "apiKey": "sk-abcdef1234", "enabled": true },
            { "name": "B", "apiUrl": "https://b.example", "apiKey": "sk-b", "enabled": false },
        ]
    })
}

fn stats() -> Value {
    json!({
        "totalRequests": 10,
        "endpoints": {
            "A": { "requests": 10, "errors": 1, "inputTokens": 500, "outputTokens": 1500 }
        }
    })
}

async fn mount_config(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve `first` for exactly one config fetch, then `then` for all later ones.
async fn mount_config_sequence(server: &MockServer, first: Value, then: Value) {
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .up_to_n_times(1)
        .mount(server)
        .await;
    mount_config(server, then).await;
}

async fn mount_stats(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats()))
        .mount(server)
        .await;
}

/// A console with both background tasks disabled, so every fetch in a
/// test is one the test asked for.
fn quiet_config(server: &MockServer) -> ConsoleConfig {
    let mut config = ConsoleConfig::new(Url::parse(&server.uri()).unwrap());
    config.telemetry_interval = Duration::ZERO;
    config.directory_interval = Duration::ZERO;
    config
}

async fn connected(server: &MockServer) -> Console {
    let console = Console::new(quiet_config(server));
    console.connect().await.unwrap();
    console
}

fn position_of(console: &Console, index: usize) -> Position {
    console.display().row(index).unwrap().position
}

// ── Display ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_builds_display_model() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;

    let console = connected(&server).await;
    let model = console.display();

    assert_eq!(*console.connection_state().borrow(), ConnectionState::Connected);
    assert_eq!(model.port, Some(3000));
    assert_eq!(model.total_requests, 10);
    assert_eq!(model.endpoint_count, 2);
    assert_eq!(model.enabled_count, 1);

    let a = model.row(0).unwrap();
    assert_eq!(a.name, "A");
    assert_eq!(a.masked_key, "****1234");
    assert_eq!(a.requests_line(), "Requests: 10 | Errors: 1");
    assert_eq!(a.tokens_line(), "Tokens: 2.0K (In: 500, Out: 1.5K)");

    let b = model.row(1).unwrap();
    assert!(!b.enabled);
    assert_eq!(b.masked_key, "***");
    assert_eq!(b.tokens_line(), "Tokens: 0 (In: 0, Out: 0)");
}

#[tokio::test]
async fn test_empty_directory_shows_empty_state() {
    let server = MockServer::start().await;
    mount_config(&server, json!({ "port": 3000, "endpoints": [] })).await;
    mount_stats(&server).await;

    let console = connected(&server).await;
    assert!(console.display().is_empty_state());
}

#[tokio::test]
async fn test_unreachable_host_is_unavailable() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = ConsoleConfig::new(Url::parse(&format!("http://{addr}")).unwrap());
    config.telemetry_interval = Duration::ZERO;
    config.directory_interval = Duration::ZERO;
    let console = Console::new(config);

    let err = console.connect().await.unwrap_err();
    assert!(err.is_unavailable(), "got {err:?}");
    assert_eq!(*console.connection_state().borrow(), ConnectionState::Unavailable);
    assert!(matches!(console.display().body, DisplayBody::Unavailable { .. }));
}

#[tokio::test]
async fn test_malformed_directory_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_endpoints()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&server)
        .await;
    mount_stats(&server).await;

    let console = connected(&server).await;
    let err = console.fetch_directory().await.unwrap_err();

    assert!(matches!(err, CoreError::Parse { .. }), "got {err:?}");
    assert_eq!(console.directory_snapshot().unwrap().len(), 2);
    let model = console.display();
    assert_eq!(model.rows().len(), 2);
    assert!(model.last_error.is_some());
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_blank_form_never_reaches_host() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let err = console
        .add_endpoint(EndpointForm::new("C", "  ", "sk-c"))
        .await
        .unwrap_err();

    match err {
        CoreError::Validation { field, .. } => assert_eq!(field, "apiUrl"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_port_never_reaches_host() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/port"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    for port in [0, 70_000] {
        let err = console.update_port(port).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }
}

#[tokio::test]
async fn test_execute_requires_connection() {
    let server = MockServer::start().await;
    let console = Console::new(quiet_config(&server));

    let err = console
        .execute(Command::UpdatePort { port: 4000 })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotConnected));
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_sends_trimmed_form_and_refreshes() {
    let server = MockServer::start().await;
    let mut after = two_endpoints();
    after["endpoints"].as_array_mut().unwrap().push(
        json!({ "name": "C", "apiUrl": "https://c.example", "apiKey": "sk-c", "enabled": true }),
    );
    mount_config_sequence(&server, two_endpoints(), after).await;
    mount_stats(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints"))
        .and(body_json(json!({
            "name": "C", "apiUrl": "https://c.example", "apiKey": "sk-c"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let result = console
        .add_endpoint(EndpointForm::new(" C ", "https://c.example ", "sk-c"))
        .await
        .unwrap();

    assert_eq!(result, CommandResult::Ok);
    assert_eq!(console.display().rows().len(), 3);
}

#[tokio::test]
async fn test_host_rejection_is_reported_verbatim() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints"))
        .respond_with(ResponseTemplate::new(400).set_body_string("endpoint 'A' already exists"))
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let err = console
        .add_endpoint(EndpointForm::new("A", "https://a.example", "sk-a"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "endpoint 'A' already exists");
    assert!(matches!(err, CoreError::Command { status: Some(400), .. }));
}

#[tokio::test]
async fn test_remove_refreshes_and_stales_old_positions() {
    let server = MockServer::start().await;
    let after = json!({
        "port": 3000,
        "endpoints": [
            { "name": "B", "apiUrl": "https://b.example", "apiKey": "sk-b", "enabled": false },
        ]
    });
    mount_config_sequence(&server, two_endpoints(), after).await;
    mount_stats(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/endpoints/0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let old_b = position_of(&console, 1);
    let result = console
        .remove_endpoint(position_of(&console, 0))
        .await
        .unwrap();

    assert_eq!(result, CommandResult::Ok);
    let model = console.display();
    assert_eq!(model.rows().len(), 1);
    assert_eq!(model.row(0).unwrap().name, "B");

    // B now sits at index 0; the position read before the remove is stale.
    let err = console.remove_endpoint(old_b).await.unwrap_err();
    assert!(matches!(err, CoreError::StalePosition { index: 1 }), "got {err:?}");
}

#[tokio::test]
async fn test_rejected_remove_keeps_rows_and_positions() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/endpoints/0"))
        .respond_with(ResponseTemplate::new(409).set_body_string("endpoint 'A' is in use"))
        .expect(1)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let before = console.directory_snapshot().unwrap();
    let position = position_of(&console, 0);

    let err = console.remove_endpoint(position).await.unwrap_err();

    assert_eq!(err.to_string(), "endpoint 'A' is in use");
    assert!(matches!(err, CoreError::Command { status: Some(409), .. }));
    assert_eq!(console.display().rows().len(), 2);
    assert!(std::sync::Arc::ptr_eq(
        &before,
        &console.directory_snapshot().unwrap()
    ));
    let endpoint = console.store().check_position(position, true).unwrap();
    assert_eq!(endpoint.name, "A");
}

#[tokio::test]
async fn test_update_port_reports_restart() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/port"))
        .and(body_json(json!({ "port": 4000 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let result = console.update_port(4000).await.unwrap();

    assert_eq!(
        result,
        CommandResult::PortUpdated {
            port: 4000,
            restart_required: true
        }
    );
}

// ── Positions ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_position_survives_unchanged_refresh() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let position = position_of(&console, 1);
    console.fetch_directory().await.unwrap();

    console
        .update_endpoint(position, EndpointForm::new("B", "https://b2.example", "sk-b"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stale_position_is_rejected_before_host_call() {
    let server = MockServer::start().await;
    let reordered = json!({
        "port": 3000,
        "endpoints": [
            { "name": "B", "apiUrl": "https://b.example", "apiKey": "sk-b", "enabled": false },
            { "name": "A", "apiUrl": "https://a.example", "apiKey": "sk-abcdef1234", "enabled": true },
        ]
    });
    mount_config_sequence(&server, two_endpoints(), reordered).await;
    mount_stats(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/endpoints/0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let old = position_of(&console, 0);
    console.fetch_directory().await.unwrap();

    let err = console.remove_endpoint(old).await.unwrap_err();
    assert!(matches!(err, CoreError::StalePosition { index: 0 }), "got {err:?}");
}

#[tokio::test]
async fn test_out_of_range_position() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;

    let console = connected(&server).await;
    let version = console.display().version;
    let err = console
        .remove_endpoint(Position::new(7, version))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::PositionOutOfRange { index: 7, len: 2 }));
}

#[tokio::test]
async fn test_resolve_by_name_and_index() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;

    let console = connected(&server).await;

    let by_name = console
        .resolve(&EndpointSelector::Name("B".into()))
        .await
        .unwrap();
    assert_eq!(by_name.index(), 1);

    let by_index = console.resolve(&EndpointSelector::Index(0)).await.unwrap();
    assert_eq!(by_index.index(), 0);

    let missing = console.resolve(&EndpointSelector::Name("Z".into())).await;
    assert!(matches!(missing, Err(CoreError::Validation { .. })));
}

#[tokio::test]
async fn test_edit_form_returns_current_values() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;

    let console = connected(&server).await;
    let draft = console.edit_form(position_of(&console, 0)).await.unwrap();

    assert_eq!(draft.form.name, "A");
    assert_eq!(draft.form.api_url, "https://a.example");
    assert!(draft.enabled);
    assert_eq!(draft.position.index(), 0);
}

// ── Toggle ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_toggle_commits_and_refreshes() {
    let server = MockServer::start().await;
    let mut after = two_endpoints();
    after["endpoints"][0]["enabled"] = json!(false);
    mount_config_sequence(&server, two_endpoints(), after).await;
    mount_stats(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints/0/toggle"))
        .and(body_json(json!({ "enabled": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let result = console
        .toggle_endpoint(position_of(&console, 0), false)
        .await
        .unwrap();

    assert_eq!(
        result,
        CommandResult::Toggled {
            index: 0,
            enabled: false,
            changed: true
        }
    );
    let row = console.display().row(0).cloned().unwrap();
    assert!(!row.enabled);
    assert_eq!(row.toggle, TogglePhase::Idle);
    assert_eq!(console.store().pending_toggles(), 0);
}

#[tokio::test]
async fn test_toggle_rolls_back_when_host_refuses() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints/0/toggle"))
        .respond_with(ResponseTemplate::new(500).set_body_string("could not persist config"))
        .expect(1)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let err = console
        .toggle_endpoint(position_of(&console, 0), false)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "could not persist config");
    let row = console.display().row(0).cloned().unwrap();
    assert!(row.enabled);
    assert_eq!(row.toggle, TogglePhase::Idle);
    assert!(console.directory_snapshot().unwrap().endpoints[0].enabled);
}

#[tokio::test]
async fn test_toggle_to_current_value_is_a_no_op() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints/1/toggle"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let console = connected(&server).await;
    let result = console
        .toggle_endpoint(position_of(&console, 1), false)
        .await
        .unwrap();

    assert_eq!(
        result,
        CommandResult::Toggled {
            index: 1,
            enabled: false,
            changed: false
        }
    );
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_oneshot_disconnects_afterwards() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;

    let names = Console::oneshot(quiet_config(&server), |console| async move {
        Ok(console
            .display()
            .rows()
            .iter()
            .map(|r| r.name.clone())
            .collect::<Vec<_>>())
    })
    .await
    .unwrap();

    assert_eq!(names, vec!["A".to_owned(), "B".to_owned()]);
}

#[tokio::test]
async fn test_disconnect_clears_snapshots() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    mount_stats(&server).await;

    let console = connected(&server).await;
    console.disconnect().await;

    assert!(console.directory_snapshot().is_none());
    assert_eq!(console.display().body, DisplayBody::Loading);
    assert_eq!(*console.connection_state().borrow(), ConnectionState::Disconnected);

    // Reconnect works on the same handle.
    console.connect().await.unwrap();
    assert_eq!(console.display().rows().len(), 2);
}

#[tokio::test]
async fn test_telemetry_poll_publishes_updates() {
    let server = MockServer::start().await;
    mount_config(&server, two_endpoints()).await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalRequests": 1 })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_stats(&server).await;

    let mut config = quiet_config(&server);
    config.telemetry_interval = Duration::from_millis(20);
    let console = Console::new(config);
    console.connect().await.unwrap();

    let mut stream = console.subscribe();
    let model = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let model = stream.changed().await.unwrap();
            if model.total_requests == 10 {
                break model;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(model.row(0).unwrap().stats.requests, 10);
    console.disconnect().await;
}
