use std::time::Duration;

use serde_json::json;
use spotter::{
    dispatch::{DispatchError, Dispatcher, GENERIC_SEND_FAILURE},
    models::{Client, Program},
    normalize::normalize_program,
    roster::ClientRoster,
    types::ClientStatus,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn roster() -> ClientRoster {
    ClientRoster::new([
        Client {
            id: "client-1".into(),
            name: "Maria Lopez".into(),
            email: Some("maria@example.com".into()),
            status: ClientStatus::Active,
            linked: true,
        },
        Client {
            id: "client-2".into(),
            name: "Sam Okafor".into(),
            email: None,
            status: ClientStatus::Inactive,
            linked: true,
        },
    ])
}

fn program() -> Program {
    let raw = json!({
        "name": "Hypertrophy",
        "isPeriodized": true,
        "durationWeeks": 2,
        "routines": [{ "name": "Day A", "exercises": [{ "name": "Squat", "sets": [{ "reps": 10 }] }] }]
    });
    normalize_program(&raw, None).unwrap().program
}

fn dispatcher(server: &MockServer) -> Dispatcher {
    Dispatcher::new(format!("{}/api/send-program", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_sends_program_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/send-program"))
        .and(body_partial_json(json!({
            "clientId": "client-1",
            "customMessage": "Start Monday",
            "importId": "imp-9",
            "programData": {
                "name": "Hypertrophy",
                "durationWeeks": 2,
                "routines": []
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = dispatcher(&server)
        .send(&roster(), "client-1", &program(), Some("Start Monday"), "imp-9")
        .await
        .unwrap();

    assert_eq!(receipt.client_id, "client-1");
    assert_eq!(receipt.import_id, "imp-9");
    assert_eq!(receipt.response, json!({ "success": true }));
}

#[tokio::test]
async fn test_empty_client_fails_before_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = dispatcher(&server)
        .send(&roster(), "", &program(), None, "imp-9")
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::NoClientSelected));
}

#[tokio::test]
async fn test_unknown_or_inactive_client_fails_before_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    for id in ["client-2", "client-404"] {
        let err = dispatcher
            .send(&roster(), id, &program(), None, "imp-9")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownClient(ref c) if c == id));
    }
}

#[tokio::test]
async fn test_server_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Client has no active plan" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = dispatcher(&server)
        .send(&roster(), "client-1", &program(), None, "imp-9")
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Transport(ref m) if m == "Client has no active plan"));
}

#[tokio::test]
async fn test_error_field_and_generic_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "importId": "with-error" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "database down" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "importId": "plain" })))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);

    let err = dispatcher
        .send(&roster(), "client-1", &program(), None, "with-error")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "database down");

    let err = dispatcher
        .send(&roster(), "client-1", &program(), None, "plain")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), GENERIC_SEND_FAILURE);
}

#[tokio::test]
async fn test_success_false_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "Client already has this program" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = dispatcher(&server)
        .send(&roster(), "client-1", &program(), None, "imp-9")
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Transport(ref m) if m == "Client already has this program"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    // Nothing listens on port 9 locally.
    let dispatcher = Dispatcher::new("http://127.0.0.1:9/send", Duration::from_secs(2)).unwrap();

    let err = dispatcher
        .send(&roster(), "client-1", &program(), None, "imp-9")
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Transport(ref m) if m == GENERIC_SEND_FAILURE));
}
