//! Integration tests for the webhook transport using wiremock.

use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foliant_delivery::webhook::{MAX_CAPTURED_BODY, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use foliant_delivery::{DeliveryError, WebhookSender};

fn sender_for(server: &MockServer, secret: Option<&str>) -> WebhookSender {
    WebhookSender::new(
        format!("{}/hooks/process", server.uri()),
        secret.map(String::from),
    )
    .unwrap()
}

#[tokio::test]
async fn test_successful_post() {
    let server = MockServer::start().await;
    let payload = json!({"action": "process_document", "document_id": "d-1"});

    Mock::given(method("POST"))
        .and(path("/hooks/process"))
        .and(header("content-type", "application/json"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sender = sender_for(&server, None);
    sender.send(&payload).await.unwrap();
}

#[tokio::test]
async fn test_signature_headers_present_when_secret_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/process"))
        .and(header_exists(SIGNATURE_HEADER))
        .and(header_exists(TIMESTAMP_HEADER))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let sender = sender_for(&server, Some("topsecret"));
    sender.send(&json!({"k": "v"})).await.unwrap();
}

#[tokio::test]
async fn test_no_signature_headers_without_secret() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/process"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sender = sender_for(&server, None);
    sender.send(&json!({})).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key(SIGNATURE_HEADER));
    assert!(!requests[0].headers.contains_key(TIMESTAMP_HEADER));
}

#[tokio::test]
async fn test_non_2xx_is_an_endpoint_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/process"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance window"))
        .mount(&server)
        .await;

    let sender = sender_for(&server, None);
    let error = sender.send(&json!({})).await.unwrap_err();
    match &error {
        DeliveryError::Endpoint { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "maintenance window");
        }
        other => panic!("expected endpoint error, got {other:?}"),
    }
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_error_body_is_truncated() {
    let server = MockServer::start().await;
    let huge = "x".repeat(MAX_CAPTURED_BODY * 3);

    Mock::given(method("POST"))
        .and(path("/hooks/process"))
        .respond_with(ResponseTemplate::new(500).set_body_string(huge))
        .mount(&server)
        .await;

    let sender = sender_for(&server, None);
    let error = sender.send(&json!({})).await.unwrap_err();
    match error {
        DeliveryError::Endpoint { body, .. } => assert_eq!(body.len(), MAX_CAPTURED_BODY),
        other => panic!("expected endpoint error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_classified_as_connect() {
    // Port 1 is never listening.
    let sender = WebhookSender::new("http://127.0.0.1:1/hooks/process", None).unwrap();
    let error = sender.send(&json!({})).await.unwrap_err();
    match error {
        DeliveryError::Connect(_) | DeliveryError::Request(_) => {}
        other => panic!("expected a transport error, got {other:?}"),
    }
    assert!(error.is_retryable());
}
