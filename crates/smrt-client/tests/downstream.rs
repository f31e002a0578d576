//! Outbound requests against a mock downstream service.

use std::time::Duration;

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde_json::json;
use smrt_client::{Client, ClientError};
use smrt_core::{Fault, FaultKind, RequestId};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LAMP: &str = "application/se.novafaen.lamp.v1+json";

#[tokio::test]
async fn test_put_sends_json_and_request_id() {
    let server = MockServer::start().await;
    let id = RequestId::new();

    Mock::given(method("PUT"))
        .and(path("/lamps/kitchen"))
        .and(header("x-request-id", id.to_string().as_str()))
        .and(header("content-type", LAMP))
        .and(body_json(json!({"on": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "kitchen", "on": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new().unwrap();
    let response = client
        .put(format!("{}/lamps/kitchen", server.uri()))
        .request_id(id)
        .header(CONTENT_TYPE, HeaderValue::from_static(LAMP))
        .json(&json!({"on": true}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let lamp: serde_json::Value = response.json().unwrap();
    assert_eq!(lamp["name"], "kitchen");
}

#[tokio::test]
async fn test_fresh_request_id_and_default_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/lamps"))
        .and(header_exists("x-request-id"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let response = Client::new()
        .unwrap()
        .post(format!("{}/lamps", server.uri()))
        .json(&json!({"name": "hall"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_downstream_500_is_bad_gateway() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("lamp controller crashed"))
        .mount(&server)
        .await;

    let err = Client::new()
        .unwrap()
        .get(format!("{}/lamps", server.uri()))
        .send()
        .await
        .unwrap_err();

    match &err {
        ClientError::DownstreamError { body, .. } => assert_eq!(body, "lamp controller crashed"),
        other => panic!("unexpected error: {other}"),
    }
    let fault = Fault::from(err);
    assert_eq!(fault.kind(), FaultKind::BadGateway);
    assert_eq!(fault.to_envelope().code, 502);
}

#[tokio::test]
async fn test_other_errors_are_returned_to_caller() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = Client::new()
        .unwrap()
        .delete(format!("{}/lamps/attic", server.uri()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_timeout_is_gateway_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = Client::with_timeout(Duration::from_millis(100))
        .unwrap()
        .get(format!("{}/slow", server.uri()))
        .send()
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unreachable { .. }));
    assert_eq!(Fault::from(err).kind(), FaultKind::GatewayTimeout);
}

#[tokio::test]
async fn test_refused_connection_is_gateway_timeout() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Client::new()
        .unwrap()
        .get(format!("http://{addr}/lamps"))
        .send()
        .await
        .unwrap_err();

    let fault = Fault::from(err);
    assert_eq!(fault.kind(), FaultKind::GatewayTimeout);
    assert_eq!(fault.description(), "Received no response from proxy.");
}

#[tokio::test]
async fn test_undecodable_body_is_bad_gateway() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let response = Client::new()
        .unwrap()
        .get(server.uri())
        .header(
            HeaderName::from_static("accept"),
            HeaderValue::from_static(LAMP),
        )
        .send()
        .await
        .unwrap();

    let err = response.json::<serde_json::Value>().unwrap_err();
    assert_eq!(Fault::from(err).kind(), FaultKind::BadGateway);
}
