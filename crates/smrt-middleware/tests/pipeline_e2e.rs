//! End-to-end tests of the responder chain.
//!
//! Each test builds the standard chain for a route contract and drives
//! requests through it, checking the response and the counters.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use smrt_core::media::ERROR_MEDIA_TYPE;
use smrt_core::{Bucket, ErrorEnvelope, Fault, ServiceState, REQUEST_ID_HEADER};
use smrt_middleware::{
    ContentContract, HandlerResult, MiddlewareContext, Pipeline, Request, Response,
};
use smrt_schema::SchemaResolver;
use std::sync::Arc;

const LAMP: &str = "application/se.novafaen.lamp.v1+json";
const LAMP_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-06/schema#",
    "type": "object",
    "properties": {
        "on": {"type": "boolean"},
        "brightness": {"type": "integer", "minimum": 0, "maximum": 100}
    },
    "required": ["on"]
}"#;

struct Fixture {
    state: Arc<ServiceState>,
    pipeline: Pipeline,
    _schemas: tempfile::TempDir,
}

impl Fixture {
    fn new(contract: &ContentContract) -> Self {
        let schemas = tempfile::tempdir().unwrap();
        std::fs::write(schemas.path().join("se.novafaen.lamp.v1.json"), LAMP_SCHEMA).unwrap();

        let state = Arc::new(ServiceState::new());
        let resolver = Arc::new(SchemaResolver::with_root(schemas.path()));
        let pipeline = Pipeline::responder(contract, Arc::clone(&state), resolver);

        Self {
            state,
            pipeline,
            _schemas: schemas,
        }
    }

    fn lamp() -> Self {
        Self::new(&ContentContract::none().consumes(LAMP).produces(LAMP))
    }

    async fn send(&self, request: Request) -> Response {
        self.send_with(request, |body| async move {
            let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())));
            *response.status_mut() = StatusCode::OK;
            Ok(response)
        })
        .await
    }

    async fn send_with<F, Fut>(&self, request: Request, handler: F) -> Response
    where
        F: FnOnce(serde_json::Value) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        self.pipeline
            .process(MiddlewareContext::new(), request, move |ctx, _req| {
                let body = ctx.json_body().cloned().unwrap_or_default();
                Box::pin(handler(body))
            })
            .await
    }
}

fn put(body: &str, content_type: Option<&str>, accept: Option<&str>) -> Request {
    let mut builder = http::Request::builder().method("PUT").uri("/lamps/kitchen");
    if let Some(value) = content_type {
        builder = builder.header(CONTENT_TYPE, value);
    }
    if let Some(value) = accept {
        builder = builder.header(ACCEPT, value);
    }
    builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
}

async fn envelope(response: Response) -> ErrorEnvelope {
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        ERROR_MEDIA_TYPE
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_valid_request_succeeds() {
    let fixture = Fixture::lamp();
    let response = fixture
        .send(put(r#"{"on": true}"#, Some(LAMP), Some(LAMP)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), LAMP);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(fixture.state.count(Bucket::Successful), 1);
    assert_eq!(fixture.state.count(Bucket::Bad), 0);
}

#[tokio::test]
async fn test_unacceptable_accept_is_406_and_bad() {
    let fixture = Fixture::lamp();
    let response = fixture
        .send(put(r#"{"on": true}"#, Some(LAMP), Some("other/type")))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    let envelope = envelope(response).await;
    assert_eq!(envelope.code, 406);
    assert_eq!(envelope.error, "Not Acceptable");
    assert_eq!(
        envelope.description,
        "Accept type 'other/type' is not served by endpoint."
    );
    assert_eq!(fixture.state.count(Bucket::Bad), 1);
    assert_eq!(fixture.state.count(Bucket::Successful), 0);
}

#[tokio::test]
async fn test_schema_violation_is_415_and_bad() {
    let fixture = Fixture::lamp();
    let response = fixture
        .send(put(r#"{"brightness": 50}"#, Some(LAMP), Some(LAMP)))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let envelope = envelope(response).await;
    assert_eq!(envelope.error, "Unsupported Media Type");
    assert_eq!(fixture.state.count(Bucket::Bad), 1);
}

#[tokio::test]
async fn test_unparseable_body_is_415_never_500() {
    let fixture = Fixture::lamp();
    let response = fixture
        .send(put("{ on: true", Some(LAMP), Some(LAMP)))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(fixture.state.count(Bucket::Bad), 1);
    assert_eq!(fixture.state.count(Bucket::Error), 0);
}

#[tokio::test]
async fn test_missing_schema_is_500_and_error() {
    let heater = "application/se.novafaen.heater.v1+json";
    let fixture = Fixture::new(&ContentContract::none().consumes(heater));
    let response = fixture.send(put("{}", Some(heater), None)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = envelope(response).await;
    assert_eq!(envelope.description, "An unexpected error has occurred.");
    assert_eq!(fixture.state.count(Bucket::Error), 1);
}

#[tokio::test]
async fn test_handler_faults_are_classified() {
    let cases = [
        (Fault::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR, Bucket::Error),
        (Fault::bad_gateway("500 upstream"), StatusCode::BAD_GATEWAY, Bucket::Error),
        (Fault::gateway_timeout("refused"), StatusCode::GATEWAY_TIMEOUT, Bucket::Error),
        (Fault::bad_request("odd"), StatusCode::BAD_REQUEST, Bucket::Bad),
        (Fault::resource_missing(), StatusCode::NOT_FOUND, Bucket::Bad),
    ];

    for (fault, status, bucket) in cases {
        let fixture = Fixture::lamp();
        let response = fixture
            .send_with(put(r#"{"on": false}"#, Some(LAMP), Some(LAMP)), move |_| async move {
                Err(fault)
            })
            .await;

        assert_eq!(response.status(), status);
        assert_eq!(envelope(response).await.code, status.as_u16());
        assert_eq!(fixture.state.count(bucket), 1);
        assert_eq!(fixture.state.snapshot().unwrap().status.amount_total, 1);
    }
}

#[tokio::test]
async fn test_fault_response_is_not_relabelled() {
    let fixture = Fixture::lamp();
    let response = fixture
        .send_with(put(r#"{"on": true}"#, Some(LAMP), Some(LAMP)), |_| async {
            Err(Fault::not_found("No lamp named 'kitchen'."))
        })
        .await;

    let envelope = envelope(response).await;
    assert_eq!(envelope.description, "No lamp named 'kitchen'.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_requests_lose_no_counts() {
    const M: usize = 1000;
    let fixture = Arc::new(Fixture::new(&ContentContract::none()));

    let tasks: Vec<_> = (0..M)
        .map(|i| {
            let fixture = Arc::clone(&fixture);
            tokio::spawn(async move {
                let request = http::Request::builder()
                    .uri("/lamps")
                    .body(Full::new(Bytes::new()))
                    .unwrap();
                fixture
                    .send_with(request, move |_| async move {
                        match i % 4 {
                            0 => Ok(http::Response::new(Full::new(Bytes::new()))),
                            1 => {
                                let mut response = http::Response::new(Full::new(Bytes::new()));
                                *response.status_mut() = StatusCode::CONFLICT;
                                Ok(response)
                            }
                            2 => Err(Fault::internal("boom")),
                            _ => Err(Fault::bad_request("odd")),
                        }
                    })
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let counters = fixture.state.snapshot().unwrap().status;
    assert_eq!(counters.amount_total, M as u64);
    assert_eq!(counters.amount_successful, (M / 4) as u64);
    assert_eq!(counters.amount_error, (M / 4) as u64);
    assert_eq!(counters.amount_bad, (M / 2) as u64);
    assert_eq!(counters.amount_warning, 0);
}
