//! Built-in endpoints.
//!
//! | Route | Produces | Behaviour |
//! |---|---|---|
//! | `GET /status` | status media type | framework info, counters, application status |
//! | `GET\|PUT /test/error` | error envelope | always an internal fault |

use std::sync::Arc;

use http::{Method, StatusCode};
use smrt_core::media::STATUS_MEDIA_TYPE;
use smrt_core::{Fault, ServiceState};
use smrt_middleware::{HandlerResult, Response, ResponseExt};

use crate::handler::{erase, ErasedHandler};
use crate::router::RouteSpec;

/// Path of the status endpoint.
pub const STATUS_PATH: &str = "/status";

/// Path of the error-test endpoint.
pub const ERROR_TEST_PATH: &str = "/test/error";

/// The status route.
pub fn status_route() -> RouteSpec {
    RouteSpec::get(STATUS_PATH).produces(STATUS_MEDIA_TYPE)
}

/// The error-test route.
pub fn error_test_route() -> RouteSpec {
    RouteSpec::get(ERROR_TEST_PATH).method(Method::PUT)
}

/// Serves the current [`StatusSnapshot`](smrt_core::StatusSnapshot).
pub fn status_handler(state: Arc<ServiceState>) -> ErasedHandler {
    erase(move |_ctx| {
        let state = Arc::clone(&state);
        async move { status(&state) }
    })
}

fn status(state: &ServiceState) -> HandlerResult {
    let snapshot = state.snapshot()?;
    Response::json(StatusCode::OK, STATUS_MEDIA_TYPE, &snapshot)
}

/// Always fails, so deployments can check error accounting end to end.
pub fn error_test_handler() -> ErasedHandler {
    erase(|_ctx| async { Err(Fault::internal("error test endpoint called")) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use smrt_core::{Application, ApplicationStatus, StatusSnapshot};

    struct Lamp;

    impl Application for Lamp {
        fn application_name(&self) -> &str {
            "lamp"
        }

        fn version(&self) -> &str {
            "1.2.0"
        }

        fn status(&self) -> ApplicationStatus {
            ApplicationStatus::new("lamp", "OK", "1.2.0")
        }
    }

    #[tokio::test]
    async fn test_status_body() {
        let state = ServiceState::new();
        state.register(Lamp).unwrap();

        let response = status(&state).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            STATUS_MEDIA_TYPE
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let snapshot: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(snapshot["framework"]["app_loaded"], true);
        assert_eq!(snapshot["application"]["name"], "lamp");
        assert_eq!(snapshot["status"]["amount_total"], 0);
    }

    #[test]
    fn test_status_round_trips() {
        let state = ServiceState::new();
        let response = status(&state).unwrap();
        let bytes = futures_util::FutureExt::now_or_never(response.into_body().collect())
            .unwrap()
            .unwrap()
            .to_bytes();
        let snapshot: StatusSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert!(snapshot.application.is_none());
    }

    #[test]
    fn test_routes() {
        assert_eq!(status_route().contract().produces.as_deref(), Some(STATUS_MEDIA_TYPE));
        assert_eq!(error_test_route().methods(), &[Method::GET, Method::PUT]);
    }
}
