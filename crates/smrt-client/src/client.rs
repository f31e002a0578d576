//! Outbound requests.

use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use smrt_core::{RequestId, REQUEST_ID_HEADER};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Timeout applied to every request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Methods the client sends. Anything else is refused before any I/O.
pub const SUPPORTED_METHODS: [Method; 4] = [Method::GET, Method::PUT, Method::POST, Method::DELETE];

/// HTTP client for calling other services from a handler.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    timeout: Duration,
}

impl Client {
    /// Creates a client with the default timeout.
    pub fn new() -> ClientResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { client, timeout })
    }

    /// The default timeout of this client.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts a `GET` request.
    pub fn get(&self, url: impl Into<String>) -> OutboundRequest<'_> {
        self.request(Method::GET, url)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, url: impl Into<String>) -> OutboundRequest<'_> {
        self.request(Method::PUT, url)
    }

    /// Starts a `POST` request.
    pub fn post(&self, url: impl Into<String>) -> OutboundRequest<'_> {
        self.request(Method::POST, url)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, url: impl Into<String>) -> OutboundRequest<'_> {
        self.request(Method::DELETE, url)
    }

    /// Starts a request with any method. Unsupported methods fail on
    /// [`send`](OutboundRequest::send).
    pub fn request(&self, method: Method, url: impl Into<String>) -> OutboundRequest<'_> {
        OutboundRequest {
            client: self,
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            request_id: None,
            body: None,
            timeout: None,
        }
    }
}

/// A request being built. Nothing is sent until [`send`](Self::send).
#[derive(Debug)]
pub struct OutboundRequest<'a> {
    client: &'a Client,
    method: Method,
    url: String,
    headers: HeaderMap,
    request_id: Option<RequestId>,
    body: Option<Result<Vec<u8>, serde_json::Error>>,
    timeout: Option<Duration>,
}

impl OutboundRequest<'_> {
    /// Propagates the id of the request being handled. Without it a fresh
    /// id is generated.
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Adds a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialises `body` as JSON. Sets `Content-Type: application/json`
    /// unless a content type was already given.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_vec(body));
        self
    }

    /// Overrides the client timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends the request.
    ///
    /// A downstream `500` is returned as [`ClientError::DownstreamError`];
    /// every other status is handed back to the caller.
    pub async fn send(self) -> ClientResult<ClientResponse> {
        if !SUPPORTED_METHODS.contains(&self.method) {
            return Err(ClientError::UnsupportedMethod(self.method));
        }

        let target = reqwest::Url::parse(&self.url).map_err(|e| ClientError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        let request_id = self.request_id.unwrap_or_default();
        let mut headers = self.headers;
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }

        let mut builder = self.client.client.request(self.method.clone(), target);
        if let Some(body) = self.body {
            let body = body.map_err(ClientError::Serialize)?;
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            builder = builder.body(body);
        }
        builder = builder.headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(request_id = %request_id, method = %self.method, url = %self.url, "outbound request");

        let response = builder.send().await.map_err(|source| {
            warn!(
                request_id = %request_id,
                url = %self.url,
                error = %source,
                "unexpected issue when connecting"
            );
            ClientError::Unreachable {
                url: self.url.clone(),
                source,
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| ClientError::Decode {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(request_id = %request_id, url = %self.url, "downstream answered 500");
            return Err(ClientError::DownstreamError {
                url: self.url,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(ClientResponse {
            url: self.url,
            status,
            headers,
            body,
        })
    }
}

/// A completed downstream response.
#[derive(Debug, Clone)]
pub struct ClientResponse {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ClientResponse {
    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}
