//! HTTP server.
//!
//! Hyper over Tokio, HTTP/1.1. Every matched route runs through its own
//! responder chain; anything unmatched is answered with 405 through the
//! fallback chain so that it is still counted.
//!
//! # Example
//!
//! ```rust,ignore
//! use smrt_server::{RouteSpec, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .http_addr("0.0.0.0:8080")
//!         .application(Lamp::default())
//!         .route(
//!             RouteSpec::put("/lamps/{name}").consumes(LAMP).produces(LAMP),
//!             switch_lamp,
//!         )
//!         .build()?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use smrt_core::{Application, Fault, ServiceState};
use smrt_middleware::{HandlerResult, MiddlewareContext, Pipeline, Request, Response};
use smrt_schema::SchemaResolver;

use crate::config::ServerConfig;
use crate::endpoints;
use crate::error::{ServerError, ServerResult};
use crate::handler::{erase, invoke, ErasedHandler, HandlerContext};
use crate::router::{RouteLookup, RouteSpec, Router};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

struct RouteEntry {
    pipeline: Pipeline,
    handler: ErasedHandler,
}

/// The smrt HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<ServiceState>,
    router: Router,
    routes: Vec<RouteEntry>,
    fallback: Pipeline,
}

impl Server {
    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared counters and registered application.
    #[must_use]
    pub fn state(&self) -> &Arc<ServiceState> {
        &self.state
    }

    /// The route table, built-in endpoints included.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Handles one request in process, without a socket.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        tracing::debug!(http.method = %method, http.path = %path, "request received");

        let found = match self.router.match_route(&method, &path) {
            RouteLookup::Found(found) => found,
            RouteLookup::MethodNotAllowed | RouteLookup::NoRoute => {
                return self
                    .reject(Fault::method_not_allowed(method.as_str(), path), request)
                    .await;
            }
        };

        let index = found.index();
        let (Some(entry), Some(spec)) = (self.routes.get(index), self.router.spec(index)) else {
            return self
                .reject(Fault::internal(format!("route {index} has no handler")), request)
                .await;
        };

        let mut ctx = MiddlewareContext::new();
        ctx.set_route(spec.path());

        let handler = Arc::clone(&entry.handler);
        let params = found.into_params();
        entry
            .pipeline
            .process(ctx, request, move |ctx, request| {
                let handler_ctx =
                    HandlerContext::new(ctx.request_id(), params, ctx.json_body().cloned(), request);
                invoke(&handler, handler_ctx)
            })
            .await
    }

    async fn reject(&self, fault: Fault, request: Request) -> Response {
        self.fallback
            .process(MiddlewareContext::new(), request, move |_ctx, _request| {
                Box::pin(async move { Err(fault) })
            })
            .await
    }

    /// Runs until SIGINT or SIGTERM.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` triggers, then
    /// waits up to the shutdown timeout for open connections to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, routes = self.router.route_count(), "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, shutdown).await {
                                    tracing::debug!(remote = %remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                    }
                }

                _ = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            open = tracker.active_connections(),
            "waiting up to {:?} for connections to close",
            timeout
        );

        if tokio::time::timeout(timeout, tracker.wait_for_idle()).await.is_err() {
            tracing::warn!(
                open = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        let mut conn = std::pin::pin!(conn);
        let mut draining = false;

        loop {
            tokio::select! {
                result = conn.as_mut() => return result,
                _ = shutdown.recv(), if !draining => {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
        }
    }

    async fn handle(&self, request: http::Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();
        match body.collect().await {
            Ok(collected) => {
                let request = http::Request::from_parts(parts, Full::new(collected.to_bytes()));
                self.dispatch(request).await
            }
            Err(e) => {
                let request = http::Request::from_parts(parts, Full::new(Bytes::new()));
                self.reject(
                    Fault::bad_request(format!("could not read request body: {e}")),
                    request,
                )
                .await
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("routes", &self.router.route_count())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Server`].
///
/// `GET /status` and `GET|PUT /test/error` are always registered.
pub struct ServerBuilder {
    config: ServerConfig,
    state: Option<Arc<ServiceState>>,
    resolver: Option<Arc<SchemaResolver>>,
    application: Option<Arc<dyn Application>>,
    routes: Vec<(RouteSpec, ErasedHandler)>,
}

impl ServerBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            state: None,
            resolver: None,
            application: None,
            routes: Vec::new(),
        }
    }

    /// Replaces the whole server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        let timeout = self.config.shutdown_timeout();
        self.config = ServerConfig::builder()
            .http_addr(addr)
            .shutdown_timeout(timeout)
            .build();
        self
    }

    /// Shares an existing state instead of creating one.
    #[must_use]
    pub fn state(mut self, state: Arc<ServiceState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Uses `resolver` for body schemas instead of a working-directory one.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<SchemaResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Registers the hosting application when the server is built.
    #[must_use]
    pub fn application<A: Application>(mut self, application: A) -> Self {
        self.application = Some(Arc::new(application));
        self
    }

    /// Adds a route.
    #[must_use]
    pub fn route<F, Fut>(self, spec: RouteSpec, handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route_erased(spec, erase(handler))
    }

    /// Adds a route with an already erased handler.
    #[must_use]
    pub fn route_erased(mut self, spec: RouteSpec, handler: ErasedHandler) -> Self {
        self.routes.push((spec, handler));
        self
    }

    /// Builds the server.
    ///
    /// Fails on duplicate or malformed routes and on an application that
    /// does not satisfy the registration contract.
    pub fn build(self) -> ServerResult<Server> {
        let state = self.state.unwrap_or_default();
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(SchemaResolver::new()));

        if let Some(application) = self.application {
            state.register_shared(application)?;
        }

        let builtins = [
            (endpoints::status_route(), endpoints::status_handler(Arc::clone(&state))),
            (endpoints::error_test_route(), endpoints::error_test_handler()),
        ];

        let mut router = Router::new();
        let mut routes = Vec::new();

        for (spec, handler) in builtins.into_iter().chain(self.routes) {
            if !spec.path().starts_with('/') {
                return Err(ServerError::InvalidPath(spec.path().to_string()));
            }
            if router.conflict(&spec).is_some() {
                return Err(ServerError::DuplicateRoute {
                    method: method_list(&spec),
                    path: spec.path().to_string(),
                });
            }

            tracing::debug!(methods = %method_list(&spec), path = spec.path(), "route registered");
            let pipeline = Pipeline::responder(spec.contract(), Arc::clone(&state), Arc::clone(&resolver));
            router.add(spec);
            routes.push(RouteEntry { pipeline, handler });
        }

        Ok(Server {
            config: self.config,
            fallback: Pipeline::fallback(Arc::clone(&state)),
            state,
            router,
            routes,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn method_list(spec: &RouteSpec) -> String {
    spec.methods()
        .iter()
        .map(http::Method::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use smrt_core::{ApplicationStatus, StateError};

    async fn ok(_ctx: HandlerContext) -> HandlerResult {
        Ok(http::Response::new(Full::new(Bytes::new())))
    }

    #[test]
    fn test_builtin_routes_registered() {
        let server = Server::builder().build().unwrap();
        assert_eq!(server.router().route_count(), 2);
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let result = Server::builder()
            .route(RouteSpec::get("/lamps/{name}"), ok)
            .route(RouteSpec::get("/lamps/{id}"), ok)
            .build();
        assert!(matches!(result, Err(ServerError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_builtin_path_cannot_be_shadowed() {
        let result = Server::builder().route(RouteSpec::get("/status"), ok).build();
        assert!(matches!(result, Err(ServerError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_relative_path_rejected() {
        let result = Server::builder().route(RouteSpec::get("lamps"), ok).build();
        assert!(matches!(result, Err(ServerError::InvalidPath(_))));
    }

    struct Nameless;

    impl Application for Nameless {
        fn application_name(&self) -> &str {
            ""
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn status(&self) -> ApplicationStatus {
            ApplicationStatus::new("", "OK", "0.1.0")
        }
    }

    #[test]
    fn test_nonconforming_application_fails_build() {
        let result = Server::builder().application(Nameless).build();
        assert!(matches!(
            result,
            Err(ServerError::Registration(StateError::InvalidApplication { .. }))
        ));
    }

    #[test]
    fn test_http_addr_keeps_timeout() {
        let builder = Server::builder()
            .config(
                ServerConfig::builder()
                    .shutdown_timeout(std::time::Duration::from_secs(2))
                    .build(),
            )
            .http_addr("127.0.0.1:0");
        let server = builder.build().unwrap();
        assert_eq!(server.config().http_addr(), "127.0.0.1:0");
        assert_eq!(server.config().shutdown_timeout(), std::time::Duration::from_secs(2));
    }
}
