//! The hyper `Service` tying routing, dispatch, and response shaping together.
//!
//! [`GcpHttpService`] handles:
//!
//! 1. Health check interception (`GET /health`)
//! 2. CORS preflight requests (`OPTIONS`)
//! 3. Route resolution via [`GcpRouter`]
//! 4. Request body collection, bounded by the read timeout
//! 5. Operation dispatch to the [`GcpHandler`], bounded by the write timeout
//! 6. Error envelope rendering for the request's API family
//! 7. Common response headers (`x-request-id`, `Server`, CORS)

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use gcpstack_model::error::{GcpError, GcpErrorCode};
use gcpstack_model::operations::ApiFamily;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::body::GcpResponseBody;
use crate::dispatch::{GcpHandler, dispatch_operation};
use crate::response::{JSON_CONTENT_TYPE, NO_CACHE, error_to_response};
use crate::router::GcpRouter;

/// Configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct GcpHttpConfig {
    /// Upper bound on collecting a request body.
    pub read_timeout: Duration,
    /// Upper bound on producing a response once the request head is read.
    pub write_timeout: Duration,
    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for GcpHttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(15),
            write_timeout: Duration::from_secs(15),
            server_name: "GcpStack".to_owned(),
        }
    }
}

/// The HTTP service that implements hyper's `Service` trait.
#[derive(Debug)]
pub struct GcpHttpService<H: GcpHandler> {
    handler: Arc<H>,
    router: Arc<GcpRouter>,
    config: Arc<GcpHttpConfig>,
}

impl<H: GcpHandler> GcpHttpService<H> {
    /// Create a new service with the given handler and configuration.
    #[must_use]
    pub fn new(handler: H, config: GcpHttpConfig) -> Self {
        Self::from_shared(Arc::new(handler), config)
    }

    /// Create a new service from an `Arc<H>` handler and configuration.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, config: GcpHttpConfig) -> Self {
        Self {
            handler,
            router: Arc::new(GcpRouter::new()),
            config: Arc::new(config),
        }
    }

    /// Run one request through the full pipeline.
    ///
    /// Generic over the request body so it can be driven without a socket.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<GcpResponseBody>
    where
        B: http_body::Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let request_id = Uuid::new_v4().to_string();
        let family = ApiFamily::from_path(req.uri().path());
        let processing = process_request(
            req,
            self.handler.as_ref(),
            &self.router,
            &self.config,
            &request_id,
        );
        let response = match tokio::time::timeout(self.config.write_timeout, processing).await {
            Ok(response) => response,
            Err(_) => {
                error!(
                    request_id,
                    timeout_ms = u64::try_from(self.config.write_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    "request exceeded write timeout"
                );
                error_to_response(&GcpError::internal_error("Timed out writing response"), family)
            }
        };
        add_common_headers(response, &request_id, &self.config.server_name)
    }
}

impl<H: GcpHandler> Clone for GcpHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            router: Arc::clone(&self.router),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: GcpHandler> Service<http::Request<Incoming>> for GcpHttpService<H> {
    type Response = http::Response<GcpResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Process a request through the routing and dispatch pipeline.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    router: &GcpRouter,
    config: &GcpHttpConfig,
    request_id: &str,
) -> http::Response<GcpResponseBody>
where
    H: GcpHandler,
    B: http_body::Body + Send,
    B::Data: Send,
    B::Error: Display,
{
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing request");

    // 1. Health check interception.
    if is_health_check(&method, uri.path()) {
        return health_check_response();
    }

    // 2. CORS preflight.
    if method == http::Method::OPTIONS {
        return cors_preflight_response();
    }

    // 3. Route.
    let ctx = match router.resolve(&method, &uri) {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!(%method, %uri, error = %err, request_id, "failed to route request");
            return error_to_response(&err, ApiFamily::from_path(uri.path()));
        }
    };
    let operation = ctx.operation;
    let family = operation.family();

    // 4. Collect body.
    let (parts, incoming) = req.into_parts();
    let body = match collect_body(incoming, config.read_timeout).await {
        Ok(body) => body,
        Err(err) => {
            warn!(operation = %operation, error = %err, request_id, "failed to read request body");
            return error_to_response(&err, family);
        }
    };

    // 5. Dispatch.
    let started = Instant::now();
    let response = match dispatch_operation(handler, parts, body, ctx).await {
        Ok(response) => response,
        Err(err) => {
            if err.code == GcpErrorCode::Internal {
                error!(
                    operation = %operation,
                    error = %err,
                    source = ?err.source,
                    request_id,
                    "operation failed"
                );
            } else {
                debug!(
                    operation = %operation,
                    error = %err,
                    request_id,
                    "operation returned error"
                );
            }
            error_to_response(&err, family)
        }
    };

    info!(
        operation = %operation,
        mutating = operation.is_mutating(),
        status = response.status().as_u16(),
        elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        request_id,
        "handled request"
    );
    response
}

/// Collect the full body, failing with a parse error on timeout or a broken stream.
async fn collect_body<B>(body: B, timeout: Duration) -> Result<Bytes, GcpError>
where
    B: http_body::Body,
    B::Error: Display,
{
    match tokio::time::timeout(timeout, body.collect()).await {
        Ok(Ok(collected)) => Ok(collected.to_bytes()),
        Ok(Err(e)) => Err(GcpError::parse_error(format!(
            "Failed to read request body: {e}"
        ))),
        Err(_) => Err(GcpError::parse_error(
            "Timed out reading request body",
        )),
    }
}

/// Check if the request is a health check.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == "/health"
}

/// Produce the liveness response.
fn health_check_response() -> http::Response<GcpResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CACHE_CONTROL, NO_CACHE)
        .body(GcpResponseBody::from_string(r#"{"status":"ok"}"#))
        .expect("static health response should be valid")
}

/// Produce a CORS preflight response.
fn cors_preflight_response() -> http::Response<GcpResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        )
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Max-Age", "3600")
        .body(GcpResponseBody::empty())
        .expect("static CORS response should be valid")
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<GcpResponseBody>,
    request_id: &str,
    server_name: &str,
) -> http::Response<GcpResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    if let Ok(hv) = HeaderValue::from_str(server_name) {
        headers.insert("Server", hv);
    }

    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Expose-Headers",
        HeaderValue::from_static(
            "x-request-id, ETag, x-goog-generation, x-goog-metageneration, x-goog-hash",
        ),
    );

    response
}
