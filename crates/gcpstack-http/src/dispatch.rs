//! Operation dispatch: the boundary between the HTTP layer and the emulator.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use gcpstack_model::GcpOperation;
use gcpstack_model::error::GcpError;

use crate::body::GcpResponseBody;
use crate::router::RequestContext;

/// Future returned by [`GcpHandler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<GcpResponseBody>, GcpError>> + Send>>;

/// Trait that the emulator implements to serve routed requests.
///
/// The handler receives the resolved operation, the request head, the fully
/// collected body, and the matcher's [`RequestContext`], and returns a fully
/// formed response or a [`GcpError`] that the service renders into the
/// family-specific error envelope.
pub trait GcpHandler: Send + Sync + 'static {
    /// Handle an operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: GcpOperation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RequestContext,
    ) -> HandlerFuture;
}

/// Dispatch a routed request to the handler.
pub async fn dispatch_operation<H: GcpHandler>(
    handler: &H,
    parts: http::request::Parts,
    body: Bytes,
    ctx: RequestContext,
) -> Result<http::Response<GcpResponseBody>, GcpError> {
    let op = ctx.operation;
    tracing::debug!(operation = %op, params = ?ctx.path_params, "dispatching operation");
    handler.handle_operation(op, parts, body, ctx).await
}
