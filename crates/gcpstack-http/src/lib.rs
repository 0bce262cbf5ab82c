//! HTTP layer for GcpStack.
//!
//! - **Routing** ([`router`]): maps method and path to a
//!   [`GcpOperation`](gcpstack_model::GcpOperation) and extracts path and
//!   query parameters.
//! - **Dispatch** ([`dispatch`]): the [`GcpHandler`] trait the emulator
//!   implements.
//! - **Response** ([`response`]): JSON responses, media responses, and the
//!   two error envelope flavors.
//! - **Multipart** ([`multipart`]): the `multipart/related` upload parser.
//! - **Service** ([`service`]): the hyper [`GcpHttpService`].
//! - **Body** ([`body`]): the [`GcpResponseBody`] type.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> GcpHttpService (hyper Service)
//!     -> Health check / CORS interception
//!     -> GcpRouter (operation + path params)
//!     -> Body collection
//!     -> dispatch_operation (GcpHandler trait)
//!     -> Error envelope for the request's API family
//!     -> Common response headers
//!   <- HTTP Response
//! ```

// GcpError carries a boxed source and is returned by value on every path;
// boxing it again would buy nothing.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod dispatch;
pub mod multipart;
pub mod response;
pub mod router;
pub mod service;

pub use body::GcpResponseBody;
pub use dispatch::{GcpHandler, HandlerFuture};
pub use router::{GcpRouter, PathParams, QueryParams, RequestContext};
pub use service::{GcpHttpConfig, GcpHttpService};
