//! Handler bridging the HTTP layer to the emulator.

use std::sync::Arc;

use bytes::Bytes;
use gcpstack_http::body::GcpResponseBody;
use gcpstack_http::dispatch::{GcpHandler, HandlerFuture};
use gcpstack_http::response::{json_response, media_response, no_content};
use gcpstack_http::router::RequestContext;
use gcpstack_model::GcpOperation;
use gcpstack_model::error::GcpError;
use gcpstack_model::storage::Object;
use http::HeaderName;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::checksums::ContentDigests;
use crate::provider::GcpEmulator;

/// Handler that serves routed requests from a [`GcpEmulator`].
///
/// # Examples
///
/// ```
/// use gcpstack_core::GcpStackConfig;
/// use gcpstack_emulator::{GcpEmulator, GcpEmulatorHandler};
/// use gcpstack_http::dispatch::GcpHandler;
/// use gcpstack_http::router::GcpRouter;
///
/// let handler = GcpEmulatorHandler::new(GcpEmulator::new(GcpStackConfig::default()));
/// let uri: http::Uri = "/storage/v1/b".parse().unwrap();
/// let ctx = GcpRouter::new().resolve(&http::Method::GET, &uri).unwrap();
/// let (parts, ()) = http::Request::get(uri).body(()).unwrap().into_parts();
/// # tokio_test::block_on(async {
/// let response = handler
///     .handle_operation(ctx.operation, parts, bytes::Bytes::new(), ctx)
///     .await
///     .unwrap();
/// assert_eq!(response.status(), http::StatusCode::OK);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct GcpEmulatorHandler {
    emulator: Arc<GcpEmulator>,
}

impl GcpEmulatorHandler {
    /// Create a handler owning a new emulator.
    #[must_use]
    pub fn new(emulator: GcpEmulator) -> Self {
        Self::from_emulator(Arc::new(emulator))
    }

    /// Create a handler sharing an existing emulator.
    #[must_use]
    pub fn from_emulator(emulator: Arc<GcpEmulator>) -> Self {
        Self { emulator }
    }

    /// The emulator behind this handler.
    #[must_use]
    pub fn emulator(&self) -> &Arc<GcpEmulator> {
        &self.emulator
    }
}

impl GcpHandler for GcpEmulatorHandler {
    fn handle_operation(
        &self,
        op: GcpOperation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RequestContext,
    ) -> HandlerFuture {
        let emulator = Arc::clone(&self.emulator);
        Box::pin(async move { dispatch(emulator.as_ref(), op, &parts, body, &ctx) })
    }
}

/// Dispatch an operation to the matching `handle_*` method.
fn dispatch(
    emulator: &GcpEmulator,
    op: GcpOperation,
    parts: &http::request::Parts,
    body: Bytes,
    ctx: &RequestContext,
) -> Result<http::Response<GcpResponseBody>, GcpError> {
    let params = &ctx.path_params;
    let query = &ctx.query;

    match op {
        // -- Buckets --
        GcpOperation::ListBuckets => {
            json_response(&emulator.handle_list_buckets(query.non_empty("project")))
        }
        GcpOperation::InsertBucket => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_insert_bucket(query.non_empty("project"), input)?)
        }
        GcpOperation::GetBucket => {
            json_response(&emulator.handle_get_bucket(params.require("bucket")?)?)
        }
        GcpOperation::PatchBucket | GcpOperation::UpdateBucket => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_patch_bucket(params.require("bucket")?, input)?)
        }
        GcpOperation::DeleteBucket => {
            emulator.handle_delete_bucket(params.require("bucket")?)?;
            Ok(no_content())
        }

        // -- Objects --
        GcpOperation::ListObjects => json_response(&emulator.handle_list_objects(
            params.require("bucket")?,
            query.non_empty("prefix"),
            query.non_empty("delimiter"),
        )?),
        GcpOperation::InsertObject => {
            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            json_response(&emulator.handle_insert_object(
                params.require("bucket")?,
                query.non_empty("name"),
                content_type,
                body,
            )?)
        }
        GcpOperation::GetObject => {
            let bucket = params.require("bucket")?;
            let object = params.require("object")?;
            if query.get("alt") == Some("media") {
                let (meta, content) = emulator.handle_download_object(bucket, object)?;
                Ok(media(&meta, content))
            } else {
                json_response(&emulator.handle_get_object(bucket, object)?)
            }
        }
        GcpOperation::DownloadObject => {
            let (meta, content) = emulator
                .handle_download_object(params.require("bucket")?, params.require("object")?)?;
            Ok(media(&meta, content))
        }
        GcpOperation::PatchObject | GcpOperation::UpdateObject => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_patch_object(
                params.require("bucket")?,
                params.require("object")?,
                input,
            )?)
        }
        GcpOperation::DeleteObject => {
            emulator.handle_delete_object(params.require("bucket")?, params.require("object")?)?;
            Ok(no_content())
        }

        // -- Instances --
        GcpOperation::ListInstances => json_response(&emulator.handle_list_instances()),
        GcpOperation::InsertInstance => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_insert_instance(input)?)
        }
        GcpOperation::GetInstance => {
            json_response(&emulator.handle_get_instance(params.require("instance")?)?)
        }
        GcpOperation::PatchInstance | GcpOperation::UpdateInstance => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_patch_instance(params.require("instance")?, input)?)
        }
        GcpOperation::DeleteInstance => {
            json_response(&emulator.handle_delete_instance(params.require("instance")?)?)
        }

        // -- Databases --
        GcpOperation::ListDatabases => {
            json_response(&emulator.handle_list_databases(params.require("instance")?)?)
        }
        GcpOperation::InsertDatabase => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_insert_database(params.require("instance")?, input)?)
        }
        GcpOperation::GetDatabase => json_response(&emulator.handle_get_database(
            params.require("instance")?,
            params.require("database")?,
        )?),
        GcpOperation::PatchDatabase | GcpOperation::UpdateDatabase => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_patch_database(
                params.require("instance")?,
                params.require("database")?,
                input,
            )?)
        }
        GcpOperation::DeleteDatabase => json_response(&emulator.handle_delete_database(
            params.require("instance")?,
            params.require("database")?,
        )?),

        // -- Users --
        GcpOperation::ListUsers => {
            json_response(&emulator.handle_list_users(params.require("instance")?)?)
        }
        GcpOperation::InsertUser => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_insert_user(params.require("instance")?, input)?)
        }
        GcpOperation::GetUser => json_response(&emulator.handle_get_user(
            params.require("instance")?,
            params.require("user")?,
            query.non_empty("host"),
        )?),
        GcpOperation::UpdateUser => {
            let input = deserialize(&body)?;
            json_response(&emulator.handle_update_user(
                params.require("instance")?,
                query.get("name"),
                query.non_empty("host"),
                input,
            )?)
        }
        GcpOperation::DeleteUser => json_response(&emulator.handle_delete_user(
            params.require("instance")?,
            query.get("name"),
            query.non_empty("host"),
        )?),

        // -- Operations --
        GcpOperation::ListOperations => {
            json_response(&emulator.handle_list_operations(query.non_empty("instance")))
        }
        GcpOperation::GetOperation => {
            json_response(&emulator.handle_get_operation(params.require("operation")?)?)
        }
    }
}

/// Decode a JSON request body. An empty body decodes to the default value.
fn deserialize<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, GcpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        GcpError::parse_error(format!("Failed to parse request body: {e}")).with_source(e)
    })
}

/// Raw content response carrying the object's generation and hashes.
fn media(meta: &Object, content: Bytes) -> http::Response<GcpResponseBody> {
    let digests = ContentDigests {
        md5: meta.md5_hash.clone(),
        crc32c: meta.crc32c.clone(),
    };
    media_response(
        content,
        &meta.content_type,
        &meta.etag,
        &[
            (
                HeaderName::from_static("x-goog-generation"),
                meta.generation.to_string(),
            ),
            (
                HeaderName::from_static("x-goog-metageneration"),
                meta.metageneration.to_string(),
            ),
            (HeaderName::from_static("x-goog-hash"), digests.header_value()),
            (
                HeaderName::from_static("x-goog-stored-content-length"),
                meta.size.to_string(),
            ),
        ],
    )
}
